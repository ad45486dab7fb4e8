//! Startup banner utilities, adapted from
//! `arcana-server::startup` — no REST/gRPC ports to print, since this
//! system exposes no server of its own.

use tracing::info;

/// Prints the startup banner.
pub fn print_banner() {
    info!(
        r#"
     _____         _      ____  _       _  __               _
    |_   _|_ _ ___| | __ |  _ \| | __ _| |/ _| ___  _ __ ___ | |
      | |/ _` / __| |/ / | |_) | |/ _` | | |_ / _ \| '__/ _ \| |
      | | (_| \__ \   <  |  __/| | (_| | |  _| (_) | | | (_) |_|
      |_|\__,_|___/_|\_\ |_|   |_|\__,_|_|_|  \___/|_|  \___/(_)

                        Rust Edition
    "#
    );
}

/// Prints a summary of what this process registered and which
/// background sweeps it runs, in place of HTTP/gRPC port info
/// (this system has no such listeners).
pub fn print_startup_info(environment: &str, registered_tasks: usize, check_interval_secs: u64, retention_days: i64) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("Environment:        {}", environment);
    info!("Registered tasks:   {}", registered_tasks);
    info!("Reconciliation:     every {}s", check_interval_secs);
    info!("Execution retention: {} days", retention_days);
    info!("{}", separator);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_banner_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_banner();
    }

    #[test]
    fn print_startup_info_does_not_panic() {
        let _ = tracing_subscriber::fmt::try_init();
        print_startup_info("development", 3, 60, 90);
    }
}
