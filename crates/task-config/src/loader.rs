//! Layered configuration loader: files, then environment variables,
//! with runtime reload support.

use crate::AppConfig;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use std::sync::Arc;
use task_core::TaskError;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Loads and holds the platform configuration, refreshable at runtime.
///
/// Sources are layered in order:
/// 1. `{config_dir}/default.toml`
/// 2. `{config_dir}/{environment}.toml`
/// 3. `{config_dir}/local.toml` (not committed to version control)
/// 4. Environment variables, prefix `TASKPLATFORM`, `__`-separated
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<String>) -> Result<Self, TaskError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    pub fn from_default_location() -> Result<Self, TaskError> {
        Self::new("./config")
    }

    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    pub async fn reload(&self) -> Result<(), TaskError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("configuration reloaded");
        Ok(())
    }

    fn load_config(config_dir: &str) -> Result<AppConfig, TaskError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("no .env file found or error loading it: {e}");
        }

        let environment =
            std::env::var("TASKPLATFORM_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!(environment = %environment, "loading configuration");

        let mut builder = Config::builder();

        let default_path = format!("{config_dir}/default.toml");
        if Path::new(&default_path).exists() {
            debug!("loading default config from {default_path}");
            builder = builder.add_source(File::with_name(&default_path).required(false));
        }

        let env_path = format!("{config_dir}/{environment}.toml");
        if Path::new(&env_path).exists() {
            debug!("loading environment config from {env_path}");
            builder = builder.add_source(File::with_name(&env_path).required(false));
        }

        let local_path = format!("{config_dir}/local.toml");
        if Path::new(&local_path).exists() {
            debug!("loading local config from {local_path}");
            builder = builder.add_source(File::with_name(&local_path).required(false));
        }

        builder = builder.add_source(
            Environment::with_prefix("TASKPLATFORM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_task_error)?;
        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_task_error)?;

        Self::validate_config(&app_config)?;
        Ok(app_config)
    }

    fn validate_config(config: &AppConfig) -> Result<(), TaskError> {
        if config.database.url.is_empty() {
            return Err(TaskError::internal("database.url is required"));
        }
        if config.scheduler.key_prefix.is_empty() {
            return Err(TaskError::internal("scheduler.key_prefix must not be empty"));
        }
        if config.environment == "production" && config.scheduler.legacy_key_pattern == "btu_scheduler:*" {
            warn!("legacy_key_pattern left at its default value in production");
        }
        Ok(())
    }

    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_task_error(err: ConfigError) -> TaskError {
    TaskError::internal(format!("configuration error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_config_has_expected_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.redis.pool_size, 16);
        assert_eq!(config.scheduler.check_interval_secs, 60);
    }
}
