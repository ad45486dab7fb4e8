//! Structured logging setup, with optional OpenTelemetry export.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
    #[serde(default = "default_console_output")]
    pub console_output: bool,
}

fn default_service_name() -> String {
    "task-platform".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

fn default_console_output() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: default_service_name(),
            otlp_endpoint: None,
            sampling_ratio: default_sampling_ratio(),
            console_output: default_console_output(),
        }
    }
}

#[cfg(feature = "telemetry")]
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<()> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::{Sampler, TracerProvider};
    use opentelemetry_sdk::Resource;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::{EnvFilter, Registry};

    let sampler = Sampler::TraceIdRatioBased(config.sampling_ratio);
    let resource = Resource::new(vec![opentelemetry::KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        config.service_name.clone(),
    )]);

    let provider = if let Some(endpoint) = &config.otlp_endpoint {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;
        TracerProvider::builder()
            .with_sampler(sampler)
            .with_resource(resource)
            .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
            .build()
    } else {
        TracerProvider::builder()
            .with_sampler(sampler)
            .with_resource(resource)
            .build()
    };

    let tracer = provider.tracer(config.service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,task_platform=debug"));

    let subscriber = Registry::default().with(env_filter).with(otel_layer);

    if config.console_output {
        tracing::subscriber::set_global_default(
            subscriber.with(tracing_subscriber::fmt::layer()),
        )?;
    } else {
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

#[cfg(feature = "telemetry")]
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(not(feature = "telemetry"))]
pub fn init_telemetry(_config: &TelemetryConfig) -> anyhow::Result<()> {
    init_basic_tracing(true)
}

#[cfg(not(feature = "telemetry"))]
pub fn shutdown_telemetry() {}

pub fn init_basic_tracing(console_output: bool) -> anyhow::Result<()> {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,task_platform=debug"));

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);

    if console_output {
        subscriber.init();
    } else {
        subscriber.with_writer(std::io::sink).init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_disabled_with_console_output() {
        let config = TelemetryConfig::default();
        assert!(!config.enabled);
        assert!(config.console_output);
        assert!((config.sampling_ratio - 1.0).abs() < f64::EPSILON);
    }
}
