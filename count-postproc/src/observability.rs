use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub service_name: String,
    pub log_level: String,
    pub json_format: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "count-postproc".to_string(),
            log_level: "info".to_string(),
            json_format: false,
        }
    }
}

impl TracingConfig {
    /// Reads `RUST_LOG` and `LOG_FORMAT` (`json` or anything else for plain
    /// text), falling back to the defaults.
    pub fn from_env(service_name: &str) -> Self {
        let log_level =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let json_format = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        Self {
            service_name: service_name.to_string(),
            log_level,
            json_format,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing setup error: {0}")]
    Setup(String),
}

/// Installs the global subscriber. Span close events are logged so the
/// duration of each batch and each shard attempt shows up in the output.
pub fn setup_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_file(true)
        .with_line_number(true);

    let fmt_layer = if config.json_format {
        fmt_layer.json().boxed()
    } else {
        fmt_layer.boxed()
    };

    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TracingError::Setup(e.to_string()))?;

    Registry::default()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::Setup(e.to_string()))?;
    tracing::debug!(service = %config.service_name, "tracing initialized");
    Ok(())
}
