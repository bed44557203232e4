use thiserror::Error;

/// Infrastructure failures raised while bootstrapping a console process.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Telemetry error: {0}")]
    TelemetryError(String),
}
