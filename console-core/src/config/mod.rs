use crate::error::CoreError;
use config::{Config as Cfg, Environment, File};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment prefix shared by every console process (`APP_SERVER__PORT`, ...).
pub const ENV_PREFIX: &str = "APP";

/// Locate `<crate>/config`, whether the process runs from the workspace root
/// or from inside the crate directory.
pub fn configuration_directory(crate_dir: &str) -> Result<PathBuf, CoreError> {
    let base_path = std::env::current_dir()?;

    if base_path.ends_with(crate_dir) {
        Ok(base_path.join("config"))
    } else {
        Ok(base_path.join(crate_dir).join("config"))
    }
}

/// Load settings from `<dir>/base.yaml` (optional) overlaid with `APP_*`
/// environment variables using `__` as the nesting separator.
pub fn load_layered<T: DeserializeOwned>(configuration_directory: &Path) -> Result<T, CoreError> {
    dotenvy::dotenv().ok();

    let settings = Cfg::builder()
        .add_source(File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize::<T>()?)
}

/// Logging and trace export settings understood by [`crate::observability::init_tracing`].
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC collector; trace export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
            json: false,
        }
    }
}
