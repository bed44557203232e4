use console_core::config::{configuration_directory, load_layered, TelemetrySettings};
use console_core::error::CoreError;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

/// Origin the console is served from. Used to derive the API base path when
/// none is configured.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn origin(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ApiSettings {
    /// Base path of the tenant service (e.g. `http://tenants.internal:8080/v1`).
    /// Set through `APP_API__BASE_PATH`.
    #[serde(default)]
    pub base_path: Option<String>,
    /// HTTP client timeout; no timeout when unset.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Settings {
    /// The tenant service base path: the configured value, or the serving
    /// origin when unset or blank.
    pub fn resolve_base_path(&self) -> String {
        match self.api.base_path.as_deref().map(str::trim) {
            Some(base_path) if !base_path.is_empty() => base_path.to_string(),
            _ => self.server.origin(),
        }
    }
}

pub fn get_configuration() -> Result<Settings, CoreError> {
    let directory = configuration_directory("tenant-console")?;
    load_layered(&directory)
}
