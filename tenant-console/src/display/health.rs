use crate::models::Application;
use std::fmt;

/// Display form of a tenant's application health.
///
/// The set of statuses is open: anything unrecognized is kept verbatim in
/// [`HealthStatus::Other`] instead of being folded into `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Progressing,
    Missing,
    Other(String),
    /// No application, no health, or an empty status.
    Unknown,
}

/// Badge colour used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Green,
    Yellow,
    Amber,
    Red,
    Zinc,
}

impl HealthStatus {
    pub fn from_status(status: Option<&str>) -> Self {
        match status {
            None | Some("") => HealthStatus::Unknown,
            Some("Healthy") => HealthStatus::Healthy,
            Some("Progressing") => HealthStatus::Progressing,
            Some("Missing") => HealthStatus::Missing,
            Some(other) => HealthStatus::Other(other.to_string()),
        }
    }

    pub fn from_application(application: Option<&Application>) -> Self {
        Self::from_status(
            application
                .and_then(|application| application.health.as_ref())
                .and_then(|health| health.status.as_deref()),
        )
    }

    pub fn label(&self) -> &str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Progressing => "Progressing",
            HealthStatus::Missing => "Missing",
            HealthStatus::Other(status) => status,
            HealthStatus::Unknown => "Unknown",
        }
    }

    pub fn badge(&self) -> Badge {
        match self {
            HealthStatus::Healthy => Badge::Green,
            HealthStatus::Progressing => Badge::Yellow,
            HealthStatus::Missing => Badge::Amber,
            HealthStatus::Other(_) => Badge::Red,
            HealthStatus::Unknown => Badge::Zinc,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}
