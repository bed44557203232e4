use crate::display::health::HealthStatus;
use crate::models::Tenant;

pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/ludydoo/poc-cloud-service-manifests";
pub const DEFAULT_PATH: &str = "tenant-manifests";
pub const DEFAULT_TARGET_REVISION: &str = "HEAD";

/// A source field as the console shows it: the configured value, or the
/// service default marked as such.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDisplay {
    pub text: String,
    pub is_default: bool,
}

impl FieldDisplay {
    /// Empty values count as unset, matching how the service applies defaults.
    pub fn resolve(value: Option<&str>, default: &str) -> Self {
        match value {
            Some(value) if !value.is_empty() => Self {
                text: value.to_string(),
                is_default: false,
            },
            _ => Self {
                text: format!("{} (default)", default),
                is_default: true,
            },
        }
    }
}

/// Everything the list and detail screens render for one tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantView {
    pub id: String,
    pub repo_url: FieldDisplay,
    pub path: FieldDisplay,
    pub target_revision: FieldDisplay,
    /// Pretty-printed Helm values; `None` when the tenant has none.
    pub helm_values: Option<String>,
    pub health: HealthStatus,
    pub health_message: Option<String>,
}

impl TenantView {
    pub fn from_tenant(tenant: &Tenant) -> Self {
        let source = tenant.source.as_ref();
        let health_message = tenant
            .application
            .as_ref()
            .and_then(|application| application.health.as_ref())
            .and_then(|health| health.message.clone())
            .filter(|message| !message.is_empty());

        Self {
            id: tenant.id.clone().unwrap_or_default(),
            repo_url: FieldDisplay::resolve(
                source.and_then(|s| s.repo_url.as_deref()),
                DEFAULT_REPOSITORY_URL,
            ),
            path: FieldDisplay::resolve(source.and_then(|s| s.path.as_deref()), DEFAULT_PATH),
            target_revision: FieldDisplay::resolve(
                source.and_then(|s| s.target_revision.as_deref()),
                DEFAULT_TARGET_REVISION,
            ),
            helm_values: source
                .and_then(|s| s.helm_values())
                .and_then(|values| serde_json::to_string_pretty(values).ok()),
            health: HealthStatus::from_application(tenant.application.as_ref()),
            health_message,
        }
    }
}
