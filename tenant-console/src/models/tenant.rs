use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Helm values are an arbitrary JSON object owned by the tenant service.
pub type HelmValues = Map<String, Value>;

/// A managed deployment unit. `id` is assigned by the service on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    /// Server-computed; never sent back by the console.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<Application>,
}

/// Repository/path/revision/Helm descriptor. An absent or empty field means
/// "use the service default".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helm: Option<Helm>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Helm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<HelmValues>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<Health>,
}

/// Health as reported by the deployment controller. `status` is open-ended
/// and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Health {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Tenant {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn health_status(&self) -> Option<&str> {
        self.application
            .as_ref()
            .and_then(|application| application.health.as_ref())
            .and_then(|health| health.status.as_deref())
    }
}

impl Source {
    pub fn helm_values(&self) -> Option<&HelmValues> {
        self.helm.as_ref().and_then(|helm| helm.values.as_ref())
    }
}

/// Body of `POST /tenants`. Carries no id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTenantRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

/// Body of `PUT /tenants/{id}`. The id travels in the path only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateTenantBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
}

impl From<Source> for CreateTenantRequest {
    fn from(source: Source) -> Self {
        Self {
            source: Some(source),
        }
    }
}

impl From<Source> for UpdateTenantBody {
    fn from(source: Source) -> Self {
        Self {
            source: Some(source),
        }
    }
}

/// `{"tenant": {...}}` returned by get, create, update and delete. Delete
/// echoes the removed tenant as its acknowledgment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
}

impl TenantResponse {
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().and_then(Tenant::id)
    }
}

/// `{"tenants": [...]}` in server order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TenantListResponse {
    #[serde(default)]
    pub tenants: Vec<Tenant>,
}
