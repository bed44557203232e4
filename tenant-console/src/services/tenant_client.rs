use crate::config::Settings;
use crate::error::ClientError;
use crate::models::{CreateTenantRequest, TenantListResponse, TenantResponse, UpdateTenantBody};
use crate::services::transport::{Operation, Transport};
use reqwest::Method;

const TENANTS_PATH: &str = "/tenants";
const TENANT_PATH: &str = "/tenants/{id}";

/// Typed client for the tenant service. One method per remote capability,
/// no retries.
#[derive(Clone, Debug)]
pub struct TenantClient {
    transport: Transport,
}

impl TenantClient {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let base_path = settings.resolve_base_path();
        let transport = Transport::new(&base_path, settings.api.request_timeout())?;

        tracing::info!(base_path = %transport.base_path(), "Tenant client configured");

        Ok(Self::new(transport))
    }

    pub fn base_path(&self) -> &str {
        self.transport.base_path()
    }

    /// `GET /tenants`
    pub async fn list_tenants(&self) -> Result<TenantListResponse, ClientError> {
        self.transport
            .execute(Operation::new("list_tenants", Method::GET, TENANTS_PATH))
            .await
    }

    /// `GET /tenants/{id}`
    pub async fn get_tenant(&self, id: &str) -> Result<TenantResponse, ClientError> {
        self.transport
            .execute(
                Operation::new("get_tenant", Method::GET, TENANT_PATH).params(&[("id", Some(id))]),
            )
            .await
    }

    /// `POST /tenants`. Not idempotent: every call creates a new tenant.
    pub async fn create_tenant(
        &self,
        request: &CreateTenantRequest,
    ) -> Result<TenantResponse, ClientError> {
        self.transport
            .execute(Operation::new("create_tenant", Method::POST, TENANTS_PATH).body(request))
            .await
    }

    /// `PUT /tenants/{id}`
    pub async fn update_tenant(
        &self,
        id: &str,
        body: &UpdateTenantBody,
    ) -> Result<TenantResponse, ClientError> {
        self.transport
            .execute(
                Operation::new("update_tenant", Method::PUT, TENANT_PATH)
                    .params(&[("id", Some(id))])
                    .body(body),
            )
            .await
    }

    /// `DELETE /tenants/{id}`. The response echoes the deleted tenant.
    pub async fn delete_tenant(&self, id: &str) -> Result<TenantResponse, ClientError> {
        self.transport
            .execute(
                Operation::new("delete_tenant", Method::DELETE, TENANT_PATH)
                    .params(&[("id", Some(id))]),
            )
            .await
    }
}
