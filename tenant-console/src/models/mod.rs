pub mod codec;
pub mod status;
pub mod tenant;

pub use status::RpcStatus;
pub use tenant::{
    Application, CreateTenantRequest, Health, Helm, HelmValues, Source, Tenant,
    TenantListResponse, TenantResponse, UpdateTenantBody,
};
