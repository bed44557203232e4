//! Pure helpers deciding how tenants are shown. No I/O.
pub mod health;
pub mod view;

pub use health::{Badge, HealthStatus};
pub use view::{FieldDisplay, TenantView};
