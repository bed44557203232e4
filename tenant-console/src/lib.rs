pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;

pub use error::ClientError;
pub use services::{TenantClient, TenantQueries};
