//! console-core: Shared infrastructure for the tenant console crates.
pub mod config;
pub mod error;
pub mod observability;

pub use reqwest;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
