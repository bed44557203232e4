pub mod query_cache;
pub mod tenant_client;
pub mod tenant_queries;
pub mod transport;

pub use query_cache::{EntryState, Invalidation, QueryCache, QuerySnapshot};
pub use tenant_client::TenantClient;
pub use tenant_queries::{MutationHooks, QueryKey, ResourceKind, TenantQueries};
pub use transport::Transport;
