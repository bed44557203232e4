//! Cached reads and cache-synchronizing mutations for tenants.
//!
//! Reads go through [`QueryCache`]; mutations go straight to the
//! [`TenantClient`] and, once the server confirms them, apply the
//! invalidations declared by [`invalidations_for`]. Failed mutations never
//! touch the cache.

use crate::error::ClientError;
use crate::models::{CreateTenantRequest, TenantListResponse, TenantResponse, UpdateTenantBody};
use crate::services::query_cache::{EntryState, Invalidation, QueryCache, QuerySnapshot};
use crate::services::tenant_client::TenantClient;
use std::fmt;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Tenant,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Tenant => f.write_str("tenants"),
        }
    }
}

/// Structured cache key: resource kind plus identity. The list of a kind is
/// the key without identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub kind: ResourceKind,
    pub id: Option<String>,
}

impl QueryKey {
    pub fn list(kind: ResourceKind) -> Self {
        Self { kind, id: None }
    }

    pub fn one(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
        }
    }

    pub fn tenants() -> Self {
        Self::list(ResourceKind::Tenant)
    }

    pub fn tenant(id: impl Into<String>) -> Self {
        Self::one(ResourceKind::Tenant, id)
    }

    pub fn is_list(&self) -> bool {
        self.id.is_none()
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "{}/{}", self.kind, id),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// A confirmed tenant mutation.
#[derive(Debug, Clone, Copy)]
pub enum Mutation<'a> {
    Create,
    Update { id: &'a str },
    Delete { id: &'a str },
}

/// Cache entries a confirmed mutation may have changed.
///
/// Update targets the id echoed by the server, falling back to the id in the
/// request when the response carries none.
pub fn invalidations_for(
    mutation: Mutation<'_>,
    response: &TenantResponse,
) -> Vec<Invalidation<QueryKey>> {
    let list = Invalidation::Stale(QueryKey::tenants());
    match mutation {
        Mutation::Create => vec![list],
        Mutation::Update { id } => {
            let id = response.tenant_id().unwrap_or(id);
            vec![list, Invalidation::Stale(QueryKey::tenant(id))]
        }
        Mutation::Delete { id } => vec![list, Invalidation::Remove(QueryKey::tenant(id))],
    }
}

type SuccessHook<T> = Box<dyn FnOnce(&T) + Send>;
type ErrorHook = Box<dyn FnOnce(&ClientError) + Send>;

/// Optional continuations run after a mutation settles. `on_success` runs
/// after the cache has been invalidated.
pub struct MutationHooks<T> {
    on_success: Option<SuccessHook<T>>,
    on_error: Option<ErrorHook>,
}

impl<T> Default for MutationHooks<T> {
    fn default() -> Self {
        Self {
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> MutationHooks<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, hook: impl FnOnce(&T) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl FnOnce(&ClientError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    fn settle(self, result: &Result<T, ClientError>) {
        match result {
            Ok(value) => {
                if let Some(hook) = self.on_success {
                    hook(value);
                }
            }
            Err(err) => {
                if let Some(hook) = self.on_error {
                    hook(err);
                }
            }
        }
    }
}

fn aborted(key: &QueryKey) -> ClientError {
    ClientError::Aborted(key.to_string())
}

/// Tenant reads and writes kept in sync with the query cache.
#[derive(Clone)]
pub struct TenantQueries {
    client: TenantClient,
    lists: QueryCache<QueryKey, TenantListResponse, ClientError>,
    items: QueryCache<QueryKey, TenantResponse, ClientError>,
}

impl TenantQueries {
    pub fn new(client: TenantClient) -> Self {
        Self {
            client,
            lists: QueryCache::new(),
            items: QueryCache::new(),
        }
    }

    pub fn client(&self) -> &TenantClient {
        &self.client
    }

    /// All tenants, served from cache while fresh.
    pub async fn tenants(&self) -> Result<TenantListResponse, ClientError> {
        let client = self.client.clone();
        self.lists
            .fetch(
                QueryKey::tenants(),
                move || async move { client.list_tenants().await },
                aborted,
            )
            .await
    }

    /// One tenant, served from cache while fresh. An empty id is rejected
    /// without touching the cache.
    pub async fn tenant(&self, id: &str) -> Result<TenantResponse, ClientError> {
        if id.is_empty() {
            return Err(ClientError::Parameter {
                operation: "get_tenant",
                parameter: "id",
            });
        }

        let client = self.client.clone();
        let owned_id = id.to_string();
        self.items
            .fetch(
                QueryKey::tenant(id),
                move || async move { client.get_tenant(&owned_id).await },
                aborted,
            )
            .await
    }

    pub async fn create_tenant(
        &self,
        request: &CreateTenantRequest,
    ) -> Result<TenantResponse, ClientError> {
        self.create_tenant_with(request, MutationHooks::default())
            .await
    }

    pub async fn create_tenant_with(
        &self,
        request: &CreateTenantRequest,
        hooks: MutationHooks<TenantResponse>,
    ) -> Result<TenantResponse, ClientError> {
        let result = self.client.create_tenant(request).await;
        self.settle(Mutation::Create, result, hooks)
    }

    pub async fn update_tenant(
        &self,
        id: &str,
        body: &UpdateTenantBody,
    ) -> Result<TenantResponse, ClientError> {
        self.update_tenant_with(id, body, MutationHooks::default())
            .await
    }

    pub async fn update_tenant_with(
        &self,
        id: &str,
        body: &UpdateTenantBody,
        hooks: MutationHooks<TenantResponse>,
    ) -> Result<TenantResponse, ClientError> {
        let result = self.client.update_tenant(id, body).await;
        self.settle(Mutation::Update { id }, result, hooks)
    }

    pub async fn delete_tenant(&self, id: &str) -> Result<TenantResponse, ClientError> {
        self.delete_tenant_with(id, MutationHooks::default()).await
    }

    pub async fn delete_tenant_with(
        &self,
        id: &str,
        hooks: MutationHooks<TenantResponse>,
    ) -> Result<TenantResponse, ClientError> {
        let result = self.client.delete_tenant(id).await;
        self.settle(Mutation::Delete { id }, result, hooks)
    }

    fn settle(
        &self,
        mutation: Mutation<'_>,
        result: Result<TenantResponse, ClientError>,
        hooks: MutationHooks<TenantResponse>,
    ) -> Result<TenantResponse, ClientError> {
        match &result {
            Ok(response) => {
                let invalidations = invalidations_for(mutation, response);
                tracing::debug!(?mutation, count = invalidations.len(), "Mutation confirmed");
                self.apply(&invalidations);
            }
            Err(err) => {
                tracing::warn!(?mutation, error = %err, "Mutation failed; cache left untouched");
            }
        }
        hooks.settle(&result);
        result
    }

    /// Route each invalidation to the cache that owns its key.
    pub fn apply(&self, invalidations: &[Invalidation<QueryKey>]) {
        for invalidation in invalidations {
            let key = match invalidation {
                Invalidation::Stale(key) | Invalidation::Remove(key) => key,
            };
            let cache_invalidation = std::slice::from_ref(invalidation);
            if key.is_list() {
                self.lists.apply(cache_invalidation);
            } else {
                self.items.apply(cache_invalidation);
            }
        }
    }

    pub fn tenants_snapshot(&self) -> QuerySnapshot<TenantListResponse, ClientError> {
        self.lists.snapshot(&QueryKey::tenants())
    }

    pub fn tenant_snapshot(&self, id: &str) -> QuerySnapshot<TenantResponse, ClientError> {
        self.items.snapshot(&QueryKey::tenant(id))
    }

    pub fn state(&self, key: &QueryKey) -> EntryState {
        if key.is_list() {
            self.lists.state(key)
        } else {
            self.items.state(key)
        }
    }

    pub fn subscribe(&self, key: &QueryKey) -> watch::Receiver<u64> {
        if key.is_list() {
            self.lists.subscribe(key)
        } else {
            self.items.subscribe(key)
        }
    }

    pub fn clear(&self) {
        self.lists.clear();
        self.items.clear();
    }
}
