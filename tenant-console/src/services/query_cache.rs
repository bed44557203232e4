//! Keyed query cache with request coalescing and declared invalidation.
//!
//! # Entry states
//! A key is *absent* (no slot), *fetching*, *fresh*, *stale* or *error*.
//! Reads of a fresh key are served from memory. Reads of any other key join
//! the in-flight fetch for that key or start one, so a key never has more
//! than one fetch outstanding.
//!
//! # Fetch lifetime
//! Fetches run as detached tasks. A caller that stops waiting does not cancel
//! the fetch; the result still lands in the cache and reaches the remaining
//! waiters. If the key is invalidated while its fetch is in flight, the result
//! is stored as stale (or dropped, when the key was removed).

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

/// What a mutation does to a cache entry once the server confirmed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation<K> {
    /// Keep the value for display but refetch on the next read.
    Stale(K),
    /// Forget the entry entirely.
    Remove(K),
}

/// Observable state of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Fetching,
    Fresh,
    Stale,
    Error,
}

/// Read accessor for presentation code.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<V, E> {
    /// Last known value, including stale values and values being refetched.
    pub data: Option<V>,
    /// Fetching with nothing to show yet.
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub is_error: bool,
    pub error: Option<E>,
}

type FetchResult<V, E> = Option<Result<V, E>>;

struct InFlight<V, E> {
    fetch_id: u64,
    superseded: bool,
    previous: Option<V>,
    result: watch::Receiver<FetchResult<V, E>>,
}

enum Slot<V, E> {
    Fetching(InFlight<V, E>),
    Fresh(V),
    Stale(V),
    Failed(E),
}

struct Inner<K, V, E> {
    slots: DashMap<K, Slot<V, E>>,
    versions: DashMap<K, watch::Sender<u64>>,
    next_fetch_id: AtomicU64,
}

/// Owned by a running fetch task. Settles the slot and wakes waiters; if the
/// task ends without settling (panic, runtime shutdown) the slot fails with
/// the aborted error so the next read starts over.
struct FetchGuard<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    inner: Arc<Inner<K, V, E>>,
    key: K,
    fetch_id: u64,
    sender: watch::Sender<FetchResult<V, E>>,
    aborted: fn(&K) -> E,
    settled: bool,
}

impl<K, V, E> FetchGuard<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn settle(mut self, result: Result<V, E>) {
        self.inner.complete(&self.key, self.fetch_id, &result);
        self.settled = true;
        let _ = self.sender.send(Some(result));
    }
}

impl<K, V, E> Drop for FetchGuard<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        tracing::warn!(fetch_id = self.fetch_id, "Fetch task ended without a result");
        let result = Err((self.aborted)(&self.key));
        self.inner.complete(&self.key, self.fetch_id, &result);
        let _ = self.sender.send(Some(result));
    }
}

enum ReadPlan<V, E> {
    Hit(V),
    Join(watch::Receiver<FetchResult<V, E>>),
    Start(u64, watch::Sender<FetchResult<V, E>>, watch::Receiver<FetchResult<V, E>>),
}

pub struct QueryCache<K, V, E> {
    inner: Arc<Inner<K, V, E>>,
}

impl<K, V, E> Clone for QueryCache<K, V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, E> Default for QueryCache<K, V, E>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                versions: DashMap::new(),
                next_fetch_id: AtomicU64::new(1),
            }),
        }
    }
}

impl<K, V, E> QueryCache<K, V, E>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, or fetch it with `fetcher`.
    ///
    /// `fetcher` is only invoked when this call starts the fetch; callers that
    /// join an in-flight fetch receive its outcome. `aborted` builds the error
    /// reported if the fetch task dies without a result.
    pub async fn fetch<F, Fut>(&self, key: K, fetcher: F, aborted: fn(&K) -> E) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let mut receiver = match self.plan_read(&key) {
            ReadPlan::Hit(value) => {
                tracing::trace!(key = ?key, "Query cache hit");
                return Ok(value);
            }
            ReadPlan::Join(receiver) => {
                tracing::debug!(key = ?key, "Joining in-flight fetch");
                receiver
            }
            ReadPlan::Start(fetch_id, sender, receiver) => {
                tracing::debug!(key = ?key, fetch_id, "Starting fetch");
                let guard = FetchGuard {
                    inner: Arc::clone(&self.inner),
                    key: key.clone(),
                    fetch_id,
                    sender,
                    aborted,
                    settled: false,
                };
                let fetch = fetcher();
                tokio::spawn(async move {
                    let result = fetch.await;
                    guard.settle(result);
                });
                receiver
            }
        };

        let outcome = match receiver.wait_for(|result| result.is_some()).await {
            Ok(result) => match &*result {
                Some(result) => result.clone(),
                None => Err(aborted(&key)),
            },
            Err(_) => {
                tracing::warn!(key = ?key, "Fetch result channel closed");
                Err(aborted(&key))
            }
        };
        outcome
    }

    fn plan_read(&self, key: &K) -> ReadPlan<V, E> {
        match self.inner.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let previous = match occupied.get() {
                    Slot::Fresh(value) => return ReadPlan::Hit(value.clone()),
                    Slot::Fetching(in_flight) => return ReadPlan::Join(in_flight.result.clone()),
                    Slot::Stale(value) => Some(value.clone()),
                    Slot::Failed(_) => None,
                };
                let (plan, in_flight) = self.inner.begin(previous);
                occupied.insert(Slot::Fetching(in_flight));
                plan
            }
            Entry::Vacant(vacant) => {
                let (plan, in_flight) = self.inner.begin(None);
                vacant.insert(Slot::Fetching(in_flight));
                plan
            }
        }
    }

    /// Apply the invalidations declared by a confirmed mutation.
    pub fn apply(&self, invalidations: &[Invalidation<K>]) {
        for invalidation in invalidations {
            match invalidation {
                Invalidation::Stale(key) => self.invalidate(key),
                Invalidation::Remove(key) => self.remove(key),
            }
        }
    }

    /// Mark `key` stale. Absent keys stay absent.
    pub fn invalidate(&self, key: &K) {
        if let Some(mut slot) = self.inner.slots.get_mut(key) {
            let stale = match &mut *slot {
                Slot::Fresh(value) => Some(value.clone()),
                Slot::Fetching(in_flight) => {
                    in_flight.superseded = true;
                    None
                }
                Slot::Stale(_) | Slot::Failed(_) => None,
            };
            if let Some(value) = stale {
                *slot = Slot::Stale(value);
            }
        }
        tracing::debug!(key = ?key, "Query invalidated");
        self.inner.bump(key);
    }

    /// Drop `key`; the next read goes to the network.
    pub fn remove(&self, key: &K) {
        self.inner.slots.remove(key);
        tracing::debug!(key = ?key, "Query removed");
        self.inner.bump(key);
        self.inner
            .versions
            .remove_if(key, |_, sender| sender.receiver_count() == 0);
    }

    pub fn clear(&self) {
        let keys: Vec<K> = self.inner.slots.iter().map(|slot| slot.key().clone()).collect();
        for key in keys {
            self.remove(&key);
        }
        self.inner
            .versions
            .retain(|_, sender| sender.receiver_count() > 0);
    }

    pub fn state(&self, key: &K) -> EntryState {
        match self.inner.slots.get(key).as_deref() {
            None => EntryState::Absent,
            Some(Slot::Fetching(_)) => EntryState::Fetching,
            Some(Slot::Fresh(_)) => EntryState::Fresh,
            Some(Slot::Stale(_)) => EntryState::Stale,
            Some(Slot::Failed(_)) => EntryState::Error,
        }
    }

    pub fn snapshot(&self, key: &K) -> QuerySnapshot<V, E> {
        let mut snapshot = QuerySnapshot {
            data: None,
            is_loading: false,
            is_fetching: false,
            is_stale: false,
            is_error: false,
            error: None,
        };

        match self.inner.slots.get(key).as_deref() {
            None => {}
            Some(Slot::Fetching(in_flight)) => {
                snapshot.data = in_flight.previous.clone();
                snapshot.is_fetching = true;
                snapshot.is_loading = in_flight.previous.is_none();
                snapshot.is_stale = in_flight.previous.is_some();
            }
            Some(Slot::Fresh(value)) => snapshot.data = Some(value.clone()),
            Some(Slot::Stale(value)) => {
                snapshot.data = Some(value.clone());
                snapshot.is_stale = true;
            }
            Some(Slot::Failed(error)) => {
                snapshot.is_error = true;
                snapshot.error = Some(error.clone());
            }
        }

        snapshot
    }

    /// Receiver whose value increases every time `key` is invalidated or
    /// removed.
    pub fn subscribe(&self, key: &K) -> watch::Receiver<u64> {
        self.inner
            .versions
            .entry(key.clone())
            .or_insert_with(|| watch::channel(0).0)
            .subscribe()
    }
}

impl<K, V, E> Inner<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn begin(&self, previous: Option<V>) -> (ReadPlan<V, E>, InFlight<V, E>) {
        let fetch_id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = watch::channel(None);
        let in_flight = InFlight {
            fetch_id,
            superseded: false,
            previous,
            result: receiver.clone(),
        };
        (ReadPlan::Start(fetch_id, sender, receiver), in_flight)
    }

    /// Store the outcome of fetch `fetch_id`, unless the slot has since been
    /// removed or taken over by another fetch.
    fn complete(&self, key: &K, fetch_id: u64, result: &Result<V, E>) {
        let Some(mut slot) = self.slots.get_mut(key) else {
            return;
        };
        let superseded = match &*slot {
            Slot::Fetching(in_flight) if in_flight.fetch_id == fetch_id => in_flight.superseded,
            _ => return,
        };
        *slot = match result {
            Ok(value) if superseded => Slot::Stale(value.clone()),
            Ok(value) => Slot::Fresh(value.clone()),
            Err(error) => Slot::Failed(error.clone()),
        };
    }

    fn bump(&self, key: &K) {
        if let Some(sender) = self.versions.get(key) {
            sender.send_modify(|version| *version += 1);
        }
    }
}
