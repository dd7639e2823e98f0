//! Query cache keyed by `(resource, params)`.
//!
//! Values are snapshots of server responses. The cache never derives or
//! patches them: a mutation only marks keys stale, and the stale snapshot
//! stays readable until a refetch replaces it.
//!
//! Every key carries a generation counter. A fetch takes a [`Ticket`] before
//! it starts; if the key is invalidated while the fetch is in flight, the
//! result is stored as stale so it cannot hide the invalidation.

use std::{
  any::Any,
  collections::HashMap,
  fmt,
  sync::Arc,
};

use tokio::sync::RwLock;
use uuid::Uuid;
use weave_core::page::PageRequest;

/// A server collection the client caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
  Connections,
  Pending,
  Suggestions,
  Feed,
  Posts,
  /// Comments of one post.
  Comments(Uuid),
}

impl fmt::Display for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Connections => f.write_str("connections"),
      Self::Pending => f.write_str("pending"),
      Self::Suggestions => f.write_str("suggestions"),
      Self::Feed => f.write_str("feed"),
      Self::Posts => f.write_str("posts"),
      Self::Comments(post) => write!(f, "comments/{post}"),
    }
  }
}

/// Identity of one cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
  pub resource: Resource,
  pub page:     PageRequest,
}

impl QueryKey {
  pub const fn new(resource: Resource, page: PageRequest) -> Self { Self { resource, page } }
}

/// A cached value and whether it has been invalidated since it was fetched.
#[derive(Debug)]
pub struct Snapshot<T> {
  pub value: Arc<T>,
  pub stale: bool,
}

/// Proof that a fetch started at a given generation of its key.
#[derive(Debug, Clone, Copy)]
pub struct Ticket {
  key:        QueryKey,
  generation: u64,
}

struct Entry {
  value:      Option<Arc<dyn Any + Send + Sync>>,
  generation: u64,
  stale:      bool,
}

impl Entry {
  fn empty() -> Self { Self { value: None, generation: 0, stale: false } }

  fn invalidate(&mut self) {
    self.generation += 1;
    self.stale = true;
  }
}

/// Shared, keyed snapshot cache.
#[derive(Default)]
pub struct QueryCache {
  entries: RwLock<HashMap<QueryKey, Entry>>,
}

impl QueryCache {
  pub fn new() -> Self { Self::default() }

  /// The cached value for `key`, if one of type `T` is present.
  pub async fn get<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Snapshot<T>> {
    let entries = self.entries.read().await;
    let entry   = entries.get(key)?;
    let value   = entry.value.clone()?.downcast::<T>().ok()?;
    Some(Snapshot { value, stale: entry.stale })
  }

  /// Record that a fetch for `key` is starting. An uncached key gets an
  /// empty entry so invalidations during its first fetch are counted.
  pub async fn begin(&self, key: QueryKey) -> Ticket {
    let mut entries = self.entries.write().await;
    let generation  = entries.entry(key).or_insert_with(Entry::empty).generation;
    Ticket { key, generation }
  }

  /// Store the result of the fetch identified by `ticket`. The value is
  /// stored stale if the key was invalidated after the ticket was taken.
  pub async fn complete<T: Send + Sync + 'static>(&self, ticket: Ticket, value: T) {
    let mut entries = self.entries.write().await;
    let entry = entries.entry(ticket.key).or_insert_with(Entry::empty);
    let stale = entry.generation != ticket.generation;
    if stale {
      tracing::debug!(resource = %ticket.key.resource, "fetch raced an invalidation; stored stale");
    }
    entry.value = Some(Arc::new(value));
    entry.stale = stale;
  }

  /// Mark every key of `resource` stale, whatever its params. Returns the
  /// number of keys affected.
  pub async fn invalidate(&self, resource: Resource) -> usize {
    let mut entries = self.entries.write().await;
    let mut count   = 0;
    for (_, entry) in entries.iter_mut().filter(|(k, _)| k.resource == resource) {
      entry.invalidate();
      count += 1;
    }
    tracing::debug!(%resource, keys = count, "invalidated");
    count
  }

  /// Mark a single key stale. A key that was never cached is remembered so
  /// a fetch already in flight for it lands stale.
  pub async fn invalidate_key(&self, key: &QueryKey) {
    let mut entries = self.entries.write().await;
    entries
      .entry(*key)
      .or_insert_with(Entry::empty)
      .invalidate();
    tracing::debug!(resource = %key.resource, "invalidated key");
  }

  pub async fn is_stale(&self, key: &QueryKey) -> Option<bool> {
    let entries = self.entries.read().await;
    entries.get(key).filter(|e| e.value.is_some()).map(|e| e.stale)
  }

  /// Resources with at least one stale cached value, sorted.
  pub async fn stale_resources(&self) -> Vec<Resource> {
    let entries = self.entries.read().await;
    let mut out: Vec<Resource> = entries
      .iter()
      .filter(|(_, e)| e.stale && e.value.is_some())
      .map(|(k, _)| k.resource)
      .collect();
    out.sort();
    out.dedup();
    out
  }

  /// Number of keys holding a value.
  pub async fn len(&self) -> usize {
    self.entries.read().await.values().filter(|e| e.value.is_some()).count()
  }

  pub async fn is_empty(&self) -> bool { self.len().await == 0 }
}
