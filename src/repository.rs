//! Data repository trait for abstracting database access.
//!
//! The repository is the source of truth; the store never treats the cache as
//! authoritative. Implement [`DataRepository`] for any storage backend:
//! - SQL databases: see [`crate::postgres`] (feature `postgres`)
//! - In-memory: [`InMemoryRepository`], for tests and local development
//!
//! # Error Handling
//!
//! "Row not found" is a distinguished outcome, not an error:
//! `fetch_by_id` returns `Ok(None)`, and updating or deleting an absent row
//! succeeds without effect (as an SQL `UPDATE`/`DELETE` matching zero rows).
//! Return `Err(Error::RepositoryError(..))` for connectivity failures,
//! constraint violations, timeouts and every other storage failure.

use crate::entity::CacheEntity;
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Trait for data repository implementations.
///
/// Implementations hold a cheap handle onto a process-owned resource (a
/// connection pool, a shared map), so the store can keep its own copy.
#[allow(async_fn_in_trait)]
pub trait DataRepository<T: CacheEntity>: Send + Sync {
    /// Insert a new entity and return the identifier the repository assigned.
    ///
    /// # Errors
    /// Returns `Err` on constraint violations or storage failures.
    async fn insert(&self, entity: &T) -> Result<T::Key>;

    /// Fetch entity by ID.
    ///
    /// # Returns
    /// - `Ok(Some(entity))` - Entity found
    /// - `Ok(None)` - Entity not found (not an error)
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable or the fetch fails.
    async fn fetch_by_id(&self, id: &T::Key) -> Result<Option<T>>;

    /// Overwrite every mutable field of the entity with `id`.
    ///
    /// Unconditional: no version check, last writer wins.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable or the update fails.
    async fn update_by_id(&self, id: &T::Key, entity: &T) -> Result<()>;

    /// Delete the entity with `id`.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable or the delete fails.
    async fn delete_by_id(&self, id: &T::Key) -> Result<()>;

    /// Fetch every entity selected by `filter`.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unavailable or the query fails.
    async fn fetch_all(&self, filter: &T::Filter) -> Result<Vec<T>>;

    /// Health check.
    ///
    /// # Errors
    /// Returns `Err` if the data source is unreachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// In-Memory Repository
// ============================================================================

/// Number of calls made per repository verb.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepositoryCalls {
    pub inserts: usize,
    pub fetches: usize,
    pub updates: usize,
    pub deletes: usize,
    pub lists: usize,
    pub pings: usize,
}

impl RepositoryCalls {
    /// Sum of all calls.
    pub fn total(&self) -> usize {
        self.inserts + self.fetches + self.updates + self.deletes + self.lists + self.pings
    }
}

#[derive(Default)]
struct CallCounters {
    inserts: AtomicUsize,
    fetches: AtomicUsize,
    updates: AtomicUsize,
    deletes: AtomicUsize,
    lists: AtomicUsize,
    pings: AtomicUsize,
}

struct Inner<T> {
    rows: RwLock<Vec<T>>,
    next_id: AtomicU64,
    calls: CallCounters,
    unavailable: AtomicBool,
}

/// In-memory repository with sequential id assignment.
///
/// Assigns ids 1, 2, 3, ... like a serial primary key, keeps rows in insertion
/// order, and counts calls per verb so tests can prove a read was served from
/// cache. Clones share the same rows and counters.
///
/// ```
/// use user_store::repository::{DataRepository, InMemoryRepository};
/// use user_store::User;
///
/// # #[tokio::main]
/// # async fn main() -> user_store::Result<()> {
/// let repo = InMemoryRepository::<User>::new();
/// let id = repo.insert(&User::new("Alice", "alice@x.com", "pw")).await?;
/// assert_eq!(id, 1);
/// assert_eq!(repo.calls().inserts, 1);
/// # Ok(())
/// # }
/// ```
pub struct InMemoryRepository<T: CacheEntity> {
    inner: Arc<Inner<T>>,
}

impl<T: CacheEntity> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        InMemoryRepository {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: CacheEntity> InMemoryRepository<T> {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        InMemoryRepository {
            inner: Arc::new(Inner {
                rows: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
                calls: CallCounters::default(),
                unavailable: AtomicBool::new(false),
            }),
        }
    }

    /// Store `entity` under its current key without counting a call.
    ///
    /// Replaces any row with the same key.
    pub async fn seed(&self, entity: T) {
        let key = entity.cache_key();
        let mut rows = self.inner.rows.write().await;
        rows.retain(|row| row.cache_key() != key);
        rows.push(entity);
    }

    /// Snapshot of every row, without counting a call.
    pub async fn rows(&self) -> Vec<T> {
        self.inner.rows.read().await.clone()
    }

    /// Calls made so far.
    pub fn calls(&self) -> RepositoryCalls {
        let c = &self.inner.calls;
        RepositoryCalls {
            inserts: c.inserts.load(Ordering::SeqCst),
            fetches: c.fetches.load(Ordering::SeqCst),
            updates: c.updates.load(Ordering::SeqCst),
            deletes: c.deletes.load(Ordering::SeqCst),
            lists: c.lists.load(Ordering::SeqCst),
            pings: c.pings.load(Ordering::SeqCst),
        }
    }

    /// Make every subsequent call fail with `Error::RepositoryError`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn enter(&self, counter: &AtomicUsize, operation: &str) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(Error::RepositoryError(format!(
                "{}: repository unavailable",
                operation
            )));
        }
        Ok(())
    }
}

impl<T: CacheEntity> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DataRepository<T> for InMemoryRepository<T>
where
    T: CacheEntity,
    T::Key: From<u64>,
{
    async fn insert(&self, entity: &T) -> Result<T::Key> {
        self.enter(&self.inner.calls.inserts, "insert")?;

        let mut rows = self.inner.rows.write().await;
        // Skip ids already taken by seeded rows
        let key = loop {
            let candidate = T::Key::from(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
            if !rows.iter().any(|row| row.cache_key() == candidate) {
                break candidate;
            }
        };

        let mut row = entity.clone();
        row.assign_key(key.clone());
        rows.push(row);
        Ok(key)
    }

    async fn fetch_by_id(&self, id: &T::Key) -> Result<Option<T>> {
        self.enter(&self.inner.calls.fetches, "fetch_by_id")?;

        let rows = self.inner.rows.read().await;
        Ok(rows.iter().find(|row| row.cache_key() == *id).cloned())
    }

    async fn update_by_id(&self, id: &T::Key, entity: &T) -> Result<()> {
        self.enter(&self.inner.calls.updates, "update_by_id")?;

        let mut rows = self.inner.rows.write().await;
        if let Some(row) = rows.iter_mut().find(|row| row.cache_key() == *id) {
            let mut updated = entity.clone();
            updated.assign_key(id.clone());
            *row = updated;
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: &T::Key) -> Result<()> {
        self.enter(&self.inner.calls.deletes, "delete_by_id")?;

        self.inner
            .rows
            .write()
            .await
            .retain(|row| row.cache_key() != *id);
        Ok(())
    }

    async fn fetch_all(&self, filter: &T::Filter) -> Result<Vec<T>> {
        self.enter(&self.inner.calls.lists, "fetch_all")?;

        let rows = self.inner.rows.read().await;
        Ok(rows.iter().filter(|row| row.matches(filter)).cloned().collect())
    }

    async fn ping(&self) -> Result<()> {
        self.enter(&self.inner.calls.pings, "ping")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{User, UserFilter};

    fn alice() -> User {
        User::new("Alice", "alice@x.com", "pw")
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let repo = InMemoryRepository::new();

        let first = repo.insert(&alice()).await.expect("Failed to insert");
        let second = repo
            .insert(&User::new("Bob", "bob@x.com", "pw"))
            .await
            .expect("Failed to insert");

        assert_eq!((first, second), (1, 2));
        let fetched = repo
            .fetch_by_id(&1)
            .await
            .expect("Failed to fetch")
            .expect("Row not found");
        assert_eq!(fetched, alice().with_id(1));
    }

    #[tokio::test]
    async fn test_insert_skips_seeded_ids() {
        let repo = InMemoryRepository::new();
        repo.seed(alice().with_id(1)).await;

        let id = repo.insert(&alice()).await.expect("Failed to insert");
        assert_eq!(id, 2);
        assert_eq!(repo.rows().await.len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_miss_is_not_an_error() {
        let repo: InMemoryRepository<User> = InMemoryRepository::new();

        let fetched = repo.fetch_by_id(&42).await.expect("Failed to fetch");
        assert!(fetched.is_none());
        assert_eq!(repo.calls().fetches, 1);
    }

    #[tokio::test]
    async fn test_update_keeps_id_and_ignores_absent_rows() {
        let repo = InMemoryRepository::new();
        repo.seed(alice().with_id(1)).await;

        let patch = User::new("Alice2", "alice2@x.com", "pw2").with_id(99);
        repo.update_by_id(&1, &patch).await.expect("Failed to update");
        repo.update_by_id(&7, &patch).await.expect("Absent row update should succeed");

        assert_eq!(repo.rows().await, vec![patch.with_id(1)]);
    }

    #[tokio::test]
    async fn test_delete_and_filter() {
        let repo = InMemoryRepository::new();
        repo.seed(alice().with_id(1)).await;
        repo.seed(User::new("Bob", "bob@x.com", "pw").with_id(2)).await;
        repo.seed(User::new("Alice", "alice@y.com", "pw").with_id(3)).await;

        let named = repo
            .fetch_all(&UserFilter::by_name("Alice"))
            .await
            .expect("Failed to list");
        assert_eq!(named.iter().map(|u| u.id).collect::<Vec<_>>(), vec![1, 3]);

        repo.delete_by_id(&1).await.expect("Failed to delete");
        repo.delete_by_id(&1).await.expect("Repeated delete should succeed");

        let all = repo
            .fetch_all(&UserFilter::default())
            .await
            .expect("Failed to list");
        assert_eq!(all.iter().map(|u| u.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_unavailable_repository() {
        let repo: InMemoryRepository<User> = InMemoryRepository::new();
        repo.set_unavailable(true);

        let err = repo.insert(&alice()).await.unwrap_err();
        assert!(err.is_repository_error());
        assert!(repo.ping().await.is_err());
        assert_eq!(repo.calls().total(), 2);

        repo.set_unavailable(false);
        repo.ping().await.expect("Repository should recover");
    }
}
