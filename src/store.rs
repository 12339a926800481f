//! Cache-aside entity store - main entry point for CRUD operations.
//!
//! [`EntityStore`] coordinates a [`DataRepository`] (source of truth) with a
//! [`JsonCache`] (accelerator):
//!
//! - **create**: insert, then write the entity (with its assigned id) to the cache
//! - **read**: cache first; on miss read the repository and fill the cache
//! - **update**: unconditional repository update, then re-read with
//!   [`CacheStrategy::Invalidate`] so the cache holds the post-update row
//! - **delete**: delete the row, then invalidate the cache entry
//! - **list**: repository only; result sets are never cached
//!
//! Nothing is rolled back and nothing is retried. A cache failure after a
//! durable repository change is reported as [`StoreError::Degraded`], which
//! still carries the value the caller would otherwise have received.

use crate::backend::CacheBackend;
use crate::cache::JsonCache;
use crate::context::RequestContext;
use crate::entity::CacheEntity;
use crate::error::{Error, Result};
use crate::health::HealthReport;
use crate::key::CacheKeyBuilder;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::repository::DataRepository;
use crate::strategy::CacheStrategy;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Failure of a store operation.
#[derive(Debug)]
pub enum StoreError<T> {
    /// The operation failed; no durable change is implied.
    Failed(Error),

    /// The repository change (or read) succeeded but synchronizing the cache
    /// did not. `value` is what the operation would have returned.
    ///
    /// The cache may now hold a stale entry until the next successful read
    /// fill or update overwrites it.
    Degraded { value: T, error: Error },
}

impl<T> StoreError<T> {
    pub fn error(&self) -> &Error {
        match self {
            StoreError::Failed(error) | StoreError::Degraded { error, .. } => error,
        }
    }

    pub fn into_error(self) -> Error {
        match self {
            StoreError::Failed(error) | StoreError::Degraded { error, .. } => error,
        }
    }

    /// Value carried by a degraded result.
    pub fn value(&self) -> Option<&T> {
        match self {
            StoreError::Failed(_) => None,
            StoreError::Degraded { value, .. } => Some(value),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            StoreError::Failed(_) => None,
            StoreError::Degraded { value, .. } => Some(value),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StoreError::Degraded { .. })
    }
}

impl<T> fmt::Display for StoreError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Failed(error) => write!(f, "{}", error),
            StoreError::Degraded { error, .. } => write!(f, "cache out of sync: {}", error),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for StoreError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error())
    }
}

impl<T> From<StoreError<T>> for Error {
    fn from(e: StoreError<T>) -> Self {
        e.into_error()
    }
}

struct StoreInner<R, B: CacheBackend> {
    repository: R,
    cache: JsonCache<B>,
    metrics: Box<dyn CacheMetrics>,
}

/// Cache-aside store for one entity type.
///
/// Cloning is cheap (an `Arc` increment) and clones share the repository
/// handle, cache and metrics, so one store can serve every request task.
///
/// # Example
///
/// ```
/// use user_store::backend::InMemoryBackend;
/// use user_store::repository::InMemoryRepository;
/// use user_store::{EntityStore, RequestContext, User};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = EntityStore::new(
///     InMemoryRepository::<User>::new(),
///     InMemoryBackend::new(),
///     Duration::from_secs(60),
/// );
/// let ctx = RequestContext::traced();
///
/// let created = store.create(&ctx, User::new("Alice", "alice@x.com", "pw")).await?;
/// assert_eq!(created.id, 1);
///
/// let read = store.read(&ctx, &1).await?;
/// assert_eq!(read, Some(created));
/// # Ok(())
/// # }
/// ```
pub struct EntityStore<T, R, B>
where
    T: CacheEntity,
    R: DataRepository<T>,
    B: CacheBackend,
{
    inner: Arc<StoreInner<R, B>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T, R, B> Clone for EntityStore<T, R, B>
where
    T: CacheEntity,
    R: DataRepository<T>,
    B: CacheBackend,
{
    fn clone(&self) -> Self {
        EntityStore {
            inner: Arc::clone(&self.inner),
            _entity: PhantomData,
        }
    }
}

impl<T, R, B> EntityStore<T, R, B>
where
    T: CacheEntity,
    R: DataRepository<T>,
    B: CacheBackend,
{
    /// Create a store over `repository`, caching in `backend` for `expiration`.
    ///
    /// A zero expiration caches without expiry.
    pub fn new(repository: R, backend: B, expiration: Duration) -> Self {
        Self::with_metrics(repository, backend, expiration, Box::new(NoOpMetrics))
    }

    /// Create a store reporting to `metrics`.
    pub fn with_metrics(
        repository: R,
        backend: B,
        expiration: Duration,
        metrics: Box<dyn CacheMetrics>,
    ) -> Self {
        EntityStore {
            inner: Arc::new(StoreInner {
                repository,
                cache: JsonCache::new(backend, expiration),
                metrics,
            }),
            _entity: PhantomData,
        }
    }

    pub fn repository(&self) -> &R {
        &self.inner.repository
    }

    pub fn cache(&self) -> &JsonCache<B> {
        &self.inner.cache
    }

    /// Insert `entity`, then write it (with its assigned id) to the cache.
    ///
    /// # Errors
    /// - `StoreError::Failed` if the insert fails; the cache is untouched
    /// - `StoreError::Degraded` carrying the created entity if the cache
    ///   write fails after the row was persisted
    pub async fn create(
        &self,
        ctx: &RequestContext,
        mut entity: T,
    ) -> std::result::Result<T, StoreError<T>> {
        const OP: &str = "EntityStore::create";
        let timer = Instant::now();
        debug!("[{}] » Creating entity", ctx.trace_id());

        let id = self
            .repository_call(ctx, "insert", self.inner.repository.insert(&entity))
            .await
            .map_err(|e| self.failed::<T>(ctx, OP, "-", e))?;
        entity.assign_key(id.clone());

        let key = CacheKeyBuilder::build::<T>(&id);
        debug!("[{}] Setting created entity in cache: {}", ctx.trace_id(), key);
        if let Err(e) = self.fill(ctx, &key, &entity).await {
            return Err(self.degraded(ctx, OP, &key, entity, e));
        }

        info!("[{}] ✓ Created {} in {:?}", ctx.trace_id(), key, timer.elapsed());
        Ok(entity)
    }

    /// Read-through lookup (`CacheStrategy::Refresh`).
    ///
    /// Returns `Ok(None)` when neither cache nor repository holds the entity.
    /// An undecodable cache entry is treated as a miss and overwritten.
    ///
    /// # Errors
    /// - `StoreError::Failed` if the cache lookup or the repository fails
    /// - `StoreError::Degraded` carrying the entity if the cache fill fails
    pub async fn read(
        &self,
        ctx: &RequestContext,
        id: &T::Key,
    ) -> std::result::Result<Option<T>, StoreError<T>> {
        self.read_with(ctx, id, CacheStrategy::Refresh).await
    }

    /// Lookup with an explicit [`CacheStrategy`].
    ///
    /// # Errors
    /// Same as [`read`](Self::read); with `Invalidate`, a failed cache delete
    /// is `StoreError::Failed`.
    pub async fn read_with(
        &self,
        ctx: &RequestContext,
        id: &T::Key,
        strategy: CacheStrategy,
    ) -> std::result::Result<Option<T>, StoreError<T>> {
        const OP: &str = "EntityStore::read";
        let key = CacheKeyBuilder::build::<T>(id);
        debug!("[{}] » Reading {} (strategy: {})", ctx.trace_id(), key, strategy);

        if strategy == CacheStrategy::Invalidate {
            self.invalidate(ctx, &key)
                .await
                .map_err(|e| self.failed::<T>(ctx, OP, &key, e))?;
        }

        if strategy.reads_cache() {
            let timer = Instant::now();
            match self.inner.cache.get(ctx, &key).await.unmarshal::<T>() {
                Ok(Some(entity)) if entity.cache_key() == *id => {
                    self.inner.metrics.record_hit(ctx.trace_id(), &key, timer.elapsed());
                    return Ok(Some(entity));
                }
                Ok(Some(entity)) => {
                    warn!(
                        "[{}] Cache entry {} holds id {}, treating as miss",
                        ctx.trace_id(),
                        key,
                        entity.cache_key()
                    );
                }
                Ok(None) => {}
                Err(e) if matches!(e.root(), Error::DeserializationError(_)) => {
                    warn!("[{}] Ignoring undecodable cache entry: {}", ctx.trace_id(), e);
                }
                Err(e) => return Err(self.failed(ctx, OP, &key, e)),
            }
            self.inner.metrics.record_miss(ctx.trace_id(), &key, timer.elapsed());

            if !strategy.reads_repository() {
                return Ok(None);
            }
            debug!("[{}] Cache miss, falling back to repository", ctx.trace_id());
        }

        let found = self
            .repository_call(ctx, "fetch_by_id", self.inner.repository.fetch_by_id(id))
            .await
            .map_err(|e| self.failed::<T>(ctx, OP, &key, e))?;

        let Some(entity) = found else {
            debug!("[{}] {} not found in repository", ctx.trace_id(), key);
            return Ok(None);
        };

        debug!("[{}] Setting entity in cache: {}", ctx.trace_id(), key);
        if let Err(e) = self.fill(ctx, &key, &entity).await {
            return Err(self.degraded(ctx, OP, &key, entity, e));
        }

        Ok(Some(entity))
    }

    /// Overwrite every mutable field of `id` with `patch` (last writer wins),
    /// then refresh the cache from the repository.
    ///
    /// Returns `patch` with `id` assigned, or `Ok(None)` if no row with `id`
    /// exists after the update.
    ///
    /// # Errors
    /// - `StoreError::Failed` if the repository update fails
    /// - `StoreError::Degraded` carrying the updated view if re-reading or
    ///   re-caching fails; the update itself is not rolled back
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &T::Key,
        patch: T,
    ) -> std::result::Result<Option<T>, StoreError<T>> {
        const OP: &str = "EntityStore::update";
        let timer = Instant::now();
        let key = CacheKeyBuilder::build::<T>(id);
        debug!("[{}] » Updating {}", ctx.trace_id(), key);

        self.repository_call(ctx, "update_by_id", self.inner.repository.update_by_id(id, &patch))
            .await
            .map_err(|e| self.failed::<T>(ctx, OP, &key, e))?;

        let mut view = patch;
        view.assign_key(id.clone());

        // Invalidate first so the re-read cannot return the pre-update entry
        match self.read_with(ctx, id, CacheStrategy::Invalidate).await {
            Ok(Some(_)) => {
                info!("[{}] ✓ Updated {} in {:?}", ctx.trace_id(), key, timer.elapsed());
                Ok(Some(view))
            }
            Ok(None) => {
                debug!("[{}] {} does not exist, nothing updated", ctx.trace_id(), key);
                Ok(None)
            }
            Err(e) => {
                let error = e.into_error().context(OP);
                warn!("[{}] Updated {} but cache is out of sync: {}", ctx.trace_id(), key, error);
                Err(StoreError::Degraded { value: view, error })
            }
        }
    }

    /// Delete the row, then invalidate its cache entry.
    ///
    /// Deleting an id that does not exist succeeds.
    ///
    /// # Errors
    /// - `StoreError::Failed` if the repository delete fails; the cache is untouched
    /// - `StoreError::Degraded` if the row is gone but the cache entry could
    ///   not be removed
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: &T::Key,
    ) -> std::result::Result<(), StoreError<()>> {
        const OP: &str = "EntityStore::delete";
        let timer = Instant::now();
        let key = CacheKeyBuilder::build::<T>(id);
        debug!("[{}] » Deleting {}", ctx.trace_id(), key);

        self.repository_call(ctx, "delete_by_id", self.inner.repository.delete_by_id(id))
            .await
            .map_err(|e| self.failed::<()>(ctx, OP, &key, e))?;

        debug!("[{}] Removing {} from cache", ctx.trace_id(), key);
        if let Err(e) = self.invalidate(ctx, &key).await {
            return Err(self.degraded(ctx, OP, &key, (), e));
        }

        info!("[{}] ✓ Deleted {} in {:?}", ctx.trace_id(), key, timer.elapsed());
        Ok(())
    }

    /// List entities selected by `filter`, straight from the repository.
    ///
    /// # Errors
    /// Returns the repository error, annotated with the operation.
    pub async fn list(&self, ctx: &RequestContext, filter: &T::Filter) -> Result<Vec<T>> {
        debug!("[{}] » Listing entities", ctx.trace_id());

        self.repository_call(ctx, "fetch_all", self.inner.repository.fetch_all(filter))
            .await
            .map_err(|e| {
                self.inner.metrics.record_error(ctx.trace_id(), "*", &e.to_string());
                e.context("EntityStore::list")
            })
    }

    /// Ping the repository ("db") and then the cache ("cache").
    pub async fn health_check(&self, ctx: &RequestContext) -> HealthReport {
        const OP: &str = "EntityStore::health_check";
        let mut report = HealthReport::new();

        let db = self
            .repository_call(ctx, "ping", self.inner.repository.ping())
            .await
            .map_err(|e| e.context(OP));
        report.check("db", "database", db);

        let cache = self.inner.cache.ping(ctx).await.map_err(|e| e.context(OP));
        report.check("cache", "cache", cache);

        if !report.is_healthy() {
            warn!("[{}] Health check failed: {:?}", ctx.trace_id(), report.details);
        }
        report
    }

    /// Run a repository call under the request deadline, timing it.
    ///
    /// Failures other than timeouts are reported as `Error::RepositoryError`.
    async fn repository_call<V, F>(
        &self,
        ctx: &RequestContext,
        operation: &str,
        fut: F,
    ) -> Result<V>
    where
        F: Future<Output = Result<V>>,
    {
        let timer = Instant::now();
        let result = ctx.run(operation, fut).await;
        self.inner
            .metrics
            .record_repository(ctx.trace_id(), operation, timer.elapsed());

        result.map_err(|e| match e.root() {
            Error::RepositoryError(_) | Error::Timeout(_) => e,
            _ => Error::RepositoryError(e.to_string()),
        })
    }

    async fn fill(&self, ctx: &RequestContext, key: &str, entity: &T) -> Result<()> {
        let timer = Instant::now();
        self.inner.cache.set_marshal(ctx, key, entity).await?;
        self.inner.metrics.record_set(ctx.trace_id(), key, timer.elapsed());
        Ok(())
    }

    async fn invalidate(&self, ctx: &RequestContext, key: &str) -> Result<()> {
        let timer = Instant::now();
        self.inner.cache.delete(ctx, key).await?;
        self.inner
            .metrics
            .record_delete(ctx.trace_id(), key, timer.elapsed());
        Ok(())
    }

    fn failed<V>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        key: &str,
        error: Error,
    ) -> StoreError<V> {
        self.inner
            .metrics
            .record_error(ctx.trace_id(), key, &error.to_string());
        StoreError::Failed(error.context(operation))
    }

    fn degraded<V>(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        key: &str,
        value: V,
        error: Error,
    ) -> StoreError<V> {
        self.inner
            .metrics
            .record_error(ctx.trace_id(), key, &error.to_string());
        warn!(
            "[{}] Repository change for {} is durable but cache is out of sync: {}",
            ctx.trace_id(),
            key,
            error
        );
        StoreError::Degraded {
            value,
            error: error.context(operation),
        }
    }
}
