//! JSON key-value cache over a [`CacheBackend`].
//!
//! [`JsonCache`] folds encoding, expiration and existence signalling into
//! three verbs: `set_marshal`, `get` and `delete`. Every write carries the
//! same configured TTL; there is no per-call override.

use crate::backend::CacheBackend;
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Cache wrapper with JSON marshalling and a uniform expiration.
///
/// # Example
///
/// ```
/// use user_store::backend::InMemoryBackend;
/// use user_store::{JsonCache, RequestContext, User};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> user_store::Result<()> {
/// let cache = JsonCache::new(InMemoryBackend::new(), Duration::from_secs(60));
/// let ctx = RequestContext::new();
///
/// let user = User::new("Alice", "alice@x.com", "pw").with_id(1);
/// cache.set_marshal(&ctx, "1", &user).await?;
///
/// let cached: Option<User> = cache.get(&ctx, "1").await.unmarshal()?;
/// assert_eq!(cached, Some(user));
///
/// let missing = cache.get(&ctx, "2").await.result()?;
/// assert_eq!(missing, None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JsonCache<B: CacheBackend> {
    backend: B,
    expiration: Option<Duration>,
}

impl<B: CacheBackend> JsonCache<B> {
    /// Wrap `backend`, applying `expiration` to every write.
    ///
    /// A zero expiration stores entries without expiry.
    pub fn new(backend: B, expiration: Duration) -> Self {
        JsonCache {
            backend,
            expiration: (!expiration.is_zero()).then_some(expiration),
        }
    }

    /// TTL applied to every write, `None` for no expiry.
    pub fn expiration(&self) -> Option<Duration> {
        self.expiration
    }

    /// Underlying backend handle.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Encode `value` as JSON and store it under `key` with the configured TTL.
    ///
    /// # Errors
    /// - `Error::SerializationError` if `value` cannot be encoded
    /// - `Error::BackendError` if the write fails
    /// - `Error::Timeout` if the request deadline elapses
    pub async fn set_marshal<V>(&self, ctx: &RequestContext, key: &str, value: &V) -> Result<()>
    where
        V: Serialize + ?Sized,
    {
        let bytes = serialize_for_cache(value).map_err(|e| e.context("JsonCache::set_marshal"))?;

        ctx.run("cache SET", self.backend.set(key, bytes, self.expiration))
            .await
            .map_err(|e| e.context("JsonCache::set_marshal"))
    }

    /// Read `key`, returning a reply to inspect with `result` or `unmarshal`.
    pub async fn get(&self, ctx: &RequestContext, key: &str) -> CacheReply {
        let outcome = ctx.run("cache GET", self.backend.get(key)).await;
        CacheReply {
            key: key.to_string(),
            outcome,
        }
    }

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the backend fails.
    pub async fn delete(&self, ctx: &RequestContext, key: &str) -> Result<()> {
        ctx.run("cache DEL", self.backend.delete(key))
            .await
            .map_err(|e| e.context("JsonCache::delete"))
    }

    /// Verify the backend answers.
    ///
    /// # Errors
    /// Returns `Error::BackendError` if the backend is unreachable or unhealthy.
    pub async fn ping(&self, ctx: &RequestContext) -> Result<()> {
        let healthy = ctx
            .run("cache PING", self.backend.health_check())
            .await
            .map_err(|e| e.context("JsonCache::ping"))?;

        if healthy {
            Ok(())
        } else {
            Err(Error::BackendError("cache reported unhealthy".to_string()).context("JsonCache::ping"))
        }
    }
}

/// Outcome of a cache read.
///
/// A missing key (or an empty stored value) is `Ok(None)` from both
/// accessors; only genuine failures are errors.
#[derive(Debug)]
pub struct CacheReply {
    key: String,
    outcome: Result<Option<Vec<u8>>>,
}

impl CacheReply {
    /// Key this reply was read from.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Raw stored string.
    ///
    /// # Errors
    /// - `Error::BackendError` if the read failed
    /// - `Error::DeserializationError` if the stored bytes are not UTF-8
    pub fn result(self) -> Result<Option<String>> {
        match self.present()? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| Error::DeserializationError(e.to_string()).context("CacheReply::result")),
            None => Ok(None),
        }
    }

    /// Decode the stored JSON into `T`.
    ///
    /// # Errors
    /// - `Error::BackendError` if the read failed
    /// - `Error::DeserializationError` if the stored JSON does not decode as `T`
    pub fn unmarshal<T: DeserializeOwned>(self) -> Result<Option<T>> {
        match self.present()? {
            Some(bytes) => deserialize_from_cache(&bytes)
                .map(Some)
                .map_err(|e| e.context("CacheReply::unmarshal")),
            None => Ok(None),
        }
    }

    fn present(self) -> Result<Option<Vec<u8>>> {
        match self.outcome {
            Ok(Some(bytes)) if !bytes.is_empty() => Ok(Some(bytes)),
            Ok(_) => Ok(None),
            Err(e) => Err(e.context("JsonCache::get")),
        }
    }
}
