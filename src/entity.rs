//! Core entity trait that all stored entities must implement.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;
use std::str::FromStr;

/// Trait that all entities kept in the store must implement.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use user_store::CacheEntity;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// pub struct Product {
///     pub id: u64,
///     pub name: String,
/// }
///
/// impl CacheEntity for Product {
///     type Key = u64;
///     type Filter = ();
///
///     fn cache_key(&self) -> Self::Key {
///         self.id
///     }
///
///     fn assign_key(&mut self, key: Self::Key) {
///         self.id = key;
///     }
/// }
/// ```
pub trait CacheEntity: Send + Sync + Serialize + DeserializeOwned + Clone + 'static {
    /// Type of the entity's identifier, assigned by the repository.
    type Key: Display + FromStr + Clone + Send + Sync + Eq + Hash + 'static;

    /// Criteria accepted by `DataRepository::fetch_all`.
    type Filter: Default + Send + Sync;

    /// Return the entity's identifier.
    fn cache_key(&self) -> Self::Key;

    /// Store the identifier the repository assigned on insert.
    fn assign_key(&mut self, key: Self::Key);

    /// Optional namespace for cache keys.
    ///
    /// `None` stores the entity under exactly `key.to_string()`;
    /// `Some("user")` stores it under `"user:{key}"`.
    fn cache_prefix() -> Option<&'static str> {
        None
    }

    /// Whether the entity is selected by `filter`.
    ///
    /// Used by in-memory repositories; SQL repositories translate the filter
    /// into a `WHERE` clause instead.
    fn matches(&self, _filter: &Self::Filter) -> bool {
        true
    }
}
