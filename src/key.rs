//! Cache key management utilities.

use crate::entity::CacheEntity;

/// Builder for cache keys.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Build the cache key for an entity id.
    ///
    /// Entities without a prefix are stored under the stringified id.
    pub fn build<T: CacheEntity>(id: &T::Key) -> String {
        match T::cache_prefix() {
            Some(prefix) => format!("{}:{}", prefix, id),
            None => id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Serialize, Deserialize)]
    struct Plain {
        id: u64,
    }

    impl CacheEntity for Plain {
        type Key = u64;
        type Filter = ();

        fn cache_key(&self) -> Self::Key {
            self.id
        }

        fn assign_key(&mut self, key: Self::Key) {
            self.id = key;
        }
    }

    #[derive(Clone, Serialize, Deserialize)]
    struct Namespaced {
        id: String,
    }

    impl CacheEntity for Namespaced {
        type Key = String;
        type Filter = ();

        fn cache_key(&self) -> Self::Key {
            self.id.clone()
        }

        fn assign_key(&mut self, key: Self::Key) {
            self.id = key;
        }

        fn cache_prefix() -> Option<&'static str> {
            Some("test")
        }
    }

    #[test]
    fn test_unprefixed_key_is_stringified_id() {
        assert_eq!(CacheKeyBuilder::build::<Plain>(&42), "42");
    }

    #[test]
    fn test_prefixed_key() {
        let key = CacheKeyBuilder::build::<Namespaced>(&"a:b".to_string());
        assert_eq!(key, "test:a:b");
    }
}
