//! JSON encoding of cache entries.
//!
//! Every cache entry is exactly the JSON encoding of the entity, with field
//! names matching the entity's attributes. The same encoding is what an HTTP
//! layer would put on the wire, so a cached value can be served verbatim.
//!
//! ```rust
//! use user_store::serialization::{deserialize_from_cache, serialize_for_cache};
//! use user_store::User;
//!
//! # fn main() -> user_store::Result<()> {
//! let user = User::new("Alice", "alice@x.com", "pw").with_id(1);
//! let bytes = serialize_for_cache(&user)?;
//! assert_eq!(
//!     bytes,
//!     br#"{"id":1,"name":"Alice","email":"alice@x.com","password":"pw"}"#
//! );
//!
//! let back: User = deserialize_from_cache(&bytes)?;
//! assert_eq!(back, user);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value for cache storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if the value cannot be encoded.
pub fn serialize_for_cache<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| {
        log::error!("Cache serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Decode a value read from cache storage.
///
/// # Errors
///
/// Returns `Error::DeserializationError` for malformed or mismatched JSON.
pub fn deserialize_from_cache<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| {
        log::warn!("Cache deserialization failed: {}", e);
        Error::DeserializationError(e.to_string())
    })
}
