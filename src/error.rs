//! Error types for the user store.

use std::fmt;

/// Result type for store, cache and repository operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the user store.
///
/// Cache failures (`SerializationError`, `DeserializationError`,
/// `BackendError`) are kept apart from `RepositoryError` so callers can tell a
/// degraded cache from a failed source of truth. "Not found" is never an error:
/// lookups return `Ok(None)` instead.
#[derive(Debug, Clone)]
pub enum Error {
    /// Encoding an entity to JSON for the cache failed.
    SerializationError(String),

    /// A cached value could not be decoded back into the entity.
    ///
    /// Indicates a corrupted or foreign entry under the entity's key.
    ///
    /// **Recovery:** The entry is overwritten by the next read-through fill.
    DeserializationError(String),

    /// Cache backend error (Redis, in-memory, etc).
    ///
    /// Common causes:
    /// - Redis connection lost or pool exhausted
    /// - Network timeout
    /// - Backend protocol error
    BackendError(String),

    /// Data repository error (database, etc).
    ///
    /// Common causes:
    /// - Database connection lost
    /// - Constraint violation (duplicate key)
    /// - Query error
    ///
    /// Always fatal to the enclosing store operation; never retried.
    RepositoryError(String),

    /// The request deadline elapsed before the operation completed.
    Timeout(String),

    /// Configuration error while loading settings or building backends.
    ConfigError(String),

    /// A cache key could not be parsed back into an entity key.
    InvalidKey(String),

    /// Error annotated with the operation it surfaced from.
    Context {
        /// Operation name, e.g. `EntityStore::create`
        operation: &'static str,
        /// Underlying error
        source: Box<Error>,
    },

    /// Generic error with custom message.
    Other(String),
}

impl Error {
    /// Wrap this error with the name of the operation it surfaced from.
    pub fn context(self, operation: &'static str) -> Self {
        Error::Context {
            operation,
            source: Box::new(self),
        }
    }

    /// Innermost error, with every `Context` layer removed.
    pub fn root(&self) -> &Error {
        let mut current = self;
        while let Error::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// True for failures of the cache round-trip (encode, decode or store).
    pub fn is_cache_error(&self) -> bool {
        matches!(
            self.root(),
            Error::SerializationError(_) | Error::DeserializationError(_) | Error::BackendError(_)
        )
    }

    /// True when the source of truth failed.
    pub fn is_repository_error(&self) -> bool {
        matches!(self.root(), Error::RepositoryError(_))
    }

    /// True when the request deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), Error::Timeout(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            Error::DeserializationError(msg) => write!(f, "Deserialization error: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::ConfigError(msg) => write!(f, "Config error: {}", msg),
            Error::InvalidKey(msg) => write!(f, "Invalid key: {}", msg),
            Error::Context { operation, source } => write!(f, "[in {}] {}", operation, source),
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Context { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::BackendError(e.to_string())
        } else if e.is_syntax() || e.is_data() || e.is_eof() {
            Error::DeserializationError(e.to_string())
        } else {
            Error::SerializationError(e.to_string())
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::BackendError(e.to_string())
    }
}

impl From<String> for Error {
    fn from(e: String) -> Self {
        Error::Other(e)
    }
}

impl From<&str> for Error {
    fn from(e: &str) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::BackendError(format!("Redis error: {}", e))
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::RepositoryError(e.to_string())
    }
}
