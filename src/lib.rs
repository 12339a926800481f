//! # user-store
//!
//! A cache-aside user store: a relational repository (source of truth) fronted
//! by an expiring key-value cache holding JSON-encoded entities.
//!
//! ## Features
//!
//! - **Read-through:** cache hits never touch the repository; misses are filled
//! - **Write-through on create**, **invalidate on delete**, **re-read on update**
//! - **Backend Agnostic:** in-memory (DashMap) and Redis backends, or your own [`CacheBackend`]
//! - **Repository Agnostic:** in-memory and PostgreSQL repositories, or your own [`DataRepository`]
//! - **Per-request context:** trace ids and deadlines via [`RequestContext`]
//! - **Explicit partial failure:** a cache failure after a durable change is
//!   [`StoreError::Degraded`] and still carries the value
//!
//! ## Quick Start
//!
//! ```
//! use user_store::backend::InMemoryBackend;
//! use user_store::repository::InMemoryRepository;
//! use user_store::{EntityStore, RequestContext, User, UserFilter};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = EntityStore::new(
//!     InMemoryRepository::<User>::new(),
//!     InMemoryBackend::new(),
//!     Duration::from_secs(60),
//! );
//!
//! // EntityStore is Clone for sharing across tasks
//! let handle = store.clone();
//! let ctx = RequestContext::traced().with_timeout(Duration::from_secs(2));
//!
//! let alice = handle.create(&ctx, User::new("Alice", "alice@x.com", "pw")).await?;
//! let cached = store.cache().get(&ctx, "1").await.result()?;
//! assert_eq!(
//!     cached.as_deref(),
//!     Some(r#"{"id":1,"name":"Alice","email":"alice@x.com","password":"pw"}"#)
//! );
//!
//! let updated = store
//!     .update(&ctx, &alice.id, User::new("Alice2", "alice2@x.com", "pw2"))
//!     .await?;
//! assert_eq!(updated.map(|u| u.name), Some("Alice2".to_string()));
//!
//! let everyone = store.list(&ctx, &UserFilter::default()).await?;
//! assert_eq!(everyone.len(), 1);
//!
//! store.delete(&ctx, &alice.id).await?;
//! assert_eq!(store.read(&ctx, &alice.id).await?, None);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod cache;
pub mod config;
pub mod context;
pub mod entity;
pub mod error;
pub mod health;
pub mod key;
pub mod model;
pub mod observability;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repository;
pub mod serialization;
pub mod store;
pub mod strategy;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use cache::{CacheReply, JsonCache};
pub use config::StoreConfig;
pub use context::RequestContext;
pub use entity::CacheEntity;
pub use error::{Error, Result};
pub use health::{HealthReport, HealthState, HealthStatus};
pub use model::{User, UserFilter};
pub use repository::{DataRepository, InMemoryRepository};
pub use store::{EntityStore, StoreError};
pub use strategy::CacheStrategy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
