//! Read strategies for [`EntityStore::read_with`](crate::EntityStore::read_with).
//!
//! | Strategy | Cache Hit | Cache Miss | Use Case |
//! |----------|-----------|-----------|----------|
//! | **Fresh** | Return | Return None | Cache-only lookup |
//! | **Refresh** | Return | DB fallback + fill | Default read-through |
//! | **Invalidate** | Delete, then DB + fill | DB + fill | Re-read after a mutation |
//! | **Bypass** | Ignore, DB + fill | DB + fill | Force the source of truth |
//!
//! `EntityStore::read` is `Refresh`; `EntityStore::update` re-reads with
//! `Invalidate` so the cache ends up holding the post-update row.

/// Strategy enum controlling cache lookup and fill behavior on reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CacheStrategy {
    /// Try cache only, no fallback to the repository.
    Fresh,

    /// Try cache first, fall back to the repository on miss and fill the cache.
    #[default]
    Refresh,

    /// Drop the cache entry, read the repository and fill the cache.
    Invalidate,

    /// Skip the cache lookup, read the repository and fill the cache.
    Bypass,
}

impl CacheStrategy {
    /// Whether the strategy consults the cache before the repository.
    pub fn reads_cache(self) -> bool {
        matches!(self, CacheStrategy::Fresh | CacheStrategy::Refresh)
    }

    /// Whether the strategy may fall back to the repository.
    pub fn reads_repository(self) -> bool {
        !matches!(self, CacheStrategy::Fresh)
    }
}

impl std::fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheStrategy::Fresh => write!(f, "Fresh"),
            CacheStrategy::Refresh => write!(f, "Refresh"),
            CacheStrategy::Invalidate => write!(f, "Invalidate"),
            CacheStrategy::Bypass => write!(f, "Bypass"),
        }
    }
}
