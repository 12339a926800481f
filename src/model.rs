//! The user entity.

use crate::entity::CacheEntity;
use serde::{Deserialize, Serialize};

/// A user record.
///
/// `id` is assigned by the repository on insert and is the cache key.
/// The JSON encoding (field order included) is the cached representation:
/// `{"id":1,"name":"Alice","email":"alice@x.com","password":"pw"}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
}

impl User {
    /// Unsaved user; the id stays `0` until the repository assigns one.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        User {
            id: 0,
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }
}

/// Criteria for listing users.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserFilter {
    /// Exact name match; `None` lists every user.
    pub name: Option<String>,
}

impl UserFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        UserFilter {
            name: Some(name.into()),
        }
    }
}

impl CacheEntity for User {
    type Key = u64;
    type Filter = UserFilter;

    fn cache_key(&self) -> Self::Key {
        self.id
    }

    fn assign_key(&mut self, key: Self::Key) {
        self.id = key;
    }

    fn matches(&self, filter: &Self::Filter) -> bool {
        filter.name.as_deref().map_or(true, |name| self.name == name)
    }
}
