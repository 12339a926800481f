//! PostgreSQL user repository (feature `postgres`).
//!
//! Expects a table shaped like:
//!
//! ```sql
//! CREATE TABLE users (
//!     id       BIGSERIAL PRIMARY KEY,
//!     name     TEXT NOT NULL,
//!     email    TEXT NOT NULL,
//!     password TEXT NOT NULL
//! );
//! ```

use crate::error::{Error, Result};
use crate::model::{User, UserFilter};
use crate::repository::DataRepository;
use sqlx::PgPool;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password: String,
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let id = u64::try_from(row.id)
            .map_err(|_| Error::InvalidKey(format!("negative user id {}", row.id)))?;
        Ok(User {
            id,
            name: row.name,
            email: row.email,
            password: row.password,
        })
    }
}

fn column_id(id: u64) -> Result<i64> {
    i64::try_from(id).map_err(|_| Error::InvalidKey(format!("user id {} out of range", id)))
}

/// Users table over a sqlx connection pool. No cache logic.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a new pool to `database_url`.
    ///
    /// # Errors
    /// Returns `Error::RepositoryError` if the database is unreachable.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        info!("✓ PostgreSQL repository connected");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DataRepository<User> for PgUserRepository {
    async fn insert(&self, user: &User) -> Result<u64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await?;

        u64::try_from(id).map_err(|_| Error::InvalidKey(format!("negative user id {}", id)))
    }

    async fn fetch_by_id(&self, id: &u64) -> Result<Option<User>> {
        sqlx::query_as::<_, UserRow>("SELECT id, name, email, password FROM users WHERE id = $1")
            .bind(column_id(*id)?)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn update_by_id(&self, id: &u64, user: &User) -> Result<()> {
        sqlx::query("UPDATE users SET name = $1, email = $2, password = $3 WHERE id = $4")
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .bind(column_id(*id)?)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(Error::from)
    }

    async fn delete_by_id(&self, id: &u64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(column_id(*id)?)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(Error::from)
    }

    async fn fetch_all(&self, filter: &UserFilter) -> Result<Vec<User>> {
        let rows = match &filter.name {
            Some(name) => {
                sqlx::query_as::<_, UserRow>(
                    "SELECT id, name, email, password FROM users WHERE name = $1 ORDER BY id",
                )
                .bind(name)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, UserRow>("SELECT id, name, email, password FROM users ORDER BY id")
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(User::try_from).collect()
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(Error::from)
    }
}
