//! Store configuration loaded from the environment.

use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;

/// Default cache entry lifetime, in seconds.
pub const DEFAULT_CACHE_EXPIRATION_SECS: u64 = 60;

/// Upper bound on `CACHE_EXPIRATION`: one year, in seconds.
pub const MAX_CACHE_EXPIRATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Settings for building an [`EntityStore`](crate::EntityStore) and its backends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    /// Lifetime of every cache entry. Zero disables expiry.
    pub cache_expiration: Duration,
    pub cache_host: String,
    pub cache_port: u16,
    pub cache_password: Option<String>,
    pub cache_db: u32,
    pub cache_pool_size: u32,
    /// Repository connection URL, required by SQL repositories only.
    pub database_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            cache_expiration: Duration::from_secs(DEFAULT_CACHE_EXPIRATION_SECS),
            cache_host: "localhost".to_string(),
            cache_port: 6379,
            cache_password: None,
            cache_db: 0,
            cache_pool_size: 16,
            database_url: None,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads:
    /// - `CACHE_EXPIRATION`: entry lifetime in seconds (default: 60, at most one year)
    /// - `CACHE_HOST` (default: localhost), `CACHE_PORT` (default: 6379)
    /// - `CACHE_PASSWORD` (optional)
    /// - `CACHE_DB` (default: 0)
    /// - `CACHE_POOL_SIZE` (default: 16)
    /// - `DATABASE_URL` (optional)
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a numeric variable does not parse or
    /// is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StoreConfig::default();
        let value = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cache_expiration = match value("CACHE_EXPIRATION") {
            Some(raw) => {
                let secs: u64 = parse("CACHE_EXPIRATION", &raw)?;
                if secs > MAX_CACHE_EXPIRATION_SECS {
                    return Err(Error::ConfigError(format!(
                        "CACHE_EXPIRATION must be at most {} seconds, got {}",
                        MAX_CACHE_EXPIRATION_SECS, secs
                    )));
                }
                Duration::from_secs(secs)
            }
            None => defaults.cache_expiration,
        };

        let config = StoreConfig {
            cache_expiration,
            cache_host: value("CACHE_HOST").unwrap_or(defaults.cache_host),
            cache_port: parse_or("CACHE_PORT", value("CACHE_PORT"), defaults.cache_port)?,
            cache_password: value("CACHE_PASSWORD"),
            cache_db: parse_or("CACHE_DB", value("CACHE_DB"), defaults.cache_db)?,
            cache_pool_size: parse_or(
                "CACHE_POOL_SIZE",
                value("CACHE_POOL_SIZE"),
                defaults.cache_pool_size,
            )?,
            database_url: value("DATABASE_URL"),
        };

        if config.cache_pool_size == 0 {
            return Err(Error::ConfigError(
                "CACHE_POOL_SIZE must be greater than zero".to_string(),
            ));
        }

        debug!(
            "Loaded store config: cache {}:{} db {} (expiration {:?})",
            config.cache_host, config.cache_port, config.cache_db, config.cache_expiration
        );
        Ok(config)
    }

    /// Redis backend settings derived from the `CACHE_*` values.
    #[cfg(feature = "redis")]
    pub fn redis_config(&self) -> crate::backend::RedisConfig {
        crate::backend::RedisConfig {
            host: self.cache_host.clone(),
            port: self.cache_port,
            password: self.cache_password.clone(),
            database: self.cache_db,
            pool_size: self.cache_pool_size,
            ..Default::default()
        }
    }
}

fn parse<T: FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::ConfigError(format!("invalid {} {:?}: {}", name, raw, e)))
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |raw| parse(name, &raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StoreConfig::from_lookup(lookup(&[])).expect("Failed to load config");
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.cache_expiration, Duration::from_secs(60));
    }

    #[test]
    fn test_reads_every_variable() {
        let config = StoreConfig::from_lookup(lookup(&[
            ("CACHE_EXPIRATION", "300"),
            ("CACHE_HOST", "cache.internal"),
            ("CACHE_PORT", "6380"),
            ("CACHE_PASSWORD", "secret"),
            ("CACHE_DB", "2"),
            ("CACHE_POOL_SIZE", "4"),
            ("DATABASE_URL", "postgres://app@db/users"),
        ]))
        .expect("Failed to load config");

        assert_eq!(config.cache_expiration, Duration::from_secs(300));
        assert_eq!(config.cache_host, "cache.internal");
        assert_eq!(config.cache_port, 6380);
        assert_eq!(config.cache_password.as_deref(), Some("secret"));
        assert_eq!(config.cache_db, 2);
        assert_eq!(config.cache_pool_size, 4);
        assert_eq!(config.database_url.as_deref(), Some("postgres://app@db/users"));
    }

    #[test]
    fn test_zero_expiration_is_allowed() {
        let config = StoreConfig::from_lookup(lookup(&[("CACHE_EXPIRATION", "0")]))
            .expect("Failed to load config");
        assert_eq!(config.cache_expiration, Duration::ZERO);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let err = StoreConfig::from_lookup(lookup(&[("CACHE_EXPIRATION", "soon")])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("CACHE_EXPIRATION")));

        let err = StoreConfig::from_lookup(lookup(&[("CACHE_PORT", "70000")])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));

        let err = StoreConfig::from_lookup(lookup(&[("CACHE_POOL_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_expiration_above_one_year_is_rejected() {
        let max = MAX_CACHE_EXPIRATION_SECS.to_string();
        let config = StoreConfig::from_lookup(lookup(&[("CACHE_EXPIRATION", max.as_str())]))
            .expect("Failed to load config");
        assert_eq!(config.cache_expiration, Duration::from_secs(MAX_CACHE_EXPIRATION_SECS));

        let huge = u64::MAX.to_string();
        let err = StoreConfig::from_lookup(lookup(&[("CACHE_EXPIRATION", huge.as_str())]))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref msg) if msg.contains("CACHE_EXPIRATION")));
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = StoreConfig::from_lookup(lookup(&[("CACHE_HOST", " "), ("DATABASE_URL", "")]))
            .expect("Failed to load config");
        assert_eq!(config.cache_host, "localhost");
        assert!(config.database_url.is_none());
    }

    #[cfg(feature = "redis")]
    #[test]
    fn test_redis_config_from_store_config() {
        let config = StoreConfig::from_lookup(lookup(&[("CACHE_PASSWORD", "pw"), ("CACHE_DB", "3")]))
            .expect("Failed to load config");
        assert_eq!(
            config.redis_config().connection_string(),
            "redis://default:pw@localhost:6379/3"
        );
    }
}
