//! Settings read from the environment.
use std::fmt::{self, Formatter};

/// Default `sqlx` connection string.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://warbler.db?mode=rwc";
/// Default listen address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5800";
/// Shortest accepted session signing key, in bytes.
pub const MIN_SECRET_LEN: usize = 64;

const DEV_SECRET: &[u8] = b"warbler-development-secret-warbler-development-secret-0123456789";

/// Errors raised while reading [`Config`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// `SECRET_KEY` is too short to sign sessions.
    #[error("SECRET_KEY must be at least 64 bytes, got {0}")]
    SecretTooShort(usize),
    /// `BCRYPT_COST` is not a number in `4..=31`.
    #[error("BCRYPT_COST must be a number between 4 and 31, got {0:?}")]
    InvalidCost(String),
}

/// Runtime settings.
#[derive(Clone)]
pub struct Config {
    /// `DATABASE_URL`
    pub database_url: String,
    /// `WARBLER_LISTEN`
    pub listen_addr: String,
    /// `SECRET_KEY`
    pub secret_key: Vec<u8>,
    /// `BCRYPT_COST`
    pub bcrypt_cost: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("listen_addr", &self.listen_addr)
            .field("secret_key", &"..")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, falling back to defaults for
    /// unset variables.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret_key = match lookup("SECRET_KEY") {
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(ConfigError::SecretTooShort(secret.len()));
            }
            Some(secret) => secret.into_bytes(),
            None => {
                tracing::warn!("SECRET_KEY is not set, using the development key");
                DEV_SECRET.to_vec()
            }
        };
        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(cost) => match cost.trim().parse::<u32>() {
                Ok(parsed) if (4..=31).contains(&parsed) => parsed,
                _ => return Err(ConfigError::InvalidCost(cost)),
            },
            None => bcrypt::DEFAULT_COST,
        };
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned()),
            listen_addr: lookup("WARBLER_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned()),
            secret_key,
            bcrypt_cost,
        })
    }

    /// Settings for an isolated in-memory database with cheap hashing.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_owned(),
            listen_addr: "127.0.0.1:5800".to_owned(),
            secret_key: DEV_SECRET.to_vec(),
            bcrypt_cost: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.secret_key.len() >= MIN_SECRET_LEN);
    }

    #[test]
    fn test_overrides() {
        let secret = "s".repeat(MIN_SECRET_LEN);
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("WARBLER_LISTEN", "127.0.0.1:8000"),
            ("SECRET_KEY", &secret),
            ("BCRYPT_COST", "6"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.listen_addr, "127.0.0.1:8000");
        assert_eq!(config.secret_key, secret.as_bytes());
        assert_eq!(config.bcrypt_cost, 6);
        assert!(!format!("{config:?}").contains(&secret));
    }

    #[test]
    fn test_rejects_short_secret() {
        let err = Config::from_lookup(lookup(&[("SECRET_KEY", "short")])).unwrap_err();
        assert!(matches!(err, ConfigError::SecretTooShort(5)));
    }

    #[test]
    fn test_rejects_bad_cost() {
        for cost in ["3", "32", "twelve"] {
            let err = Config::from_lookup(lookup(&[("BCRYPT_COST", cost)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidCost(_)), "{cost}");
        }
    }
}
