//! Connection pool and schema setup.
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::Result;

/// Pool type shared by every model.
pub type Db = SqlitePool;

const SCHEMA: &str = include_str!("schema.sql");

/// Opens a pool for `url`.
///
/// Foreign keys are always enforced. An in-memory url gets a single
/// connection that is never recycled, otherwise every new connection would
/// see an empty database.
pub async fn connect(url: &str) -> Result<Db> {
    let options = SqliteConnectOptions::from_str(url)?
        .foreign_keys(true)
        .create_if_missing(true);
    let pool = if is_memory(url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new().connect_with(options).await?
    };
    tracing::debug!(url, "database connected");
    Ok(pool)
}

/// Creates the `users`, `messages` and `follows` tables if they are missing.
pub async fn migrate(db: &Db) -> Result<()> {
    sqlx::raw_sql(SCHEMA).execute(db).await?;
    Ok(())
}

/// Connects to a fresh in-memory database with the schema applied.
pub async fn memory() -> Result<Db> {
    let db = connect("sqlite::memory:").await?;
    migrate(&db).await?;
    Ok(db)
}

fn is_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let db = memory().await.unwrap();
        migrate(&db).await.unwrap();

        let tables: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'messages', 'follows') ORDER BY name")
                .fetch_all(&db)
                .await
                .unwrap();
        let tables: Vec<_> = tables.into_iter().map(|(name,)| name).collect();
        assert_eq!(tables, ["follows", "messages", "users"]);
    }

    #[test]
    fn test_is_memory() {
        assert!(is_memory("sqlite::memory:"));
        assert!(is_memory("sqlite://warbler?mode=memory"));
        assert!(!is_memory("sqlite://warbler.db?mode=rwc"));
    }
}
