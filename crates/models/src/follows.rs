use serde::Serialize;
use sqlx::FromRow;

use crate::db::Db;
use crate::{Error, Result};

/// An edge of the follow graph: `follower_id` follows `followed_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, FromRow)]
pub struct Follows {
    /// Id of the user doing the following.
    pub follower_id: i64,
    /// Id of the user being followed.
    pub followed_id: i64,
}

impl Follows {
    /// Records that `follower_id` follows `followed_id`.
    ///
    /// Returns `false` if the edge already existed. Following oneself is a
    /// validation error.
    pub async fn create(db: &Db, follower_id: i64, followed_id: i64) -> Result<bool> {
        if follower_id == followed_id {
            return Err(Error::Validation("users cannot follow themselves".into()));
        }
        let done = sqlx::query("INSERT INTO follows (follower_id, followed_id) VALUES (?, ?) ON CONFLICT DO NOTHING")
            .bind(follower_id)
            .bind(followed_id)
            .execute(db)
            .await?;
        tracing::debug!(follower_id, followed_id, "follow");
        Ok(done.rows_affected() == 1)
    }

    /// Removes the edge, returning whether it existed.
    pub async fn delete(db: &Db, follower_id: i64, followed_id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followed_id = ?")
            .bind(follower_id)
            .bind(followed_id)
            .execute(db)
            .await?;
        tracing::debug!(follower_id, followed_id, "unfollow");
        Ok(done.rows_affected() == 1)
    }

    /// Whether `follower_id` follows `followed_id`.
    pub async fn exists(db: &Db, follower_id: i64, followed_id: i64) -> Result<bool> {
        let found: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = ? AND followed_id = ?)")
                .bind(follower_id)
                .bind(followed_id)
                .fetch_one(db)
                .await?;
        Ok(found)
    }

    /// Every follow edge, in insertion order.
    pub async fn all(db: &Db) -> Result<Vec<Self>> {
        let follows = sqlx::query_as("SELECT * FROM follows ORDER BY follower_id, followed_id")
            .fetch_all(db)
            .await?;
        Ok(follows)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::{Signup, User, db};

    async fn setup() -> (Db, User, User) {
        let db = db::memory().await.unwrap();
        let u = User::signup(&db, Signup::new("testuser", "test@test.com", "HASHED_PASSWORD"), 4)
            .await
            .unwrap();
        let u2 = User::signup(&db, Signup::new("testuser2", "user2@user.com", "HASHED_PASSWORD"), 4)
            .await
            .unwrap();
        (db, u, u2)
    }

    #[tokio::test]
    #[traced_test]
    async fn test_follow_round_trip() {
        let (db, u, u2) = setup().await;
        let before = (u.following(&db).await.unwrap(), u2.followers(&db).await.unwrap());

        assert!(Follows::create(&db, u.id, u2.id).await.unwrap());
        assert_eq!(
            Follows::all(&db).await.unwrap(),
            vec![Follows {
                follower_id: u.id,
                followed_id: u2.id
            }]
        );
        assert!(Follows::delete(&db, u.id, u2.id).await.unwrap());

        let after = (u.following(&db).await.unwrap(), u2.followers(&db).await.unwrap());
        assert_eq!(before, after);
        assert!(logs_contain("unfollow"));
    }

    #[tokio::test]
    async fn test_double_follow_keeps_one_row() {
        let (db, u, u2) = setup().await;

        assert!(Follows::create(&db, u.id, u2.id).await.unwrap());
        assert!(!Follows::create(&db, u.id, u2.id).await.unwrap());
        assert_eq!(Follows::all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_self_follow_rejected() {
        let (db, u, _) = setup().await;

        let err = Follows::create(&db, u.id, u.id).await.unwrap_err();
        assert!(err.is_validation(), "{err:?}");

        let err = sqlx::query("INSERT INTO follows (follower_id, followed_id) VALUES (?, ?)")
            .bind(u.id)
            .bind(u.id)
            .execute(&db)
            .await
            .map_err(Error::from)
            .unwrap_err();
        assert!(err.is_integrity(), "{err:?}");
        assert!(Follows::all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_follow_unknown_user() {
        let (db, u, _) = setup().await;

        let err = Follows::create(&db, u.id, 9999).await.unwrap_err();
        assert!(err.is_integrity(), "{err:?}");
    }

    #[tokio::test]
    async fn test_unfollow_missing_edge() {
        let (db, u, u2) = setup().await;

        assert!(!Follows::delete(&db, u.id, u2.id).await.unwrap());
    }
}
