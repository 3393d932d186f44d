use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::Result;
use crate::db::Db;

/// A short message posted by a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, FromRow)]
pub struct Message {
    /// Row id.
    pub id: i64,
    /// Message body, at most [`Message::MAX_LEN`] characters.
    pub text: String,
    /// When the message was posted, in UTC.
    pub timestamp: NaiveDateTime,
    /// Author.
    pub user_id: i64,
}

/// A message joined with its author, as listed on a timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, FromRow)]
pub struct Warble {
    /// Message id.
    pub id: i64,
    /// Message body.
    pub text: String,
    /// When the message was posted, in UTC.
    pub timestamp: NaiveDateTime,
    /// Author.
    pub user_id: i64,
    /// Author's username.
    pub username: String,
    /// Avatar of the author.
    pub image_url: Option<String>,
}

/// Input for [`Message::create`].
///
/// Missing values are passed through to the database, which rejects them.
#[derive(Clone, Debug, Default)]
pub struct NewMessage {
    /// Message body.
    pub text: Option<String>,
    /// Author.
    pub user_id: Option<i64>,
}

impl NewMessage {
    /// A message with `text` owned by `user_id`.
    pub fn new(text: impl Into<String>, user_id: i64) -> Self {
        Self {
            text: Some(text.into()),
            user_id: Some(user_id),
        }
    }
}

impl Message {
    /// Longest text a message may hold, in characters.
    pub const MAX_LEN: usize = 140;

    /// Persists a message. A null `text` or `user_id`, an unknown user or an
    /// over-long text fails with [`Error::Integrity`](crate::Error::Integrity).
    pub async fn create(db: &Db, new: NewMessage) -> Result<Self> {
        let message = sqlx::query_as::<_, Self>("INSERT INTO messages (text, user_id) VALUES (?, ?) RETURNING *")
            .bind(new.text)
            .bind(new.user_id)
            .fetch_one(db)
            .await?;
        tracing::debug!(id = message.id, user_id = message.user_id, "message created");
        Ok(message)
    }

    /// Looks a message up by id.
    pub async fn find(db: &Db, id: i64) -> Result<Option<Self>> {
        let message = sqlx::query_as("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(message)
    }

    /// Every message, oldest first.
    pub async fn all(db: &Db) -> Result<Vec<Self>> {
        let messages = sqlx::query_as("SELECT * FROM messages ORDER BY id")
            .fetch_all(db)
            .await?;
        Ok(messages)
    }

    /// Messages owned by `user_id`, newest first.
    pub async fn for_user(db: &Db, user_id: i64) -> Result<Vec<Self>> {
        let messages = sqlx::query_as("SELECT * FROM messages WHERE user_id = ? ORDER BY timestamp DESC, id DESC")
            .bind(user_id)
            .fetch_all(db)
            .await?;
        Ok(messages)
    }

    /// The newest `limit` messages by `user_id` and everyone they follow.
    pub async fn timeline(db: &Db, user_id: i64, limit: i64) -> Result<Vec<Warble>> {
        let warbles = sqlx::query_as(
            "SELECT m.id, m.text, m.timestamp, m.user_id, u.username, u.image_url \
             FROM messages m JOIN users u ON u.id = m.user_id \
             WHERE m.user_id = ?1 OR m.user_id IN (SELECT followed_id FROM follows WHERE follower_id = ?1) \
             ORDER BY m.timestamp DESC, m.id DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(db)
        .await?;
        Ok(warbles)
    }

    /// Deletes the message, returning whether a row was removed.
    pub async fn delete(db: &Db, id: i64) -> Result<bool> {
        let done = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        tracing::debug!(id, "message deleted");
        Ok(done.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Follows, Signup, User, db};

    async fn setup() -> (Db, User) {
        let db = db::memory().await.unwrap();
        let u = User::signup(&db, Signup::new("testuser", "test@test.com", "HASHED_PASSWORD"), 4)
            .await
            .unwrap();
        (db, u)
    }

    #[tokio::test]
    async fn test_make_message() {
        let (db, u) = setup().await;

        let msg = Message::create(&db, NewMessage::new("Test msg for user 1", u.id)).await.unwrap();

        assert_eq!(Message::all(&db).await.unwrap().len(), 1);
        assert!(u.messages(&db).await.unwrap().contains(&msg));

        let found = Message::find(&db, msg.id).await.unwrap().unwrap();
        assert_eq!(found.text, "Test msg for user 1");
        assert_eq!(found.user_id, u.id);
    }

    #[tokio::test]
    async fn test_msg_text_err() {
        let (db, u) = setup().await;

        let new = NewMessage {
            text: None,
            user_id: Some(u.id),
        };
        let err = Message::create(&db, new).await.unwrap_err();
        assert!(err.is_integrity(), "{err:?}");
        assert!(Message::all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_msg_id_err() {
        let (db, _) = setup().await;

        let new = NewMessage {
            text: Some("Should error".into()),
            user_id: None,
        };
        let err = Message::create(&db, new).await.unwrap_err();
        assert!(err.is_integrity(), "{err:?}");
        assert!(Message::all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_msg_unknown_user_err() {
        let (db, u) = setup().await;

        let err = Message::create(&db, NewMessage::new("orphan", u.id + 100)).await.unwrap_err();
        assert!(err.is_integrity(), "{err:?}");
    }

    #[tokio::test]
    async fn test_msg_too_long_err() {
        let (db, u) = setup().await;

        let text = "x".repeat(Message::MAX_LEN + 1);
        let err = Message::create(&db, NewMessage::new(text, u.id)).await.unwrap_err();
        assert!(err.is_integrity(), "{err:?}");

        let text = "x".repeat(Message::MAX_LEN);
        Message::create(&db, NewMessage::new(text, u.id)).await.unwrap();
    }

    #[tokio::test]
    async fn test_message_user_relationship() {
        let (db, u) = setup().await;

        let first = Message::create(&db, NewMessage::new("first", u.id)).await.unwrap();
        let second = Message::create(&db, NewMessage::new("second", u.id)).await.unwrap();

        assert_eq!(u.messages(&db).await.unwrap(), vec![second, first]);
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, u) = setup().await;

        let msg = Message::create(&db, NewMessage::new("bye", u.id)).await.unwrap();
        assert!(Message::delete(&db, msg.id).await.unwrap());
        assert!(!Message::delete(&db, msg.id).await.unwrap());
        assert!(Message::find(&db, msg.id).await.unwrap().is_none());
        assert!(u.messages(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeline() {
        let (db, u) = setup().await;
        let u2 = User::signup(&db, Signup::new("testuser2", "user2@user.com", "pw"), 4)
            .await
            .unwrap();
        let u3 = User::signup(&db, Signup::new("testuser3", "user3@user.com", "pw"), 4)
            .await
            .unwrap();

        let own = Message::create(&db, NewMessage::new("own", u.id)).await.unwrap();
        let followed = Message::create(&db, NewMessage::new("followed", u2.id)).await.unwrap();
        Message::create(&db, NewMessage::new("stranger", u3.id)).await.unwrap();
        Follows::create(&db, u.id, u2.id).await.unwrap();

        let timeline = Message::timeline(&db, u.id, 100).await.unwrap();
        let ids: Vec<_> = timeline.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![followed.id, own.id]);
        assert_eq!(timeline[0].username, "testuser2");

        assert_eq!(Message::timeline(&db, u.id, 1).await.unwrap().len(), 1);
    }
}
