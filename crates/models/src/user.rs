use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use sqlx::FromRow;

use crate::db::Db;
use crate::message::Message;
use crate::{Error, Result, password};

/// Avatar shown for users without an `image_url`.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
/// Profile header shown for users without a `header_image_url`.
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";

/// A registered user.
#[derive(Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    /// Row id.
    pub id: i64,
    /// Unique, case-sensitive login name.
    pub username: String,
    /// Unique e-mail address.
    pub email: String,
    /// bcrypt hash, never rendered.
    #[serde(skip)]
    pub password: String,
    /// Avatar url.
    pub image_url: Option<String>,
    /// Profile header url.
    pub header_image_url: Option<String>,
    /// Free-form biography.
    pub bio: Option<String>,
    /// Where the user says they are.
    pub location: Option<String>,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"..")
            .finish()
    }
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<User #{}: {}, {}>", self.id, self.username, self.email)
    }
}

/// Input for [`User::signup`].
///
/// Every field is optional so that missing form values reach the database
/// and fail there as constraint violations.
#[derive(Clone, Default, Debug)]
pub struct Signup {
    /// Login name.
    pub username: Option<String>,
    /// Unique e-mail address.
    pub email: Option<String>,
    /// Plain-text password, hashed before it is stored.
    pub password: Option<String>,
    /// Avatar url; blank means the default.
    pub image_url: Option<String>,
}

impl Signup {
    /// Builds a sign-up request from plain values.
    pub fn new(username: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            email: Some(email.into()),
            password: Some(password.into()),
            image_url: None,
        }
    }
}

/// Editable profile fields.
#[derive(Clone, Default, Debug)]
pub struct ProfileUpdate {
    /// New login name.
    pub username: String,
    /// New e-mail address.
    pub email: String,
    /// Avatar url; blank clears it.
    pub image_url: Option<String>,
    /// Profile header url; blank clears it.
    pub header_image_url: Option<String>,
    /// Biography; blank clears it.
    pub bio: Option<String>,
    /// Location; blank clears it.
    pub location: Option<String>,
}

/// Message and follow counts shown on a profile.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Serialize, FromRow)]
pub struct ProfileStats {
    /// Messages posted.
    pub messages: i64,
    /// Users followed.
    pub following: i64,
    /// Followers.
    pub followers: i64,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl User {
    /// Creates a user with a bcrypt-hashed password.
    ///
    /// An absent or empty password is a validation error. A missing or
    /// duplicate username or email is an integrity error.
    pub async fn signup(db: &Db, signup: Signup, cost: u32) -> Result<Self> {
        let Signup {
            username,
            email,
            password,
            image_url,
        } = signup;
        let password = match password {
            Some(password) if !password.is_empty() => password,
            _ => return Err(Error::Validation("password must not be empty".into())),
        };
        let hashed = password::hash(&password, cost).await?;

        let user = sqlx::query_as::<_, Self>(
            "INSERT INTO users (username, email, password, image_url) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(username)
        .bind(email)
        .bind(hashed)
        .bind(non_empty(image_url))
        .fetch_one(db)
        .await?;
        tracing::debug!(id = user.id, username = %user.username, "user signed up");
        Ok(user)
    }

    /// Returns the user when `username` and `password` match, `None` otherwise.
    pub async fn authenticate(db: &Db, username: &str, password: &str) -> Result<Option<Self>> {
        let Some(user) = Self::find_by_username(db, username).await? else {
            return Ok(None);
        };
        if password::verify(password, &user.password).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Looks a user up by id.
    pub async fn find(db: &Db, id: i64) -> Result<Option<Self>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Looks a user up by exact username.
    pub async fn find_by_username(db: &Db, username: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    /// Every user, by id.
    pub async fn all(db: &Db) -> Result<Vec<Self>> {
        let users = sqlx::query_as("SELECT * FROM users ORDER BY id")
            .fetch_all(db)
            .await?;
        Ok(users)
    }

    /// Users whose username contains `query`, or everyone when it is empty.
    pub async fn search(db: &Db, query: &str) -> Result<Vec<Self>> {
        let query = query.trim();
        if query.is_empty() {
            return Self::all(db).await;
        }
        let users = sqlx::query_as("SELECT * FROM users WHERE instr(username, ?) > 0 ORDER BY id")
            .bind(query)
            .fetch_all(db)
            .await?;
        Ok(users)
    }

    /// Users this user follows.
    pub async fn following(&self, db: &Db) -> Result<Vec<Self>> {
        let users = sqlx::query_as(
            "SELECT u.* FROM users u JOIN follows f ON f.followed_id = u.id WHERE f.follower_id = ? ORDER BY u.id",
        )
        .bind(self.id)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Users following this user.
    pub async fn followers(&self, db: &Db) -> Result<Vec<Self>> {
        let users = sqlx::query_as(
            "SELECT u.* FROM users u JOIN follows f ON f.follower_id = u.id WHERE f.followed_id = ? ORDER BY u.id",
        )
        .bind(self.id)
        .fetch_all(db)
        .await?;
        Ok(users)
    }

    /// Whether this user follows `other`.
    pub async fn is_following(&self, db: &Db, other: &Self) -> Result<bool> {
        crate::Follows::exists(db, self.id, other.id).await
    }

    /// Whether `other` follows this user.
    pub async fn is_followed_by(&self, db: &Db, other: &Self) -> Result<bool> {
        crate::Follows::exists(db, other.id, self.id).await
    }

    /// Messages written by this user, newest first.
    pub async fn messages(&self, db: &Db) -> Result<Vec<Message>> {
        Message::for_user(db, self.id).await
    }

    /// Message, following and follower counts.
    pub async fn stats(&self, db: &Db) -> Result<ProfileStats> {
        let stats = sqlx::query_as(
            "SELECT \
                (SELECT COUNT(*) FROM messages WHERE user_id = ?1) AS messages, \
                (SELECT COUNT(*) FROM follows WHERE follower_id = ?1) AS following, \
                (SELECT COUNT(*) FROM follows WHERE followed_id = ?1) AS followers",
        )
        .bind(self.id)
        .fetch_one(db)
        .await?;
        Ok(stats)
    }

    /// Replaces the editable profile fields and returns the stored row.
    pub async fn update_profile(&self, db: &Db, update: ProfileUpdate) -> Result<Self> {
        let user = sqlx::query_as::<_, Self>(
            "UPDATE users SET username = ?, email = ?, image_url = ?, header_image_url = ?, bio = ?, location = ? \
             WHERE id = ? RETURNING *",
        )
        .bind(update.username)
        .bind(update.email)
        .bind(non_empty(update.image_url))
        .bind(non_empty(update.header_image_url))
        .bind(non_empty(update.bio))
        .bind(non_empty(update.location))
        .bind(self.id)
        .fetch_one(db)
        .await?;
        tracing::debug!(id = user.id, "profile updated");
        Ok(user)
    }

    /// Deletes the user together with their messages and follow edges.
    pub async fn delete(self, db: &Db) -> Result<()> {
        let mut tx = db.begin().await?;
        sqlx::query("DELETE FROM follows WHERE follower_id = ?1 OR followed_id = ?1")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM messages WHERE user_id = ?")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(self.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        tracing::debug!(id = self.id, "user deleted");
        Ok(())
    }
}
