/*!
# Warbler models

Relational schema and data model behind Warbler: users, their messages and
the follow graph between them, persisted in SQLite through [`sqlx`].

Relationships are plain queries rather than lazily loaded collections:

- [`User::messages`] lists the rows a user owns.
- [`User::following`] and [`User::followers`] walk the `follows` join table.
- [`Follows::create`] and [`Follows::delete`] add and remove edges.

Constraint violations (a null username, a duplicate email, a message without
an owner) surface as [`Error::Integrity`]. Input rejected before it reaches
the database, such as an empty password, is an [`Error::Validation`].

```no_run
use warbler_models::{NewMessage, Message, Signup, User, db};

# async fn demo() -> warbler_models::Result<()> {
let db = db::memory().await?;
let user = User::signup(&db, Signup::new("alice", "alice@example.com", "secret"), bcrypt::DEFAULT_COST).await?;
Message::create(&db, NewMessage::new("hello", user.id)).await?;
assert!(User::authenticate(&db, "alice", "secret").await?.is_some());
# Ok(())
# }
```
*/

pub mod db;
mod error;
mod follows;
mod message;
pub mod password;
mod user;

pub use db::Db;
pub use error::{Error, Result};
pub use follows::Follows;
pub use message::{Message, NewMessage, Warble};
pub use user::{DEFAULT_HEADER_IMAGE_URL, DEFAULT_IMAGE_URL, ProfileStats, ProfileUpdate, Signup, User};
