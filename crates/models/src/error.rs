use sqlx::error::ErrorKind;

/// Result type with [`Error`] as the error.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can happen when reading or writing Warbler data.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A non-null, unique, foreign-key or check constraint was violated.
    #[error("integrity error: {0}")]
    Integrity(String),
    /// Input was rejected before it reached the database.
    #[error("validation error: {0}")]
    Validation(String),
    /// Any other database failure.
    #[error("database error: {0}")]
    Database(sqlx::Error),
    /// Hashing or verifying a password failed.
    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    /// A blocking hash task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Returns `true` if this is a constraint violation.
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity(_))
    }

    /// Returns `true` if the input was rejected before any write.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            let violated = !matches!(db.kind(), ErrorKind::Other)
                || db.message().contains("constraint failed");
            if violated {
                return Self::Integrity(db.message().to_owned());
            }
        }
        Self::Database(e)
    }
}
