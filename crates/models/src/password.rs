//! bcrypt helpers that keep hashing off the async runtime.
use crate::Result;

/// Hashes `password` with the given bcrypt cost.
pub async fn hash(password: &str, cost: u32) -> Result<String> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// Checks `password` against a stored bcrypt hash.
///
/// A hash that cannot be parsed never matches.
pub async fn verify(password: &str, hashed: &str) -> Result<bool> {
    let password = password.to_owned();
    let hashed = hashed.to_owned();
    let matched = tokio::task::spawn_blocking(move || match bcrypt::verify(password, &hashed) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
    })
    .await?;
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash("HASHED_PASSWORD", 4).await.unwrap();
        assert_ne!(hashed, "HASHED_PASSWORD");
        assert!(verify("HASHED_PASSWORD", &hashed).await.unwrap());
        assert!(!verify("hashed_password", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_unreadable_hash_never_matches() {
        assert!(!verify("HASHED_PASSWORD", "HASHED_PASSWORD").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_cost() {
        assert!(matches!(hash("secret", 2).await, Err(crate::Error::Hash(_))));
    }
}
