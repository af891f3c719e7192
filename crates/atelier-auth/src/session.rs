//! Store-backed admin sessions.
//!
//! A session is issued after a successful Google sign-in by an allow-listed
//! account. The browser holds a random token in an HttpOnly cookie; the
//! store holds only the token's SHA-256 hash, so the session collection is
//! useless to an attacker who reads it.

use chrono::{Duration, Utc};
use constant_time_eq::constant_time_eq;
use rand::RngCore;
use sha2::{Digest, Sha256};

use atelier_core::{AdminUser, AtelierError, Result, Session};
use atelier_store::SessionStore;

use crate::google::GoogleUser;

/// Bytes of entropy in a session token.
const TOKEN_BYTES: usize = 32;

/// Generate a fresh session token (base64url, no padding).
pub fn generate_token() -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a token, lowercase hex.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

/// Compare two tokens or hashes without leaking a timing signal.
pub fn verify_state(expected: &str, got: &str) -> bool {
    constant_time_eq(expected.as_bytes(), got.as_bytes())
}

/// Issues, validates, and revokes admin sessions.
#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    allowed_emails: Vec<String>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a manager over the given session collection.
    ///
    /// `allowed_emails` is the admin allow-list from configuration; entries
    /// are matched case-insensitively.
    pub fn new(store: SessionStore, allowed_emails: Vec<String>, ttl_hours: u32) -> Self {
        let allowed_emails = allowed_emails
            .into_iter()
            .map(|e| e.trim().to_lowercase())
            .collect();

        Self {
            store,
            allowed_emails,
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    /// Whether an account email is on the admin allow-list.
    pub fn is_admin(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.allowed_emails.iter().any(|allowed| *allowed == email)
    }

    /// Issue a session for a signed-in Google account.
    ///
    /// Returns the raw token (for the cookie) alongside the stored record.
    /// Fails with `Forbidden` for accounts not on the allow-list.
    pub async fn issue(&self, user: &GoogleUser) -> Result<(String, Session)> {
        if !self.is_admin(&user.email) {
            return Err(AtelierError::Forbidden(user.email.clone()));
        }

        let token = generate_token();
        let now = Utc::now();
        let session = Session {
            id: None,
            token_hash: hash_token(&token),
            email: user.email.to_lowercase(),
            name: user.name.clone(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        self.store.insert(&session).await?;
        tracing::info!("issued admin session for {}", session.email);

        Ok((token, session))
    }

    /// Validate a cookie token and return the admin it authenticates.
    pub async fn authenticate(&self, token: &str) -> Result<AdminUser> {
        let token_hash = hash_token(token);

        let session = self
            .store
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AtelierError::unauthorized("unknown session"))?;

        // The store matched on the hash already; re-compare in constant time
        // so the equality check never becomes a timing oracle if the store's
        // matching semantics change.
        if !verify_state(&session.token_hash, &token_hash) {
            return Err(AtelierError::unauthorized("session token mismatch"));
        }

        if session.is_expired(Utc::now()) {
            self.store.delete_by_token_hash(&token_hash).await?;
            return Err(AtelierError::unauthorized("session expired"));
        }

        // Allow-list changes take effect on the next request, not the next
        // login.
        if !self.is_admin(&session.email) {
            return Err(AtelierError::Forbidden(session.email));
        }

        Ok(session.user())
    }

    /// Revoke the session behind a cookie token (logout). Idempotent.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.store.delete_by_token_hash(&hash_token(token)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_long_and_unique() {
        let a = generate_token();
        let b = generate_token();
        // 32 bytes of base64url without padding is 43 characters.
        assert_eq!(a.len(), 43);
        assert_ne!(a, b);
    }

    #[test]
    fn hash_token_matches_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            hash_token("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn verify_state_accepts_equal_rejects_different() {
        assert!(verify_state("state-token", "state-token"));
        assert!(!verify_state("state-token", "state-tokem"));
        assert!(!verify_state("state-token", "state"));
    }
}
