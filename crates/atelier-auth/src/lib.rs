//! Google OAuth sign-in and admin sessions.
//!
//! The admin dashboard is gated behind Google OAuth plus a configured
//! allow-list of account emails. This crate owns both halves:
//!
//! - [`GoogleOAuth`]: the authorization-code flow against Google's endpoints
//! - [`SessionManager`]: issuing, validating, and revoking sessions stored
//!   in the document store
//!
//! The HTTP routes that drive these live in the server crate; nothing here
//! depends on the web framework.

pub mod google;
pub mod session;

pub use google::{GoogleOAuth, GoogleUser};
pub use session::{generate_token, hash_token, verify_state, SessionManager};

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_store::{SessionStore, StoreClient};
    use std::sync::Arc;

    fn manager(allowed: Vec<String>) -> SessionManager {
        let client = Arc::new(StoreClient::new(
            "https://data.store.example.com/app/site/endpoint",
            "key",
            "atelier",
        ));
        SessionManager::new(SessionStore::new(client), allowed, 72)
    }

    #[test]
    fn allow_list_matching_is_case_insensitive() {
        let manager = manager(vec!["Owner@Atelier.site".to_string()]);

        assert!(manager.is_admin("owner@atelier.site"));
        assert!(manager.is_admin("OWNER@ATELIER.SITE"));
        assert!(!manager.is_admin("intruder@atelier.site"));
    }

    #[test]
    fn allow_list_entries_are_trimmed() {
        let manager = manager(vec!["  owner@atelier.site  ".to_string()]);
        assert!(manager.is_admin("owner@atelier.site"));
    }
}
