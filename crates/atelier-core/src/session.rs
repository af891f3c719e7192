//! Admin user and session types.
//!
//! Sessions back the Google-OAuth-gated admin dashboard. The raw session
//! token is only ever held by the browser cookie; the store keeps a SHA-256
//! hash, so a leaked session collection cannot be replayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated administrator, as attached to admin requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminUser {
    /// Google account email (allow-list key, stored lowercased)
    pub email: String,

    /// Display name from the Google profile
    pub name: String,
}

/// A persisted admin session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Store-issued record identifier
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// SHA-256 of the session token, hex-encoded
    pub token_hash: String,

    /// Account email this session belongs to
    pub email: String,

    /// Display name captured at login
    pub name: String,

    /// When the session was issued
    pub created_at: DateTime<Utc>,

    /// When the session stops being valid
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether this session has expired as of `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The admin user this session authenticates
    pub fn user(&self) -> AdminUser {
        AdminUser {
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}
