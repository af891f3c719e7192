//! Error types for atelier.
//!
//! This module defines all error types that can occur throughout the atelier system.

/// The main error type for atelier operations.
#[derive(Debug, thiserror::Error)]
pub enum AtelierError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid configuration value
    #[error("Invalid configuration for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// Configuration file not found
    #[error("Configuration file not found at path: {0}")]
    ConfigNotFound(String),

    /// CMS delivery API errors
    #[error("CMS error: {0}")]
    Cms(String),

    /// A CMS entry was requested that does not exist
    #[error("CMS entry not found: {0}")]
    CmsEntryNotFound(String),

    /// Document store errors
    #[error("Store error in collection '{collection}': {message}")]
    Store { collection: String, message: String },

    /// A record was requested that does not exist
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Payment gateway communication errors
    #[error("Payment gateway error: {0}")]
    Payment(String),

    /// Outbound email errors
    #[error("Mail error: {0}")]
    Mail(String),

    /// OAuth provider errors
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// A session token was missing, expired, or invalid
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// An authenticated account is not on the admin allow-list
    #[error("Forbidden: account '{0}' is not an administrator")]
    Forbidden(String),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// HTTP client errors (wraps reqwest errors)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Request timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Invalid HTTP request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid HTTP response from a hosted service
    #[error("Invalid response from '{service}': {message}")]
    InvalidResponse { service: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// JSON serialization errors (wraps serde_json errors)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown signal received
    #[error("Shutdown signal received")]
    Shutdown,

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AtelierError {
    /// Create a config error with a message
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid config error
    pub fn invalid_config<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a CMS error
    pub fn cms<S: Into<String>>(message: S) -> Self {
        Self::Cms(message.into())
    }

    /// Create a store error scoped to a collection
    pub fn store<C: Into<String>, M: Into<String>>(collection: C, message: M) -> Self {
        Self::Store {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create a payment gateway error
    pub fn payment<S: Into<String>>(message: S) -> Self {
        Self::Payment(message.into())
    }

    /// Create a mail error
    pub fn mail<S: Into<String>>(message: S) -> Self {
        Self::Mail(message.into())
    }

    /// Create an OAuth error
    pub fn oauth<S: Into<String>>(message: S) -> Self {
        Self::OAuth(message.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized<S: Into<String>>(message: S) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Create an invalid response error
    pub fn invalid_response<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::InvalidResponse {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Check if this error is transient (retryable)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http(_)
                | Self::HttpClient(_)
                | Self::Timeout(_)
                | Self::Cms(_)
                | Self::Payment(_)
                | Self::Mail(_)
        )
    }

    /// Check if this error is fatal (should stop the daemon)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::InvalidConfig { .. } | Self::Shutdown
        )
    }
}

/// Result type alias for atelier operations
pub type Result<T> = std::result::Result<T, AtelierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AtelierError::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_invalid_config_error() {
        let err = AtelierError::invalid_config("test_field", "test message");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for 'test_field': test message"
        );
    }

    #[test]
    fn test_store_error() {
        let err = AtelierError::store("events", "connection failed");
        assert_eq!(
            err.to_string(),
            "Store error in collection 'events': connection failed"
        );
    }

    #[test]
    fn test_transient_errors() {
        assert!(AtelierError::Timeout(30).is_transient());
        assert!(AtelierError::cms("test").is_transient());
        assert!(!AtelierError::ConfigNotFound("test".into()).is_transient());
    }

    #[test]
    fn test_fatal_errors() {
        assert!(AtelierError::Shutdown.is_fatal());
        assert!(AtelierError::invalid_config("a", "b").is_fatal());
        assert!(!AtelierError::Timeout(30).is_fatal());
    }
}
