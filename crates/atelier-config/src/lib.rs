//! Configuration loading and types for atelier.
//!
//! This crate is responsible for:
//! - Defining the top-level configuration model used by the daemon and other crates
//! - Loading configuration from TOML files
//! - Providing a simple default search strategy (e.g. /etc/atelier/atelier.toml, ./atelier.toml)
//!
//! The goal is to keep this crate focused on configuration concerns and to avoid
//! pulling in heavy runtime dependencies. Business logic and orchestration live
//! in higher-level crates.
//!
//! Every hosted service the site depends on (CMS, document store, payment
//! gateway, SMTP relay, Google OAuth) gets its own section. Validation here is
//! structural only; reachability of the services is a runtime concern.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use atelier_core::{AtelierError, Result};

/// Root configuration struct for atelier.
///
/// This represents the operator-supplied configuration that the daemon
/// and related crates consume.
#[derive(Debug, Clone, Deserialize)]
pub struct AtelierConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerSection,

    /// Headless CMS delivery API credentials.
    pub cms: CmsSection,

    /// Document store data API credentials.
    pub store: StoreSection,

    /// Payment gateway credentials.
    pub payments: PaymentsSection,

    /// Outbound email configuration.
    ///
    /// When absent, the daemon falls back to a console transport that only
    /// logs rendered messages, which is the intended development setup.
    #[serde(default)]
    pub mail: Option<MailSection>,

    /// Google OAuth and admin-session configuration.
    pub auth: AuthSection,
}

impl AtelierConfig {
    /// Perform basic structural validation of the configuration.
    ///
    /// This does not attempt to contact any external systems; it only checks
    /// for obviously invalid or inconsistent values. More advanced validation
    /// (e.g., CMS reachability) belongs in higher-level crates.
    pub fn validate(&self) -> Result<()> {
        self.validate_cms()?;
        self.validate_store()?;
        self.validate_payments()?;
        self.validate_mail()?;
        self.validate_auth()?;
        Ok(())
    }

    fn validate_cms(&self) -> Result<()> {
        require_http_url("cms.base_url", &self.cms.base_url)?;
        require_non_empty("cms.api_key", &self.cms.api_key)?;
        require_non_empty("cms.space", &self.cms.space)?;
        Ok(())
    }

    fn validate_store(&self) -> Result<()> {
        require_http_url("store.base_url", &self.store.base_url)?;
        require_non_empty("store.api_key", &self.store.api_key)?;
        require_non_empty("store.database", &self.store.database)?;
        Ok(())
    }

    fn validate_payments(&self) -> Result<()> {
        require_http_url("payments.base_url", &self.payments.base_url)?;
        require_non_empty("payments.api_key", &self.payments.api_key)?;
        if self.payments.currency.trim().len() != 3 {
            return Err(AtelierError::invalid_config(
                "payments.currency",
                "payments.currency must be a 3-letter ISO currency code",
            ));
        }
        Ok(())
    }

    fn validate_mail(&self) -> Result<()> {
        let Some(mail) = &self.mail else {
            return Ok(());
        };

        require_non_empty("mail.smtp_host", &mail.smtp_host)?;
        require_non_empty("mail.from_email", &mail.from_email)?;
        require_non_empty("mail.notify_email", &mail.notify_email)?;
        Ok(())
    }

    fn validate_auth(&self) -> Result<()> {
        require_non_empty("auth.google_client_id", &self.auth.google_client_id)?;
        require_non_empty("auth.google_client_secret", &self.auth.google_client_secret)?;
        require_http_url("auth.redirect_url", &self.auth.redirect_url)?;

        if self.auth.admin_emails.is_empty() {
            return Err(AtelierError::invalid_config(
                "auth.admin_emails",
                "auth.admin_emails must list at least one administrator",
            ));
        }

        for email in &self.auth.admin_emails {
            if email.trim().is_empty() || !email.contains('@') {
                return Err(AtelierError::invalid_config(
                    "auth.admin_emails",
                    &format!("'{}' is not a plausible email address", email),
                ));
            }
        }

        if self.auth.session_ttl_hours == 0 {
            return Err(AtelierError::invalid_config(
                "auth.session_ttl_hours",
                "auth.session_ttl_hours must be at least 1",
            ));
        }

        Ok(())
    }
}

/// HTTP server section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Port to listen on. Defaults to 8080.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Optional listen address override. Defaults to 0.0.0.0.
    #[serde(default)]
    pub listen_addr: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            listen_addr: None,
        }
    }
}

/// Headless CMS section.
#[derive(Debug, Clone, Deserialize)]
pub struct CmsSection {
    /// Base URL of the CMS delivery API, e.g. `https://cdn.cms.example.com`.
    pub base_url: String,

    /// Delivery API key (read-only token).
    pub api_key: String,

    /// Space/project identifier within the CMS.
    pub space: String,
}

/// Document store section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// Base URL of the hosted data API, e.g. `https://data.store.example.com/app/site/endpoint`.
    pub base_url: String,

    /// Data API key.
    pub api_key: String,

    /// Database name. Defaults to `atelier`.
    #[serde(default = "default_database")]
    pub database: String,
}

/// Payment gateway section.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsSection {
    /// Base URL of the gateway REST API.
    pub base_url: String,

    /// Secret API key.
    pub api_key: String,

    /// ISO currency code charges are denominated in. Defaults to `usd`.
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Outbound email (SMTP) section.
#[derive(Debug, Clone, Deserialize)]
pub struct MailSection {
    /// SMTP relay hostname.
    pub smtp_host: String,

    /// SMTP port. Defaults to 587.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// SMTP username.
    pub username: String,

    /// SMTP password.
    pub password: String,

    /// Sender address on outbound mail.
    pub from_email: String,

    /// Sender display name. Defaults to "Atelier Art Studio".
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Studio inbox that receives private-event notifications.
    pub notify_email: String,
}

/// Google OAuth and session section.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSection {
    /// OAuth 2.0 client id from the Google Cloud console.
    pub google_client_id: String,

    /// OAuth 2.0 client secret.
    pub google_client_secret: String,

    /// Registered redirect URL, e.g. `https://atelier.site/auth/callback`.
    pub redirect_url: String,

    /// Google account emails allowed into the admin dashboard.
    pub admin_emails: Vec<String>,

    /// Session lifetime in hours. Defaults to 72.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
}

/// Load configuration from a specific file path.
///
/// This function parses TOML into [`AtelierConfig`] and maps errors into
/// [`AtelierError::Config`] / [`AtelierError::InvalidConfig`] as appropriate.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<AtelierConfig> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref).map_err(|err| {
        AtelierError::config(format!(
            "failed to read config file '{}': {}",
            path_ref.display(),
            err
        ))
    })?;

    let cfg: AtelierConfig = toml::from_str(&contents).map_err(|err| {
        AtelierError::invalid_config(
            path_ref.display().to_string(),
            format!("failed to parse config: {}", err),
        )
    })?;

    Ok(cfg)
}

/// Attempt to load configuration using the default search strategy.
///
/// Current strategy (in order):
/// 1. `/etc/atelier/atelier.toml`
/// 2. `./atelier.toml` (in the current working directory)
pub fn load_default() -> Result<AtelierConfig> {
    let candidates = [
        PathBuf::from("/etc/atelier/atelier.toml"),
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("atelier.toml"),
    ];

    for candidate in &candidates {
        if candidate.exists() {
            return load_from_path(candidate);
        }
    }

    Err(AtelierError::config(
        "no configuration file found; provide a path explicitly or create /etc/atelier/atelier.toml or ./atelier.toml".to_string(),
    ))
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AtelierError::invalid_config(
            field,
            &format!("{} must not be empty", field),
        ));
    }
    Ok(())
}

fn require_http_url(field: &str, value: &str) -> Result<()> {
    require_non_empty(field, value)?;

    let url = value.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(AtelierError::invalid_config(
            field,
            &format!("{} must start with http:// or https://", field),
        ));
    }
    Ok(())
}

fn default_listen_port() -> u16 {
    8080
}

fn default_database() -> String {
    "atelier".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Atelier Art Studio".to_string()
}

fn default_session_ttl_hours() -> u32 {
    72
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;

    fn sample_config() -> AtelierConfig {
        AtelierConfig {
            server: ServerSection::default(),
            cms: CmsSection {
                base_url: "https://cdn.cms.example.com".to_string(),
                api_key: "cms-token".to_string(),
                space: "studio".to_string(),
            },
            store: StoreSection {
                base_url: "https://data.store.example.com/app/site/endpoint".to_string(),
                api_key: "store-token".to_string(),
                database: default_database(),
            },
            payments: PaymentsSection {
                base_url: "https://gateway.example.com".to_string(),
                api_key: "sk_test_123".to_string(),
                currency: default_currency(),
            },
            mail: None,
            auth: AuthSection {
                google_client_id: "client-id".to_string(),
                google_client_secret: "client-secret".to_string(),
                redirect_url: "https://atelier.site/auth/callback".to_string(),
                admin_emails: vec!["owner@atelier.site".to_string()],
                session_ttl_hours: default_session_ttl_hours(),
            },
        }
    }

    #[test]
    fn test_load_from_path_minimal() {
        // Create a temporary file path in the current directory without relying on
        // external tempfile utilities. This keeps the test self-contained and
        // avoids additional dev-only dependencies.
        let path = PathBuf::from("test_atelier_config_minimal.toml");

        // Ensure we don't accidentally reuse an existing file from a previous run.
        let _ = fs::remove_file(&path);

        {
            let mut file = fs::File::create(&path).expect("create temp config file");
            writeln!(
                file,
                r#"
[server]
listen_port = 8080

[cms]
base_url = "https://cdn.cms.example.com"
api_key = "cms-token"
space = "studio"

[store]
base_url = "https://data.store.example.com/app/site/endpoint"
api_key = "store-token"

[payments]
base_url = "https://gateway.example.com"
api_key = "sk_test_123"

[auth]
google_client_id = "client-id"
google_client_secret = "client-secret"
redirect_url = "https://atelier.site/auth/callback"
admin_emails = ["owner@atelier.site"]
"#
            )
            .expect("write config");
        }

        let cfg = load_from_path(&path).expect("load config");

        assert_eq!(cfg.server.listen_port, 8080);
        assert_eq!(cfg.cms.base_url, "https://cdn.cms.example.com");
        assert_eq!(cfg.store.database, "atelier");
        assert_eq!(cfg.payments.currency, "usd");
        assert!(cfg.mail.is_none());
        assert_eq!(cfg.auth.session_ttl_hours, 72);
        assert_eq!(cfg.auth.admin_emails, vec!["owner@atelier.site"]);

        // Best-effort cleanup; ignore errors if the file was already removed.
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_errors() {
        let res = load_from_path("/this/definitely/does/not/exist.toml");
        assert!(res.is_err());
    }

    #[test]
    fn test_validate_accepts_sample_config() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_cms_url() {
        let mut cfg = sample_config();
        cfg.cms.base_url = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_http_store_url() {
        let mut cfg = sample_config();
        cfg.store.base_url = "ftp://data.store.example.com".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_admin_list() {
        let mut cfg = sample_config();
        cfg.auth.admin_emails.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bogus_admin_email() {
        let mut cfg = sample_config();
        cfg.auth.admin_emails = vec!["not-an-email".to_string()];
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_session_ttl() {
        let mut cfg = sample_config();
        cfg.auth.session_ttl_hours = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_currency() {
        let mut cfg = sample_config();
        cfg.payments.currency = "dollars".to_string();
        assert!(cfg.validate().is_err());
    }
}
