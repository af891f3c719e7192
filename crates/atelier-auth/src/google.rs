//! Google OAuth 2.0 code exchange.
//!
//! The admin dashboard signs in with Google. This module implements the
//! server side of the authorization-code flow directly over HTTP: build the
//! consent URL, exchange the returned code for an access token, fetch the
//! userinfo document. No tokens are retained; the account email and name
//! are all the session layer needs.

use reqwest::Client;
use serde::Deserialize;
use url::Url;

use atelier_core::{AtelierError, Result};

const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// The Google account identity recovered from a completed flow.
#[derive(Debug, Clone, PartialEq)]
pub struct GoogleUser {
    /// Verified account email, lowercased
    pub email: String,

    /// Display name from the profile
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfoResponse {
    email: String,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
}

/// Google OAuth 2.0 client.
#[derive(Clone)]
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    http: Client,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleOAuth {
    /// Create a client with the registered credentials and redirect URL.
    pub fn new<S: Into<String>>(client_id: S, client_secret: S, redirect_url: S) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            http: Client::new(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            userinfo_url: DEFAULT_USERINFO_URL.to_string(),
        }
    }

    /// Override the Google endpoints (tests point these at a stub server).
    pub fn with_endpoints<S: Into<String>>(
        mut self,
        auth_url: S,
        token_url: S,
        userinfo_url: S,
    ) -> Self {
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }

    /// Build the consent-screen URL the login route redirects to.
    ///
    /// `state` is the anti-forgery token; the callback must echo it and the
    /// server compares it against the value it stashed in a cookie.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.auth_url)
            .map_err(|e| AtelierError::oauth(format!("invalid authorize endpoint: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("response_type", "code")
            .append_pair("scope", "openid email profile")
            .append_pair("state", state);

        Ok(url.into())
    }

    /// Exchange an authorization code for the account identity.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleUser> {
        let params = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_url.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AtelierError::oauth(format!(
                "token exchange failed with HTTP {}",
                status
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AtelierError::oauth(format!("token response: {}", e)))?;

        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AtelierError::oauth(format!(
                "userinfo request failed with HTTP {}",
                status
            )));
        }

        let info: UserInfoResponse = response
            .json()
            .await
            .map_err(|e| AtelierError::oauth(format!("userinfo response: {}", e)))?;

        if info.email_verified == Some(false) {
            return Err(AtelierError::oauth(format!(
                "account '{}' email is unverified",
                info.email
            )));
        }

        let email = info.email.trim().to_lowercase();
        let name = info.name.unwrap_or_else(|| email.clone());

        Ok(GoogleUser { email, name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_expected_parameters() {
        let oauth = GoogleOAuth::new(
            "client-id",
            "client-secret",
            "https://atelier.site/auth/callback",
        );
        let url = oauth.authorize_url("state-token").unwrap();
        let parsed = Url::parse(&url).unwrap();

        let pairs: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs["client_id"], "client-id");
        assert_eq!(pairs["redirect_uri"], "https://atelier.site/auth/callback");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["state"], "state-token");
        assert!(pairs["scope"].contains("email"));
        // The secret never appears in the browser-visible URL.
        assert!(!url.contains("client-secret"));
    }

    #[test]
    fn userinfo_parses_with_and_without_name() {
        let with_name: UserInfoResponse = serde_json::from_str(
            r#"{ "email": "Owner@Atelier.site", "email_verified": true, "name": "Studio Owner" }"#,
        )
        .unwrap();
        assert_eq!(with_name.name.as_deref(), Some("Studio Owner"));

        let without_name: UserInfoResponse =
            serde_json::from_str(r#"{ "email": "owner@atelier.site" }"#).unwrap();
        assert!(without_name.name.is_none());
        assert!(without_name.email_verified.is_none());
    }
}
