//! HTTP error mapping.
//!
//! Handlers return `Result<_, ApiError>`; this module decides which status
//! each [`AtelierError`] becomes and renders a small JSON body. Hosted
//! service failures surface as 502 so monitoring can tell "we broke" from
//! "an upstream broke".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use atelier_core::AtelierError;

/// Wrapper that turns an [`AtelierError`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AtelierError);

impl From<AtelierError> for ApiError {
    fn from(err: AtelierError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// The status code this error renders as.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AtelierError::RecordNotFound(_) | AtelierError::CmsEntryNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AtelierError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AtelierError::Forbidden(_) => StatusCode::FORBIDDEN,
            AtelierError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AtelierError::Cms(_)
            | AtelierError::Store { .. }
            | AtelierError::Payment(_)
            | AtelierError::Mail(_)
            | AtelierError::OAuth(_)
            | AtelierError::Http(_)
            | AtelierError::HttpClient(_)
            | AtelierError::Timeout(_)
            | AtelierError::InvalidResponse { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        } else {
            tracing::debug!("request rejected: {}", self.0);
        }

        // Upstream detail stays in the logs; clients get the generic line.
        let message = match status {
            StatusCode::BAD_GATEWAY => "upstream service unavailable".to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => "internal error".to_string(),
            _ => self.0.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_variants_map_to_404() {
        assert_eq!(
            ApiError(AtelierError::RecordNotFound("event 'x'".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError(AtelierError::CmsEntryNotFound("page 'x'".into())).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn auth_variants_map_to_401_and_403() {
        assert_eq!(
            ApiError(AtelierError::unauthorized("no session")).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(AtelierError::Forbidden("who@example.com".into())).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn upstream_failures_map_to_502() {
        assert_eq!(
            ApiError(AtelierError::cms("down")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError(AtelierError::store("events", "down")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError(AtelierError::payment("down")).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn everything_else_is_500() {
        assert_eq!(
            ApiError(AtelierError::Internal("bug".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
