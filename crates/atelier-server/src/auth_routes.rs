//! Admin sign-in routes (Google OAuth).
//!
//! `GET /auth/login` stashes an anti-forgery token in a short-lived cookie
//! and redirects to Google's consent screen; `GET /auth/callback` checks the
//! echoed token, exchanges the code, and sets the session cookie. Accounts
//! that complete Google sign-in but are not on the allow-list get a 403 and
//! no session.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use serde::Deserialize;

use atelier_auth::verify_state;
use atelier_core::AtelierError;

use crate::cookies::{self, SESSION_COOKIE, STATE_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /auth/login`
pub async fn login(State(state): State<AppState>) -> Result<Response, ApiError> {
    let state_token = atelier_auth::generate_token();
    let url = state.oauth.authorize_url(&state_token)?;

    Ok((
        AppendHeaders([(SET_COOKIE, cookies::state_cookie(&state_token))]),
        Redirect::to(&url),
    )
        .into_response())
}

/// Query parameters Google sends to the callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// `GET /auth/callback`
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let stashed = cookies::cookie_value(&headers, STATE_COOKIE)
        .ok_or_else(|| AtelierError::unauthorized("missing OAuth state cookie"))?;

    if !verify_state(&stashed, &params.state) {
        return Err(AtelierError::unauthorized("OAuth state mismatch").into());
    }

    let user = state.oauth.exchange_code(&params.code).await?;
    let (token, _session) = state.sessions.issue(&user).await?;

    Ok((
        AppendHeaders([
            (
                SET_COOKIE,
                cookies::session_cookie(&token, state.session_ttl_hours),
            ),
            (SET_COOKIE, cookies::clear_cookie(STATE_COOKIE)),
        ]),
        Redirect::to("/admin"),
    )
        .into_response())
}

/// `POST /auth/logout`
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = cookies::cookie_value(&headers, SESSION_COOKIE) {
        state.sessions.revoke(&token).await?;
    }

    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(SET_COOKIE, cookies::clear_cookie(SESSION_COOKIE))]),
    )
        .into_response())
}
