//! Admin dashboard API: session gate and management handlers.

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use atelier_cms::PageContent;
use atelier_core::{AdminUser, AtelierError, Event, EventCategory, InquiryStatus};

use crate::cookies::{cookie_value, SESSION_COOKIE};
use crate::error::ApiError;
use crate::routes::EventView;
use crate::state::AppState;

/// Session gate for everything nested under `/admin/api`.
///
/// Validates the session cookie, attaches the [`AdminUser`] as a request
/// extension, and rejects with 401/403 otherwise.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = cookie_value(request.headers(), SESSION_COOKIE) else {
        return ApiError(AtelierError::unauthorized("missing session cookie")).into_response();
    };

    match state.sessions.authenticate(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// `GET /admin/api/me`: the signed-in administrator.
pub async fn me(Extension(user): Extension<AdminUser>) -> Json<AdminUser> {
    Json(user)
}

/// Event fields as the admin dashboard submits them.
///
/// Separate from [`Event`] so edits cannot touch the identifier, the seat
/// counter, or the record timestamps.
#[derive(Debug, Deserialize)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: EventCategory,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub price_cents: i64,
    pub capacity: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub published: bool,
}

impl EventInput {
    /// Structural checks shared by create and update.
    pub fn validate(&self) -> Result<(), AtelierError> {
        if self.title.trim().is_empty() {
            return Err(AtelierError::InvalidRequest("title is required".into()));
        }
        if self.capacity == 0 {
            return Err(AtelierError::InvalidRequest(
                "capacity must be at least 1".into(),
            ));
        }
        if self.price_cents < 0 {
            return Err(AtelierError::InvalidRequest(
                "price must not be negative".into(),
            ));
        }
        if self.ends_at <= self.starts_at {
            return Err(AtelierError::InvalidRequest(
                "event must end after it starts".into(),
            ));
        }
        Ok(())
    }

    /// Build a fresh event record from this input.
    pub fn into_event(self) -> Event {
        let mut event = Event::new(
            self.title,
            self.category,
            self.starts_at,
            self.ends_at,
            self.price_cents,
            self.capacity,
        )
        .with_description(self.description);
        event.image_url = self.image_url;
        event.published = self.published;
        event
    }

    /// Apply this input to an existing record, preserving identifier, seat
    /// counter, and creation timestamp.
    pub fn apply_to(self, event: &mut Event) {
        event.title = self.title;
        event.description = self.description;
        event.category = self.category;
        event.starts_at = self.starts_at;
        event.ends_at = self.ends_at;
        event.price_cents = self.price_cents;
        event.capacity = self.capacity;
        event.image_url = self.image_url;
        event.published = self.published;
        event.updated_at = Utc::now();
    }
}

/// `GET /admin/api/events`: every event, including drafts.
pub async fn list_events(State(state): State<AppState>) -> Result<Response, ApiError> {
    let events = state.events.all().await?;
    let views: Vec<EventView> = events.into_iter().map(EventView::from).collect();
    Ok(Json(views).into_response())
}

/// `POST /admin/api/events`
pub async fn create_event(
    State(state): State<AppState>,
    Json(input): Json<EventInput>,
) -> Result<Response, ApiError> {
    input.validate()?;
    let event = input.into_event();
    let id = state.events.insert(&event).await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

/// `GET /admin/api/events/{id}`
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let event = state
        .events
        .by_id(&id)
        .await?
        .ok_or_else(|| AtelierError::RecordNotFound(format!("event '{}'", id)))?;
    Ok(Json(EventView::from(event)).into_response())
}

/// `PUT /admin/api/events/{id}`
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<EventInput>,
) -> Result<Response, ApiError> {
    input.validate()?;

    let mut event = state
        .events
        .by_id(&id)
        .await?
        .ok_or_else(|| AtelierError::RecordNotFound(format!("event '{}'", id)))?;

    input.apply_to(&mut event);
    state.events.update(&id, &event).await?;

    Ok(Json(EventView::from(event)).into_response())
}

/// `DELETE /admin/api/events/{id}`
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    state.events.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// `GET /admin/api/private-events`: triage listing, newest first.
pub async fn list_inquiries(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.inquiries.all().await?).into_response())
}

/// Status change body.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: InquiryStatus,
}

/// `PUT /admin/api/private-events/{id}/status`
pub async fn set_inquiry_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Result<Response, ApiError> {
    state.inquiries.set_status(&id, body.status).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// Listing limit for payment errors.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// `GET /admin/api/payment-errors`: newest first.
pub async fn list_payment_errors(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Response, ApiError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    Ok(Json(state.payment_errors.recent(limit).await?).into_response())
}

/// `PUT /admin/api/pages/{slug}`: write copy through to the CMS.
///
/// After a successful write the home-page cache is invalidated so the next
/// public read refetches.
pub async fn update_page(
    State(state): State<AppState>,
    Path(page_slug): Path<String>,
    Json(content): Json<PageContent>,
) -> Result<Response, ApiError> {
    let updated = state.cms.update_page(&page_slug, &content).await?;

    if page_slug == "home" {
        state.home_cache.invalidate().await;
    }

    Ok(Json(updated).into_response())
}

/// `POST /admin/api/content/refresh`: manual cache clear.
pub async fn refresh_content(State(state): State<AppState>) -> Response {
    state.home_cache.invalidate().await;
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_input() -> EventInput {
        let starts = Utc::now() + Duration::days(10);
        EventInput {
            title: "Mosaic Workshop".to_string(),
            description: "An afternoon of glass and grout.".to_string(),
            category: EventCategory::Workshop,
            starts_at: starts,
            ends_at: starts + Duration::hours(3),
            price_cents: 8500,
            capacity: 8,
            image_url: None,
            published: true,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn input_rejects_empty_title_and_zero_capacity() {
        let mut input = sample_input();
        input.title = "  ".to_string();
        assert!(input.validate().is_err());

        let mut input = sample_input();
        input.capacity = 0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn input_rejects_inverted_schedule() {
        let mut input = sample_input();
        input.ends_at = input.starts_at - Duration::hours(1);
        assert!(input.validate().is_err());
    }

    #[test]
    fn into_event_starts_with_no_bookings() {
        let event = sample_input().into_event();
        assert!(event.id.is_none());
        assert_eq!(event.seats_booked, 0);
        assert!(event.published);
    }

    #[test]
    fn apply_to_preserves_protected_fields() {
        let mut event = sample_input().into_event();
        event.id = Some("507f1f77bcf86cd799439011".to_string());
        event.seats_booked = 5;
        let created_at = event.created_at;

        let mut edit = sample_input();
        edit.title = "Mosaic Workshop (rescheduled)".to_string();
        edit.apply_to(&mut event);

        assert_eq!(event.title, "Mosaic Workshop (rescheduled)");
        assert_eq!(event.seats_booked, 5);
        assert_eq!(event.created_at, created_at);
        assert_eq!(event.id.as_deref(), Some("507f1f77bcf86cd799439011"));
    }
}
