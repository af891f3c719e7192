//! Public route handlers.
//!
//! Content reads are pass-throughs to the CMS; event reads go to the
//! document store; the two purchase flows (bookings, gift cards) drive the
//! payment gateway and record every failure for the admin dashboard.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use atelier_core::{
    slug, AtelierError, Booking, Event, GiftCardOrder, PaymentErrorRecord, PaymentFlow,
    PrivateEventRequest,
};
use atelier_mail::templates;
use atelier_payments::ChargeOutcome;

use crate::error::ApiError;
use crate::state::AppState;

/// Liveness probe.
pub async fn healthz() -> &'static str {
    "ok\n"
}

/// An event as the public API serves it: the record plus its link fields.
#[derive(Debug, Serialize)]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,

    /// Identifier-bearing URL segment for the detail page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_slug: Option<String>,

    /// Site-relative detail page path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        let combined_slug = event.combined_slug();
        let href = event.detail_href();
        Self {
            event,
            combined_slug,
            href,
        }
    }
}

/// `GET /api/pages/{slug}`: CMS page copy.
///
/// The home page is the one piece of content on every visitor's path, so it
/// is served through the single-flight cache; other pages go straight to
/// the CMS.
pub async fn page(
    State(state): State<AppState>,
    Path(page_slug): Path<String>,
) -> Result<Response, ApiError> {
    let content = if page_slug == "home" {
        state.home_cache.get().await?
    } else {
        state.cms.page(&page_slug).await?
    };
    Ok(Json(content).into_response())
}

/// `GET /api/hours`
pub async fn hours(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.cms.hours().await?).into_response())
}

/// `GET /api/gallery`
pub async fn gallery(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.cms.gallery().await?).into_response())
}

/// `GET /api/blog`
pub async fn blog_index(State(state): State<AppState>) -> Result<Response, ApiError> {
    Ok(Json(state.cms.blog_posts().await?).into_response())
}

/// `GET /api/blog/{slug}`
pub async fn blog_post(
    State(state): State<AppState>,
    Path(post_slug): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(state.cms.blog_post(&post_slug).await?).into_response())
}

/// `GET /api/events`: published upcoming events with their links.
pub async fn events_index(State(state): State<AppState>) -> Result<Response, ApiError> {
    let events = state.events.published_upcoming().await?;
    let views: Vec<EventView> = events.into_iter().map(EventView::from).collect();
    Ok(Json(views).into_response())
}

/// `GET /api/events/classes-workshops/{slug}` (and the legacy
/// `GET /api/events/{slug}`): event detail by combined slug.
///
/// The decoder hands back either the embedded identifier or, for legacy
/// links, the whole segment; either way the value goes to the lookup
/// unchanged and a miss is a plain 404 here.
pub async fn event_detail(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Response, ApiError> {
    let key = slug::decode(&segment).to_lowercase();

    let event = state
        .events
        .by_id(&key)
        .await?
        .ok_or_else(|| AtelierError::RecordNotFound(format!("event '{}'", segment)))?;

    Ok(Json(EventView::from(event)).into_response())
}

/// Booking request body.
#[derive(Debug, Deserialize)]
pub struct BookingRequest {
    pub attendee_name: String,
    pub attendee_email: String,
    pub seats: u32,

    /// One-time card token from the gateway's JS SDK
    pub source_token: String,
}

/// Why a booking cannot proceed against the current event state.
#[derive(Debug, PartialEq, Eq)]
pub enum BookingRejection {
    /// Unpublished, already started, or sold out
    EventNotBookable,

    /// Fewer seats remain than were requested
    NotEnoughSeats { seats_left: u32 },
}

/// Check a booking request against the event and compute the charge amount.
pub fn validate_booking(
    event: &Event,
    seats: u32,
    now: DateTime<Utc>,
) -> Result<i64, BookingRejection> {
    if !event.is_bookable(now) {
        return Err(BookingRejection::EventNotBookable);
    }
    let seats_left = event.seats_left();
    if seats > seats_left {
        return Err(BookingRejection::NotEnoughSeats { seats_left });
    }
    Ok(event.price_cents * i64::from(seats))
}

/// `POST /api/events/{id}/bookings`: the booking flow.
pub async fn create_booking(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Json(request): Json<BookingRequest>,
) -> Result<Response, ApiError> {
    if request.seats == 0 {
        return Err(AtelierError::InvalidRequest("seats must be at least 1".into()).into());
    }
    if request.attendee_name.trim().is_empty() || !request.attendee_email.contains('@') {
        return Err(
            AtelierError::InvalidRequest("attendee name and email are required".into()).into(),
        );
    }

    let event = state
        .events
        .by_id(&event_id)
        .await?
        .ok_or_else(|| AtelierError::RecordNotFound(format!("event '{}'", event_id)))?;

    let amount_cents = match validate_booking(&event, request.seats, Utc::now()) {
        Ok(amount) => amount,
        Err(BookingRejection::EventNotBookable) => {
            return Ok((
                StatusCode::CONFLICT,
                Json(json!({ "error": "this event is no longer open for booking" })),
            )
                .into_response());
        }
        Err(BookingRejection::NotEnoughSeats { seats_left }) => {
            return Ok((
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "not enough seats left",
                    "seats_left": seats_left
                })),
            )
                .into_response());
        }
    };

    let summary = format!(
        "booking: {} x{} for {}",
        event.title, request.seats, request.attendee_email
    );
    let description = format!("Atelier booking: {}", event.title);

    let outcome = match state
        .payments
        .charge(amount_cents, &request.source_token, &description)
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            record_payment_failure(
                &state,
                PaymentFlow::Booking,
                "transport",
                &err.to_string(),
                summary,
                Some(event_id),
            )
            .await;
            return Err(err.into());
        }
    };

    let payment_id = match outcome {
        ChargeOutcome::Approved { payment_id } => payment_id,
        ChargeOutcome::Declined { code, message } => {
            record_payment_failure(
                &state,
                PaymentFlow::Booking,
                &code,
                &message,
                summary,
                Some(event_id),
            )
            .await;
            return Ok((
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({ "error": message, "code": code })),
            )
                .into_response());
        }
    };

    // The charge has settled; a failure past this point needs operator
    // attention, not a retry from the buyer.
    if let Err(err) = state.events.add_booked_seats(&event_id, request.seats).await {
        tracing::error!(
            "charge '{}' succeeded but seat update for event '{}' failed: {}",
            payment_id,
            event_id,
            err
        );
        return Err(err.into());
    }

    let booking = Booking {
        event_id: event_id.clone(),
        attendee_name: request.attendee_name,
        attendee_email: request.attendee_email,
        seats: request.seats,
        amount_cents,
        payment_id,
        created_at: Utc::now(),
    };

    state.send_email(
        "booking_confirmation",
        templates::booking_confirmation(&event, &booking),
    );
    state.metrics.record_booking(booking.seats);

    Ok((StatusCode::CREATED, Json(booking)).into_response())
}

/// Gift-card purchase request body.
#[derive(Debug, Deserialize)]
pub struct GiftCardPurchaseRequest {
    #[serde(flatten)]
    pub order: GiftCardOrder,

    /// One-time card token from the gateway's JS SDK
    pub source_token: String,
}

/// `POST /api/gift-cards`: purchase a gift card.
pub async fn create_gift_card(
    State(state): State<AppState>,
    Json(request): Json<GiftCardPurchaseRequest>,
) -> Result<Response, ApiError> {
    let order = request.order;

    if order.amount_cents <= 0 {
        return Err(AtelierError::InvalidRequest("amount must be positive".into()).into());
    }
    if !order.purchaser_email.contains('@') || !order.recipient_email.contains('@') {
        return Err(
            AtelierError::InvalidRequest("purchaser and recipient emails are required".into())
                .into(),
        );
    }

    let summary = format!(
        "gift card: {} for {}",
        templates::format_cents(order.amount_cents),
        order.recipient_email
    );

    let outcome = match state
        .payments
        .charge(
            order.amount_cents,
            &request.source_token,
            "Atelier gift card",
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(err) => {
            record_payment_failure(
                &state,
                PaymentFlow::GiftCard,
                "transport",
                &err.to_string(),
                summary,
                None,
            )
            .await;
            return Err(err.into());
        }
    };

    if let ChargeOutcome::Declined { code, message } = outcome {
        record_payment_failure(&state, PaymentFlow::GiftCard, &code, &message, summary, None)
            .await;
        return Ok((
            StatusCode::PAYMENT_REQUIRED,
            Json(json!({ "error": message, "code": code })),
        )
            .into_response());
    }

    let card = match state.payments.create_gift_card(order.amount_cents).await {
        Ok(card) => card,
        Err(err) => {
            // Funded but not issued; surface loudly for manual follow-up.
            tracing::error!("gift card funding charged but issuance failed: {}", err);
            record_payment_failure(
                &state,
                PaymentFlow::GiftCard,
                "issue_failed",
                &err.to_string(),
                summary,
                None,
            )
            .await;
            return Err(err.into());
        }
    };

    state.send_email(
        "gift_card_receipt",
        templates::gift_card_receipt(&order, &card),
    );

    Ok((StatusCode::CREATED, Json(card)).into_response())
}

/// `GET /api/gift-cards/{code}/balance`
pub async fn gift_card_balance(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ApiError> {
    Ok(Json(state.payments.gift_card_balance(&code).await?).into_response())
}

/// Private-event request body.
#[derive(Debug, Deserialize)]
pub struct InquiryRequest {
    pub contact_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub preferred_date: Option<NaiveDate>,
    pub party_size: u32,
    pub message: String,
}

/// `POST /api/private-events`: submit a private-event request.
pub async fn create_inquiry(
    State(state): State<AppState>,
    Json(request): Json<InquiryRequest>,
) -> Result<Response, ApiError> {
    if request.contact_name.trim().is_empty() || !request.email.contains('@') {
        return Err(AtelierError::InvalidRequest("name and email are required".into()).into());
    }
    if request.party_size == 0 {
        return Err(AtelierError::InvalidRequest("party size must be at least 1".into()).into());
    }

    let mut inquiry = PrivateEventRequest::new(
        request.contact_name,
        request.email,
        request.party_size,
        request.message,
    );
    if let Some(phone) = request.phone {
        inquiry = inquiry.with_phone(phone);
    }
    if let Some(date) = request.preferred_date {
        inquiry = inquiry.with_preferred_date(date);
    }

    let id = state.inquiries.insert(&inquiry).await?;

    state.send_email(
        "private_event_notification",
        templates::private_event_notification(&state.notify_email, &inquiry),
    );

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

/// Write a payment failure to the store and the metrics, swallowing store
/// errors: the buyer-facing outcome must not depend on the audit write.
async fn record_payment_failure(
    state: &AppState,
    flow: PaymentFlow,
    code: &str,
    message: &str,
    summary: String,
    related_id: Option<String>,
) {
    state.metrics.record_payment_failure(flow.as_str(), code);

    let mut record = PaymentErrorRecord::new(flow, message, summary.as_str()).with_error_code(code);
    if let Some(related) = related_id {
        record = record.with_related_id(related);
    }

    if let Err(err) = state.payment_errors.record(&record).await {
        tracing::error!("failed to record payment error: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::EventCategory;
    use chrono::Duration;

    fn bookable_event() -> Event {
        let starts = Utc::now() + Duration::days(7);
        let mut event = Event::new(
            "Wheel Throwing for Beginners",
            EventCategory::Class,
            starts,
            starts + Duration::hours(2),
            6500,
            12,
        )
        .publish();
        event.id = Some("507f1f77bcf86cd799439011".to_string());
        event
    }

    #[test]
    fn validate_booking_computes_amount() {
        let event = bookable_event();
        assert_eq!(validate_booking(&event, 2, Utc::now()), Ok(13000));
    }

    #[test]
    fn validate_booking_rejects_unbookable_event() {
        let mut event = bookable_event();
        event.published = false;
        assert_eq!(
            validate_booking(&event, 1, Utc::now()),
            Err(BookingRejection::EventNotBookable)
        );
    }

    #[test]
    fn validate_booking_rejects_overbooking() {
        let mut event = bookable_event();
        event.seats_booked = 11;
        assert_eq!(
            validate_booking(&event, 2, Utc::now()),
            Err(BookingRejection::NotEnoughSeats { seats_left: 1 })
        );
    }

    #[test]
    fn event_view_carries_link_fields() {
        let view = EventView::from(bookable_event());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(
            json["combined_slug"],
            "wheel-throwing-for-beginners-507f1f77bcf86cd799439011"
        );
        assert_eq!(
            json["href"],
            "/events/classes-workshops/wheel-throwing-for-beginners-507f1f77bcf86cd799439011"
        );
        assert_eq!(json["title"], "Wheel Throwing for Beginners");
    }

    #[test]
    fn event_view_for_unpersisted_event_omits_links() {
        let starts = Utc::now() + Duration::days(1);
        let event = Event::new(
            "Draft",
            EventCategory::Workshop,
            starts,
            starts + Duration::hours(1),
            1000,
            5,
        );
        let json = serde_json::to_value(EventView::from(event)).unwrap();
        assert!(json.get("combined_slug").is_none());
        assert!(json.get("href").is_none());
    }
}
