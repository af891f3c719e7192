//! Event and booking types.
//!
//! This module defines the event record stored in the document database and
//! the booking summary produced by the booking flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::slug;

/// A bookable class, workshop, or camp.
///
/// Events are stored in the hosted document database; the `id` field holds
/// the 24-hex identifier issued by the store on insert and is `None` for a
/// record that has not been persisted yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Store-issued record identifier
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Display title (e.g., "Wheel Throwing for Beginners")
    pub title: String,

    /// Long-form description shown on the detail page
    pub description: String,

    /// Event category
    pub category: EventCategory,

    /// Scheduled start
    pub starts_at: DateTime<Utc>,

    /// Scheduled end
    pub ends_at: DateTime<Utc>,

    /// Price per seat, in cents
    pub price_cents: i64,

    /// Total seats available
    pub capacity: u32,

    /// Seats already booked
    pub seats_booked: u32,

    /// Hero image served by the CMS (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Whether the event is visible on the public site
    pub published: bool,

    /// When this record was created
    pub created_at: DateTime<Utc>,

    /// When this record was last updated
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Create a new unpersisted event
    pub fn new<S: Into<String>>(
        title: S,
        category: EventCategory,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        price_cents: i64,
        capacity: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            category,
            starts_at,
            ends_at,
            price_cents,
            capacity,
            seats_booked: 0,
            image_url: None,
            published: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the description
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    /// Set the hero image URL
    pub fn with_image_url<S: Into<String>>(mut self, url: S) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Mark the event as published
    pub fn publish(mut self) -> Self {
        self.published = true;
        self
    }

    /// Seats still available
    pub fn seats_left(&self) -> u32 {
        self.capacity.saturating_sub(self.seats_booked)
    }

    /// Whether the event can accept a booking at `now`
    pub fn is_bookable(&self, now: DateTime<Utc>) -> bool {
        self.published && self.starts_at > now && self.seats_left() > 0
    }

    /// The identifier-bearing URL segment for this event.
    ///
    /// Returns `None` for unpersisted events, which have no identifier to
    /// embed.
    pub fn combined_slug(&self) -> Option<String> {
        self.id.as_deref().map(|id| slug::encode(&self.title, id))
    }

    /// Site-relative detail page path for this event
    pub fn detail_href(&self) -> Option<String> {
        self.combined_slug()
            .map(|s| format!("/events/classes-workshops/{}", s))
    }
}

/// Category of an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// Recurring multi-week class
    Class,

    /// Single-session workshop
    Workshop,

    /// Multi-day camp (school breaks, summer)
    Camp,

    /// Drop-in open studio time
    OpenStudio,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => write!(f, "class"),
            Self::Workshop => write!(f, "workshop"),
            Self::Camp => write!(f, "camp"),
            Self::OpenStudio => write!(f, "open_studio"),
        }
    }
}

/// Summary of a completed booking.
///
/// This is what the booking endpoint returns and what the confirmation
/// email is rendered from. It is not stored as its own collection; the
/// event's `seats_booked` counter is the persisted effect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    /// Identifier of the booked event
    pub event_id: String,

    /// Attendee display name
    pub attendee_name: String,

    /// Attendee email (confirmation recipient)
    pub attendee_email: String,

    /// Number of seats booked
    pub seats: u32,

    /// Total amount charged, in cents
    pub amount_cents: i64,

    /// Gateway payment identifier for the charge
    pub payment_id: String,

    /// When the booking completed
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_event() -> Event {
        let starts = Utc::now() + Duration::days(7);
        Event::new(
            "Wheel Throwing for Beginners",
            EventCategory::Class,
            starts,
            starts + Duration::hours(2),
            6500,
            12,
        )
    }

    #[test]
    fn seats_left_saturates() {
        let mut event = sample_event();
        event.seats_booked = 15;
        assert_eq!(event.seats_left(), 0);
    }

    #[test]
    fn unpublished_event_is_not_bookable() {
        let event = sample_event();
        assert!(!event.is_bookable(Utc::now()));
        assert!(event.publish().is_bookable(Utc::now()));
    }

    #[test]
    fn past_event_is_not_bookable() {
        let mut event = sample_event().publish();
        event.starts_at = Utc::now() - Duration::days(1);
        assert!(!event.is_bookable(Utc::now()));
    }

    #[test]
    fn full_event_is_not_bookable() {
        let mut event = sample_event().publish();
        event.seats_booked = event.capacity;
        assert!(!event.is_bookable(Utc::now()));
    }

    #[test]
    fn combined_slug_requires_identifier() {
        let mut event = sample_event();
        assert_eq!(event.combined_slug(), None);

        event.id = Some("507f1f77bcf86cd799439011".to_string());
        assert_eq!(
            event.combined_slug().as_deref(),
            Some("wheel-throwing-for-beginners-507f1f77bcf86cd799439011")
        );
        assert_eq!(
            event.detail_href().as_deref(),
            Some("/events/classes-workshops/wheel-throwing-for-beginners-507f1f77bcf86cd799439011")
        );
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&EventCategory::OpenStudio).unwrap();
        assert_eq!(json, "\"open_studio\"");
    }
}
