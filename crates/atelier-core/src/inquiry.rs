//! Private-event request types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A private-event inquiry submitted through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrivateEventRequest {
    /// Store-issued record identifier
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Contact display name
    pub contact_name: String,

    /// Contact email
    pub email: String,

    /// Contact phone number (optional, free-form)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Preferred event date, if the requester picked one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_date: Option<NaiveDate>,

    /// Expected party size
    pub party_size: u32,

    /// Free-form message describing the occasion
    pub message: String,

    /// Triage status, managed from the admin dashboard
    pub status: InquiryStatus,

    /// When the request was submitted
    pub created_at: DateTime<Utc>,
}

impl PrivateEventRequest {
    /// Create a new request in the `New` status
    pub fn new<S: Into<String>>(contact_name: S, email: S, party_size: u32, message: S) -> Self {
        Self {
            id: None,
            contact_name: contact_name.into(),
            email: email.into(),
            phone: None,
            preferred_date: None,
            party_size,
            message: message.into(),
            status: InquiryStatus::New,
            created_at: Utc::now(),
        }
    }

    /// Set the phone number
    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the preferred date
    pub fn with_preferred_date(mut self, date: NaiveDate) -> Self {
        self.preferred_date = Some(date);
        self
    }
}

/// Triage status of a private-event request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    /// Submitted, nobody has followed up yet
    New,

    /// The studio has reached out
    Contacted,

    /// Resolved (booked or declined)
    Closed,
}

impl fmt::Display for InquiryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Contacted => write!(f, "contacted"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_request_starts_untriaged() {
        let req = PrivateEventRequest::new(
            "Dana Field",
            "dana@example.com",
            14,
            "Birthday party, mosaics if possible",
        );
        assert_eq!(req.status, InquiryStatus::New);
        assert!(req.id.is_none());
        assert!(req.phone.is_none());
    }

    #[test]
    fn status_round_trips_through_json() {
        for status in [
            InquiryStatus::New,
            InquiryStatus::Contacted,
            InquiryStatus::Closed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            let back: InquiryStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }
}
