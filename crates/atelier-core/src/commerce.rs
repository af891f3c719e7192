//! Gift-card and payment-error types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A gift-card purchase request as submitted by the public site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GiftCardOrder {
    /// Card value, in cents
    pub amount_cents: i64,

    /// Purchaser display name
    pub purchaser_name: String,

    /// Purchaser email (receipt recipient)
    pub purchaser_email: String,

    /// Recipient email the card code is sent to
    pub recipient_email: String,

    /// Optional gift message included in the recipient email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Balance view for an issued gift card.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GiftCardBalance {
    /// Gateway-issued card code
    pub code: String,

    /// Remaining value, in cents
    pub balance_cents: i64,
}

/// Which purchase flow a payment belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFlow {
    /// Event booking checkout
    Booking,

    /// Gift-card purchase
    GiftCard,
}

impl PaymentFlow {
    /// Stable label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::GiftCard => "gift_card",
        }
    }
}

impl fmt::Display for PaymentFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded payment failure.
///
/// Written to the document store whenever the gateway declines a charge or
/// a charge attempt fails in transit, and read back by the admin dashboard.
/// The summary is a short human description; card data never appears here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentErrorRecord {
    /// Store-issued record identifier
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// When the failure happened
    pub occurred_at: DateTime<Utc>,

    /// Which flow produced the failure
    pub flow: PaymentFlow,

    /// Gateway error code (e.g., "card_declined"), when one was returned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    /// Gateway or transport error message
    pub error_message: String,

    /// Short description of the attempted purchase
    pub summary: String,

    /// Related event id or gift-card order reference, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_id: Option<String>,
}

impl PaymentErrorRecord {
    /// Create a new unpersisted record stamped with the current time
    pub fn new<S: Into<String>>(flow: PaymentFlow, error_message: S, summary: S) -> Self {
        Self {
            id: None,
            occurred_at: Utc::now(),
            flow,
            error_code: None,
            error_message: error_message.into(),
            summary: summary.into(),
            related_id: None,
        }
    }

    /// Set the gateway error code
    pub fn with_error_code<S: Into<String>>(mut self, code: S) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Set the related record identifier
    pub fn with_related_id<S: Into<String>>(mut self, id: S) -> Self {
        self.related_id = Some(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_flow_labels() {
        assert_eq!(PaymentFlow::Booking.as_str(), "booking");
        assert_eq!(PaymentFlow::GiftCard.to_string(), "gift_card");
    }

    #[test]
    fn record_builder_sets_optional_fields() {
        let record = PaymentErrorRecord::new(
            PaymentFlow::GiftCard,
            "card_declined: insufficient funds",
            "gift card purchase, $50.00",
        )
        .with_error_code("card_declined")
        .with_related_id("507f1f77bcf86cd799439011");

        assert_eq!(record.error_code.as_deref(), Some("card_declined"));
        assert_eq!(record.related_id.as_deref(), Some("507f1f77bcf86cd799439011"));
        assert!(record.id.is_none());
    }

    #[test]
    fn unpersisted_record_omits_id_in_json() {
        let record = PaymentErrorRecord::new(PaymentFlow::Booking, "timeout", "booking, 2 seats");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("_id").is_none());
        assert_eq!(json["flow"], "booking");
    }
}
