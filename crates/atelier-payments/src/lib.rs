//! Payment-gateway adapter.
//!
//! Charges and gift cards are handled entirely by a hosted payment gateway;
//! this crate wraps its REST API. The site never sees card numbers: the
//! frontend tokenizes the card with the gateway's JS SDK and submits the
//! resulting one-time source token.
//!
//! A gateway *decline* is a normal business outcome, not a transport error:
//! [`PaymentsClient::charge`] returns it as [`ChargeOutcome::Declined`] so
//! callers can write a payment-error record and answer the buyer with a 402.
//! Only network- and protocol-level failures surface as `Err`.

use serde::{Deserialize, Serialize};

use atelier_core::{AtelierError, GiftCardBalance, Result};

/// A charge request against a tokenized card.
#[derive(Debug, Clone, Serialize)]
pub struct ChargeRequest {
    /// Amount, in cents
    pub amount_cents: i64,

    /// ISO currency code
    pub currency: String,

    /// One-time source token produced by the gateway's JS SDK
    pub source_token: String,

    /// Human-readable statement description
    pub description: String,
}

/// Outcome of a charge attempt that reached the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChargeOutcome {
    /// The charge succeeded.
    Approved {
        /// Gateway payment identifier
        payment_id: String,
    },

    /// The gateway refused the charge.
    Declined {
        /// Stable decline code (e.g. "card_declined", "expired_card")
        code: String,

        /// Human-readable decline message
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct ChargeResponse {
    #[serde(default)]
    id: Option<String>,
    status: String,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GiftCardResponse {
    code: String,
    balance_cents: i64,
}

/// Map a parsed gateway charge response to a [`ChargeOutcome`].
///
/// Kept separate from the HTTP call so response handling is testable
/// without a gateway.
fn outcome_from_response(response: ChargeResponse) -> Result<ChargeOutcome> {
    match response.status.as_str() {
        "succeeded" => {
            let payment_id = response.id.ok_or_else(|| {
                AtelierError::invalid_response("payments", "succeeded charge without an id")
            })?;
            Ok(ChargeOutcome::Approved { payment_id })
        }
        "declined" => Ok(ChargeOutcome::Declined {
            code: response
                .error_code
                .unwrap_or_else(|| "declined".to_string()),
            message: response
                .error_message
                .unwrap_or_else(|| "the card was declined".to_string()),
        }),
        other => Err(AtelierError::invalid_response(
            "payments",
            &format!("unexpected charge status '{}'", other),
        )),
    }
}

/// Typed client for the payment gateway's REST API.
#[derive(Clone)]
pub struct PaymentsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    currency: String,
}

impl PaymentsClient {
    /// Create a client for the given gateway.
    pub fn new<S: Into<String>>(base_url: S, api_key: S, currency: S) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            currency: currency.into(),
        }
    }

    /// The currency charges are denominated in.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Attempt to charge a tokenized card.
    pub async fn charge(
        &self,
        amount_cents: i64,
        source_token: &str,
        description: &str,
    ) -> Result<ChargeOutcome> {
        let request = ChargeRequest {
            amount_cents,
            currency: self.currency.clone(),
            source_token: source_token.to_string(),
            description: description.to_string(),
        };

        let response = self
            .http
            .post(format!("{}/v1/charges", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        // The gateway answers declines with 402 and a regular charge body;
        // both 2xx and 402 carry a parseable response.
        if !status.is_success() && status.as_u16() != 402 {
            return Err(AtelierError::payment(format!(
                "charge request failed with HTTP {}",
                status
            )));
        }

        let parsed: ChargeResponse = response.json().await.map_err(|e| {
            AtelierError::invalid_response("payments", &format!("charge response: {}", e))
        })?;

        let outcome = outcome_from_response(parsed)?;
        if let ChargeOutcome::Declined { code, .. } = &outcome {
            tracing::warn!("gateway declined charge: {}", code);
        }
        Ok(outcome)
    }

    /// Issue a new gift card funded with the given amount.
    ///
    /// Called only after the funding charge has been approved.
    pub async fn create_gift_card(&self, amount_cents: i64) -> Result<GiftCardBalance> {
        let response = self
            .http
            .post(format!("{}/v1/gift_cards", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "amount_cents": amount_cents }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AtelierError::payment(format!(
                "gift card creation failed with HTTP {}",
                status
            )));
        }

        let card: GiftCardResponse = response.json().await.map_err(|e| {
            AtelierError::invalid_response("payments", &format!("gift card response: {}", e))
        })?;

        Ok(GiftCardBalance {
            code: card.code,
            balance_cents: card.balance_cents,
        })
    }

    /// Look up the remaining balance on a gift card.
    pub async fn gift_card_balance(&self, code: &str) -> Result<GiftCardBalance> {
        let response = self
            .http
            .get(format!("{}/v1/gift_cards/{}", self.base_url, code))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(AtelierError::RecordNotFound(format!("gift card '{}'", code)));
        }
        if !status.is_success() {
            return Err(AtelierError::payment(format!(
                "gift card lookup failed with HTTP {}",
                status
            )));
        }

        let card: GiftCardResponse = response.json().await.map_err(|e| {
            AtelierError::invalid_response("payments", &format!("gift card response: {}", e))
        })?;

        Ok(GiftCardBalance {
            code: card.code,
            balance_cents: card.balance_cents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_charge_maps_to_outcome() {
        let response: ChargeResponse =
            serde_json::from_str(r#"{ "id": "pay_123", "status": "succeeded" }"#).unwrap();
        assert_eq!(
            outcome_from_response(response).unwrap(),
            ChargeOutcome::Approved {
                payment_id: "pay_123".to_string()
            }
        );
    }

    #[test]
    fn declined_charge_maps_to_outcome_not_error() {
        let response: ChargeResponse = serde_json::from_str(
            r#"{ "status": "declined", "error_code": "card_declined", "error_message": "insufficient funds" }"#,
        )
        .unwrap();
        assert_eq!(
            outcome_from_response(response).unwrap(),
            ChargeOutcome::Declined {
                code: "card_declined".to_string(),
                message: "insufficient funds".to_string()
            }
        );
    }

    #[test]
    fn declined_charge_without_code_gets_fallback_labels() {
        let response: ChargeResponse =
            serde_json::from_str(r#"{ "status": "declined" }"#).unwrap();
        match outcome_from_response(response).unwrap() {
            ChargeOutcome::Declined { code, message } => {
                assert_eq!(code, "declined");
                assert!(!message.is_empty());
            }
            other => panic!("expected a decline, got {:?}", other),
        }
    }

    #[test]
    fn succeeded_charge_without_id_is_a_protocol_error() {
        let response: ChargeResponse =
            serde_json::from_str(r#"{ "status": "succeeded" }"#).unwrap();
        assert!(outcome_from_response(response).is_err());
    }

    #[test]
    fn unknown_status_is_a_protocol_error() {
        let response: ChargeResponse =
            serde_json::from_str(r#"{ "status": "pending" }"#).unwrap();
        assert!(outcome_from_response(response).is_err());
    }
}
