//! Typed per-collection wrappers over [`StoreClient`](crate::StoreClient).

use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use atelier_core::{
    AtelierError, Event, PaymentErrorRecord, PrivateEventRequest, Result, Session,
};
use atelier_core::inquiry::InquiryStatus;

use crate::{
    StoreClient, COLLECTION_EVENTS, COLLECTION_INQUIRIES, COLLECTION_PAYMENT_ERRORS,
    COLLECTION_SESSIONS,
};

/// Strip the `_id` field from a serialized document so it can be used in a
/// `$set` update without attempting to rewrite the immutable identifier.
fn without_id(mut value: Value) -> Value {
    if let Some(map) = value.as_object_mut() {
        map.remove("_id");
    }
    value
}

/// Event collection operations.
#[derive(Clone)]
pub struct EventStore {
    client: Arc<StoreClient>,
}

impl EventStore {
    pub fn new(client: Arc<StoreClient>) -> Self {
        Self { client }
    }

    /// Published events that have not started yet, soonest first.
    pub async fn published_upcoming(&self) -> Result<Vec<Event>> {
        self.client
            .find(
                COLLECTION_EVENTS,
                json!({ "published": true, "starts_at": { "$gt": Utc::now() } }),
                Some(json!({ "starts_at": 1 })),
                None,
            )
            .await
    }

    /// Every event, newest first (admin listing).
    pub async fn all(&self) -> Result<Vec<Event>> {
        self.client
            .find(
                COLLECTION_EVENTS,
                json!({}),
                Some(json!({ "starts_at": -1 })),
                None,
            )
            .await
    }

    /// Look an event up by its store identifier.
    ///
    /// The identifier arrives from the slug decoder, which may hand back a
    /// legacy path segment instead of a real id; a miss is an ordinary
    /// `Ok(None)` here and becomes a 404 at the route layer.
    pub async fn by_id(&self, id: &str) -> Result<Option<Event>> {
        self.client
            .find_one(COLLECTION_EVENTS, json!({ "_id": id }))
            .await
    }

    /// Insert a new event; returns the issued identifier.
    pub async fn insert(&self, event: &Event) -> Result<String> {
        self.client.insert_one(COLLECTION_EVENTS, event).await
    }

    /// Replace an event's fields.
    pub async fn update(&self, id: &str, event: &Event) -> Result<()> {
        let mut fields = without_id(serde_json::to_value(event)?);
        if let Some(map) = fields.as_object_mut() {
            map.insert("updated_at".to_string(), json!(Utc::now()));
        }

        let counts = self
            .client
            .update_one(
                COLLECTION_EVENTS,
                json!({ "_id": id }),
                json!({ "$set": fields }),
            )
            .await?;

        if counts.matched == 0 {
            return Err(AtelierError::RecordNotFound(format!("event '{}'", id)));
        }
        Ok(())
    }

    /// Atomically add booked seats after a successful charge.
    pub async fn add_booked_seats(&self, id: &str, seats: u32) -> Result<()> {
        let counts = self
            .client
            .update_one(
                COLLECTION_EVENTS,
                json!({ "_id": id }),
                json!({
                    "$inc": { "seats_booked": seats },
                    "$set": { "updated_at": Utc::now() }
                }),
            )
            .await?;

        if counts.matched == 0 {
            return Err(AtelierError::RecordNotFound(format!("event '{}'", id)));
        }
        Ok(())
    }

    /// Delete an event.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let deleted = self
            .client
            .delete_one(COLLECTION_EVENTS, json!({ "_id": id }))
            .await?;

        if deleted == 0 {
            return Err(AtelierError::RecordNotFound(format!("event '{}'", id)));
        }
        Ok(())
    }
}

/// Private-event request collection operations.
#[derive(Clone)]
pub struct InquiryStore {
    client: Arc<StoreClient>,
}

impl InquiryStore {
    pub fn new(client: Arc<StoreClient>) -> Self {
        Self { client }
    }

    /// Persist a newly submitted request; returns the issued identifier.
    pub async fn insert(&self, request: &PrivateEventRequest) -> Result<String> {
        self.client.insert_one(COLLECTION_INQUIRIES, request).await
    }

    /// All requests, newest first (admin triage view).
    pub async fn all(&self) -> Result<Vec<PrivateEventRequest>> {
        self.client
            .find(
                COLLECTION_INQUIRIES,
                json!({}),
                Some(json!({ "created_at": -1 })),
                None,
            )
            .await
    }

    /// Move a request to a new triage status.
    pub async fn set_status(&self, id: &str, status: InquiryStatus) -> Result<()> {
        let counts = self
            .client
            .update_one(
                COLLECTION_INQUIRIES,
                json!({ "_id": id }),
                json!({ "$set": { "status": status } }),
            )
            .await?;

        if counts.matched == 0 {
            return Err(AtelierError::RecordNotFound(format!(
                "private-event request '{}'",
                id
            )));
        }
        Ok(())
    }
}

/// Payment-error collection operations.
#[derive(Clone)]
pub struct PaymentErrorStore {
    client: Arc<StoreClient>,
}

impl PaymentErrorStore {
    pub fn new(client: Arc<StoreClient>) -> Self {
        Self { client }
    }

    /// Append a failure record.
    pub async fn record(&self, record: &PaymentErrorRecord) -> Result<String> {
        self.client
            .insert_one(COLLECTION_PAYMENT_ERRORS, record)
            .await
    }

    /// The most recent failures, newest first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<PaymentErrorRecord>> {
        self.client
            .find(
                COLLECTION_PAYMENT_ERRORS,
                json!({}),
                Some(json!({ "occurred_at": -1 })),
                Some(limit),
            )
            .await
    }
}

/// Session collection operations.
#[derive(Clone)]
pub struct SessionStore {
    client: Arc<StoreClient>,
}

impl SessionStore {
    pub fn new(client: Arc<StoreClient>) -> Self {
        Self { client }
    }

    /// Persist a freshly issued session.
    pub async fn insert(&self, session: &Session) -> Result<String> {
        self.client.insert_one(COLLECTION_SESSIONS, session).await
    }

    /// Look a session up by token hash.
    pub async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>> {
        self.client
            .find_one(COLLECTION_SESSIONS, json!({ "token_hash": token_hash }))
            .await
    }

    /// Remove a session by token hash (logout, or expiry cleanup).
    pub async fn delete_by_token_hash(&self, token_hash: &str) -> Result<()> {
        // Deleting an already-gone session is not an error; logout must be
        // idempotent.
        self.client
            .delete_one(COLLECTION_SESSIONS, json!({ "token_hash": token_hash }))
            .await?;
        Ok(())
    }
}
