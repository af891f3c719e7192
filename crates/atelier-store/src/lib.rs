//! Document-store adapter.
//!
//! Events, private-event requests, payment-error records, and admin sessions
//! live in a hosted document database reached through its REST data API: one
//! action URL per operation, JSON bodies, an api-key header. This crate is
//! the typed boundary in front of that API.
//!
//! [`StoreClient`] exposes the raw actions generically; the [`stores`]
//! module wraps them per collection with domain-level methods, which is what
//! the rest of the system uses.

pub mod stores;

pub use stores::{EventStore, InquiryStore, PaymentErrorStore, SessionStore};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use atelier_core::{AtelierError, Result};

/// Collection holding event records.
pub const COLLECTION_EVENTS: &str = "events";

/// Collection holding private-event requests.
pub const COLLECTION_INQUIRIES: &str = "private_event_requests";

/// Collection holding payment-error records.
pub const COLLECTION_PAYMENT_ERRORS: &str = "payment_errors";

/// Collection holding admin sessions.
pub const COLLECTION_SESSIONS: &str = "sessions";

/// Errors specific to data API response handling.
#[derive(Debug, Error)]
pub enum StoreApiError {
    #[error("data API returned HTTP {status} for action '{action}'")]
    Status { status: u16, action: String },

    #[error("data API response for action '{action}' could not be parsed: {reason}")]
    Malformed { action: String, reason: String },
}

impl StoreApiError {
    fn into_atelier(self, collection: &str) -> AtelierError {
        AtelierError::store(collection, &self.to_string())
    }
}

#[derive(Debug, Serialize)]
struct ActionBody<'a> {
    database: &'a str,
    collection: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sort: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<Value>,
}

impl<'a> ActionBody<'a> {
    fn new(database: &'a str, collection: &'a str) -> Self {
        Self {
            database,
            collection,
            filter: None,
            sort: None,
            limit: None,
            update: None,
            document: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FindOneResponse<T> {
    document: Option<T>,
}

#[derive(Debug, Deserialize)]
struct FindResponse<T> {
    documents: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertOneResponse {
    inserted_id: String,
}

/// Counts returned by an update action.
///
/// `matched` is the existence signal; `modified` can legitimately be zero
/// when the update was a no-op (e.g. saving an unchanged record).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateCounts {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOneResponse {
    matched_count: u64,
    modified_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteOneResponse {
    deleted_count: u64,
}

/// Low-level client for the hosted data API.
#[derive(Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    database: String,
}

impl StoreClient {
    /// Create a client for the given data API endpoint.
    pub fn new<S: Into<String>>(base_url: S, api_key: S, database: S) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            database: database.into(),
        }
    }

    fn action_url(&self, action: &str) -> String {
        format!("{}/action/{}", self.base_url, action)
    }

    async fn post_action<R>(&self, action: &str, collection: &str, body: &ActionBody<'_>) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.action_url(action))
            .header("api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreApiError::Status {
                status: status.as_u16(),
                action: action.to_string(),
            }
            .into_atelier(collection));
        }

        response.json::<R>().await.map_err(|e| {
            StoreApiError::Malformed {
                action: action.to_string(),
                reason: e.to_string(),
            }
            .into_atelier(collection)
        })
    }

    /// Find a single document matching `filter`.
    pub async fn find_one<T>(&self, collection: &str, filter: Value) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut body = ActionBody::new(&self.database, collection);
        body.filter = Some(&filter);

        let response: FindOneResponse<T> = self.post_action("findOne", collection, &body).await?;
        Ok(response.document)
    }

    /// Find all documents matching `filter`, with optional sort and limit.
    pub async fn find<T>(
        &self,
        collection: &str,
        filter: Value,
        sort: Option<Value>,
        limit: Option<i64>,
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut body = ActionBody::new(&self.database, collection);
        body.filter = Some(&filter);
        body.sort = sort.as_ref();
        body.limit = limit;

        let response: FindResponse<T> = self.post_action("find", collection, &body).await?;
        Ok(response.documents)
    }

    /// Insert one document; returns the store-issued identifier.
    pub async fn insert_one<T>(&self, collection: &str, document: &T) -> Result<String>
    where
        T: Serialize,
    {
        let mut body = ActionBody::new(&self.database, collection);
        body.document = Some(serde_json::to_value(document)?);

        let response: InsertOneResponse = self.post_action("insertOne", collection, &body).await?;
        Ok(response.inserted_id)
    }

    /// Apply an update document to the first match.
    pub async fn update_one(
        &self,
        collection: &str,
        filter: Value,
        update: Value,
    ) -> Result<UpdateCounts> {
        let mut body = ActionBody::new(&self.database, collection);
        body.filter = Some(&filter);
        body.update = Some(&update);

        let response: UpdateOneResponse = self.post_action("updateOne", collection, &body).await?;
        Ok(UpdateCounts {
            matched: response.matched_count,
            modified: response.modified_count,
        })
    }

    /// Delete the first match; returns the deleted count.
    pub async fn delete_one(&self, collection: &str, filter: Value) -> Result<u64> {
        let mut body = ActionBody::new(&self.database, collection);
        body.filter = Some(&filter);

        let response: DeleteOneResponse = self.post_action("deleteOne", collection, &body).await?;
        Ok(response.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_url_joins_cleanly() {
        let client = StoreClient::new(
            "https://data.store.example.com/app/site/endpoint/",
            "key",
            "atelier",
        );
        assert_eq!(
            client.action_url("findOne"),
            "https://data.store.example.com/app/site/endpoint/action/findOne"
        );
    }

    #[test]
    fn action_body_omits_unused_fields() {
        let filter = serde_json::json!({ "_id": "507f1f77bcf86cd799439011" });
        let mut body = ActionBody::new("atelier", COLLECTION_EVENTS);
        body.filter = Some(&filter);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["database"], "atelier");
        assert_eq!(json["collection"], "events");
        assert!(json.get("update").is_none());
        assert!(json.get("document").is_none());
        assert!(json.get("sort").is_none());
    }

    #[test]
    fn insert_response_parses_camel_case() {
        let response: InsertOneResponse =
            serde_json::from_str(r#"{ "insertedId": "507f1f77bcf86cd799439011" }"#).unwrap();
        assert_eq!(response.inserted_id, "507f1f77bcf86cd799439011");
    }

    #[test]
    fn update_response_parses_counts() {
        let response: UpdateOneResponse =
            serde_json::from_str(r#"{ "matchedCount": 1, "modifiedCount": 1 }"#).unwrap();
        assert_eq!(response.modified_count, 1);
    }
}
