//! Headless CMS adapter.
//!
//! All marketing copy, images, and operating hours live in a hosted headless
//! CMS; this crate is the typed boundary in front of its delivery API. The
//! site never interprets rich-text bodies (they pass through as opaque JSON
//! for the frontend to render), so the types here stay thin.
//!
//! The adapter also owns [`ContentCache`], the single-flight cache the server
//! puts in front of high-traffic page copy. See [`cache`] for the contract.

pub mod cache;

pub use cache::{ContentCache, FetchFuture};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use atelier_core::{AtelierError, Result};

/// Errors specific to CMS response handling.
#[derive(Debug, Error)]
pub enum CmsApiError {
    #[error("CMS returned HTTP {status} for {context}")]
    Status { status: u16, context: String },

    #[error("CMS response for {context} could not be parsed: {reason}")]
    Malformed { context: String, reason: String },
}

impl From<CmsApiError> for AtelierError {
    fn from(err: CmsApiError) -> Self {
        AtelierError::cms(err.to_string())
    }
}

/// A marketing page's copy, as edited in the CMS.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageContent {
    /// Page slug (e.g. "home", "about")
    pub slug: String,

    /// Page title
    pub title: String,

    /// Rich-text body, passed through opaque for the frontend renderer
    pub body: serde_json::Value,

    /// Optional hero image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,

    /// When the entry was last published
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One row of the operating-hours table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoursEntry {
    /// Day label as the editors wrote it (e.g. "Monday", "Sat–Sun")
    pub day: String,

    /// Opening time, free-form ("10:00 AM"), empty when closed
    #[serde(default)]
    pub opens: String,

    /// Closing time, free-form
    #[serde(default)]
    pub closes: String,

    /// Whether the studio is closed that day
    #[serde(default)]
    pub closed: bool,
}

/// A gallery image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GalleryImage {
    /// Image title / caption
    pub title: String,

    /// Asset URL
    pub url: String,

    /// Alt text for accessibility
    #[serde(default)]
    pub alt: String,

    /// Editor-controlled sort position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

/// A blog post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlogPost {
    /// Post slug
    pub slug: String,

    /// Post title
    pub title: String,

    /// Short teaser shown in the list view
    #[serde(default)]
    pub excerpt: String,

    /// Rich-text body, opaque
    pub body: serde_json::Value,

    /// Cover image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,

    /// Publication timestamp
    pub published_at: DateTime<Utc>,
}

/// Wire envelope for delivery API list responses.
#[derive(Debug, Deserialize)]
struct EntryList<T> {
    items: Vec<Entry<T>>,
}

/// Wire envelope for a single entry.
#[derive(Debug, Deserialize)]
struct Entry<T> {
    fields: T,
}

/// Typed client for the CMS delivery and management APIs.
///
/// Reads use the delivery token from configuration; the single management
/// write (admin page-copy updates) reuses the same credential, which the
/// hosted CMS scopes appropriately.
#[derive(Clone)]
pub struct CmsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    space: String,
}

impl CmsClient {
    /// Create a client for the given delivery API.
    pub fn new<S: Into<String>>(base_url: S, api_key: S, space: S) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            space: space.into(),
        }
    }

    fn entries_url(&self) -> String {
        format!("{}/spaces/{}/entries", self.base_url, self.space)
    }

    async fn fetch_entries<T>(&self, content_type: &str, query: &[(&str, &str)]) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut request = self
            .http
            .get(self.entries_url())
            .bearer_auth(&self.api_key)
            .query(&[("content_type", content_type)]);
        for (key, value) in query {
            request = request.query(&[(*key, *value)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CmsApiError::Status {
                status: status.as_u16(),
                context: format!("content_type={}", content_type),
            }
            .into());
        }

        let list: EntryList<T> = response.json().await.map_err(|e| CmsApiError::Malformed {
            context: format!("content_type={}", content_type),
            reason: e.to_string(),
        })?;

        Ok(list.items.into_iter().map(|entry| entry.fields).collect())
    }

    /// Build a fetch function for a [`ContentCache`] fronting one page.
    ///
    /// The returned closure clones this client per call, which is what the
    /// cache expects from its injected fetcher.
    pub fn page_fetcher(
        &self,
        slug: &str,
    ) -> impl Fn() -> FetchFuture<PageContent> + Send + Sync + 'static {
        let client = self.clone();
        let slug = slug.to_string();
        move || {
            let client = client.clone();
            let slug = slug.clone();
            let fut: FetchFuture<PageContent> =
                Box::pin(async move { client.page(&slug).await });
            fut
        }
    }

    /// Fetch one page's copy by slug.
    pub async fn page(&self, slug: &str) -> Result<PageContent> {
        let mut pages: Vec<PageContent> = self
            .fetch_entries("page", &[("fields.slug", slug), ("limit", "1")])
            .await?;

        pages
            .pop()
            .ok_or_else(|| AtelierError::CmsEntryNotFound(format!("page '{}'", slug)))
    }

    /// Fetch the operating-hours table.
    pub async fn hours(&self) -> Result<Vec<HoursEntry>> {
        self.fetch_entries("hours", &[("order", "fields.position")])
            .await
    }

    /// Fetch the gallery, in editor order.
    pub async fn gallery(&self) -> Result<Vec<GalleryImage>> {
        let mut images: Vec<GalleryImage> = self.fetch_entries("gallery_image", &[]).await?;
        images.sort_by_key(|img| img.position.unwrap_or(u32::MAX));
        Ok(images)
    }

    /// Fetch all blog posts, newest first.
    pub async fn blog_posts(&self) -> Result<Vec<BlogPost>> {
        self.fetch_entries("blog_post", &[("order", "-fields.published_at")])
            .await
    }

    /// Fetch one blog post by slug.
    pub async fn blog_post(&self, slug: &str) -> Result<BlogPost> {
        let mut posts: Vec<BlogPost> = self
            .fetch_entries("blog_post", &[("fields.slug", slug), ("limit", "1")])
            .await?;

        posts
            .pop()
            .ok_or_else(|| AtelierError::CmsEntryNotFound(format!("blog post '{}'", slug)))
    }

    /// Write a page's copy back to the CMS (admin dashboard edits).
    ///
    /// The caller is responsible for invalidating any [`ContentCache`] that
    /// fronts this page after the write succeeds.
    pub async fn update_page(&self, slug: &str, content: &PageContent) -> Result<PageContent> {
        let url = format!("{}/{}", self.entries_url(), slug);
        let response = self
            .http
            .put(url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "fields": content }))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(AtelierError::CmsEntryNotFound(format!("page '{}'", slug)));
        }
        if !status.is_success() {
            return Err(CmsApiError::Status {
                status: status.as_u16(),
                context: format!("update page '{}'", slug),
            }
            .into());
        }

        let entry: Entry<PageContent> =
            response.json().await.map_err(|e| CmsApiError::Malformed {
                context: format!("update page '{}'", slug),
                reason: e.to_string(),
            })?;

        Ok(entry.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_entry_deserializes_from_delivery_payload() {
        let payload = r#"
        {
            "items": [
                {
                    "fields": {
                        "slug": "home",
                        "title": "Welcome to the Studio",
                        "body": { "nodeType": "document", "content": [] },
                        "hero_image": "https://cdn.cms.example.com/hero.jpg",
                        "updated_at": "2025-06-01T12:00:00Z"
                    }
                }
            ]
        }"#;

        let list: EntryList<PageContent> = serde_json::from_str(payload).unwrap();
        assert_eq!(list.items.len(), 1);

        let page = &list.items[0].fields;
        assert_eq!(page.slug, "home");
        assert_eq!(page.title, "Welcome to the Studio");
        assert!(page.hero_image.is_some());
    }

    #[test]
    fn hours_entry_defaults_apply() {
        let payload = r#"{ "items": [ { "fields": { "day": "Sunday", "closed": true } } ] }"#;

        let list: EntryList<HoursEntry> = serde_json::from_str(payload).unwrap();
        let sunday = &list.items[0].fields;
        assert!(sunday.closed);
        assert_eq!(sunday.opens, "");
    }

    #[test]
    fn gallery_sort_puts_unpositioned_images_last() {
        let mut images = vec![
            GalleryImage {
                title: "b".into(),
                url: "https://cdn/b".into(),
                alt: String::new(),
                position: None,
            },
            GalleryImage {
                title: "a".into(),
                url: "https://cdn/a".into(),
                alt: String::new(),
                position: Some(1),
            },
        ];
        images.sort_by_key(|img| img.position.unwrap_or(u32::MAX));
        assert_eq!(images[0].title, "a");
        assert_eq!(images[1].title, "b");
    }

    #[test]
    fn entries_url_strips_trailing_slash() {
        let client = CmsClient::new("https://cdn.cms.example.com/", "token", "studio");
        assert_eq!(
            client.entries_url(),
            "https://cdn.cms.example.com/spaces/studio/entries"
        );
    }
}
