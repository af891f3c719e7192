//! Shared application state for the HTTP server.

use std::sync::Arc;

use atelier_auth::{GoogleOAuth, SessionManager};
use atelier_cms::{CmsClient, ContentCache, PageContent};
use atelier_mail::{EmailMessage, Mailer};
use atelier_payments::PaymentsClient;
use atelier_store::{EventStore, InquiryStore, PaymentErrorStore};
use atelier_telemetry::MetricsRecorder;

/// Everything the route handlers need, cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    /// CMS adapter for page copy, hours, gallery, and blog
    pub cms: CmsClient,

    /// Single-flight cache in front of the home page copy
    pub home_cache: Arc<ContentCache<PageContent>>,

    /// Event collection
    pub events: EventStore,

    /// Private-event request collection
    pub inquiries: InquiryStore,

    /// Payment-error collection
    pub payment_errors: PaymentErrorStore,

    /// Admin session issue/validate/revoke
    pub sessions: SessionManager,

    /// Google OAuth client for the admin sign-in flow
    pub oauth: GoogleOAuth,

    /// Payment gateway adapter
    pub payments: PaymentsClient,

    /// Outbound email transport
    pub mailer: Arc<dyn Mailer>,

    /// Studio inbox for private-event notifications
    pub notify_email: String,

    /// Session cookie lifetime, in hours (mirrors the session TTL)
    pub session_ttl_hours: u32,

    /// Shared metrics recorder
    pub metrics: Arc<dyn MetricsRecorder>,

    /// Prometheus registry handle for the `/metrics` endpoint
    #[cfg(feature = "prometheus")]
    pub prometheus: Arc<atelier_telemetry::PrometheusMetricsRecorder>,
}

impl AppState {
    /// Deliver an email off the request path.
    ///
    /// Purchases must never fail because the confirmation could not be sent,
    /// so delivery runs on a background blocking task; failures are logged
    /// and counted, nothing more.
    pub fn send_email(&self, template: &'static str, message: EmailMessage) {
        let mailer = Arc::clone(&self.mailer);
        let metrics = Arc::clone(&self.metrics);

        tokio::spawn(async move {
            let to = message.to.clone();
            let outcome = tokio::task::spawn_blocking(move || mailer.send(&message)).await;

            let success = matches!(outcome, Ok(Ok(())));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!("failed to send '{}' email to {}: {}", template, to, err);
                }
                Err(err) => {
                    tracing::error!("email task for '{}' to {} panicked: {}", template, to, err);
                }
            }
            metrics.record_email(template, success);
        });
    }
}
