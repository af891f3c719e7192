//! HTTP server for the atelier site.
//!
//! Three route groups share one axum `Router`:
//!
//! - Public content and commerce under `/api` (pages, hours, gallery, blog,
//!   events, bookings, gift cards, private-event requests)
//! - The OAuth sign-in flow under `/auth`
//! - The session-gated dashboard API under `/admin/api`
//!
//! Handlers live in [`routes`], [`auth_routes`], and [`admin`]; shared
//! dependencies travel in [`state::AppState`].

pub mod admin;
pub mod auth_routes;
pub mod cookies;
pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::Router;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::state::AppState;

#[cfg(feature = "prometheus")]
use atelier_telemetry::prometheus_http_response;

/// Error type for the HTTP server.
///
/// This is intentionally lightweight; callers (typically `atelierd`) can map it
/// into their own error types if desired.
#[derive(Debug)]
pub enum ServerError {
    /// Failed to bind on the requested address.
    BindFailed(String),
    /// The HTTP server encountered a runtime error.
    ServeFailed(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerError::BindFailed(msg) => write!(f, "failed to bind HTTP server: {}", msg),
            ServerError::ServeFailed(msg) => write!(f, "HTTP server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

/// Configuration for the atelier HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP server on, e.g. `0.0.0.0:8080`.
    pub bind_addr: SocketAddr,
}

/// Handle to a running atelier HTTP server.
///
/// The main entrypoint (`run`) is `async` and will not return until the server
/// stops (e.g., due to shutdown or error). Callers that want finer-grained
/// control can spawn `run` onto a Tokio task and manage the `JoinHandle`.
pub struct AtelierServer {
    cfg: ServerConfig,
    state: AppState,
}

impl AtelierServer {
    /// Create a new atelier server with the given configuration and state.
    pub fn new(cfg: ServerConfig, state: AppState) -> Self {
        Self { cfg, state }
    }

    /// Spawn the HTTP server onto the current Tokio runtime and return a handle.
    pub fn spawn(self) -> JoinHandle<Result<(), ServerError>> {
        tokio::spawn(self.run())
    }

    /// Run the HTTP server until shutdown.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.cfg.bind_addr;

        info!("atelier-server: binding HTTP server on {}", addr);

        let app = router(self.state);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindFailed(e.to_string()))?;

        info!("atelier-server: listening on {}", addr);

        loop {
            let (stream, peer_addr) = match listener.accept().await {
                Ok(s) => s,
                Err(e) => {
                    error!("atelier-server: accept error: {}", e);
                    return Err(ServerError::ServeFailed(e.to_string()));
                }
            };

            let svc = app.clone();
            let io = TokioIo::new(stream);
            let conn = http1::Builder::new()
                .serve_connection(io, TowerToHyperService::new(svc))
                .with_upgrades();

            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    error!("atelier-server: error serving {}: {}", peer_addr, e);
                }
            });
        }
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let admin_api = Router::new()
        .route("/me", get(admin::me))
        .route("/events", get(admin::list_events).post(admin::create_event))
        .route(
            "/events/:id",
            get(admin::get_event)
                .put(admin::update_event)
                .delete(admin::delete_event),
        )
        .route("/private-events", get(admin::list_inquiries))
        .route("/private-events/:id/status", put(admin::set_inquiry_status))
        .route("/payment-errors", get(admin::list_payment_errors))
        .route("/pages/:slug", put(admin::update_page))
        .route("/content/refresh", post(admin::refresh_content))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin::require_admin,
        ));

    Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/metrics", get(metrics_handler))
        .route("/api/pages/:slug", get(routes::page))
        .route("/api/hours", get(routes::hours))
        .route("/api/gallery", get(routes::gallery))
        .route("/api/blog", get(routes::blog_index))
        .route("/api/blog/:slug", get(routes::blog_post))
        .route("/api/events", get(routes::events_index))
        .route(
            "/api/events/classes-workshops/:slug",
            get(routes::event_detail),
        )
        // Legacy links carry no identifier suffix; the decoder's fallback
        // resolves them the same way.
        .route("/api/events/:slug", get(routes::event_detail))
        .route("/api/events/:slug/bookings", post(routes::create_booking))
        .route("/api/gift-cards", post(routes::create_gift_card))
        .route(
            "/api/gift-cards/:code/balance",
            get(routes::gift_card_balance),
        )
        .route("/api/private-events", post(routes::create_inquiry))
        .route("/auth/login", get(auth_routes::login))
        .route("/auth/callback", get(auth_routes::callback))
        .route("/auth/logout", post(auth_routes::logout))
        .nest("/admin/api", admin_api)
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Record one counter and one latency sample per request, keyed by the
/// matched route pattern so path parameters don't explode cardinality.
async fn track_requests(
    State(state): State<AppState>,
    matched_path: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let route = matched_path
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    state.metrics.record_http_request(
        &route,
        response.status().as_u16(),
        Some(started.elapsed().as_secs_f64()),
    );

    response
}

/// Handler for `GET /metrics`.
///
/// When the `prometheus` feature is enabled, this returns a Prometheus text
/// exposition payload backed by the shared registry. Otherwise, we return a
/// 501 to signal that metrics support is not compiled in.
async fn metrics_handler(State(_state): State<AppState>) -> Response {
    #[cfg(feature = "prometheus")]
    {
        let resp = prometheus_http_response(_state.prometheus.registry());

        let (parts, body_bytes) = resp.into_parts();
        let body = axum::body::Body::from(body_bytes);

        (parts.status, parts.headers, body).into_response()
    }

    #[cfg(not(feature = "prometheus"))]
    {
        (
            StatusCode::NOT_IMPLEMENTED,
            [("Content-Type", "text/plain; charset=utf-8")],
            "Prometheus metrics not enabled\n",
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use std::sync::Arc;
    use tower::util::ServiceExt; // for `oneshot`

    use atelier_auth::{GoogleOAuth, SessionManager};
    use atelier_cms::{CmsClient, ContentCache};
    use atelier_mail::ConsoleMailer;
    use atelier_payments::PaymentsClient;
    use atelier_store::{
        EventStore, InquiryStore, PaymentErrorStore, SessionStore, StoreClient,
    };
    use atelier_telemetry::{MetricsRecorder, NoopMetricsRecorder};

    fn test_state() -> AppState {
        let store = Arc::new(StoreClient::new(
            "https://data.store.example.com/app/site/endpoint",
            "key",
            "atelier",
        ));
        let cms = CmsClient::new("https://cdn.cms.example.com", "token", "studio");
        let home_cache = Arc::new(ContentCache::new(cms.page_fetcher("home")));

        let metrics: Arc<dyn MetricsRecorder> = Arc::new(NoopMetricsRecorder);

        AppState {
            cms,
            home_cache,
            events: EventStore::new(Arc::clone(&store)),
            inquiries: InquiryStore::new(Arc::clone(&store)),
            payment_errors: PaymentErrorStore::new(Arc::clone(&store)),
            sessions: SessionManager::new(
                SessionStore::new(Arc::clone(&store)),
                vec!["owner@atelier.site".to_string()],
                72,
            ),
            oauth: GoogleOAuth::new(
                "client-id",
                "client-secret",
                "https://atelier.site/auth/callback",
            ),
            payments: PaymentsClient::new("https://gateway.example.com", "sk_test", "usd"),
            mailer: Arc::new(ConsoleMailer),
            notify_email: "hello@atelier.site".to_string(),
            session_ttl_hours: 72,
            metrics,
            #[cfg(feature = "prometheus")]
            prometheus: Arc::new(atelier_telemetry::PrometheusMetricsRecorder::new()),
        }
    }

    #[tokio::test]
    async fn healthz_responds_ok() {
        let app = router(test_state());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_path_is_not_found() {
        let app = router(test_state());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/definitely-not-a-route")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn admin_api_without_session_cookie_is_unauthorized() {
        let app = router(test_state());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/admin/api/events")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[cfg(not(feature = "prometheus"))]
    #[tokio::test]
    async fn metrics_endpoint_reports_not_implemented_without_feature() {
        let app = router(test_state());

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
    }
}
