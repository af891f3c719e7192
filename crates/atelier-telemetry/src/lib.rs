use std::env;
use std::str::FromStr;

use time::{format_description, UtcOffset};
use tracing::Level;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::prelude::*;

/// Re-export the Prometheus-backed metrics recorder so that other crates can
/// depend on a concrete type without repeating the feature gate everywhere.
#[cfg(feature = "prometheus")]
pub use crate::prometheus_impl::{prometheus_http_response, PrometheusMetricsRecorder};

#[cfg(feature = "prometheus")]
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[cfg(feature = "prometheus")]
use hyper::{body::Bytes, Response};

/// Error type for telemetry initialisation failures.
///
/// This is intentionally lightweight so `atelier-telemetry` can be used
/// without depending on `atelier-core`. Callers can map this into their own
/// error types as needed.
#[derive(Debug)]
pub enum TelemetryError {
    /// Provided log level string could not be parsed.
    InvalidLevel(String),

    /// Failed to configure the subscriber (should be rare).
    SubscriberInit(String),
}

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryError::InvalidLevel(level) => {
                write!(f, "invalid log level: {}", level)
            }
            TelemetryError::SubscriberInit(msg) => write!(f, "failed to init telemetry: {}", msg),
        }
    }
}

impl std::error::Error for TelemetryError {}

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Interface for recording site- and payment-level metrics.
///
/// This trait is implemented by whichever metrics backend is compiled in
/// (Prometheus behind the `prometheus` feature, or the no-op recorder). Call
/// sites are wired against the trait so that metrics can be disabled without
/// touching handler code.
pub trait MetricsRecorder: Send + Sync + 'static {
    /// Record a completed HTTP request.
    ///
    /// - `route`: the matched route pattern (e.g. "/api/events/{slug}"),
    ///   never the raw path, so cardinality stays bounded.
    /// - `status`: response status code.
    /// - `latency_secs`: request latency in seconds (optional if not measured).
    fn record_http_request(&self, route: &str, status: u16, latency_secs: Option<f64>);

    /// Record a completed booking and the number of seats it covered.
    fn record_booking(&self, seats: u32);

    /// Record a payment failure.
    ///
    /// - `flow`: "booking" or "gift_card".
    /// - `kind`: a short, stable failure kind (gateway error code, or
    ///   "transport" for network-level failures).
    fn record_payment_failure(&self, flow: &str, kind: &str);

    /// Record an outbound email attempt.
    ///
    /// - `template`: which message was sent (e.g. "booking_confirmation").
    fn record_email(&self, template: &str, success: bool);

    /// Record a content-cache lookup outcome.
    fn record_content_cache(&self, hit: bool);
}

/// A no-op metrics recorder that does nothing.
///
/// This is useful as a default implementation in environments where metrics
/// are not configured or desired.
#[derive(Debug, Clone, Default)]
pub struct NoopMetricsRecorder;

impl MetricsRecorder for NoopMetricsRecorder {
    fn record_http_request(&self, _route: &str, _status: u16, _latency_secs: Option<f64>) {}

    fn record_booking(&self, _seats: u32) {}

    fn record_payment_failure(&self, _flow: &str, _kind: &str) {}

    fn record_email(&self, _template: &str, _success: bool) {}

    fn record_content_cache(&self, _hit: bool) {}
}

#[cfg(feature = "prometheus")]
pub mod prometheus_impl {
    use super::*;

    /// Prometheus HTTP metrics handler.
    ///
    /// This function encodes the given registry into Prometheus' text exposition
    /// format and returns an HTTP response suitable for serving on a `/metrics`
    /// endpoint. The handler itself is agnostic to how the listener is exposed;
    /// that is the daemon's responsibility.
    pub fn prometheus_http_response(registry: &Registry) -> Response<Bytes> {
        let encoder = TextEncoder::new();
        let metric_families = registry.gather();

        let mut buffer = Vec::new();
        if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
            // In case of encoding failure, return a 500 with a simple text body.
            let body = format!("failed to encode Prometheus metrics: {}", err);
            return Response::builder()
                .status(500)
                .header("Content-Type", "text/plain; charset=utf-8")
                .body(Bytes::from(body))
                .unwrap_or_else(|_| Response::new(Bytes::from_static(b"internal error")));
        }

        Response::builder()
            .status(200)
            .header(
                "Content-Type",
                encoder.format_type(), // e.g. "text/plain; version=0.0.4"
            )
            .body(Bytes::from(buffer))
            .unwrap_or_else(|_| Response::new(Bytes::from_static(b"internal error")))
    }

    /// Prometheus-backed metrics recorder and HTTP exporter.
    ///
    /// This is behind the `prometheus` feature flag so that deployments which do
    /// not require metrics do not have to pull in the Prometheus stack.
    #[derive(Clone)]
    pub struct PrometheusMetricsRecorder {
        registry: Registry,
        http_requests_total: IntCounterVec,
        http_request_latency_seconds: HistogramVec,
        bookings_total: IntCounter,
        booked_seats_total: IntCounter,
        payment_failures_total: IntCounterVec,
        emails_total: IntCounterVec,
        content_cache_total: IntCounterVec,
    }

    impl PrometheusMetricsRecorder {
        /// Create a new Prometheus-backed recorder with a fresh registry.
        pub fn new() -> Self {
            let registry = Registry::new();

            let http_requests_total = IntCounterVec::new(
                Opts::new("http_requests_total", "Total HTTP requests served").namespace("atelier"),
                &["route", "status"],
            )
            .expect("failed to create atelier_http_requests_total counter");
            registry
                .register(Box::new(http_requests_total.clone()))
                .expect("failed to register atelier_http_requests_total");

            let http_request_latency_seconds = HistogramVec::new(
                HistogramOpts::new(
                    "http_request_latency_seconds",
                    "HTTP request latency in seconds",
                )
                .namespace("atelier"),
                &["route"],
            )
            .expect("failed to create atelier_http_request_latency_seconds histogram");
            registry
                .register(Box::new(http_request_latency_seconds.clone()))
                .expect("failed to register atelier_http_request_latency_seconds");

            let bookings_total = IntCounter::with_opts(
                Opts::new("bookings_total", "Completed event bookings").namespace("atelier"),
            )
            .expect("failed to create atelier_bookings_total counter");
            registry
                .register(Box::new(bookings_total.clone()))
                .expect("failed to register atelier_bookings_total");

            let booked_seats_total = IntCounter::with_opts(
                Opts::new("booked_seats_total", "Seats sold across all bookings")
                    .namespace("atelier"),
            )
            .expect("failed to create atelier_booked_seats_total counter");
            registry
                .register(Box::new(booked_seats_total.clone()))
                .expect("failed to register atelier_booked_seats_total");

            let payment_failures_total = IntCounterVec::new(
                Opts::new("payment_failures_total", "Declined or failed charges")
                    .namespace("atelier"),
                &["flow", "kind"],
            )
            .expect("failed to create atelier_payment_failures_total counter");
            registry
                .register(Box::new(payment_failures_total.clone()))
                .expect("failed to register atelier_payment_failures_total");

            let emails_total = IntCounterVec::new(
                Opts::new("emails_total", "Outbound email attempts").namespace("atelier"),
                &["template", "success"],
            )
            .expect("failed to create atelier_emails_total counter");
            registry
                .register(Box::new(emails_total.clone()))
                .expect("failed to register atelier_emails_total");

            let content_cache_total = IntCounterVec::new(
                Opts::new("content_cache_requests_total", "Content cache lookups")
                    .namespace("atelier"),
                &["result"],
            )
            .expect("failed to create atelier_content_cache_requests_total counter");
            registry
                .register(Box::new(content_cache_total.clone()))
                .expect("failed to register atelier_content_cache_requests_total");

            Self {
                registry,
                http_requests_total,
                http_request_latency_seconds,
                bookings_total,
                booked_seats_total,
                payment_failures_total,
                emails_total,
                content_cache_total,
            }
        }

        /// The registry backing this recorder, for the `/metrics` handler.
        pub fn registry(&self) -> &Registry {
            &self.registry
        }
    }

    impl Default for PrometheusMetricsRecorder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MetricsRecorder for PrometheusMetricsRecorder {
        fn record_http_request(&self, route: &str, status: u16, latency_secs: Option<f64>) {
            self.http_requests_total
                .with_label_values(&[route, &status.to_string()])
                .inc();

            if let Some(lat) = latency_secs {
                self.http_request_latency_seconds
                    .with_label_values(&[route])
                    .observe(lat);
            }
        }

        fn record_booking(&self, seats: u32) {
            self.bookings_total.inc();
            self.booked_seats_total.inc_by(u64::from(seats));
        }

        fn record_payment_failure(&self, flow: &str, kind: &str) {
            self.payment_failures_total
                .with_label_values(&[flow, kind])
                .inc();
        }

        fn record_email(&self, template: &str, success: bool) {
            let success_label = if success { "true" } else { "false" };
            self.emails_total
                .with_label_values(&[template, success_label])
                .inc();
        }

        fn record_content_cache(&self, hit: bool) {
            let result = if hit { "hit" } else { "miss" };
            self.content_cache_total.with_label_values(&[result]).inc();
        }
    }
}

/// Initialise the global telemetry / logging subscriber.
///
/// This sets up a `tracing_subscriber` using `EnvFilter` and a formatted
/// output layer. It is intended to be called once at process startup
/// (typically from `main` in the daemon).
///
/// # Parameters
///
/// - `level`: Optional log level string. If `None`, the function will:
///   - Respect `RUST_LOG` if it is set, or
///   - Default to `"info"` otherwise.
///   If `Some(level)` is provided, it takes precedence over `RUST_LOG`.
///
/// # Behavior
///
/// - Logs are formatted with timestamps, level, and target.
/// - A single global subscriber is installed. Calling `init` more than once
///   returns an error from the underlying registry.
pub fn init(level: Option<&str>) -> Result<()> {
    // Determine the effective filter string:
    //
    // - If an explicit level is provided, use that (e.g. "info", "debug").
    // - Otherwise:
    //   - If RUST_LOG is set, let EnvFilter parse it.
    //   - Else default to "info".
    let filter = if let Some(level_str) = level {
        parse_level_filter(level_str)?
    } else if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("info")
    };

    // Build a text formatter with timestamps, level, and target (module path).
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(OffsetTime::new(
            // Use local time with offset; falls back to UTC if offset cannot be determined.
            UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            format_description::parse(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z",
            )
            .unwrap_or_else(|_| {
                // Fallback to a very simple format if the description cannot be parsed.
                format_description::parse("[hour]:[minute]:[second]").unwrap()
            }),
        ));

    // Compose registry + filter + formatter.
    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);

    // Install as global subscriber.
    subscriber
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    Ok(())
}

/// Parse a simple level string into an `EnvFilter`.
///
/// Supports both plain levels ("info", "debug", etc.) and full `EnvFilter`
/// expressions (like "info,atelierd=debug").
///
/// The heuristic is:
/// - If the string parses cleanly as a `Level`, we use it as a simple
///   global filter (`EnvFilter::new(level_str)`).
/// - Otherwise, we treat the string as an `EnvFilter` expression and let
///   `EnvFilter::builder()` handle it.
fn parse_level_filter(level_str: &str) -> Result<EnvFilter> {
    // First try to parse as a simple Level.
    if Level::from_str(level_str).is_ok() {
        return Ok(EnvFilter::new(level_str));
    }

    // Fallback: treat as a full EnvFilter expression, e.g. "info,atelierd=debug".
    EnvFilter::builder()
        .parse(level_str)
        .map_err(|e| TelemetryError::InvalidLevel(format!("{} ({})", level_str, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_level() {
        let f = parse_level_filter("info").expect("should parse info level");
        // EnvFilter doesn't expose a simple way to inspect internal rules,
        // but successful construction is enough for this test.
        let _ = f;
    }

    #[test]
    fn parse_full_expression() {
        let f = parse_level_filter("info,atelierd=debug").expect("should parse expression");
        let _ = f;
    }

    #[test]
    fn noop_metrics_recorder_does_not_panic() {
        let recorder = NoopMetricsRecorder::default();

        recorder.record_http_request("/api/events", 200, Some(0.012));
        recorder.record_booking(2);
        recorder.record_payment_failure("booking", "card_declined");
        recorder.record_email("booking_confirmation", true);
        recorder.record_content_cache(true);
    }

    // Note: `EnvFilter` is intentionally permissive and accepts many strings as
    // valid filter expressions, so we do not assert on specific rejection
    // behavior here. The important cases are covered by the positive parsing
    // tests above.
}
