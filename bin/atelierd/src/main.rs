use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{ArgAction, Parser};

use atelier_auth::{GoogleOAuth, SessionManager};
use atelier_cms::{CmsClient, ContentCache};
use atelier_config::{load_default, load_from_path, AtelierConfig};
use atelier_core::AtelierError;
use atelier_mail::{ConsoleMailer, Mailer, SmtpMailer};
use atelier_payments::PaymentsClient;
use atelier_server::state::AppState;
use atelier_server::{AtelierServer, ServerConfig};
use atelier_store::{EventStore, InquiryStore, PaymentErrorStore, SessionStore, StoreClient};
use atelier_telemetry::MetricsRecorder;

/// atelierd - atelier site daemon
///
/// atelierd is responsible for:
/// - Parsing basic CLI arguments
/// - Loading configuration via `atelier-config`
/// - Wiring the hosted-service adapters (CMS, document store, payment
///   gateway, SMTP, Google OAuth) into the HTTP server and running it
///
/// Configuration discovery rules:
/// 1. If `--config PATH` (or `-c PATH`) is provided, that path is used.
/// 2. Otherwise, `atelier_config::load_default()` is used, which probes:
///    - `/etc/atelier/atelier.toml`
///    - `./atelier.toml`
///
/// No atelier-specific environment variables are used for configuration.
#[derive(Debug, Parser)]
#[command(
    name = "atelierd",
    version,
    about = "atelier site daemon",
    long_about = "atelierd serves the art studio's public site API and the Google-OAuth-gated admin dashboard, backed by the hosted CMS, document store, and payment gateway.",
    disable_help_subcommand = true
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When provided, this path is used instead of the default search locations.
    /// Long form (`--config`) is preferred in docs and examples; `-c` is a
    /// short-form alias for interactive use.
    #[arg(long = "config", short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log level for atelierd (overrides RUST_LOG if set).
    ///
    /// Accepts standard tracing levels (trace, debug, info, warn, error) or a
    /// full filter expression (e.g. "info,atelierd=debug").
    #[arg(long = "log-level", short = 'L', value_name = "LEVEL")]
    log_level: Option<String>,

    /// Print loaded configuration summary and exit without starting the daemon.
    ///
    /// This is primarily useful for debugging configuration issues.
    #[arg(long = "print-config", action = ArgAction::SetTrue)]
    print_config: bool,

    /// Optional address for the HTTP server to bind on.
    ///
    /// Overrides the `[server]` section of the configuration file.
    #[arg(long = "bind-addr", value_name = "ADDR")]
    bind_addr: Option<String>,

    /// Validate configuration and exit without starting the daemon.
    ///
    /// This is useful for CI and deployment pipelines to ensure configuration
    /// is structurally sound before rollout.
    #[arg(long = "check-config", action = ArgAction::SetTrue)]
    check_config: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialise telemetry as early as possible so subsequent logs use the
    // configured subscriber. CLI-provided log level, if any, takes precedence
    // over RUST_LOG.
    if let Err(err) = atelier_telemetry::init(cli.log_level.as_deref()) {
        eprintln!("atelierd: failed to initialise telemetry: {}", err);
        process::exit(1);
    }

    let config_result: Result<AtelierConfig, AtelierError> = if let Some(ref path) = cli.config {
        match load_from_path(path) {
            Ok(cfg) => {
                tracing::info!("loaded configuration from {}", path.display());
                Ok(cfg)
            }
            Err(err) => {
                tracing::error!(
                    "failed to load configuration from {}: {}",
                    path.display(),
                    err
                );
                Err(err)
            }
        }
    } else {
        match load_default() {
            Ok(cfg) => {
                tracing::info!("loaded configuration from default locations");
                Ok(cfg)
            }
            Err(err) => {
                tracing::error!("failed to load configuration from default locations: {err}");
                Err(err)
            }
        }
    };

    let config = match config_result {
        Ok(cfg) => cfg,
        Err(_) => {
            // Error already printed above; exit with a non-zero status code.
            process::exit(1);
        }
    };

    // Perform structural validation before any further processing.
    if let Err(err) = config.validate() {
        tracing::error!("configuration validation failed: {}", err);
        process::exit(1);
    }

    if cli.check_config {
        // Configuration loaded and validated successfully; exit cleanly.
        tracing::info!("configuration is valid");
        return;
    }

    if cli.print_config {
        print_config_summary(&config);
        return;
    }

    let bind_addr = match resolve_bind_addr(&cli, &config) {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!("invalid bind address: {}", err);
            process::exit(1);
        }
    };

    let state = build_state(&config);
    let server = AtelierServer::new(ServerConfig { bind_addr }, state);

    tracing::info!("starting atelier HTTP server on {}", bind_addr);

    if let Err(err) = run_server_blocking(server) {
        tracing::error!("atelier HTTP server terminated with error: {}", err);
        process::exit(1);
    }
}

/// Wire every hosted-service adapter into the shared application state.
fn build_state(config: &AtelierConfig) -> AppState {
    let store = Arc::new(StoreClient::new(
        config.store.base_url.clone(),
        config.store.api_key.clone(),
        config.store.database.clone(),
    ));

    let cms = CmsClient::new(
        config.cms.base_url.clone(),
        config.cms.api_key.clone(),
        config.cms.space.clone(),
    );

    #[cfg(feature = "prometheus")]
    let prometheus = Arc::new(atelier_telemetry::PrometheusMetricsRecorder::new());

    #[cfg(feature = "prometheus")]
    let metrics: Arc<dyn MetricsRecorder> = prometheus.clone();

    #[cfg(not(feature = "prometheus"))]
    let metrics: Arc<dyn MetricsRecorder> = Arc::new(atelier_telemetry::NoopMetricsRecorder);

    // The home page is the hot content path; everything else reads through.
    let home_cache = Arc::new(
        ContentCache::new(cms.page_fetcher("home")).with_metrics(Arc::clone(&metrics)),
    );

    let (mailer, notify_email): (Arc<dyn Mailer>, String) = match &config.mail {
        Some(mail) => (
            Arc::new(SmtpMailer::new(
                mail.smtp_host.clone(),
                mail.smtp_port,
                mail.username.clone(),
                mail.password.clone(),
                mail.from_email.clone(),
                mail.from_name.clone(),
            )),
            mail.notify_email.clone(),
        ),
        None => {
            tracing::warn!("no [mail] section configured; using console email transport");
            (Arc::new(ConsoleMailer), "studio@localhost".to_string())
        }
    };

    let sessions = SessionManager::new(
        SessionStore::new(Arc::clone(&store)),
        config.auth.admin_emails.clone(),
        config.auth.session_ttl_hours,
    );

    let oauth = GoogleOAuth::new(
        config.auth.google_client_id.clone(),
        config.auth.google_client_secret.clone(),
        config.auth.redirect_url.clone(),
    );

    let payments = PaymentsClient::new(
        config.payments.base_url.clone(),
        config.payments.api_key.clone(),
        config.payments.currency.clone(),
    );

    AppState {
        cms,
        home_cache,
        events: EventStore::new(Arc::clone(&store)),
        inquiries: InquiryStore::new(Arc::clone(&store)),
        payment_errors: PaymentErrorStore::new(Arc::clone(&store)),
        sessions,
        oauth,
        payments,
        mailer,
        notify_email,
        session_ttl_hours: config.auth.session_ttl_hours,
        metrics,
        #[cfg(feature = "prometheus")]
        prometheus,
    }
}

/// Resolve the bind address for the HTTP server.
///
/// Priority:
/// 1. `--bind-addr` CLI flag if provided.
/// 2. `[server].listen_addr` + `[server].listen_port` from configuration,
///    defaulting to 0.0.0.0.
fn resolve_bind_addr(cli: &Cli, cfg: &AtelierConfig) -> Result<SocketAddr, String> {
    if let Some(addr_str) = cli.bind_addr.as_deref() {
        return addr_str
            .parse::<SocketAddr>()
            .map_err(|e| format!("failed to parse --bind-addr '{}': {}", addr_str, e));
    }

    let host = cfg.server.listen_addr.as_deref().unwrap_or("0.0.0.0");
    let addr = format!("{}:{}", host, cfg.server.listen_port);
    addr.parse::<SocketAddr>()
        .map_err(|e| format!("failed to parse [server] address '{}': {}", addr, e))
}

/// Run the atelier HTTP server using a Tokio runtime.
///
/// This helper exists so `main` can remain synchronous while the server
/// runs asynchronously under the hood.
fn run_server_blocking(server: AtelierServer) -> anyhow::Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async move { server.run().await })?;

    Ok(())
}

/// Print a concise summary of the loaded configuration.
///
/// Secrets (API keys, the OAuth client secret, SMTP password) are redacted;
/// only their presence is reported.
fn print_config_summary(cfg: &AtelierConfig) {
    println!("atelierd configuration summary:");

    println!(
        "  server.listen_addr       = {}",
        cfg.server.listen_addr.as_deref().unwrap_or("0.0.0.0")
    );
    println!("  server.listen_port       = {}", cfg.server.listen_port);

    println!("  cms.base_url             = {}", cfg.cms.base_url);
    println!("  cms.space                = {}", cfg.cms.space);
    println!("  cms.api_key              = {}", redact(&cfg.cms.api_key));

    println!("  store.base_url           = {}", cfg.store.base_url);
    println!("  store.database           = {}", cfg.store.database);
    println!("  store.api_key            = {}", redact(&cfg.store.api_key));

    println!("  payments.base_url        = {}", cfg.payments.base_url);
    println!("  payments.currency        = {}", cfg.payments.currency);
    println!(
        "  payments.api_key         = {}",
        redact(&cfg.payments.api_key)
    );

    match &cfg.mail {
        Some(mail) => {
            println!(
                "  mail.smtp_host           = {}:{}",
                mail.smtp_host, mail.smtp_port
            );
            println!("  mail.from                = {} <{}>", mail.from_name, mail.from_email);
            println!("  mail.notify_email        = {}", mail.notify_email);
            println!("  mail.password            = {}", redact(&mail.password));
        }
        None => println!("  mail                     = <console transport>"),
    }

    println!(
        "  auth.google_client_id    = {}",
        cfg.auth.google_client_id
    );
    println!(
        "  auth.google_client_secret = {}",
        redact(&cfg.auth.google_client_secret)
    );
    println!("  auth.redirect_url        = {}", cfg.auth.redirect_url);
    println!(
        "  auth.admin_emails        = [{}]",
        cfg.auth.admin_emails.join(", ")
    );
    println!(
        "  auth.session_ttl_hours   = {}",
        cfg.auth.session_ttl_hours
    );
}

fn redact(secret: &str) -> &'static str {
    if secret.trim().is_empty() {
        "<not set>"
    } else {
        "<set>"
    }
}
