//! Carrito storefront binary.
//!
//! Serves the server-rendered shop on `STOREFRONT_HOST:STOREFRONT_PORT`.
//!
//! # Architecture
//!
//! - Axum web framework with HTMX for the cart badge and flyout
//! - Askama templates for server-side rendering
//! - Remote REST backend for products, accounts and orders
//! - tower-sessions for per-visitor state (`PostgreSQL` when
//!   `STOREFRONT_DATABASE_URL` is set, in-memory otherwise)

#![cfg_attr(not(test), forbid(unsafe_code))]

use carrito_storefront::{build_app, config::StorefrontConfig, middleware, state::AppState};
use secrecy::ExposeSecret;
use sentry::integrations::tracing as sentry_tracing;
use sqlx::PgPool;
use tower_sessions::MemoryStore;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "carrito_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // NOTE: the sessions table is NOT created on startup.
    // Run it explicitly via: cargo run -p carrito-cli -- migrate sessions
    let pool = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url.expose_secret())
                .await
                .expect("Failed to create database pool");
            tracing::info!("Session database pool created");
            Some(pool)
        }
        None => {
            tracing::warn!("No session database configured, sessions are in-memory");
            None
        }
    };

    let state =
        AppState::new(config.clone(), pool.clone()).expect("Failed to initialize application state");

    let app = match pool {
        Some(pool) => build_app(
            state,
            middleware::create_session_layer(PostgresStore::new(pool), &config),
        ),
        None => build_app(
            state,
            middleware::create_session_layer(MemoryStore::default(), &config),
        ),
    };

    let addr = config.socket_addr();
    tracing::info!(backend = %config.backend.api_url, "storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
