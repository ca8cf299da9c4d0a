//! # gymctl: Gym Control Layer
//!
//! `gymctl` is the login and session backend for the gym management platform. It signs members
//! in through Google, keeps their sessions on the server, and gates the platform's routes behind
//! a signed session cookie.
//!
//! ## Overview
//!
//! `gymctl` sits between the browser frontend and Google's OAuth2 endpoints. The frontend never
//! sees provider credentials or token exchanges; it sends the browser to `/auth/google`, and
//! `gymctl` runs the consent dance, establishes a server-side session, and hands the browser a
//! signed HttpOnly cookie that references it. From then on the cookie is the only credential a
//! client carries, and the server remains free to revoke any session at any time.
//!
//! ### What It Does
//!
//! At its core, `gymctl` redirects login attempts to the Google consent screen with a one-time
//! state token, validates the callback, exchanges the authorization code for an access token,
//! fetches the member's profile, and stores a session record keyed by an opaque id. Requests to
//! gated routes resolve that id from the cookie back to a principal. Outcome routes report the
//! login result as JSON for the frontend, and logout deletes the record and expires the cookie.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer.
//! Sessions and one-time login state tokens live in in-process TTL caches, so a single instance
//! needs no external storage; the [`auth::store::SessionStore`] trait is the seam a shared
//! backend would plug into.
//!
//! ### Request Flow
//!
//! A login starts at `/auth/google`, which stores a fresh state token and 303-redirects to the
//! consent screen. Google sends the browser back to `/auth/google/callback`, where the state
//! token is consumed exactly once, the code is exchanged, and a session is established before
//! the browser is forwarded to the configured frontend URL. Gated requests carry the session
//! cookie; the extractors in [`auth::gate`] verify its signature, look up the session record,
//! and resolve the principal before the handler runs. Unauthenticated browser requests are
//! redirected back into the login flow, API clients get JSON denials.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the login flow routes at the root along with the gated
//! profile route, all documented with OpenAPI annotations and served interactively at `/docs`.
//!
//! The **authentication layer** ([`auth`]) owns the provider client, the session store, the
//! cookie token codec, and the request gate. Each piece is independent: the provider talks to
//! Google, the store holds session records, and the gate ties them together per request.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use gymctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = gymctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging)
//!     gymctl::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config)?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
mod openapi;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use crate::{
    auth::provider::{GoogleProvider, IdentityProvider},
    auth::serializer::SessionSerializer,
    auth::store::{MemorySessionStore, SessionStore},
    config::CorsOrigin,
    openapi::ApiDoc,
};
use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, routing::get};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Baseline Content-Security-Policy attached to every response.
///
/// The API serves JSON and redirects, so everything stays locked to 'self';
/// the frontend is a separate deployment with its own policy.
const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; base-uri 'self'; font-src 'self' https: data:; \
     form-action 'self'; frame-ancestors 'self'; img-src 'self' data:; object-src 'none'; \
     script-src 'self'; script-src-attr 'none'; style-src 'self' https: 'unsafe-inline'; \
     upgrade-insecure-requests";

/// Application state shared across all request handlers.
///
/// This struct contains all the shared resources needed by the API handlers:
/// the configuration, the session store, the principal cache, and the
/// identity provider client. The store and provider sit behind trait objects
/// so tests and alternative backends can swap them out.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .session_store(store)
///     .serializer(serializer)
///     .identity_provider(provider)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub session_store: Arc<dyn SessionStore>,
    pub serializer: SessionSerializer,
    pub identity_provider: Arc<dyn IdentityProvider>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            // Browsers send the bare origin, not the normalized URL with its
            // trailing slash, so match on the origin serialization
            CorsOrigin::Url(url) => url.origin().ascii_serialization().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut exposed_headers = Vec::new();
    for name in &config.cors.exposed_headers {
        exposed_headers.push(name.parse::<header::HeaderName>()?);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .expose_headers(exposed_headers);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Login flow routes (initiation, callback, outcome, logout)
/// - The session-gated profile route
/// - Health check and interactive API documentation
/// - CORS and security header configuration
/// - Tracing middleware
///
/// # Errors
///
/// Returns an error if the CORS configuration cannot be turned into header
/// values.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Login flow routes (at root level, browser facing)
    let auth_routes = Router::new()
        .route("/auth/google", get(api::handlers::auth::login_with_google))
        .route(
            "/auth/google/callback",
            get(api::handlers::auth::google_callback),
        )
        .route("/login/success", get(api::handlers::auth::login_success))
        .route("/login/failed", get(api::handlers::auth::login_failed))
        .route("/logout", get(api::handlers::auth::logout))
        .with_state(state.clone());

    // Routes behind the session gate
    let gated_routes = Router::new()
        .route("/profile", get(api::handlers::profile::get_profile))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(auth_routes)
        .merge(gated_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    // Baseline security headers on every response
    let router = router
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ));

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] wires the provider client, the session
///    store, and the router from configuration
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: When the shutdown signal resolves, in-flight requests
///    drain before the server exits
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting gym control layer with configuration: {:#?}", config);

        let identity_provider = Arc::new(GoogleProvider::new(&config.oauth)?);
        let session_store = Arc::new(MemorySessionStore::new(config.session.timeout));
        let serializer = SessionSerializer::new(config.session.timeout);

        let state = AppState::builder()
            .config(config.clone())
            .session_store(session_store)
            .serializer(serializer)
            .identity_provider(identity_provider)
            .build();

        let router = build_router(&state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Gym control layer listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
