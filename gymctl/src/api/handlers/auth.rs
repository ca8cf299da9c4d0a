use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use base64::{Engine as _, engine::general_purpose};
use rand::prelude::RngExt;
use rand::rng;
use tracing::{debug, info, warn};

use crate::{
    AppState,
    api::models::{
        auth::{CallbackQuery, LoginFailureResponse, LoginSuccessResponse, SessionRedirect},
        principals::Principal,
    },
    auth::{gate, token},
    config::SessionConfig,
    errors::Error,
};

/// Start the Google login flow
#[utoipa::path(
    get,
    path = "/auth/google",
    tag = "authentication",
    responses(
        (status = 303, description = "Redirect to the Google consent screen"),
        (status = 503, description = "Session store unavailable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_with_google(State(state): State<AppState>) -> Result<SessionRedirect, Error> {
    let login_state = generate_login_state();
    state
        .session_store
        .put_login_state(login_state.clone())
        .await?;

    let consent_url = state.identity_provider.authorization_url(&login_state);
    debug!(
        provider = state.identity_provider.name(),
        "Redirecting to the consent screen"
    );

    Ok(SessionRedirect::new(&consent_url))
}

/// Handle the redirect back from Google
///
/// Every authentication failure sends the browser to the configured failure
/// URL without establishing anything. Only infrastructure faults surface as
/// HTTP errors.
#[utoipa::path(
    get,
    path = "/auth/google/callback",
    tag = "authentication",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Redirect to the configured success or failure URL"),
        (status = 400, description = "Callback carries neither a code nor an error"),
        (status = 503, description = "Session store unavailable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<SessionRedirect, Error> {
    let failure = SessionRedirect::new(&state.config.redirects.failure_url);

    if let Some(error) = query.error {
        warn!("Consent was denied or failed upstream: {error}");
        return Ok(failure);
    }

    let Some(code) = query.code else {
        return Err(Error::BadRequest {
            message: "callback is missing both code and error".to_string(),
        });
    };

    let Some(login_state) = query.state else {
        warn!("Callback carries a code but no state token");
        return Ok(failure);
    };

    // Consume before touching the provider so a replayed or forged state
    // token never triggers a code exchange
    if !state.session_store.consume_login_state(&login_state).await? {
        warn!("Callback state token is unknown, expired, or already used");
        return Ok(failure);
    }

    let principal = match state.identity_provider.authenticate(&code).await {
        Ok(principal) => principal,
        Err(e) => {
            warn!("Authentication with the identity provider failed: {e}");
            return Ok(failure);
        }
    };

    let record = state
        .serializer
        .serialize(&principal, state.config.session.timeout)
        .await;
    state.session_store.insert(record.clone()).await?;

    let cookie_token = token::create_cookie_token(record.id, &state.config.session)?;
    let cookie = create_session_cookie(&cookie_token, &state.config.session);

    info!(
        "Established session {} for subject {}",
        record.id, principal.id
    );

    Ok(SessionRedirect::with_cookie(
        &state.config.redirects.success_url,
        cookie,
    ))
}

/// Report the outcome of a completed login
#[utoipa::path(
    get,
    path = "/login/success",
    tag = "authentication",
    responses(
        (status = 200, description = "An authenticated session exists", body = LoginSuccessResponse),
        (status = 401, description = "No authenticated session", body = LoginFailureResponse),
        (status = 503, description = "Session store unavailable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_success(
    principal: Option<Principal>,
) -> Result<Json<LoginSuccessResponse>, Error> {
    let Some(principal) = principal else {
        return Err(Error::Unauthenticated {
            message: Some("User failed to authenticate.".to_string()),
        });
    };

    Ok(Json(LoginSuccessResponse {
        success: true,
        message: "User has successfully authenticated.".to_string(),
        token: principal.access_token.clone(),
        user: principal,
    }))
}

/// Fixed failure payload the consent flow redirects browsers to
#[utoipa::path(
    get,
    path = "/login/failed",
    tag = "authentication",
    responses(
        (status = 401, description = "Login failed", body = LoginFailureResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login_failed() -> (StatusCode, Json<LoginFailureResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(LoginFailureResponse {
            success: false,
            message: "User failed to authenticate.".to_string(),
        }),
    )
}

/// End the session and send the browser back to the login page
#[utoipa::path(
    get,
    path = "/logout",
    tag = "authentication",
    responses(
        (status = 303, description = "Session ended, redirect to the configured logout URL"),
        (status = 503, description = "Session store unavailable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<SessionRedirect, Error> {
    if let Some(session_id) = gate::session_id_from_cookies(&headers, &state.config) {
        state.session_store.delete(session_id).await?;
        debug!("Deleted session {session_id}");
    }

    let cookie = clear_session_cookie(&state.config.session);
    Ok(SessionRedirect::with_cookie(
        &state.config.redirects.logout_url,
        cookie,
    ))
}

/// A fresh unguessable state token for one login attempt.
fn generate_login_state() -> String {
    // 32 bytes (256 bits) of cryptographically secure random data
    let mut bytes = [0u8; 32];
    rng().fill(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Render the session cookie with the configured attributes.
fn create_session_cookie(token: &str, config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        config.cookie_name,
        token,
        config.cookie_same_site,
        config.timeout.as_secs()
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// An already-expired empty cookie, which makes browsers drop theirs.
fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite={}; Max-Age=0",
        config.cookie_name, config.cookie_same_site
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}
