//! Session resolution and the request gate.
//!
//! Handlers never see cookies. A route that requires authentication takes a
//! [`Principal`] argument, a route that merely reacts to it takes an
//! `Option<Principal>`, and this module does the rest: parse the cookie
//! header, verify the signed token, look up the session record, resolve the
//! principal.
//!
//! Every unauthenticated shape (no cookie, tampered cookie, unknown or
//! expired session, uncached principal) denies identically, so a probing
//! client learns nothing about which check failed. Only a session store
//! outage reports differently, as 503.

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{HeaderMap, header, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, instrument, trace};
use uuid::Uuid;

use crate::AppState;
use crate::api::models::principals::Principal;
use crate::auth::token;
use crate::config::Config;
use crate::errors::{Error, Result};

/// Route unauthenticated browsers are sent to. Starting a login is the only
/// useful next step for them.
const LOGIN_ROUTE: &str = "/auth/google";

/// Rejection produced when a gated route denies a request.
///
/// Browser-style requests get a redirect to the login route, API clients get
/// the JSON denial from [`Error`].
#[derive(Debug)]
pub enum GateRejection {
    Redirect(Redirect),
    Error(Error),
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            GateRejection::Redirect(redirect) => redirect.into_response(),
            GateRejection::Error(error) => error.into_response(),
        }
    }
}

/// Extract the session id referenced by the request's cookies.
///
/// Scans every cookie with the configured name and returns the first whose
/// signature verifies. An unverifiable cookie is treated exactly like no
/// cookie.
#[instrument(skip(headers, config))]
pub fn session_id_from_cookies(headers: &HeaderMap, config: &Config) -> Option<Uuid> {
    let cookie_header = headers.get(header::COOKIE)?;
    let Ok(cookie_str) = cookie_header.to_str() else {
        trace!("Cookie header is not valid UTF-8, treating as absent");
        return None;
    };

    let cookie_name = &config.session.cookie_name;
    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == cookie_name {
                match token::verify_cookie_token(value, &config.session) {
                    Ok(session_id) => return Some(session_id),
                    Err(_) => {
                        // Unverifiable, try any remaining cookies
                        continue;
                    }
                }
            }
        }
    }

    None
}

/// Resolve the request's cookies to a principal.
///
/// `Ok(None)` covers every unauthenticated shape. Only infrastructure
/// faults, meaning session store errors, surface as `Err`.
async fn resolve_principal(headers: &HeaderMap, state: &AppState) -> Result<Option<Principal>> {
    let Some(session_id) = session_id_from_cookies(headers, &state.config) else {
        return Ok(None);
    };

    let Some(record) = state.session_store.get(session_id).await? else {
        trace!("Cookie references an unknown session");
        return Ok(None);
    };

    // Stores without their own eviction may hand back lapsed records
    if record.is_expired() {
        trace!("Cookie references an expired session");
        return Ok(None);
    }

    match state.serializer.deserialize(&record).await {
        Some(principal) => Ok(Some(principal)),
        None => {
            debug!("Session {} references a subject that is no longer cached", record.id);
            Ok(None)
        }
    }
}

/// Pick the denial shape from the request's Accept header.
fn deny(headers: &HeaderMap) -> GateRejection {
    let wants_html = headers
        .get(header::ACCEPT)
        .and_then(|accept| accept.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"));

    if wants_html {
        GateRejection::Redirect(Redirect::to(LOGIN_ROUTE))
    } else {
        GateRejection::Error(Error::Unauthenticated { message: None })
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = GateRejection;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, GateRejection> {
        match resolve_principal(&parts.headers, state).await {
            Ok(Some(principal)) => {
                debug!("Resolved session principal: {}", principal.id);
                Ok(principal)
            }
            Ok(None) => {
                trace!("No resolvable session on request");
                Err(deny(&parts.headers))
            }
            Err(e) => Err(GateRejection::Error(e)),
        }
    }
}

impl OptionalFromRequestParts<AppState> for Principal {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Option<Self>, Error> {
        resolve_principal(&parts.headers, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::SessionRecord;
    use crate::test_utils::{
        create_test_principal, create_test_state, create_test_state_with_broken_store,
        establish_test_session,
    };
    use axum::http::StatusCode;
    use chrono::Utc;
    use std::time::Duration;

    fn create_parts_with_headers(headers: &[(&str, &str)]) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/test");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    async fn extract_required(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Principal, GateRejection> {
        <Principal as FromRequestParts<AppState>>::from_request_parts(parts, state).await
    }

    async fn extract_optional(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Option<Principal>, Error> {
        <Principal as OptionalFromRequestParts<AppState>>::from_request_parts(parts, state).await
    }

    #[tokio::test]
    async fn test_valid_cookie_resolves_principal() {
        let state = create_test_state();
        let cookie = establish_test_session(&state).await;
        let mut parts = create_parts_with_headers(&[("cookie", &cookie)]);

        let principal = extract_required(&mut parts, &state).await.unwrap();

        assert_eq!(principal.id, "42");
        assert_eq!(principal.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_missing_cookie_denies_with_json() {
        let state = create_test_state();
        let mut parts = create_parts_with_headers(&[]);

        let rejection = extract_required(&mut parts, &state).await.unwrap_err();
        let response = rejection.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_tampered_cookie_denies_like_no_cookie() {
        let state = create_test_state();
        let cookie = establish_test_session(&state).await;
        let tampered = format!("{}-tampered", cookie);
        let mut parts = create_parts_with_headers(&[("cookie", &tampered)]);

        let rejection = extract_required(&mut parts, &state).await.unwrap_err();
        let response = rejection.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_html_requests_are_redirected_to_login() {
        let state = create_test_state();
        let mut parts = create_parts_with_headers(&[(
            "accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )]);

        let rejection = extract_required(&mut parts, &state).await.unwrap_err();
        let response = rejection.into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/google"
        );
    }

    #[tokio::test]
    async fn test_valid_token_for_unknown_session_denies() {
        let state = create_test_state();
        // Properly signed cookie, but nothing in the store to match it
        let token = token::create_cookie_token(Uuid::new_v4(), &state.config.session).unwrap();
        let cookie = format!("{}={}", state.config.session.cookie_name, token);
        let mut parts = create_parts_with_headers(&[("cookie", &cookie)]);

        let rejection = extract_required(&mut parts, &state).await.unwrap_err();
        let response = rejection.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_lapsed_record_denies() {
        let state = create_test_state();
        let principal = create_test_principal();
        let now = Utc::now();
        let record = SessionRecord {
            id: Uuid::new_v4(),
            subject: principal.id.clone(),
            created_at: now - Duration::from_secs(7200),
            expires_at: now - Duration::from_secs(3600),
        };
        state.session_store.insert(record.clone()).await.unwrap();

        let token = token::create_cookie_token(record.id, &state.config.session).unwrap();
        let cookie = format!("{}={}", state.config.session.cookie_name, token);
        let mut parts = create_parts_with_headers(&[("cookie", &cookie)]);

        let rejection = extract_required(&mut parts, &state).await.unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_uncached_subject_denies_instead_of_erroring() {
        let state = create_test_state();
        let now = Utc::now();
        // Record is live but its subject was never cached
        let record = SessionRecord {
            id: Uuid::new_v4(),
            subject: "evicted-subject".to_string(),
            created_at: now,
            expires_at: now + Duration::from_secs(3600),
        };
        state.session_store.insert(record.clone()).await.unwrap();

        let token = token::create_cookie_token(record.id, &state.config.session).unwrap();
        let cookie = format!("{}={}", state.config.session.cookie_name, token);
        let mut parts = create_parts_with_headers(&[("cookie", &cookie)]);

        let rejection = extract_required(&mut parts, &state).await.unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_store_outage_is_reported_not_denied() {
        let state = create_test_state_with_broken_store();
        let token = token::create_cookie_token(Uuid::new_v4(), &state.config.session).unwrap();
        let cookie = format!("{}={}", state.config.session.cookie_name, token);
        let mut parts = create_parts_with_headers(&[("cookie", &cookie)]);

        let rejection = extract_required(&mut parts, &state).await.unwrap_err();
        let response = rejection.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_optional_extractor_yields_none_without_session() {
        let state = create_test_state();
        let mut parts = create_parts_with_headers(&[]);

        let resolved = extract_optional(&mut parts, &state).await.unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_optional_extractor_yields_principal_with_session() {
        let state = create_test_state();
        let cookie = establish_test_session(&state).await;
        let mut parts = create_parts_with_headers(&[("cookie", &cookie)]);

        let resolved = extract_optional(&mut parts, &state).await.unwrap();
        assert_eq!(resolved.unwrap().id, "42");
    }

    #[tokio::test]
    async fn test_optional_extractor_propagates_store_outage() {
        let state = create_test_state_with_broken_store();
        let token = token::create_cookie_token(Uuid::new_v4(), &state.config.session).unwrap();
        let cookie = format!("{}={}", state.config.session.cookie_name, token);
        let mut parts = create_parts_with_headers(&[("cookie", &cookie)]);

        let result = extract_optional(&mut parts, &state).await;
        assert!(matches!(result.unwrap_err(), Error::SessionStore { .. }));
    }

    #[tokio::test]
    async fn test_cookie_scan_skips_unrelated_and_broken_cookies() {
        let state = create_test_state();
        let cookie = establish_test_session(&state).await;
        let cookie_name = &state.config.session.cookie_name;
        // Unrelated cookie, then a corrupted session cookie, then the real one
        let header_value = format!("theme=dark; {cookie_name}=garbage; {cookie}");
        let mut parts = create_parts_with_headers(&[("cookie", &header_value)]);

        let principal = extract_required(&mut parts, &state).await.unwrap();
        assert_eq!(principal.id, "42");
    }

    #[test]
    fn test_session_id_from_cookies_without_header() {
        let state = create_test_state();
        let headers = HeaderMap::new();
        assert_eq!(session_id_from_cookies(&headers, &state.config), None);
    }
}
