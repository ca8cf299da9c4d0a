//! Request and response models for the login flow routes.

use axum::{
    http::{HeaderValue, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};

use crate::api::models::principals::Principal;
use crate::errors::Error;

/// Query parameters Google appends when redirecting back to the callback.
///
/// All fields are optional on the wire: consent denials carry `error` and no
/// `code`, completed consents carry `code` and `state`.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackQuery {
    /// Authorization code issued on user consent
    pub code: Option<String>,
    /// Login state token echoed back from the initiation redirect
    pub state: Option<String>,
    /// Provider error code when consent was denied or failed
    pub error: Option<String>,
}

/// Body returned by `/login/success` when an authenticated session exists.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginSuccessResponse {
    /// Always `true` on this route
    pub success: bool,
    /// Human-readable outcome description
    pub message: String,
    /// The authenticated principal
    pub user: Principal,
    /// Provider access token captured at login
    pub token: String,
}

/// Body returned when authentication is missing or has failed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginFailureResponse {
    /// Always `false` on this route
    pub success: bool,
    /// Human-readable outcome description
    pub message: String,
}

/// Confirmation body for the session-gated profile route.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub message: String,
}

/// A browser redirect that may also set or clear the session cookie.
///
/// Used by the callback and logout routes, which talk to browsers rather
/// than API clients and report their outcome via `Location`.
#[derive(Debug)]
pub struct SessionRedirect {
    pub location: Url,
    pub cookie: Option<String>,
}

impl SessionRedirect {
    pub fn new(location: &Url) -> Self {
        Self {
            location: location.clone(),
            cookie: None,
        }
    }

    pub fn with_cookie(location: &Url, cookie: String) -> Self {
        Self {
            location: location.clone(),
            cookie: Some(cookie),
        }
    }
}

impl IntoResponse for SessionRedirect {
    fn into_response(self) -> Response {
        let mut response = Redirect::to(self.location.as_str()).into_response();

        if let Some(cookie) = self.cookie {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    response.headers_mut().insert(header::SET_COOKIE, value);
                }
                Err(e) => {
                    return Error::Internal {
                        operation: format!("encode session cookie header: {e}"),
                    }
                    .into_response();
                }
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_redirect_without_cookie() {
        let url = Url::parse("http://localhost:3030/login").unwrap();
        let response = SessionRedirect::new(&url).into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "http://localhost:3030/login"
        );
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_redirect_with_cookie() {
        let url = Url::parse("http://localhost:3030/welcome").unwrap();
        let response =
            SessionRedirect::with_cookie(&url, "gymctl_session=abc; Path=/".to_string())
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(header::SET_COOKIE).unwrap(),
            "gymctl_session=abc; Path=/"
        );
    }

    #[test]
    fn test_callback_query_accepts_partial_parameters() {
        let query: CallbackQuery = serde_urlencoded::from_str("error=access_denied").unwrap();
        assert!(query.code.is_none());
        assert_eq!(query.error.as_deref(), Some("access_denied"));

        let query: CallbackQuery = serde_urlencoded::from_str("code=abc123&state=xyz").unwrap();
        assert_eq!(query.code.as_deref(), Some("abc123"));
        assert_eq!(query.state.as_deref(), Some("xyz"));
        assert!(query.error.is_none());
    }
}
