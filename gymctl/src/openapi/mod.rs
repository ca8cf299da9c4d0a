//! OpenAPI documentation configuration.
//!
//! Defines [`ApiDoc`], the OpenAPI document for the login flow and the gated
//! routes. Served interactively at `/docs` and as JSON at
//! `/api-docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::api;

/// Registers the session cookie as the API's security scheme.
struct SessionCookieAddon;

impl Modify for SessionCookieAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "session_cookie".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "gymctl_session",
                    "Signed session cookie established by the Google login flow.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SessionCookieAddon),
    paths(
        api::handlers::auth::login_with_google,
        api::handlers::auth::google_callback,
        api::handlers::auth::login_success,
        api::handlers::auth::login_failed,
        api::handlers::auth::logout,
        api::handlers::profile::get_profile,
    ),
    components(
        schemas(
            api::models::principals::Principal,
            api::models::auth::LoginSuccessResponse,
            api::models::auth::LoginFailureResponse,
            api::models::auth::ProfileResponse,
        )
    ),
    tags(
        (name = "authentication", description = "Google login flow and session lifecycle.

Start a login with `GET /auth/google`, which redirects to the Google consent
screen. The callback establishes a server-side session and hands the browser
a signed HttpOnly cookie. The outcome routes report the result as JSON for
the frontend, and `/logout` tears the session down again."),
        (name = "profile", description = "Session-gated routes.

These respond only to requests carrying a valid session cookie. Browser
clients without one are redirected to the login flow, API clients get 401."),
    ),
    info(
        title = "Gym Control Layer API",
        version = "0.1.0",
        description = "Google login and session backend for the gym management platform.

## Authentication

All gated endpoints authenticate via the `gymctl_session` cookie, which is
set by the login flow and cleared by `/logout`. There is no bearer token
surface; the raw provider access token is only reported once, by
`/login/success`.",
    ),
)]
pub struct ApiDoc;
