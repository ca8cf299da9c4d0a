use axum::Json;
use tracing::debug;

use crate::api::models::auth::ProfileResponse;
use crate::api::models::principals::Principal;

/// The session-gated profile confirmation
#[utoipa::path(
    get,
    path = "/profile",
    tag = "profile",
    responses(
        (status = 200, description = "An authenticated session exists", body = ProfileResponse),
        (status = 303, description = "Browser clients without a session are sent to the login route"),
        (status = 401, description = "No authenticated session"),
        (status = 503, description = "Session store unavailable"),
    ),
    security(
        ("session_cookie" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_profile(principal: Principal) -> Json<ProfileResponse> {
    debug!("Serving profile for subject {}", principal.id);

    Json(ProfileResponse {
        message: "Welcome to your profile!".to_string(),
    })
}
