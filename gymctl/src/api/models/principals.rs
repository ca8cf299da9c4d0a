//! The authenticated identity handed to request handlers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An authenticated identity established by a completed Google login.
///
/// This is what the session layer yields once a request's cookie resolves.
/// The access token is deliberately excluded from the serialized form; the
/// one route that exposes it does so through a dedicated response field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    /// Stable identifier assigned by the identity provider
    pub id: String,
    /// Human-readable name from the provider profile
    pub display_name: String,
    /// Email address from the provider profile
    pub email: String,
    /// Identity provider that vouched for this principal (e.g. "google")
    pub provider: String,
    /// Principal category. Provider logins always produce "user".
    pub kind: String,
    /// Provider access token attached at login
    #[serde(skip)]
    pub access_token: String,
}
