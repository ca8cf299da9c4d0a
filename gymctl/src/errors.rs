//! Error handling for the application.
//!
//! All fallible paths converge on [`Error`], which knows how to render itself
//! as an HTTP response. Client-facing messages are deliberately generic; the
//! detailed cause is logged server-side when the response is built.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Invalid request data
    #[error("{message}")]
    BadRequest { message: String },

    /// An interaction with the identity provider failed during login
    #[error("Identity provider {operation}")]
    Provider { operation: String },

    /// The session store could not serve a read or write
    #[error("Session store {operation}")]
    SessionStore { operation: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } | Error::Provider { .. } => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::SessionStore { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to API consumers. Never includes provider
    /// responses, token material, or store internals.
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message
                .clone()
                .unwrap_or_else(|| "Authentication required".to_string()),
            Error::BadRequest { message } => message.clone(),
            Error::Provider { .. } => "Authentication failed".to_string(),
            Error::SessionStore { .. } => "Session service temporarily unavailable".to_string(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        match &self {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::SessionStore { .. } => {
                tracing::error!("Session store error: {:#}", self);
            }
            Error::Provider { .. } => {
                tracing::warn!("Identity provider error: {}", self);
            }
            Error::Unauthenticated { .. } => {
                tracing::info!("Authentication error: {}", self);
            }
            Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        // Denials reuse the body shape the login status routes speak, so
        // callers can always key off `success`.
        let body = match &self {
            Error::Unauthenticated { .. } | Error::Provider { .. } => json!({
                "success": false,
                "message": self.user_message(),
            }),
            _ => json!({
                "error": { "message": self.user_message() },
            }),
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal { operation: message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
