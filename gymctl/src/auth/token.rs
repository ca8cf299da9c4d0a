//! Signed cookie token creation and verification.
//!
//! The cookie is a reference, not a record: its only payload is the opaque
//! session id. Everything known about the caller stays server side, so a
//! captured cookie reveals nothing and a tampered one fails signature
//! verification.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::errors::{Error, Result};

/// Claims carried by the session cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct CookieClaims {
    pub sid: Uuid, // Session id
    pub exp: i64,  // Expiration time
    pub iat: i64,  // Issued at
}

/// Sign a cookie token referencing an established session.
pub fn create_cookie_token(session_id: Uuid, config: &SessionConfig) -> Result<String> {
    let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
        operation: "session cookies: secret_key is required".to_string(),
    })?;

    let now = Utc::now();
    let exp = now + config.timeout;

    let claims = CookieClaims {
        sid: session_id,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(secret_key.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create session cookie token: {e}"),
    })
}

/// Verify a cookie token and extract the session id it references.
///
/// Anything a client could have produced or corrupted maps to
/// `Unauthenticated`. Only key and serialization trouble on our side maps to
/// `Internal`.
pub fn verify_cookie_token(token: &str, config: &SessionConfig) -> Result<Uuid> {
    let secret_key = config.secret_key.as_ref().ok_or_else(|| Error::Internal {
        operation: "session cookies: secret_key is required".to_string(),
    })?;

    let key = DecodingKey::from_secret(secret_key.as_bytes());
    let validation = Validation::default();

    match decode::<CookieClaims>(token, &key, &validation) {
        Ok(token_data) => Ok(token_data.claims.sid),
        Err(e) => match e.kind() {
            // Client errors: malformed, tampered, or expired tokens
            jsonwebtoken::errors::ErrorKind::InvalidToken
            | jsonwebtoken::errors::ErrorKind::InvalidSignature
            | jsonwebtoken::errors::ErrorKind::ExpiredSignature
            | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
            | jsonwebtoken::errors::ErrorKind::InvalidIssuer
            | jsonwebtoken::errors::ErrorKind::InvalidAudience
            | jsonwebtoken::errors::ErrorKind::InvalidSubject
            | jsonwebtoken::errors::ErrorKind::ImmatureSignature
            | jsonwebtoken::errors::ErrorKind::Base64(_)
            | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => {
                Err(Error::Unauthenticated { message: None })
            }
            // Server errors: key material or crypto problems
            jsonwebtoken::errors::ErrorKind::InvalidEcdsaKey
            | jsonwebtoken::errors::ErrorKind::InvalidRsaKey(_)
            | jsonwebtoken::errors::ErrorKind::RsaFailedSigning
            | jsonwebtoken::errors::ErrorKind::InvalidAlgorithmName
            | jsonwebtoken::errors::ErrorKind::InvalidKeyFormat
            | jsonwebtoken::errors::ErrorKind::MissingAlgorithm
            | jsonwebtoken::errors::ErrorKind::Json(_)
            | jsonwebtoken::errors::ErrorKind::Utf8(_)
            | jsonwebtoken::errors::ErrorKind::Crypto(_) => Err(Error::Internal {
                operation: format!("session cookie verification: {e}"),
            }),
            _ => Err(Error::Internal {
                operation: "session cookie verification (unknown error)".to_string(),
            }),
        },
    }
}
