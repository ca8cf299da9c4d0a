//! Authentication and session lifecycle.
//!
//! This module implements Google OAuth2 login on top of server-side
//! sessions:
//! - OAuth2 authorization-code flow against Google
//! - Server-side session records referenced by opaque ids
//! - Signed, HTTP-only session cookies
//! - Request gating via axum extractors
//!
//! # Login Flow
//!
//! A login walks through the modules in order:
//!
//! 1. [`provider`] builds the consent URL for the initiation redirect and,
//!    on callback, exchanges the authorization code and fetches the profile,
//!    producing a [`Principal`](crate::api::models::principals::Principal).
//! 2. [`serializer`] reduces that principal to a thin session record and
//!    caches the full principal for later resolution.
//! 3. [`store`] persists the record (and the one-time login state tokens
//!    that tie an initiation to its callback).
//! 4. [`token`] signs the record's id into the cookie the browser carries.
//!
//! On every subsequent request [`gate`] runs the chain in reverse: cookie to
//! session id, session id to record, record to principal.
//!
//! # Modules
//!
//! - [`gate`]: Extractors for getting the authenticated principal in handlers
//! - [`provider`]: Identity provider abstraction and the Google implementation
//! - [`serializer`]: Principal-to-record conversion and the principal cache
//! - [`store`]: Session and login state storage
//! - [`token`]: Signed cookie token creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use gymctl::api::models::principals::Principal;
//!
//! // Gated route: denies before the body runs
//! async fn protected_handler(principal: Principal) -> String {
//!     format!("Hello, {}!", principal.display_name)
//! }
//!
//! // Reactive route: runs either way
//! async fn status_handler(principal: Option<Principal>) -> &'static str {
//!     if principal.is_some() { "in" } else { "out" }
//! }
//! ```

pub mod gate;
pub mod provider;
pub mod serializer;
pub mod store;
pub mod token;
