//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication checks via the session gate
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Login flow initiation, provider callback, outcome routes, logout
//! - [`profile`]: The session-gated profile confirmation
//!
//! # Authentication
//!
//! Gated handlers take a [`crate::api::models::principals::Principal`]
//! argument, which the extractors in [`crate::auth::gate`] resolve from the
//! session cookie before the handler runs.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and JSON error responses.

pub mod auth;
pub mod profile;
