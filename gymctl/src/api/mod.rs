//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! The API is divided into a few functional areas:
//!
//! - **Login flow** (`/auth/google`, `/auth/google/callback`): Consent
//!   redirect and the provider callback that establishes a session
//! - **Login outcome** (`/login/success`, `/login/failed`): JSON outcome
//!   routes the frontend polls after the consent dance
//! - **Profile** (`/profile`): A session-gated confirmation route
//! - **Logout** (`/logout`): Session teardown
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
