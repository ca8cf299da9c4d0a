//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from the session
//!   records held in the store, allowing the wire contract and the storage
//!   representation to evolve independently
//! - **Validation**: Models use serde for deserialization and validation
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//!
//! # Model Categories
//!
//! - [`auth`]: Login flow payloads, the provider callback query, and the
//!   cookie-setting redirect
//! - [`principals`]: The authenticated identity handed to request handlers
//!
//! # Example
//!
//! ```ignore
//! use gymctl::api::models::auth::LoginSuccessResponse;
//!
//! // Deserialize from JSON
//! let outcome: LoginSuccessResponse = serde_json::from_str(json_str)?;
//! assert!(outcome.success);
//! ```

pub mod auth;
pub mod principals;
