//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for the record endpoints and the
//!   WebSocket subscribe channel
//! - **[`models`]**: Request/response data structures for API communication
//!
//! All record endpoints are documented with OpenAPI annotations using
//! `utoipa`; the rendered documentation is served at `/docs`.

pub mod handlers;
pub mod models;
