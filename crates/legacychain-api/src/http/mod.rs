//! HTTP/REST API layer for LegacyChain.
//!
//! Axum routes under `/api`, a countdown WebSocket, and CORS support.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod response;
pub mod router;
