//! Library crate for rps-back, exposing modules for binaries and integration tests.

pub mod config;
mod dto;
mod error;
pub mod gesture;
/// HTTP, SSE and WebSocket routes.
pub mod routes;
/// Business logic behind the routes.
pub mod services;
/// Shared application state and the match state machine.
pub mod state;
