use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Payloads shared by REST and SSE.
pub mod common;
/// Match requests and summaries.
pub mod game;
/// Health check payload.
pub mod health;
pub mod observation;
/// Client-facing phase names.
pub mod phase;
/// Read-only public responses.
pub mod public;
/// Server-sent event payloads.
pub mod sse;
pub mod validation;
/// Camera WebSocket messages.
pub mod ws;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
