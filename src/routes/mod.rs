use axum::Router;

use crate::state::SharedState;

/// Stateless frame classification.
pub mod classify;
/// Swagger UI and OpenAPI JSON.
pub mod docs;
/// Health check.
pub mod health;
/// Match lifecycle and round play.
pub mod matches;
/// Read-only projections.
pub mod public;
/// Public event stream.
pub mod sse;
/// Camera WebSocket upgrade.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(websocket::router())
        .merge(matches::router())
        .merge(classify::router())
        .merge(public::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
