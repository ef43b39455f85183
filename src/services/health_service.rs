use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a health payload carrying the current phase and connected cameras.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let phase = state.state_machine_phase().await;
    let cameras = state.cameras().len();
    debug!(?phase, cameras, "health check");

    HealthResponse::ok((&phase).into(), cameras)
}
