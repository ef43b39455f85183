use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::phase::VisibleGamePhase;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the server answers.
    pub status: String,
    /// Current game phase.
    pub phase: VisibleGamePhase,
    /// Number of camera clients streaming frames.
    pub cameras: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(phase: VisibleGamePhase, cameras: usize) -> Self {
        Self {
            status: "ok".to_string(),
            phase,
            cameras,
        }
    }
}
