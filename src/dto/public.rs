use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::{common::GamePhaseSnapshot, game::MatchSummary};

/// Response exposing the current phase as seen by the public.
#[derive(Debug, Serialize, ToSchema)]
pub struct GamePhaseResponse {
    /// Phase and scoreboard.
    #[serde(flatten)]
    pub snapshot: GamePhaseSnapshot,
    /// Number of transitions applied since startup.
    pub version: usize,
    /// Whether a transition is being applied right now.
    pub transition_pending: bool,
}

/// Finished matches, most recent first.
#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryResponse {
    /// Archived matches.
    pub matches: Vec<MatchSummary>,
}
