use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    game::{RoundSummary, ScoreSummary},
    phase::{FinishReasonDto, VisibleGamePhase},
};

/// Shared snapshot describing the current phase and the scoreboard around it.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GamePhaseSnapshot {
    /// Phase as shown to clients.
    pub phase: VisibleGamePhase,
    /// Loaded match, if any.
    pub match_id: Option<Uuid>,
    /// Present during the finished phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReasonDto>,
    /// Present while a countdown is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown_remaining: Option<u32>,
    /// Present whenever a match is loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreSummary>,
    /// Present during reveal and finished phases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_round: Option<RoundSummary>,
}
