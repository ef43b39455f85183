use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::{FinishReason, GamePhase, RoundPhase};

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// No active match.
    Idle,
    /// Match running, waiting for the next round.
    Ready,
    /// Counting down before capture.
    Countdown,
    /// Waiting for the player's gesture.
    Capturing,
    /// Showing the result of the last round.
    Reveal,
    /// Showing the final score.
    Finished,
}

impl From<&GamePhase> for VisibleGamePhase {
    fn from(value: &GamePhase) -> Self {
        match value {
            GamePhase::Idle => VisibleGamePhase::Idle,
            GamePhase::Finished(_) => VisibleGamePhase::Finished,
            GamePhase::MatchRunning(RoundPhase::Ready) => VisibleGamePhase::Ready,
            GamePhase::MatchRunning(RoundPhase::Countdown) => VisibleGamePhase::Countdown,
            GamePhase::MatchRunning(RoundPhase::Capturing) => VisibleGamePhase::Capturing,
            GamePhase::MatchRunning(RoundPhase::Reveal) => VisibleGamePhase::Reveal,
        }
    }
}

/// Why the match ended, as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FinishReasonDto {
    /// A side reached the rounds-to-win threshold.
    TargetReached,
    /// Stopped through the API.
    ManualStop,
}

impl From<FinishReason> for FinishReasonDto {
    fn from(value: FinishReason) -> Self {
        match value {
            FinishReason::TargetReached => FinishReasonDto::TargetReached,
            FinishReason::ManualStop => FinishReasonDto::ManualStop,
        }
    }
}
