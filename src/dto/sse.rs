use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    common::GamePhaseSnapshot,
    game::{RetryReason, RoundSummary, ScoreSummary},
    phase::FinishReasonDto,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// SSE event name, unnamed when `None`.
    pub event: Option<String>,
    /// Serialized payload.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already formatted data field.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever the gameplay phase changes.
pub struct PhaseChangedEvent(pub GamePhaseSnapshot);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast every second while a round counts down.
pub struct CountdownEvent {
    /// Match counting down.
    pub match_id: Uuid,
    /// Round about to be captured.
    pub round: u32,
    /// Seconds left.
    pub remaining: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a submitted frame did not contain a usable gesture.
pub struct RoundRetryEvent {
    /// Why the frame was not usable.
    pub reason: RetryReason,
    /// Message shown to the player.
    pub prompt: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast once a round has been played.
pub struct RoundResolvedEvent {
    /// Match the round belongs to.
    pub match_id: Uuid,
    /// The played round.
    pub round: RoundSummary,
    /// Scoreboard after the round.
    pub score: ScoreSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the match ends.
pub struct MatchFinishedEvent {
    /// Finished match.
    pub match_id: Uuid,
    /// Why it ended.
    pub reason: FinishReasonDto,
    /// Final scoreboard.
    pub score: ScoreSummary,
}
