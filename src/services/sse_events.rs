use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        common::GamePhaseSnapshot,
        game::{MatchSummary, RetryReason, RoundSummary, ScoreSummary},
        sse::{
            CountdownEvent, MatchFinishedEvent, PhaseChangedEvent, RoundResolvedEvent,
            RoundRetryEvent, ServerEvent,
        },
    },
    state::{
        SharedState,
        session::MatchSession,
        state_machine::{FinishReason, GamePhase, RoundPhase},
    },
};

const EVENT_PHASE_CHANGED: &str = "phase_changed";
const EVENT_COUNTDOWN: &str = "countdown";
const EVENT_ROUND_RESOLVED: &str = "round.resolved";
const EVENT_ROUND_RETRY: &str = "round.retry";
const EVENT_MATCH_STARTED: &str = "match.started";
const EVENT_MATCH_FINISHED: &str = "match.finished";

/// Broadcast a gameplay phase change notification.
pub async fn broadcast_phase_changed(state: &SharedState, phase: GamePhase) {
    let snapshot = phase_snapshot(state, phase).await;
    send_public_event(state, EVENT_PHASE_CHANGED, &PhaseChangedEvent(snapshot));
}

/// Broadcast the freshly created match.
pub fn broadcast_match_started(state: &SharedState, summary: &MatchSummary) {
    send_public_event(state, EVENT_MATCH_STARTED, summary);
}

/// Broadcast one countdown tick.
pub fn broadcast_countdown(state: &SharedState, match_id: Uuid, round: u32, remaining: u32) {
    let payload = CountdownEvent {
        match_id,
        round,
        remaining,
    };
    send_public_event(state, EVENT_COUNTDOWN, &payload);
}

/// Broadcast the result of a played round.
pub fn broadcast_round_resolved(
    state: &SharedState,
    match_id: Uuid,
    round: RoundSummary,
    score: ScoreSummary,
) {
    let payload = RoundResolvedEvent {
        match_id,
        round,
        score,
    };
    send_public_event(state, EVENT_ROUND_RESOLVED, &payload);
}

/// Ask the player to show their hand again.
pub fn broadcast_round_retry(state: &SharedState, reason: RetryReason) {
    let payload = RoundRetryEvent {
        reason,
        prompt: reason.prompt().to_string(),
    };
    send_public_event(state, EVENT_ROUND_RETRY, &payload);
}

/// Broadcast the final score of a match.
pub fn broadcast_match_finished(state: &SharedState, session: &MatchSession, reason: FinishReason) {
    let payload = MatchFinishedEvent {
        match_id: session.id,
        reason: reason.into(),
        score: session.into(),
    };
    send_public_event(state, EVENT_MATCH_FINISHED, &payload);
}

/// Project the current match onto `phase`, keeping only what that phase displays.
pub async fn phase_snapshot(state: &SharedState, phase: GamePhase) -> GamePhaseSnapshot {
    let finish_reason = match phase {
        GamePhase::Finished(reason) => Some(reason.into()),
        _ => None,
    };

    state
        .read_current_match(|maybe| {
            let Some(session) = maybe else {
                return GamePhaseSnapshot {
                    phase: (&phase).into(),
                    match_id: None,
                    finish_reason,
                    countdown_remaining: None,
                    score: None,
                    last_round: None,
                };
            };

            let countdown_remaining = match phase {
                GamePhase::MatchRunning(RoundPhase::Countdown) => session.countdown_remaining,
                _ => None,
            };
            let last_round = match phase {
                GamePhase::MatchRunning(RoundPhase::Reveal) | GamePhase::Finished(_) => {
                    session.last_round().map(RoundSummary::from)
                }
                _ => None,
            };

            GamePhaseSnapshot {
                phase: (&phase).into(),
                match_id: Some(session.id),
                finish_reason,
                countdown_remaining,
                score: Some(session.into()),
                last_round,
            }
        })
        .await
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
