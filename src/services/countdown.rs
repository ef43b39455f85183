//! Background ticker driving the countdown that precedes every capture.

use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        state_machine::{GameEvent, GamePhase, RoundPhase},
        transitions::run_transition_with_broadcast,
    },
};

const TICK: Duration = Duration::from_secs(1);

/// Spawn the countdown of the current round of `match_id`.
///
/// The task stops on its own when the phase leaves `Countdown` or another match takes over.
pub fn spawn(state: SharedState, match_id: Uuid) -> JoinHandle<()> {
    tokio::spawn(async move { run(state, match_id).await })
}

async fn run(state: SharedState, match_id: Uuid) {
    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some((round, remaining)) = current_tick(&state, match_id).await else {
            debug!(%match_id, "countdown cancelled");
            return;
        };

        if remaining == 0 {
            open_capture(&state, match_id).await;
            return;
        }

        sse_events::broadcast_countdown(&state, match_id, round, remaining);

        if let Err(err) = decrement(&state, match_id).await {
            debug!(%match_id, error = %err, "countdown lost its match");
            return;
        }
    }
}

/// Round number and remaining seconds, or `None` when this countdown is no longer current.
async fn current_tick(state: &SharedState, match_id: Uuid) -> Option<(u32, u32)> {
    if state.state_machine_phase().await != GamePhase::MatchRunning(RoundPhase::Countdown) {
        return None;
    }

    state
        .read_current_match(|maybe| {
            maybe
                .filter(|session| session.id == match_id)
                .map(|session| {
                    (
                        session.next_round_number(),
                        session.countdown_remaining.unwrap_or(0),
                    )
                })
        })
        .await
}

async fn decrement(state: &SharedState, match_id: Uuid) -> Result<(), ServiceError> {
    state
        .with_current_match_mut(|session| {
            if session.id != match_id {
                return Err(ServiceError::InvalidState("match changed".into()));
            }
            session.countdown_remaining = session
                .countdown_remaining
                .map(|remaining| remaining.saturating_sub(1));
            Ok(())
        })
        .await
}

async fn open_capture(state: &SharedState, match_id: Uuid) {
    let result = run_transition_with_broadcast(state, GameEvent::OpenCapture, move || async move {
        state
            .with_current_match_mut(|session| {
                session.countdown_remaining = None;
                Ok(())
            })
            .await
    })
    .await;

    match result {
        Ok(()) => info!(%match_id, "capture opened"),
        Err(err) => warn!(%match_id, error = %err, "failed to open capture after countdown"),
    }
}
