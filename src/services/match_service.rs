//! Business logic behind the match routes. Every phase change goes through the
//! state machine's plan/apply cycle so only one transition runs at a time.

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        game::{
            MatchSummary, RetryReason, RoundSummary, ScoreSummary, StartMatchRequest,
            ThrowResponse,
        },
        observation::ClassifyResponse,
        ws::CameraOutboundMessage,
    },
    error::ServiceError,
    gesture::{Detection, Gesture, Observation},
    services::{camera_service, countdown, sse_events},
    state::{
        SharedState,
        session::MatchSession,
        state_machine::{FinishReason, GameEvent, GamePhase, RoundPhase},
        transitions::{run_transition_then_with_broadcast, run_transition_with_broadcast},
    },
};

/// Create a new match while idle, filling unset options from the configuration.
pub async fn start_match(
    state: &SharedState,
    request: StartMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    let config = state.config();
    let StartMatchRequest {
        player_name,
        rounds_to_win,
        countdown_secs,
    } = request;

    let player_name = match player_name {
        Some(name) => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ServiceError::InvalidInput(
                    "player name must not be empty".into(),
                ));
            }
            trimmed.to_string()
        }
        None => config.default_player_name.clone(),
    };

    let rounds_to_win = rounds_to_win.unwrap_or(config.rounds_to_win);
    if rounds_to_win == 0 {
        return Err(ServiceError::InvalidInput(
            "rounds to win must be strictly positive".into(),
        ));
    }
    let countdown_secs = countdown_secs.unwrap_or(config.countdown_secs);

    let summary = run_transition_with_broadcast(state, GameEvent::StartMatch, move || async move {
        let session = MatchSession::new(player_name, rounds_to_win, countdown_secs);
        let summary = MatchSummary::from(&session);
        let mut slot = state.current_match().write().await;
        *slot = Some(session);
        Ok(summary)
    })
    .await?;

    info!(
        match_id = %summary.id,
        player = %summary.score.player_name,
        rounds_to_win,
        countdown_secs,
        "match started"
    );
    sse_events::broadcast_match_started(state, &summary);
    Ok(summary)
}

/// Start the next round: count down when the match has a countdown, capture right away otherwise.
pub async fn start_round(state: &SharedState) -> Result<MatchSummary, ServiceError> {
    let countdown_secs = state
        .read_current_match(|maybe| maybe.map(|session| session.countdown_secs))
        .await
        .ok_or_else(|| ServiceError::NotFound("no active match".into()))?;

    if countdown_secs == 0 {
        return run_transition_with_broadcast(state, GameEvent::OpenCapture, move || async move {
            state
                .with_current_match_mut(|session| Ok(MatchSummary::from(&*session)))
                .await
        })
        .await;
    }

    let summary = run_transition_with_broadcast(state, GameEvent::StartCountdown, move || async move {
        state
            .with_current_match_mut(|session| {
                session.countdown_remaining = Some(countdown_secs);
                Ok(MatchSummary::from(&*session))
            })
            .await
    })
    .await?;

    countdown::spawn(state.clone(), summary.id);
    Ok(summary)
}

/// Submit the frame captured for the current round.
///
/// Frames without a usable gesture leave the round open and ask for a retry.
pub async fn throw(
    state: &SharedState,
    observation: Observation,
) -> Result<ThrowResponse, ServiceError> {
    ensure_capturing(state).await?;

    match observation.detect(&state.config().detector) {
        Detection::Recognized(gesture) => resolve_throw(state, gesture).await,
        Detection::NoHand => Ok(request_retry(state, RetryReason::NoHand)),
        Detection::Unrecognized => Ok(request_retry(state, RetryReason::Unrecognized)),
    }
}

/// A round recorded inside the throw transition.
struct PlayedRound {
    match_id: Uuid,
    round: RoundSummary,
    score: ScoreSummary,
    /// The whole session when this round decided the match.
    decided: Option<MatchSession>,
}

/// Play the round with the player's `gesture` against a freshly drawn computer move.
///
/// The winning round finishes the match before any other transition can run.
pub(crate) async fn resolve_throw(
    state: &SharedState,
    player: Gesture,
) -> Result<ThrowResponse, ServiceError> {
    let (played, finished) = run_transition_then_with_broadcast(
        state,
        GameEvent::Throw,
        move || async move {
            let computer = state.moves().next_move();
            state
                .with_current_match_mut(|session| {
                    let record = session.record_round(player, computer).ok_or_else(|| {
                        ServiceError::InvalidState("match is already decided".into())
                    })?;
                    Ok(PlayedRound {
                        match_id: session.id,
                        round: RoundSummary::from(&record),
                        score: ScoreSummary::from(&*session),
                        decided: session.is_decided().then(|| session.clone()),
                    })
                })
                .await
        },
        |played: &PlayedRound| {
            played
                .decided
                .as_ref()
                .map(|_| GameEvent::Finish(FinishReason::TargetReached))
        },
    )
    .await?;
    let PlayedRound {
        match_id,
        round,
        score,
        decided,
    } = played;

    info!(
        %match_id,
        round = round.number,
        player = %round.player,
        computer = %round.computer,
        outcome = ?round.outcome,
        score = %format!("{}-{}", score.player, score.computer),
        "round resolved"
    );

    sse_events::broadcast_round_resolved(state, match_id, round.clone(), score.clone());
    camera_service::broadcast_to_cameras(
        state,
        &CameraOutboundMessage::RoundResolved {
            round: round.clone(),
            score: score.clone(),
        },
    );

    let match_over = match decided {
        Some(session) if finished => {
            announce_finish(state, &session, FinishReason::TargetReached);
            true
        }
        _ => false,
    };

    Ok(ThrowResponse::Resolved {
        round,
        score,
        match_over,
    })
}

fn request_retry(state: &SharedState, reason: RetryReason) -> ThrowResponse {
    info!(?reason, "throw needs a retry");
    sse_events::broadcast_round_retry(state, reason);
    ThrowResponse::retry(reason)
}

/// Leave the round result and get ready for the next round.
pub async fn next_round(state: &SharedState) -> Result<MatchSummary, ServiceError> {
    run_transition_with_broadcast(state, GameEvent::NextRound, move || async move {
        state
            .with_current_match_mut(|session| Ok(MatchSummary::from(&*session)))
            .await
    })
    .await
}

/// Stop the running match before either side reached the threshold.
pub async fn stop_match(state: &SharedState) -> Result<MatchSummary, ServiceError> {
    finish(state, FinishReason::ManualStop).await
}

async fn finish(state: &SharedState, reason: FinishReason) -> Result<MatchSummary, ServiceError> {
    let session = run_transition_with_broadcast(state, GameEvent::Finish(reason), move || async move {
        state
            .with_current_match_mut(|session| {
                session.countdown_remaining = None;
                Ok(session.clone())
            })
            .await
    })
    .await?;

    announce_finish(state, &session, reason);
    Ok(MatchSummary::from(&session))
}

fn announce_finish(state: &SharedState, session: &MatchSession, reason: FinishReason) {
    info!(
        match_id = %session.id,
        ?reason,
        player = session.player_score,
        computer = session.computer_score,
        "match finished"
    );
    sse_events::broadcast_match_finished(state, session, reason);
}

/// Close the finished match, archive it and return to idle.
pub async fn end_match(state: &SharedState) -> Result<MatchSummary, ServiceError> {
    let session = run_transition_with_broadcast(state, GameEvent::EndMatch, move || async move {
        let mut slot = state.current_match().write().await;
        slot.take()
            .ok_or_else(|| ServiceError::NotFound("no active match".into()))
    })
    .await?;

    let summary = MatchSummary::from(&session);
    state.archive_match(session).await;
    info!(match_id = %summary.id, "match archived");
    Ok(summary)
}

/// Return the match currently loaded, running or finished.
pub async fn current_match(state: &SharedState) -> Result<MatchSummary, ServiceError> {
    state
        .read_current_match(|maybe| maybe.map(MatchSummary::from))
        .await
        .ok_or_else(|| ServiceError::NotFound("no active match".into()))
}

/// Classify a frame without touching the match.
pub fn classify(state: &SharedState, observation: &Observation) -> ClassifyResponse {
    let hands = observation.hands(&state.config().detector);
    let gesture = Detection::from_hands(&hands).gesture();
    ClassifyResponse {
        gesture,
        hands: hands.into_iter().map(Into::into).collect(),
    }
}

async fn ensure_capturing(state: &SharedState) -> Result<(), ServiceError> {
    match state.state_machine_phase().await {
        GamePhase::MatchRunning(RoundPhase::Capturing) => Ok(()),
        other => Err(ServiceError::InvalidState(format!(
            "throws are only accepted while capturing, current phase {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::AppConfig,
        gesture::{FingerStates, rules::ScriptedMoves},
        state::AppState,
    };

    fn rock() -> Observation {
        Observation::Fingers(vec![FingerStates::ALL_DOWN])
    }

    fn state_with(config: AppConfig, computer: Vec<Gesture>) -> SharedState {
        AppState::with_move_source(config, Arc::new(ScriptedMoves::new(computer)))
    }

    fn instant_rounds(rounds_to_win: u32) -> AppConfig {
        AppConfig {
            rounds_to_win,
            countdown_secs: 0,
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn match_ends_when_a_side_reaches_the_threshold() {
        let state = state_with(instant_rounds(2), vec![Gesture::Scissors]);
        start_match(&state, StartMatchRequest::default()).await.unwrap();

        start_round(&state).await.unwrap();
        let first = throw(&state, rock()).await.unwrap();
        assert!(matches!(first, ThrowResponse::Resolved { match_over: false, .. }));
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::MatchRunning(RoundPhase::Reveal)
        );

        next_round(&state).await.unwrap();
        start_round(&state).await.unwrap();
        let second = throw(&state, rock()).await.unwrap();
        match second {
            ThrowResponse::Resolved {
                score, match_over, ..
            } => {
                assert!(match_over);
                assert_eq!((score.player, score.computer), (2, 0));
            }
            other => panic!("expected a resolved round, got {other:?}"),
        }
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::Finished(FinishReason::TargetReached)
        );

        assert!(matches!(
            next_round(&state).await,
            Err(ServiceError::InvalidState(_))
        ));

        let archived = end_match(&state).await.unwrap();
        assert_eq!(archived.rounds.len(), 2);
        assert_eq!(state.state_machine_phase().await, GamePhase::Idle);
        assert_eq!(state.history().await.len(), 1);
        assert!(matches!(
            current_match(&state).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn winning_throw_finishes_before_a_queued_stop() {
        let state = state_with(instant_rounds(1), vec![Gesture::Scissors]);
        start_match(&state, StartMatchRequest::default()).await.unwrap();
        start_round(&state).await.unwrap();
        let mut events = state.public_sse().subscribe();

        // Park the throw inside its transition work.
        let session_lock = state.current_match().write().await;
        let throwing = tokio::spawn({
            let state = state.clone();
            async move { throw(&state, rock()).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(state.snapshot().await.pending.is_some());

        let stopping = tokio::spawn({
            let state = state.clone();
            async move { stop_match(&state).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        drop(session_lock);

        let thrown = throwing.await.unwrap().unwrap();
        assert!(matches!(thrown, ThrowResponse::Resolved { match_over: true, .. }));
        assert!(matches!(
            stopping.await.unwrap(),
            Err(ServiceError::InvalidState(_))
        ));
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::Finished(FinishReason::TargetReached)
        );

        let mut finished = Vec::new();
        while let Ok(event) = events.try_recv() {
            if event.event.as_deref() == Some("match.finished") {
                let json: serde_json::Value = serde_json::from_str(&event.data).unwrap();
                finished.push(json["reason"].clone());
            }
        }
        assert_eq!(finished, vec![serde_json::json!("target_reached")]);
    }

    #[tokio::test]
    async fn disabled_history_keeps_nothing() {
        let config = AppConfig {
            history_limit: 0,
            ..instant_rounds(1)
        };
        let state = state_with(config, vec![Gesture::Scissors]);
        start_match(&state, StartMatchRequest::default()).await.unwrap();
        start_round(&state).await.unwrap();
        throw(&state, rock()).await.unwrap();

        let archived = end_match(&state).await.unwrap();
        assert_eq!(archived.score.player, 1);
        assert_eq!(state.state_machine_phase().await, GamePhase::Idle);
        assert!(state.history().await.is_empty());
    }

    #[tokio::test]
    async fn ties_do_not_score() {
        let state = state_with(instant_rounds(1), vec![Gesture::Rock]);
        start_match(&state, StartMatchRequest::default()).await.unwrap();
        start_round(&state).await.unwrap();

        let response = throw(&state, rock()).await.unwrap();
        match response {
            ThrowResponse::Resolved {
                round,
                score,
                match_over,
            } => {
                assert_eq!(round.outcome, crate::gesture::RoundOutcome::Tie);
                assert_eq!((score.player, score.computer), (0, 0));
                assert!(!match_over);
            }
            other => panic!("expected a resolved round, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn retry_leaves_scores_untouched() {
        let state = state_with(instant_rounds(3), vec![Gesture::Paper]);
        start_match(&state, StartMatchRequest::default()).await.unwrap();
        start_round(&state).await.unwrap();
        let mut events = state.public_sse().subscribe();

        let empty = throw(&state, Observation::Fingers(Vec::new())).await.unwrap();
        assert!(matches!(
            empty,
            ThrowResponse::Retry {
                reason: RetryReason::NoHand,
                ..
            }
        ));

        let thumb_only =
            Observation::Fingers(vec![FingerStates::new(true, false, false, false, false)]);
        let unknown = throw(&state, thumb_only).await.unwrap();
        assert!(matches!(
            unknown,
            ThrowResponse::Retry {
                reason: RetryReason::Unrecognized,
                ..
            }
        ));

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("round.retry"));

        let summary = current_match(&state).await.unwrap();
        assert_eq!((summary.score.player, summary.score.computer), (0, 0));
        assert!(summary.rounds.is_empty());
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::MatchRunning(RoundPhase::Capturing)
        );
    }

    #[tokio::test]
    async fn throw_outside_capture_is_rejected() {
        let state = state_with(instant_rounds(3), vec![Gesture::Paper]);
        assert!(matches!(
            throw(&state, rock()).await,
            Err(ServiceError::InvalidState(_))
        ));

        start_match(&state, StartMatchRequest::default()).await.unwrap();
        assert!(matches!(
            throw(&state, rock()).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn only_one_match_at_a_time() {
        let state = state_with(instant_rounds(3), vec![Gesture::Paper]);
        start_match(&state, StartMatchRequest::default()).await.unwrap();

        assert!(matches!(
            start_match(&state, StartMatchRequest::default()).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn start_match_applies_overrides_and_rejects_blank_names() {
        let state = state_with(instant_rounds(3), vec![Gesture::Paper]);

        let blank = StartMatchRequest {
            player_name: Some("   ".into()),
            ..StartMatchRequest::default()
        };
        assert!(matches!(
            start_match(&state, blank).await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert_eq!(state.state_machine_phase().await, GamePhase::Idle);

        let request = StartMatchRequest {
            player_name: Some(" Ada ".into()),
            rounds_to_win: Some(7),
            countdown_secs: None,
        };
        let summary = start_match(&state, request).await.unwrap();
        assert_eq!(summary.score.player_name, "Ada");
        assert_eq!(summary.score.rounds_to_win, 7);
        assert_eq!(summary.countdown_secs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_then_opens_capture() {
        let config = AppConfig {
            countdown_secs: 2,
            ..AppConfig::default()
        };
        let state = state_with(config, vec![Gesture::Rock]);
        start_match(&state, StartMatchRequest::default()).await.unwrap();
        let mut events = state.public_sse().subscribe();

        start_round(&state).await.unwrap();
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::MatchRunning(RoundPhase::Countdown)
        );

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::MatchRunning(RoundPhase::Capturing)
        );

        let mut ticks = Vec::new();
        while let Ok(event) = events.try_recv() {
            if event.event.as_deref() == Some("countdown") {
                let json: serde_json::Value = serde_json::from_str(&event.data).unwrap();
                ticks.push(json["remaining"].as_u64().unwrap());
            }
        }
        assert_eq!(ticks, vec![2, 1]);
        assert_eq!(
            current_match(&state).await.unwrap().countdown_remaining,
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stopping_cancels_the_countdown() {
        let config = AppConfig {
            countdown_secs: 3,
            ..AppConfig::default()
        };
        let state = state_with(config, vec![Gesture::Rock]);
        start_match(&state, StartMatchRequest::default()).await.unwrap();
        start_round(&state).await.unwrap();

        stop_match(&state).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            state.state_machine_phase().await,
            GamePhase::Finished(FinishReason::ManualStop)
        );
    }

    #[test]
    fn classify_reports_every_hand() {
        let state = AppState::new(AppConfig::default());
        let observation = Observation::Fingers(vec![
            FingerStates::new(true, false, false, false, false),
            FingerStates::ALL_UP,
        ]);

        let response = classify(&state, &observation);
        assert_eq!(response.gesture, Some(Gesture::Paper));
        assert_eq!(response.hands.len(), 2);
    }
}
