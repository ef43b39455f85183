use std::time::Instant;

use thiserror::Error;
use uuid::Uuid;

/// High-level phases the game can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// No match is running.
    Idle,
    /// A match is active and can be in one of the round sub-phases.
    MatchRunning(RoundPhase),
    /// Final score is displayed before returning to idle.
    Finished(FinishReason),
}

/// Fine-grained phase while a match is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Waiting for the next round to be started.
    Ready,
    /// Counting down before gestures are captured.
    Countdown,
    /// Accepting the player's gesture.
    Capturing,
    /// The round is resolved and its result is displayed.
    Reveal,
}

/// Indicates why the match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// One side reached the rounds-to-win threshold.
    TargetReached,
    /// The match was stopped before either side won.
    ManualStop,
}

/// Events that can be applied to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// Start a new match from the idle state.
    StartMatch,
    /// Begin the countdown for the next round.
    StartCountdown,
    /// Start accepting gestures, either after the countdown or straight from ready.
    OpenCapture,
    /// A gesture was recognized and the round resolved.
    Throw,
    /// Leave the round result and get ready for the next one.
    NextRound,
    /// Transition to the final score view.
    Finish(FinishReason),
    /// Completely end the match and return to idle.
    EndMatch,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// The phase the state machine was in when the invalid event was received.
    pub from: GamePhase,
    /// The event that cannot be applied from this phase.
    pub event: GameEvent,
}

/// Errors that can occur when planning a state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// A transition is already pending and must be applied or aborted.
    AlreadyPending,
    /// The requested transition is not valid from the current phase.
    InvalidTransition(InvalidTransition),
}

/// Errors that can occur when applying a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
    /// State machine phase changed since the plan was created.
    PhaseMismatch {
        /// Phase when plan was created.
        expected: GamePhase,
        /// Current phase.
        actual: GamePhase,
    },
    /// State machine version changed since the plan was created.
    VersionMismatch {
        /// Version when plan was created.
        expected: usize,
        /// Current version.
        actual: usize,
    },
}

/// Errors that can occur when aborting a planned state machine transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortError {
    /// No transition is currently pending.
    NoPending,
    /// Plan ID does not match the pending plan.
    IdMismatch {
        /// Expected plan ID.
        expected: PlanId,
        /// Provided plan ID.
        got: PlanId,
    },
}

/// Unique identifier for a planned state transition.
pub type PlanId = Uuid;

/// A planned state machine transition that has been validated but not yet applied.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Unique identifier for this plan.
    pub id: PlanId,
    /// Phase the state machine is currently in.
    pub from: GamePhase,
    /// Phase the state machine will transition to.
    pub to: GamePhase,
    /// Event that triggered this transition.
    pub event: GameEvent,
    /// Version number after applying this transition.
    pub version_next: usize,
    /// Timestamp when this plan was created.
    pub pending_since: Instant,
}

/// Snapshot of the current state machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase of the state machine.
    pub phase: GamePhase,
    /// Version number of the state machine (increments on each transition).
    pub version: usize,
    /// Pending transition phase, if a transition is planned but not yet applied.
    pub pending: Option<GamePhase>,
}

/// State machine implementing the match flow: ready, countdown, capture, reveal, repeat.
#[derive(Debug, Clone)]
pub struct GameStateMachine {
    phase: GamePhase,
    version: usize,
    pending: Option<Plan>,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            version: 0,
            pending: None,
        }
    }
}

impl GameStateMachine {
    /// Create a new state machine initialised in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state machine state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
            pending: self.pending.as_ref().map(|plan| plan.to),
        }
    }

    /// Plan a transition by validating that the event can be applied from the current phase.
    /// Returns a Plan that can later be applied or aborted.
    pub fn plan(&mut self, event: GameEvent) -> Result<Plan, PlanError> {
        if self.pending.is_some() {
            return Err(PlanError::AlreadyPending);
        }

        let next = self
            .compute_transition(event)
            .map_err(PlanError::InvalidTransition)?;

        let plan = Plan {
            id: Uuid::new_v4(),
            from: self.phase,
            to: next,
            event,
            version_next: self.version + 1,
            pending_since: Instant::now(),
        };

        self.pending = Some(plan.clone());

        Ok(plan)
    }

    /// Apply a planned transition, moving the state machine to the next phase.
    /// Returns the new phase after the transition.
    pub fn apply(&mut self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let plan = self.pending.take().ok_or(ApplyError::NoPending)?;

        if plan.id != plan_id {
            let expected_plan_id = plan.id;
            self.pending = Some(plan);
            return Err(ApplyError::IdMismatch {
                expected: expected_plan_id,
                got: plan_id,
            });
        }

        if self.phase != plan.from {
            return Err(ApplyError::PhaseMismatch {
                expected: plan.from,
                actual: self.phase,
            });
        }

        if self.version + 1 != plan.version_next {
            return Err(ApplyError::VersionMismatch {
                expected: plan.version_next,
                actual: self.version + 1,
            });
        }

        self.phase = plan.to;
        self.version = plan.version_next;

        Ok(self.phase)
    }

    /// Abort a planned transition without applying it, returning the state machine to its previous state.
    pub fn abort(&mut self, plan_id: PlanId) -> Result<(), AbortError> {
        let plan = self.pending.as_ref().ok_or(AbortError::NoPending)?;

        if plan.id != plan_id {
            return Err(AbortError::IdMismatch {
                expected: plan.id,
                got: plan_id,
            });
        }

        self.pending = None;
        Ok(())
    }

    /// Compute a transition from an event if the transition is valid.
    fn compute_transition(&self, event: GameEvent) -> Result<GamePhase, InvalidTransition> {
        use GamePhase::{Finished, Idle, MatchRunning};

        let next = match (self.phase, event) {
            (Idle, GameEvent::StartMatch) => MatchRunning(RoundPhase::Ready),
            (MatchRunning(RoundPhase::Ready), GameEvent::StartCountdown) => {
                MatchRunning(RoundPhase::Countdown)
            }
            (
                MatchRunning(RoundPhase::Ready | RoundPhase::Countdown),
                GameEvent::OpenCapture,
            ) => MatchRunning(RoundPhase::Capturing),
            (MatchRunning(RoundPhase::Capturing), GameEvent::Throw) => {
                MatchRunning(RoundPhase::Reveal)
            }
            (MatchRunning(RoundPhase::Reveal), GameEvent::NextRound) => {
                MatchRunning(RoundPhase::Ready)
            }
            (MatchRunning(_), GameEvent::Finish(reason)) => Finished(reason),
            (Finished(_), GameEvent::EndMatch) => Idle,
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(sm: &mut GameStateMachine, event: GameEvent) -> GamePhase {
        let plan = sm.plan(event).unwrap();
        sm.apply(plan.id).unwrap()
    }

    #[test]
    fn initial_state_is_idle() {
        let sm = GameStateMachine::new();
        assert_eq!(sm.phase(), GamePhase::Idle);
    }

    #[test]
    fn full_happy_path_through_match() {
        let mut sm = GameStateMachine::new();

        assert_eq!(
            apply(&mut sm, GameEvent::StartMatch),
            GamePhase::MatchRunning(RoundPhase::Ready)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::StartCountdown),
            GamePhase::MatchRunning(RoundPhase::Countdown)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::OpenCapture),
            GamePhase::MatchRunning(RoundPhase::Capturing)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::Throw),
            GamePhase::MatchRunning(RoundPhase::Reveal)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::NextRound),
            GamePhase::MatchRunning(RoundPhase::Ready)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::OpenCapture),
            GamePhase::MatchRunning(RoundPhase::Capturing)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::Throw),
            GamePhase::MatchRunning(RoundPhase::Reveal)
        );
        assert_eq!(
            apply(&mut sm, GameEvent::Finish(FinishReason::TargetReached)),
            GamePhase::Finished(FinishReason::TargetReached)
        );
        assert_eq!(apply(&mut sm, GameEvent::EndMatch), GamePhase::Idle);
        assert_eq!(sm.snapshot().version, 9);
    }

    #[test]
    fn stop_is_allowed_from_every_round_phase() {
        for setup in [
            &[][..],
            &[GameEvent::StartCountdown][..],
            &[GameEvent::OpenCapture][..],
            &[GameEvent::OpenCapture, GameEvent::Throw][..],
        ] {
            let mut sm = GameStateMachine::new();
            apply(&mut sm, GameEvent::StartMatch);
            for event in setup {
                apply(&mut sm, *event);
            }
            assert_eq!(
                apply(&mut sm, GameEvent::Finish(FinishReason::ManualStop)),
                GamePhase::Finished(FinishReason::ManualStop)
            );
        }
    }

    #[test]
    fn throw_requires_capture() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::StartMatch);
        apply(&mut sm, GameEvent::StartCountdown);

        let err = sm.plan(GameEvent::Throw).unwrap_err();
        match err {
            PlanError::InvalidTransition(InvalidTransition { from, event }) => {
                assert_eq!(from, GamePhase::MatchRunning(RoundPhase::Countdown));
                assert_eq!(event, GameEvent::Throw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn finished_match_accepts_only_end() {
        let mut sm = GameStateMachine::new();
        apply(&mut sm, GameEvent::StartMatch);
        apply(&mut sm, GameEvent::Finish(FinishReason::ManualStop));

        for event in [
            GameEvent::StartMatch,
            GameEvent::StartCountdown,
            GameEvent::OpenCapture,
            GameEvent::Throw,
            GameEvent::NextRound,
            GameEvent::Finish(FinishReason::TargetReached),
        ] {
            assert!(sm.plan(event).is_err(), "{event:?} should be rejected");
        }
        assert_eq!(apply(&mut sm, GameEvent::EndMatch), GamePhase::Idle);
    }

    #[test]
    fn invalid_transition_returns_error() {
        let mut sm = GameStateMachine::new();
        let err = sm.plan(GameEvent::Throw).unwrap_err();
        match err {
            PlanError::InvalidTransition(invalid) => {
                assert_eq!(invalid.from, GamePhase::Idle);
                assert_eq!(invalid.event, GameEvent::Throw);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn second_plan_is_rejected_while_pending() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::StartMatch).unwrap();
        assert_eq!(sm.plan(GameEvent::StartMatch).unwrap_err(), PlanError::AlreadyPending);
        assert_eq!(
            sm.snapshot().pending,
            Some(GamePhase::MatchRunning(RoundPhase::Ready))
        );
        sm.apply(plan.id).unwrap();
        assert_eq!(sm.snapshot().pending, None);
    }

    #[test]
    fn apply_with_wrong_id_keeps_plan_pending() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::StartMatch).unwrap();
        let err = sm.apply(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApplyError::IdMismatch { .. }));
        assert_eq!(sm.apply(plan.id).unwrap(), GamePhase::MatchRunning(RoundPhase::Ready));
    }

    #[test]
    fn abort_clears_pending() {
        let mut sm = GameStateMachine::new();
        let plan = sm.plan(GameEvent::StartMatch).unwrap();
        sm.abort(plan.id).unwrap();
        assert!(sm.pending.is_none());
        assert_eq!(sm.phase(), GamePhase::Idle);
        assert_eq!(sm.abort(plan.id).unwrap_err(), AbortError::NoPending);
    }
}
