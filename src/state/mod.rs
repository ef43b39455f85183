/// Scoreboard of a single match.
pub mod session;
mod sse;
/// Phases and the plan/apply transition cycle.
pub mod state_machine;
/// Transitions followed by a phase broadcast.
pub mod transitions;

use std::{sync::Arc, time::Duration};

use axum::extract::ws::Message;
use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ServiceError,
    gesture::{MoveSource, RandomMoves},
    state::{session::MatchSession, state_machine::GamePhase},
};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::state_machine::{GameEvent, GameStateMachine};

/// Application state shared across handlers and background tasks.
pub type SharedState = Arc<AppState>;
/// Longest a transition's work may run before the plan is aborted.
pub const DEFAULT_TRANSITION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
/// Handle used to push messages to a connected camera client.
pub struct CameraConnection {
    /// Identifier announced by the camera.
    pub id: String,
    /// Writer channel of the socket.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state: the match state machine, the scoreboard and live connections.
pub struct AppState {
    config: Arc<AppConfig>,
    moves: Arc<dyn MoveSource>,
    sse: SseHub,
    cameras: DashMap<String, CameraConnection>,
    game: RwLock<GameStateMachine>,
    current_match: RwLock<Option<MatchSession>>,
    history: RwLock<IndexMap<Uuid, MatchSession>>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Computer moves are drawn at random, seeded from the configuration when it carries a seed.
    pub fn new(config: AppConfig) -> SharedState {
        let moves = Arc::new(RandomMoves::new(config.seed));
        Self::with_move_source(config, moves)
    }

    /// Construct the state with a custom source of computer moves.
    pub fn with_move_source(config: AppConfig, moves: Arc<dyn MoveSource>) -> SharedState {
        Arc::new(Self {
            config: Arc::new(config),
            moves,
            sse: SseHub::new(16),
            cameras: DashMap::new(),
            game: RwLock::new(GameStateMachine::new()),
            current_match: RwLock::new(None),
            history: RwLock::new(IndexMap::new()),
            transition_gate: Mutex::new(()),
            transition_timeout: Some(DEFAULT_TRANSITION_TIMEOUT),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Opponent used to pick the computer's gestures.
    pub fn moves(&self) -> &dyn MoveSource {
        self.moves.as_ref()
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Registry of active camera sockets keyed by their identifier.
    pub fn cameras(&self) -> &DashMap<String, CameraConnection> {
        &self.cameras
    }

    /// Snapshot the current phase of the shared game state machine.
    pub async fn state_machine_phase(&self) -> GamePhase {
        self.game.read().await.phase()
    }

    /// Phase, version and pending plan of the shared game state machine.
    pub async fn snapshot(&self) -> Snapshot {
        let sm = self.game.read().await;
        sm.snapshot()
    }

    /// Currently active match, if any.
    pub fn current_match(&self) -> &RwLock<Option<MatchSession>> {
        &self.current_match
    }

    /// Run `f` against the active match, failing when there is none.
    pub async fn with_current_match_mut<F, T>(&self, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut MatchSession) -> Result<T, ServiceError>,
    {
        let mut guard = self.current_match.write().await;
        let session = guard
            .as_mut()
            .ok_or_else(|| ServiceError::NotFound("no active match".into()))?;
        f(session)
    }

    /// Read the active match, if any, without holding the lock afterwards.
    pub async fn read_current_match<F, T>(&self, f: F) -> T
    where
        F: FnOnce(Option<&MatchSession>) -> T,
    {
        let guard = self.current_match.read().await;
        f(guard.as_ref())
    }

    /// Finished matches, most recent first.
    pub async fn history(&self) -> Vec<MatchSession> {
        self.history.read().await.values().cloned().collect()
    }

    /// Store a finished match at the front of the history, evicting the oldest beyond the limit.
    pub async fn archive_match(&self, session: MatchSession) {
        let limit = self.config.history_limit;
        let mut history = self.history.write().await;
        if limit == 0 {
            return;
        }
        history.shift_insert(0, session.id, session);
        history.truncate(limit);
    }

    /// Plan a transition to the shared game state machine, returning the plan.
    async fn plan_transition(&self, event: GameEvent) -> Result<Plan, PlanError> {
        let mut sm = self.game.write().await;
        sm.plan(event)
    }

    /// Apply the planned transition to the shared game state machine, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let mut sm = self.game.write().await;
        sm.apply(plan_id)
    }

    /// Abort a planned transition of the shared game state machine
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut sm = self.game.write().await;
        sm.abort(plan_id)
    }

    /// Plan `event`, run `work`, then apply the plan on success or abort it on error or timeout.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: GameEvent,
        work: F,
    ) -> Result<(T, GamePhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let _gate = self.transition_gate.lock().await;
        self.run_gated_transition(event, work).await
    }

    /// Like [`AppState::run_transition`], then apply the event `follow_up` derives from the result
    /// before any other transition gets the gate.
    ///
    /// Returns the phase after `event` and, when a follow-up ran, the phase after it.
    pub async fn run_transition_then<F, Fut, T, N>(
        &self,
        event: GameEvent,
        work: F,
        follow_up: N,
    ) -> Result<(T, GamePhase, Option<GamePhase>), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
        N: FnOnce(&T) -> Option<GameEvent>,
    {
        let _gate = self.transition_gate.lock().await;
        let (value, next) = self.run_gated_transition(event, work).await?;

        let Some(follow_event) = follow_up(&value) else {
            return Ok((value, next, None));
        };
        let ((), follow) = self
            .run_gated_transition(follow_event, || async { Ok::<_, ServiceError>(()) })
            .await?;
        Ok((value, next, Some(follow)))
    }

    /// Plan, work and apply or abort. The caller holds `transition_gate`.
    async fn run_gated_transition<F, Fut, T>(
        &self,
        event: GameEvent,
        work: F,
    ) -> Result<(T, GamePhase), ServiceError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, ServiceError>>,
    {
        let Plan { id: plan_id, .. } = self.plan_transition(event).await?;

        let work_future = work();
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::{FinishReason, RoundPhase};

    #[tokio::test]
    async fn failed_work_aborts_the_transition() {
        let state = AppState::new(AppConfig::default());

        let result = state
            .run_transition(GameEvent::StartMatch, || async {
                Err::<(), _>(ServiceError::InvalidInput("nope".into()))
            })
            .await;

        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.phase, GamePhase::Idle);
        assert_eq!(snapshot.pending, None);
    }

    #[tokio::test]
    async fn successful_work_applies_the_transition() {
        let state = AppState::new(AppConfig::default());

        let (value, next) = state
            .run_transition(GameEvent::StartMatch, || async { Ok(7) })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(next, GamePhase::MatchRunning(RoundPhase::Ready));
        assert_eq!(state.snapshot().await.version, 1);
    }

    #[tokio::test]
    async fn follow_up_is_applied_under_the_same_gate() {
        let state = AppState::new(AppConfig::default());

        let (_, next, follow) = state
            .run_transition_then(
                GameEvent::StartMatch,
                || async { Ok(true) },
                |stop: &bool| stop.then_some(GameEvent::Finish(FinishReason::ManualStop)),
            )
            .await
            .unwrap();

        assert_eq!(next, GamePhase::MatchRunning(RoundPhase::Ready));
        assert_eq!(follow, Some(GamePhase::Finished(FinishReason::ManualStop)));
        assert_eq!(state.snapshot().await.version, 2);
    }

    #[tokio::test]
    async fn no_follow_up_leaves_the_first_phase() {
        let state = AppState::new(AppConfig::default());

        let (_, next, follow) = state
            .run_transition_then(
                GameEvent::StartMatch,
                || async { Ok(false) },
                |stop: &bool| stop.then_some(GameEvent::Finish(FinishReason::ManualStop)),
            )
            .await
            .unwrap();

        assert_eq!(next, GamePhase::MatchRunning(RoundPhase::Ready));
        assert_eq!(follow, None);
        assert_eq!(state.state_machine_phase().await, next);
    }

    #[tokio::test]
    async fn history_is_bounded_and_most_recent_first() {
        let config = AppConfig {
            history_limit: 2,
            ..AppConfig::default()
        };
        let state = AppState::new(config);

        let sessions: Vec<_> = (0..3)
            .map(|i| MatchSession::new(format!("p{i}"), 1, 0))
            .collect();
        for session in &sessions {
            state.archive_match(session.clone()).await;
        }

        let names: Vec<_> = state
            .history()
            .await
            .into_iter()
            .map(|session| session.player_name)
            .collect();
        assert_eq!(names, vec!["p2", "p1"]);
    }
}
