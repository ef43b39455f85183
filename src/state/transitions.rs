use crate::{
    error::ServiceError,
    services::sse_events::broadcast_phase_changed,
    state::{SharedState, state_machine::GameEvent},
};

/// Execute a planned state-machine transition, then broadcast the resulting phase change.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    state: &SharedState,
    event: GameEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
{
    let (res, next) = state.run_transition(event, work).await?;
    broadcast_phase_changed(state, next).await;
    Ok(res)
}

/// Execute a transition and the follow-up derived from its result without releasing the
/// transition gate in between, then broadcast each resulting phase in order.
///
/// The boolean reports whether the follow-up ran.
pub async fn run_transition_then_with_broadcast<F, Fut, T, N>(
    state: &SharedState,
    event: GameEvent,
    work: F,
    follow_up: N,
) -> Result<(T, bool), ServiceError>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, ServiceError>>,
    N: FnOnce(&T) -> Option<GameEvent>,
{
    let (res, next, follow) = state.run_transition_then(event, work, follow_up).await?;
    broadcast_phase_changed(state, next).await;
    if let Some(follow) = follow {
        broadcast_phase_changed(state, follow).await;
    }
    Ok((res, follow.is_some()))
}
