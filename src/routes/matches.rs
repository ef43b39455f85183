use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        game::{MatchSummary, StartMatchRequest, ThrowResponse},
        observation::ObservationInput,
    },
    error::AppError,
    gesture::Observation,
    services::match_service,
    state::SharedState,
};

/// Routes driving the match lifecycle.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/match", get(current_match).post(start_match))
        .route("/match/round", post(start_round))
        .route("/match/throw", post(throw))
        .route("/match/next", post(next_round))
        .route("/match/stop", post(stop_match))
        .route("/match/end", post(end_match))
}

/// Start a new match. Unset fields fall back to the server configuration.
#[utoipa::path(
    post,
    path = "/match",
    tag = "match",
    request_body = StartMatchRequest,
    responses(
        (status = 200, description = "Match started", body = MatchSummary),
        (status = 400, description = "Invalid match options"),
        (status = 409, description = "A match is already loaded")
    )
)]
pub async fn start_match(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartMatchRequest>>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::start_match(&state, payload).await?))
}

/// Return the match currently loaded.
#[utoipa::path(
    get,
    path = "/match",
    tag = "match",
    responses(
        (status = 200, description = "Current match", body = MatchSummary),
        (status = 404, description = "No active match")
    )
)]
pub async fn current_match(
    State(state): State<SharedState>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::current_match(&state).await?))
}

/// Start the next round, running the countdown when the match has one.
#[utoipa::path(
    post,
    path = "/match/round",
    tag = "match",
    responses(
        (status = 200, description = "Round started", body = MatchSummary),
        (status = 409, description = "Not ready for a new round")
    )
)]
pub async fn start_round(
    State(state): State<SharedState>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::start_round(&state).await?))
}

/// Submit the detector output captured for the current round.
#[utoipa::path(
    post,
    path = "/match/throw",
    tag = "match",
    request_body = ObservationInput,
    responses(
        (status = 200, description = "Round resolved, or retry requested", body = ThrowResponse),
        (status = 400, description = "Malformed observation"),
        (status = 409, description = "Not capturing")
    )
)]
pub async fn throw(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ObservationInput>>,
) -> Result<Json<ThrowResponse>, AppError> {
    let observation = Observation::try_from(payload)?;
    Ok(Json(match_service::throw(&state, observation).await?))
}

/// Leave the round result and get ready for the next round.
#[utoipa::path(
    post,
    path = "/match/next",
    tag = "match",
    responses(
        (status = 200, description = "Ready for the next round", body = MatchSummary),
        (status = 409, description = "No round result displayed")
    )
)]
pub async fn next_round(
    State(state): State<SharedState>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::next_round(&state).await?))
}

/// Stop the running match early.
#[utoipa::path(
    post,
    path = "/match/stop",
    tag = "match",
    responses(
        (status = 200, description = "Match stopped", body = MatchSummary),
        (status = 409, description = "No running match")
    )
)]
pub async fn stop_match(
    State(state): State<SharedState>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::stop_match(&state).await?))
}

/// Archive the finished match and return to idle.
#[utoipa::path(
    post,
    path = "/match/end",
    tag = "match",
    responses(
        (status = 200, description = "Match archived", body = MatchSummary),
        (status = 409, description = "Match not finished")
    )
)]
pub async fn end_match(
    State(state): State<SharedState>,
) -> Result<Json<MatchSummary>, AppError> {
    Ok(Json(match_service::end_match(&state).await?))
}
