use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{
        game::ScoreSummary,
        public::{GamePhaseResponse, HistoryResponse},
    },
    error::AppError,
    services::public_service,
    state::SharedState,
};

/// Public read-only endpoints that expose the current match.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/phase", get(get_game_phase))
        .route("/public/score", get(get_score))
        .route("/matches", get(get_history))
}

#[utoipa::path(
    get,
    path = "/public/phase",
    tag = "public",
    responses((status = 200, description = "Current game phase", body = GamePhaseResponse))
)]
/// Return the phase the game is currently in.
pub async fn get_game_phase(
    State(state): State<SharedState>,
) -> Result<Json<GamePhaseResponse>, AppError> {
    let payload = public_service::get_game_phase(&state).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/public/score",
    tag = "public",
    responses(
        (status = 200, description = "Current score", body = ScoreSummary),
        (status = 404, description = "No active match")
    )
)]
/// Return the score of the current match.
pub async fn get_score(State(state): State<SharedState>) -> Result<Json<ScoreSummary>, AppError> {
    let payload = public_service::get_score(&state).await?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/matches",
    tag = "public",
    responses((status = 200, description = "Finished matches, most recent first", body = HistoryResponse))
)]
/// Return the finished matches kept in memory.
pub async fn get_history(
    State(state): State<SharedState>,
) -> Result<Json<HistoryResponse>, AppError> {
    let payload = public_service::get_history(&state).await?;
    Ok(Json(payload))
}
