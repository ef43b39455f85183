use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::observation::{ClassifyResponse, ObservationInput},
    error::AppError,
    gesture::Observation,
    services::match_service,
    state::SharedState,
};

#[utoipa::path(
    post,
    path = "/classify",
    tag = "match",
    request_body = ObservationInput,
    responses(
        (status = 200, description = "Classification of the submitted frame", body = ClassifyResponse),
        (status = 400, description = "Malformed observation")
    )
)]
/// Classify a frame without affecting the match.
pub async fn classify(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ObservationInput>>,
) -> Result<Json<ClassifyResponse>, AppError> {
    let observation = Observation::try_from(payload)?;
    Ok(Json(match_service::classify(&state, &observation)))
}

/// Configure the stateless classification endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/classify", post(classify))
}
