use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Rock-Paper-Scissors backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::start_match,
        crate::routes::matches::current_match,
        crate::routes::matches::start_round,
        crate::routes::matches::throw,
        crate::routes::matches::next_round,
        crate::routes::matches::stop_match,
        crate::routes::matches::end_match,
        crate::routes::classify::classify,
        crate::routes::public::get_game_phase,
        crate::routes::public::get_score,
        crate::routes::public::get_history,
        crate::routes::sse::public_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::StartMatchRequest,
            crate::dto::game::MatchSummary,
            crate::dto::game::ScoreSummary,
            crate::dto::game::WinnerDto,
            crate::dto::game::RoundSummary,
            crate::dto::game::ThrowResponse,
            crate::dto::game::RetryReason,
            crate::dto::observation::ObservationInput,
            crate::dto::observation::HandInput,
            crate::dto::observation::FingerStatesDto,
            crate::dto::observation::ClassifyResponse,
            crate::dto::public::GamePhaseResponse,
            crate::dto::public::HistoryResponse,
            crate::dto::common::GamePhaseSnapshot,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::phase::FinishReasonDto,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::CountdownEvent,
            crate::dto::sse::RoundRetryEvent,
            crate::dto::sse::RoundResolvedEvent,
            crate::dto::sse::MatchFinishedEvent,
            crate::dto::ws::CameraInboundMessage,
            crate::dto::ws::CameraOutboundMessage,
            crate::gesture::Gesture,
            crate::gesture::RoundOutcome,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "match", description = "Match lifecycle and round play"),
        (name = "public", description = "Read-only projections for displays"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "cameras", description = "WebSocket frame stream for camera clients"),
    )
)]
pub struct ApiDoc;
