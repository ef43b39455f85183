//! Service helpers that expose read-only public projections of the current match.

use crate::{
    dto::{
        game::{MatchSummary, ScoreSummary},
        public::{GamePhaseResponse, HistoryResponse},
    },
    error::ServiceError,
    services::sse_events,
    state::SharedState,
};

/// Return the current phase together with the scoreboard it displays.
pub async fn get_game_phase(state: &SharedState) -> Result<GamePhaseResponse, ServiceError> {
    let snapshot = state.snapshot().await;

    Ok(GamePhaseResponse {
        snapshot: sse_events::phase_snapshot(state, snapshot.phase).await,
        version: snapshot.version,
        transition_pending: snapshot.pending.is_some(),
    })
}

/// Return the score of the current match.
pub async fn get_score(state: &SharedState) -> Result<ScoreSummary, ServiceError> {
    state
        .read_current_match(|maybe| maybe.map(ScoreSummary::from))
        .await
        .ok_or_else(|| ServiceError::NotFound("no active match".into()))
}

/// Return the finished matches kept in memory, most recent first.
pub async fn get_history(state: &SharedState) -> Result<HistoryResponse, ServiceError> {
    let matches = state
        .history()
        .await
        .iter()
        .map(MatchSummary::from)
        .collect();
    Ok(HistoryResponse { matches })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig, dto::game::StartMatchRequest, dto::phase::VisibleGamePhase,
        services::match_service, state::AppState,
    };

    #[tokio::test]
    async fn score_requires_a_match() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            get_score(&state).await,
            Err(ServiceError::NotFound(_))
        ));

        match_service::start_match(&state, StartMatchRequest::default())
            .await
            .unwrap();
        let score = get_score(&state).await.unwrap();
        assert_eq!((score.player, score.computer), (0, 0));
        assert_eq!(score.rounds_to_win, 5);
    }

    #[tokio::test]
    async fn phase_reports_version_and_match() {
        let state = AppState::new(AppConfig::default());
        let idle = get_game_phase(&state).await.unwrap();
        assert_eq!(idle.snapshot.phase, VisibleGamePhase::Idle);
        assert_eq!(idle.version, 0);

        match_service::start_match(&state, StartMatchRequest::default())
            .await
            .unwrap();
        let ready = get_game_phase(&state).await.unwrap();
        assert_eq!(ready.snapshot.phase, VisibleGamePhase::Ready);
        assert_eq!(ready.version, 1);
        assert!(ready.snapshot.match_id.is_some());
        assert!(!ready.transition_pending);
    }

    #[tokio::test]
    async fn history_starts_empty() {
        let state = AppState::new(AppConfig::default());
        assert!(get_history(&state).await.unwrap().matches.is_empty());
    }
}
