use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::format_system_time,
    gesture::{Gesture, RoundOutcome},
    state::session::{MatchSession, MatchWinner, RoundRecord},
};

/// Payload used to start a new match. Every field falls back to the server configuration.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct StartMatchRequest {
    /// Name shown on the scoreboard.
    #[serde(default)]
    #[validate(length(min = 1, max = 64))]
    pub player_name: Option<String>,
    /// Round wins needed to take the match.
    #[serde(default)]
    #[validate(range(min = 1, max = 99))]
    pub rounds_to_win: Option<u32>,
    /// Seconds counted down before each capture, 0 to capture right away.
    #[serde(default)]
    #[validate(range(max = 10))]
    pub countdown_secs: Option<u32>,
}

/// Side that won a decided match.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WinnerDto {
    /// The human player.
    Player,
    /// The computer opponent.
    Computer,
}

impl From<MatchWinner> for WinnerDto {
    fn from(value: MatchWinner) -> Self {
        match value {
            MatchWinner::Player => WinnerDto::Player,
            MatchWinner::Computer => WinnerDto::Computer,
        }
    }
}

/// A resolved round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoundSummary {
    /// 1-based round number.
    pub number: u32,
    /// Gesture recognized for the player.
    pub player: Gesture,
    /// Gesture drawn for the computer.
    pub computer: Gesture,
    /// Who took the round.
    pub outcome: RoundOutcome,
    /// RFC 3339 timestamp of the throw.
    pub played_at: String,
}

impl From<&RoundRecord> for RoundSummary {
    fn from(value: &RoundRecord) -> Self {
        Self {
            number: value.number,
            player: value.player,
            computer: value.computer,
            outcome: value.outcome,
            played_at: format_system_time(value.played_at),
        }
    }
}

/// The two counters and what they race towards.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreSummary {
    /// Name of the player.
    pub player_name: String,
    /// Rounds won by the player.
    pub player: u32,
    /// Rounds won by the computer.
    pub computer: u32,
    /// Round wins needed to take the match.
    pub rounds_to_win: u32,
    /// Set once a counter reached the threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<WinnerDto>,
}

impl From<&MatchSession> for ScoreSummary {
    fn from(value: &MatchSession) -> Self {
        Self {
            player_name: value.player_name.clone(),
            player: value.player_score,
            computer: value.computer_score,
            rounds_to_win: value.rounds_to_win,
            winner: value.winner().map(Into::into),
        }
    }
}

/// Full projection of a match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSummary {
    /// Match identifier.
    pub id: Uuid,
    /// Countdown length of every round.
    pub countdown_secs: u32,
    /// Current scoreboard.
    pub score: ScoreSummary,
    /// Number the next round will carry.
    pub next_round: u32,
    /// Seconds left while a countdown runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown_remaining: Option<u32>,
    /// Played rounds, oldest first.
    pub rounds: Vec<RoundSummary>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp of the last change.
    pub updated_at: String,
}

impl From<&MatchSession> for MatchSummary {
    fn from(value: &MatchSession) -> Self {
        Self {
            id: value.id,
            countdown_secs: value.countdown_secs,
            score: value.into(),
            next_round: value.next_round_number(),
            countdown_remaining: value.countdown_remaining,
            rounds: value.rounds.iter().map(RoundSummary::from).collect(),
            created_at: format_system_time(value.created_at),
            updated_at: format_system_time(value.updated_at),
        }
    }
}

/// Why a throw has to be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RetryReason {
    /// No hand passed the detector.
    NoHand,
    /// Hands were seen but none formed a gesture.
    Unrecognized,
}

impl RetryReason {
    /// Message shown to the player.
    pub fn prompt(self) -> &'static str {
        match self {
            RetryReason::NoHand => {
                "No hand detected. Hold your hand in front of the camera and try again."
            }
            RetryReason::Unrecognized => {
                "Gesture not recognized. Show a fist (rock), an open hand (paper) or two fingers (scissors)."
            }
        }
    }
}

/// Result of submitting a gesture for the current round.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ThrowResponse {
    /// Nothing usable was seen; the round is still open.
    Retry {
        /// Why the frame was not usable.
        reason: RetryReason,
        /// Message shown to the player.
        prompt: String,
    },
    /// The round was played.
    Resolved {
        /// The played round.
        round: RoundSummary,
        /// Scoreboard after the round.
        score: ScoreSummary,
        /// Whether this round decided the match.
        match_over: bool,
    },
}

impl ThrowResponse {
    /// Retry answer carrying the prompt for `reason`.
    pub fn retry(reason: RetryReason) -> Self {
        ThrowResponse::Retry {
            reason,
            prompt: reason.prompt().to_string(),
        }
    }
}
