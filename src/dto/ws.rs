use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        game::{RoundSummary, ScoreSummary},
        observation::ObservationInput,
        validation::validate_camera_id,
    },
    error::ServiceError,
    gesture::Gesture,
};

#[derive(Debug, Deserialize, ToSchema)]
/// Messages accepted from camera WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraInboundMessage {
    /// First message of every connection.
    Identification {
        /// Camera identifier.
        id: String,
    },
    /// Detector output for one video frame.
    Frame(ObservationInput),
    /// Any other message type, ignored.
    #[serde(other)]
    Unknown,
}

impl CameraInboundMessage {
    /// Parse a text frame and validate its payload.
    pub fn from_json_str(text: &str) -> Result<Self, ServiceError> {
        let message: Self = serde_json::from_str(text)
            .map_err(|err| ServiceError::InvalidInput(format!("malformed message: {err}")))?;

        match &message {
            Self::Identification { id } => validate_camera_id(id).map_err(|err| {
                ServiceError::InvalidInput(format!("invalid camera id `{id}`: {err}"))
            })?,
            Self::Frame(observation) => observation.validate()?,
            Self::Unknown => {}
        }

        Ok(message)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Messages pushed to camera WebSocket clients.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraOutboundMessage {
    /// Positive acknowledgement sent after successful identification.
    Ack {
        /// Identifier the camera announced.
        id: String,
    },
    /// Per-frame classification feedback.
    Detection {
        /// Gesture seen in the frame, `null` when none.
        gesture: Option<Gesture>,
        /// Consecutive frames showing this gesture.
        streak: u32,
        /// Whether the current round is accepting gestures.
        capturing: bool,
    },
    /// A round was played.
    RoundResolved {
        /// The played round.
        round: RoundSummary,
        /// Scoreboard after the round.
        score: ScoreSummary,
    },
}
