//! Wire format of hand-tracker output sent by camera clients.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::ServiceError,
    gesture::{Finger, FingerStates, Gesture, HandLandmarks, Observation},
};

/// Landmarks of one detected hand.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct HandInput {
    /// 21 `[x, y, z]` points, normalized to the frame, in tracker order.
    #[validate(length(equal = 21))]
    #[schema(value_type = Vec<Vec<f32>>)]
    pub landmarks: Vec<[f32; 3]>,
    /// Tracker confidence that the hand is present.
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub presence: Option<f32>,
}

/// Five-finger "extended" mapping computed client-side.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, ToSchema)]
pub struct FingerStatesDto {
    /// Thumb extended.
    pub thumb: bool,
    /// Index finger extended.
    pub index: bool,
    /// Middle finger extended.
    pub middle: bool,
    /// Ring finger extended.
    pub ring: bool,
    /// Little finger extended.
    pub pinky: bool,
}

impl From<FingerStatesDto> for FingerStates {
    fn from(value: FingerStatesDto) -> Self {
        FingerStates::new(value.thumb, value.index, value.middle, value.ring, value.pinky)
    }
}

impl From<FingerStates> for FingerStatesDto {
    fn from(value: FingerStates) -> Self {
        Self {
            thumb: value.is_extended(Finger::Thumb),
            index: value.is_extended(Finger::Index),
            middle: value.is_extended(Finger::Middle),
            ring: value.is_extended(Finger::Ring),
            pinky: value.is_extended(Finger::Pinky),
        }
    }
}

/// One frame of detector output: either landmarks or finger states, never both.
///
/// An empty observation means no hand was detected.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct ObservationInput {
    /// Raw landmarks per detected hand.
    #[serde(default)]
    #[validate(length(max = 4))]
    #[validate(nested)]
    pub hands: Vec<HandInput>,
    /// Finger states per detected hand.
    #[serde(default)]
    #[validate(length(max = 4))]
    pub fingers: Vec<FingerStatesDto>,
}

impl TryFrom<ObservationInput> for Observation {
    type Error = ServiceError;

    fn try_from(value: ObservationInput) -> Result<Self, Self::Error> {
        match (value.hands.is_empty(), value.fingers.is_empty()) {
            (false, false) => Err(ServiceError::InvalidInput(
                "observation must carry either hands or fingers, not both".into(),
            )),
            (true, false) => Ok(Observation::Fingers(
                value.fingers.into_iter().map(Into::into).collect(),
            )),
            _ => {
                let hands = value
                    .hands
                    .iter()
                    .map(|hand| HandLandmarks::new(&hand.landmarks, hand.presence))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Observation::Landmarks(hands))
            }
        }
    }
}

/// Stateless classification result.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClassifyResponse {
    /// Recognized gesture, `null` when none.
    pub gesture: Option<Gesture>,
    /// Finger states of every hand that passed the detector, in detector order.
    pub hands: Vec<FingerStatesDto>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmark::LANDMARK_COUNT;

    #[test]
    fn rejects_mixed_observations() {
        let input = ObservationInput {
            hands: vec![HandInput {
                landmarks: vec![[0.0; 3]; LANDMARK_COUNT],
                presence: None,
            }],
            fingers: vec![FingerStates::ALL_UP.into()],
        };
        assert!(Observation::try_from(input).is_err());
    }

    #[test]
    fn empty_observation_has_no_hands() {
        let observation = Observation::try_from(ObservationInput::default()).unwrap();
        assert_eq!(observation, Observation::Landmarks(Vec::new()));
    }

    #[test]
    fn validation_catches_short_landmark_lists() {
        let input = ObservationInput {
            hands: vec![HandInput {
                landmarks: vec![[0.0; 3]; 5],
                presence: Some(0.9),
            }],
            fingers: Vec::new(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn parses_finger_states_from_json() {
        let input: ObservationInput = serde_json::from_str(
            r#"{"fingers":[{"thumb":false,"index":true,"middle":true,"ring":false,"pinky":false}]}"#,
        )
        .unwrap();
        let observation = Observation::try_from(input).unwrap();
        assert_eq!(
            observation,
            Observation::Fingers(vec![FingerStates::new(false, true, true, false, false)])
        );
    }
}
