//! A single frame of hand-tracker output and how it turns into a [`Detection`].

use tracing::debug;

use crate::gesture::{
    classifier::{Detection, FingerStates},
    landmark::HandLandmarks,
};

/// Detector tuning applied to landmark observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorSettings {
    /// Hands reporting a presence below this value are ignored.
    pub min_presence: f32,
    /// Whether frames are horizontally flipped before tracking (selfie view).
    pub mirrored: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            min_presence: 0.7,
            mirrored: true,
        }
    }
}

/// What the camera client saw in one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Raw landmarks for every detected hand.
    Landmarks(Vec<HandLandmarks>),
    /// Finger states already derived client-side.
    Fingers(Vec<FingerStates>),
}

impl Observation {
    /// Finger states of every hand that passes the detector settings, in detector order.
    pub fn hands(&self, settings: &DetectorSettings) -> Vec<FingerStates> {
        match self {
            Observation::Landmarks(hands) => hands
                .iter()
                .filter(|hand| {
                    let present = hand.is_present(settings.min_presence);
                    if !present {
                        debug!(
                            presence = ?hand.presence(),
                            min_presence = settings.min_presence,
                            "ignoring hand below presence threshold"
                        );
                    }
                    present
                })
                .map(|hand| hand.finger_states(settings.mirrored))
                .collect(),
            Observation::Fingers(hands) => hands.clone(),
        }
    }

    /// Look for a gesture among the observed hands.
    pub fn detect(&self, settings: &DetectorSettings) -> Detection {
        Detection::from_hands(&self.hands(settings))
    }
}
