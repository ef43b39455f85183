//! Hand landmarks as produced by the external hand tracker, and finger extension derived from
//! them.

use thiserror::Error;

use crate::gesture::classifier::{Finger, FingerStates};

/// Number of landmarks reported per hand.
pub const LANDMARK_COUNT: usize = 21;

/// Names for the hand pose landmarks, in the order the tracker reports them.
///
/// # Terminology
///
/// - **CMC**: carpometacarpal joint, the lowest joint of the thumb near the wrist.
/// - **MCP**: metacarpophalangeal joint, the knuckles near the palm.
/// - **PIP**: proximal interphalangeal joint, between the MCP and DIP.
/// - **DIP**: distal interphalangeal joint, the highest joint of a finger.
/// - **Tip**: placed on the tip of the finger, above the DIP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandLandmark {
    /// Wrist.
    Wrist,
    /// Thumb carpometacarpal joint.
    ThumbCmc,
    /// Thumb metacarpophalangeal joint.
    ThumbMcp,
    /// Thumb interphalangeal joint.
    ThumbIp,
    /// Thumb tip.
    ThumbTip,
    /// Index finger MCP joint.
    IndexFingerMcp,
    /// Index finger PIP joint.
    IndexFingerPip,
    /// Index finger DIP joint.
    IndexFingerDip,
    /// Index finger tip.
    IndexFingerTip,
    /// Middle finger MCP joint.
    MiddleFingerMcp,
    /// Middle finger PIP joint.
    MiddleFingerPip,
    /// Middle finger DIP joint.
    MiddleFingerDip,
    /// Middle finger tip.
    MiddleFingerTip,
    /// Ring finger MCP joint.
    RingFingerMcp,
    /// Ring finger PIP joint.
    RingFingerPip,
    /// Ring finger DIP joint.
    RingFingerDip,
    /// Ring finger tip.
    RingFingerTip,
    /// Pinky MCP joint.
    PinkyMcp,
    /// Pinky PIP joint.
    PinkyPip,
    /// Pinky DIP joint.
    PinkyDip,
    /// Pinky tip.
    PinkyTip,
}

/// Reasons a set of landmark points cannot describe a hand.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    /// Not exactly [`LANDMARK_COUNT`] points.
    #[error("expected {LANDMARK_COUNT} landmarks, got {0}")]
    WrongCount(usize),
    /// A coordinate is NaN or infinite.
    #[error("landmark {index} has a non-finite coordinate")]
    NonFinite {
        /// Offending landmark.
        index: usize,
    },
    /// Presence is not a probability.
    #[error("presence {0} is outside 0.0..=1.0")]
    PresenceOutOfRange(f32),
}

/// The 21 normalized landmark positions of one detected hand.
///
/// Coordinates are `[x, y, z]` with `x` and `y` normalized to the frame size and `y` growing
/// downwards.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    positions: [[f32; 3]; LANDMARK_COUNT],
    presence: Option<f32>,
}

impl HandLandmarks {
    /// Validate and wrap the tracker output for a single hand.
    pub fn new(points: &[[f32; 3]], presence: Option<f32>) -> Result<Self, LandmarkError> {
        let positions: [[f32; 3]; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|_| LandmarkError::WrongCount(points.len()))?;

        if let Some(index) = positions
            .iter()
            .position(|point| point.iter().any(|coord| !coord.is_finite()))
        {
            return Err(LandmarkError::NonFinite { index });
        }

        if let Some(value) = presence.filter(|value| !(0.0..=1.0).contains(value)) {
            return Err(LandmarkError::PresenceOutOfRange(value));
        }

        Ok(Self {
            positions,
            presence,
        })
    }

    /// Returns a landmark's position.
    pub fn position(&self, landmark: HandLandmark) -> [f32; 3] {
        self.positions[landmark as usize]
    }

    /// Tracker confidence that a hand is actually present, when reported.
    pub fn presence(&self) -> Option<f32> {
        self.presence
    }

    /// Whether the hand passes the presence threshold. Hands without a reported presence pass.
    pub fn is_present(&self, min_presence: f32) -> bool {
        self.presence.is_none_or(|presence| presence >= min_presence)
    }

    /// Derive which fingers are extended.
    ///
    /// A finger is extended when its tip sits above its PIP joint. The thumb folds sideways, so it
    /// is extended when its tip lies left of its MCP joint in a mirrored (selfie) frame, and right
    /// of it otherwise.
    pub fn finger_states(&self, mirrored: bool) -> FingerStates {
        FingerStates::from_fn(|finger| {
            let [tip_x, tip_y, _] = self.position(finger.tip());
            let [ref_x, ref_y, _] = self.position(finger.reference_joint());
            match finger {
                Finger::Thumb if mirrored => tip_x < ref_x,
                Finger::Thumb => tip_x > ref_x,
                _ => tip_y < ref_y,
            }
        })
    }
}
