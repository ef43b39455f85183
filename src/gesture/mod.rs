//! Hand gesture recognition: landmarks to finger states, finger states to a gesture, and the
//! rules deciding who wins a round.

pub mod classifier;
pub mod landmark;
pub mod observation;
pub mod rules;

pub use self::classifier::{Detection, Finger, FingerStates, classify};
pub use self::landmark::{HandLandmark, HandLandmarks, LandmarkError};
pub use self::observation::{DetectorSettings, Observation};
pub use self::rules::{Gesture, MoveSource, RandomMoves, RoundOutcome};
