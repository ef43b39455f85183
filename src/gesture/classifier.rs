//! Finger-state decision table mapping a raised/lowered finger vector to a gesture.

use crate::gesture::{landmark::HandLandmark, rules::Gesture};

/// The five fingers of a hand, thumb first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finger {
    /// Thumb.
    Thumb,
    /// Index finger.
    Index,
    /// Middle finger.
    Middle,
    /// Ring finger.
    Ring,
    /// Little finger.
    Pinky,
}

impl Finger {
    /// All fingers in landmark order.
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// Landmark placed on the tip of this finger.
    pub fn tip(self) -> HandLandmark {
        match self {
            Finger::Thumb => HandLandmark::ThumbTip,
            Finger::Index => HandLandmark::IndexFingerTip,
            Finger::Middle => HandLandmark::MiddleFingerTip,
            Finger::Ring => HandLandmark::RingFingerTip,
            Finger::Pinky => HandLandmark::PinkyTip,
        }
    }

    /// Joint the tip is compared against to decide whether the finger is extended.
    ///
    /// For the thumb this is the MCP joint (compared horizontally), for every other finger the
    /// PIP joint (compared vertically).
    pub fn reference_joint(self) -> HandLandmark {
        match self {
            Finger::Thumb => HandLandmark::ThumbMcp,
            Finger::Index => HandLandmark::IndexFingerPip,
            Finger::Middle => HandLandmark::MiddleFingerPip,
            Finger::Ring => HandLandmark::RingFingerPip,
            Finger::Pinky => HandLandmark::PinkyPip,
        }
    }
}

/// Mapping from each finger to its "extended" flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerStates {
    extended: [bool; 5],
}

impl FingerStates {
    /// Every finger folded (a fist).
    pub const ALL_DOWN: FingerStates = FingerStates {
        extended: [false; 5],
    };
    /// Every finger extended (an open hand).
    pub const ALL_UP: FingerStates = FingerStates {
        extended: [true; 5],
    };

    /// Build the mapping from flags given in [`Finger::ALL`] order.
    pub fn new(thumb: bool, index: bool, middle: bool, ring: bool, pinky: bool) -> Self {
        Self {
            extended: [thumb, index, middle, ring, pinky],
        }
    }

    /// Build the mapping by asking `f` about every finger.
    pub fn from_fn(mut f: impl FnMut(Finger) -> bool) -> Self {
        let mut extended = [false; 5];
        for (slot, finger) in extended.iter_mut().zip(Finger::ALL) {
            *slot = f(finger);
        }
        Self { extended }
    }

    /// Return a copy with `finger` set to `extended`.
    pub fn with(mut self, finger: Finger, extended: bool) -> Self {
        self.extended[finger as usize] = extended;
        self
    }

    /// Whether `finger` is extended.
    pub fn is_extended(&self, finger: Finger) -> bool {
        self.extended[finger as usize]
    }
}

/// Classify a finger-state vector.
///
/// Returns `None` when the vector does not match any gesture.
pub fn classify(states: &FingerStates) -> Option<Gesture> {
    match states.extended {
        [false, false, false, false, false] => Some(Gesture::Rock),
        [true, true, true, true, true] => Some(Gesture::Paper),
        [_, true, true, false, false] => Some(Gesture::Scissors),
        _ => None,
    }
}

/// Outcome of looking for a gesture among the hands of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// No hand made it through the detector.
    NoHand,
    /// At least one hand was seen but none formed a gesture.
    Unrecognized,
    /// A gesture was recognized.
    Recognized(Gesture),
}

impl Detection {
    /// Classify every hand and keep the first recognized gesture, in detector order.
    pub fn from_hands<'a>(hands: impl IntoIterator<Item = &'a FingerStates>) -> Self {
        let mut seen = false;
        for hand in hands {
            seen = true;
            if let Some(gesture) = classify(hand) {
                return Detection::Recognized(gesture);
            }
        }

        if seen {
            Detection::Unrecognized
        } else {
            Detection::NoHand
        }
    }

    /// The recognized gesture, if any.
    pub fn gesture(&self) -> Option<Gesture> {
        match self {
            Detection::Recognized(gesture) => Some(*gesture),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_down_is_rock() {
        assert_eq!(classify(&FingerStates::ALL_DOWN), Some(Gesture::Rock));
    }

    #[test]
    fn all_up_is_paper() {
        assert_eq!(classify(&FingerStates::ALL_UP), Some(Gesture::Paper));
    }

    #[test]
    fn index_and_middle_are_scissors_whatever_the_thumb() {
        for thumb in [false, true] {
            let states = FingerStates::new(thumb, true, true, false, false);
            assert_eq!(classify(&states), Some(Gesture::Scissors), "thumb={thumb}");
        }
    }

    #[test]
    fn other_vectors_are_unrecognized() {
        let cases = [
            FingerStates::new(true, false, false, false, false),
            FingerStates::new(false, true, true, true, true),
            FingerStates::new(false, true, false, false, false),
            FingerStates::new(false, true, true, true, false),
            FingerStates::new(false, false, true, true, false),
            FingerStates::new(true, true, false, false, true),
        ];
        for states in cases {
            assert_eq!(classify(&states), None, "{states:?}");
        }
    }

    #[test]
    fn every_vector_has_at_most_one_label() {
        let mut counts = [0usize; 4];
        for bits in 0u8..32 {
            let states = FingerStates::from_fn(|finger| bits & (1 << finger as u8) != 0);
            let slot = match classify(&states) {
                Some(Gesture::Rock) => 0,
                Some(Gesture::Paper) => 1,
                Some(Gesture::Scissors) => 2,
                None => 3,
            };
            counts[slot] += 1;
        }
        assert_eq!(counts, [1, 1, 2, 28]);
    }

    #[test]
    fn with_sets_single_fingers() {
        let states = FingerStates::ALL_DOWN
            .with(Finger::Index, true)
            .with(Finger::Pinky, true);
        assert!(states.is_extended(Finger::Index));
        assert!(!states.is_extended(Finger::Middle));
        assert!(states.is_extended(Finger::Pinky));
    }

    #[test]
    fn detection_keeps_first_recognized_hand() {
        let hands = [
            FingerStates::new(true, false, false, false, false),
            FingerStates::ALL_UP,
            FingerStates::ALL_DOWN,
        ];
        assert_eq!(
            Detection::from_hands(&hands),
            Detection::Recognized(Gesture::Paper)
        );
    }

    #[test]
    fn detection_distinguishes_missing_and_unrecognized_hands() {
        assert_eq!(Detection::from_hands(&[] as &[FingerStates]), Detection::NoHand);
        let hands = [FingerStates::new(false, true, false, false, false)];
        assert_eq!(Detection::from_hands(&hands), Detection::Unrecognized);
        assert_eq!(Detection::Unrecognized.gesture(), None);
    }
}
