//! Round rules and the computer opponent.

use std::{
    fmt,
    sync::{Mutex, PoisonError},
};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the three playable hand gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    /// Closed fist.
    Rock,
    /// Open hand.
    Paper,
    /// Index and middle finger raised.
    Scissors,
}

impl Gesture {
    /// Every gesture, in a fixed order.
    pub const ALL: [Gesture; 3] = [Gesture::Rock, Gesture::Paper, Gesture::Scissors];

    /// Whether `self` wins against `other`.
    pub fn beats(self, other: Gesture) -> bool {
        matches!(
            (self, other),
            (Gesture::Rock, Gesture::Scissors)
                | (Gesture::Scissors, Gesture::Paper)
                | (Gesture::Paper, Gesture::Rock)
        )
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gesture::Rock => "rock",
            Gesture::Paper => "paper",
            Gesture::Scissors => "scissors",
        };
        f.write_str(name)
    }
}

/// Result of a single round, from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// The player scores.
    PlayerWins,
    /// The computer scores.
    ComputerWins,
    /// Same gesture on both sides, nobody scores.
    Tie,
}

impl RoundOutcome {
    /// Compare the player's gesture against the computer's.
    pub fn decide(player: Gesture, computer: Gesture) -> Self {
        if player == computer {
            RoundOutcome::Tie
        } else if player.beats(computer) {
            RoundOutcome::PlayerWins
        } else {
            RoundOutcome::ComputerWins
        }
    }
}

/// Source of the computer's moves.
pub trait MoveSource: Send + Sync {
    /// Pick the computer's gesture for the next round.
    fn next_move(&self) -> Gesture;
}

/// Uniformly random computer moves.
pub struct RandomMoves {
    rng: Mutex<StdRng>,
}

impl RandomMoves {
    /// Seed from the OS, or from `seed` to replay the same sequence of moves.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl MoveSource for RandomMoves {
    fn next_move(&self) -> Gesture {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        Gesture::ALL[rng.random_range(0..Gesture::ALL.len())]
    }
}

/// Replays a fixed list of moves in a loop.
#[cfg(test)]
pub struct ScriptedMoves {
    moves: Vec<Gesture>,
    cursor: Mutex<usize>,
}

#[cfg(test)]
impl ScriptedMoves {
    pub fn new(moves: Vec<Gesture>) -> Self {
        assert!(!moves.is_empty(), "scripted moves must not be empty");
        Self {
            moves,
            cursor: Mutex::new(0),
        }
    }
}

#[cfg(test)]
impl MoveSource for ScriptedMoves {
    fn next_move(&self) -> Gesture {
        let mut cursor = self.cursor.lock().unwrap();
        let gesture = self.moves[*cursor % self.moves.len()];
        *cursor += 1;
        gesture
    }
}
