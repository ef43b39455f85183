use std::time::SystemTime;

use uuid::Uuid;

use crate::gesture::{Gesture, RoundOutcome};

/// Side that won a decided match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchWinner {
    /// The human player.
    Player,
    /// The computer opponent.
    Computer,
}

/// A round that has been played.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundRecord {
    /// 1-based round number within the match.
    pub number: u32,
    /// Gesture recognized for the player.
    pub player: Gesture,
    /// Gesture drawn for the computer.
    pub computer: Gesture,
    /// Who took the round.
    pub outcome: RoundOutcome,
    /// When the round was resolved.
    pub played_at: SystemTime,
}

/// Scoreboard and round history of a single match.
#[derive(Debug, Clone)]
pub struct MatchSession {
    /// Primary key of the match.
    pub id: Uuid,
    /// Display name of the human player.
    pub player_name: String,
    /// Wins needed to take the match.
    pub rounds_to_win: u32,
    /// Countdown length applied to every round, in seconds.
    pub countdown_secs: u32,
    /// Rounds won by the player.
    pub player_score: u32,
    /// Rounds won by the computer.
    pub computer_score: u32,
    /// Remaining countdown seconds while a countdown is running.
    pub countdown_remaining: Option<u32>,
    /// Every resolved round, oldest first.
    pub rounds: Vec<RoundRecord>,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the scoreboard changed.
    pub updated_at: SystemTime,
}

impl MatchSession {
    /// Build a new session with both counters at zero.
    pub fn new(player_name: String, rounds_to_win: u32, countdown_secs: u32) -> Self {
        let now = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            player_name,
            rounds_to_win,
            countdown_secs,
            player_score: 0,
            computer_score: 0,
            countdown_remaining: None,
            rounds: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Number the next round will carry.
    pub fn next_round_number(&self) -> u32 {
        self.rounds.len() as u32 + 1
    }

    /// Score a round and append it to the history.
    ///
    /// Returns `None` without touching the counters once the match is decided.
    pub fn record_round(&mut self, player: Gesture, computer: Gesture) -> Option<RoundRecord> {
        if self.is_decided() {
            return None;
        }

        let outcome = RoundOutcome::decide(player, computer);
        match outcome {
            RoundOutcome::PlayerWins => self.player_score += 1,
            RoundOutcome::ComputerWins => self.computer_score += 1,
            RoundOutcome::Tie => {}
        }

        let now = SystemTime::now();
        let record = RoundRecord {
            number: self.next_round_number(),
            player,
            computer,
            outcome,
            played_at: now,
        };
        self.rounds.push(record.clone());
        self.countdown_remaining = None;
        self.updated_at = now;

        Some(record)
    }

    /// Whether either counter reached the rounds-to-win threshold.
    pub fn is_decided(&self) -> bool {
        self.winner().is_some()
    }

    /// Side whose counter reached the threshold, if any.
    pub fn winner(&self) -> Option<MatchWinner> {
        if self.player_score >= self.rounds_to_win {
            Some(MatchWinner::Player)
        } else if self.computer_score >= self.rounds_to_win {
            Some(MatchWinner::Computer)
        } else {
            None
        }
    }

    /// Most recently resolved round.
    pub fn last_round(&self) -> Option<&RoundRecord> {
        self.rounds.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_follow_round_outcomes() {
        let mut session = MatchSession::new("Ada".into(), 3, 0);

        let win = session.record_round(Gesture::Rock, Gesture::Scissors).unwrap();
        assert_eq!(win.outcome, RoundOutcome::PlayerWins);
        let tie = session.record_round(Gesture::Paper, Gesture::Paper).unwrap();
        assert_eq!(tie.outcome, RoundOutcome::Tie);
        let loss = session.record_round(Gesture::Paper, Gesture::Scissors).unwrap();
        assert_eq!(loss.outcome, RoundOutcome::ComputerWins);

        assert_eq!((session.player_score, session.computer_score), (1, 1));
        assert_eq!(
            session.rounds.iter().map(|r| r.number).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(session.next_round_number(), 4);
    }

    #[test]
    fn match_is_decided_at_threshold() {
        let mut session = MatchSession::new("Ada".into(), 2, 0);
        session.record_round(Gesture::Scissors, Gesture::Rock);
        assert!(!session.is_decided());
        session.record_round(Gesture::Paper, Gesture::Scissors);

        assert_eq!(session.winner(), Some(MatchWinner::Computer));
        assert_eq!(session.computer_score, session.rounds_to_win);
    }

    #[test]
    fn decided_match_rejects_further_rounds() {
        let mut session = MatchSession::new("Ada".into(), 1, 0);
        session.record_round(Gesture::Rock, Gesture::Scissors).unwrap();

        assert!(session.record_round(Gesture::Rock, Gesture::Scissors).is_none());
        assert_eq!(session.player_score, 1);
        assert_eq!(session.rounds.len(), 1);
    }

    #[test]
    fn recording_clears_countdown() {
        let mut session = MatchSession::new("Ada".into(), 5, 3);
        session.countdown_remaining = Some(0);
        session.record_round(Gesture::Rock, Gesture::Rock);
        assert_eq!(session.countdown_remaining, None);
        assert_eq!(session.last_round().map(|r| r.outcome), Some(RoundOutcome::Tie));
    }
}
