//! Vote state machine
//!
//! Pure planning of what a vote action does to one (voter, voteable) pair:
//! which ledger write it needs and how the up/down counters move. Applying
//! the plan is the coordinator's job.
//!
//! ```text
//!              up_vote               down_vote
//!   NONE ───────────────► UP   NONE ───────────► DOWN
//!   DOWN ───────────────► UP   UP   ───────────► DOWN
//!   UP, DOWN ── unvote ──► NONE
//! ```

use serde::{Deserialize, Serialize};

use crate::error::VoteError;

/// Direction recorded on a voting row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn from_up_vote(up_vote: bool) -> Self {
        if up_vote {
            Direction::Up
        } else {
            Direction::Down
        }
    }

    pub fn is_up(self) -> bool {
        self == Direction::Up
    }
}

/// Vote state of a (voter, voteable) pair. `None` is the absence of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteState {
    None,
    Up,
    Down,
}

impl From<Option<Direction>> for VoteState {
    fn from(direction: Option<Direction>) -> Self {
        match direction {
            Some(Direction::Up) => VoteState::Up,
            Some(Direction::Down) => VoteState::Down,
            None => VoteState::None,
        }
    }
}

impl std::fmt::Display for VoteState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VoteState::None => "none",
            VoteState::Up => "up",
            VoteState::Down => "down",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteAction {
    UpVote,
    DownVote,
    Unvote,
}

/// Ledger write a transition requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerWrite {
    Create(Direction),
    Flip(Direction),
    Delete,
}

/// Change applied to a participant's up/down counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterDelta {
    pub up: i64,
    pub down: i64,
}

impl CounterDelta {
    pub fn new(up: i64, down: i64) -> Self {
        Self { up, down }
    }
}

/// A planned state change for one pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: VoteState,
    pub to: VoteState,
    pub write: LedgerWrite,
    /// Applied identically to the voteable and, when counted, the voter
    pub delta: CounterDelta,
}

/// Plan `action` from `current`, or fail with the state error it raises
pub fn plan(action: VoteAction, current: VoteState) -> Result<Transition, VoteError> {
    use VoteState::*;

    let (to, write, delta) = match (action, current) {
        (VoteAction::UpVote, None) => (Up, LedgerWrite::Create(Direction::Up), CounterDelta::new(1, 0)),
        (VoteAction::UpVote, Down) => (Up, LedgerWrite::Flip(Direction::Up), CounterDelta::new(1, -1)),
        (VoteAction::UpVote, Up) => return Err(VoteError::AlreadyVoted { up: true }),

        (VoteAction::DownVote, None) => (Down, LedgerWrite::Create(Direction::Down), CounterDelta::new(0, 1)),
        (VoteAction::DownVote, Up) => (Down, LedgerWrite::Flip(Direction::Down), CounterDelta::new(-1, 1)),
        (VoteAction::DownVote, Down) => return Err(VoteError::AlreadyVoted { up: false }),

        (VoteAction::Unvote, Up) => (None, LedgerWrite::Delete, CounterDelta::new(-1, 0)),
        (VoteAction::Unvote, Down) => (None, LedgerWrite::Delete, CounterDelta::new(0, -1)),
        (VoteAction::Unvote, None) => return Err(VoteError::NotVoted),
    };

    Ok(Transition { from: current, to, write, delta })
}

/// Whether `err` is the "already there" outcome the idempotent form of
/// `action` swallows
pub fn is_absorbed(action: VoteAction, err: &VoteError) -> bool {
    match action {
        VoteAction::UpVote | VoteAction::DownVote => matches!(err, VoteError::AlreadyVoted { .. }),
        VoteAction::Unvote => matches!(err, VoteError::NotVoted),
    }
}
