//! Diesel model definitions for the voting tables
//!
//! - Queryable structs: for SELECT queries (reading data)
//! - Insertable structs: for INSERT queries (writing data)

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::diesel_schema::*;
use crate::participant::ParticipantKey;
use crate::transition::{Direction, VoteState};

// ============================================================================
// Timestamp Helpers (SQLite stores timestamps as TEXT)
// ============================================================================

/// Get current UTC timestamp as ISO 8601 string for SQLite TEXT columns
pub fn current_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ============================================================================
// Voting Models
// ============================================================================

/// One voter's stance on one voteable
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = votings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Voting {
    pub id: String,
    pub voter_type: String,
    pub voter_id: String,
    pub voteable_type: String,
    pub voteable_id: String,
    pub up_vote: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Voting {
    pub fn direction(&self) -> Direction {
        Direction::from_up_vote(self.up_vote)
    }

    pub fn state(&self) -> VoteState {
        VoteState::from(Some(self.direction()))
    }

    pub fn voter(&self) -> ParticipantKey {
        ParticipantKey::new(&self.voter_type, &self.voter_id)
    }

    pub fn voteable(&self) -> ParticipantKey {
        ParticipantKey::new(&self.voteable_type, &self.voteable_id)
    }
}

/// New voting for INSERT
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = votings)]
pub struct NewVoting<'a> {
    pub id: &'a str,
    pub voter_type: &'a str,
    pub voter_id: &'a str,
    pub voteable_type: &'a str,
    pub voteable_id: &'a str,
    pub up_vote: bool,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

// ============================================================================
// Counter Models
// ============================================================================

/// Which side of a voting a counter row aggregates
pub mod counter_roles {
    pub const VOTER: &str = "voter";
    pub const VOTEABLE: &str = "voteable";
}

/// Persisted up/down aggregate for one participant in one role
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = vote_counters)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VoteCounter {
    pub role: String,
    pub participant_type: String,
    pub participant_id: String,
    pub up_votes: i64,
    pub down_votes: i64,
    pub updated_at: String,
}

/// New counter row for INSERT (upsert seed)
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = vote_counters)]
pub struct NewVoteCounter<'a> {
    pub role: &'a str,
    pub participant_type: &'a str,
    pub participant_id: &'a str,
    pub up_votes: i64,
    pub down_votes: i64,
    pub updated_at: &'a str,
}

/// Up/down totals as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteCounts {
    pub up_votes: i64,
    pub down_votes: i64,
}

impl From<&VoteCounter> for VoteCounts {
    fn from(row: &VoteCounter) -> Self {
        Self {
            up_votes: row.up_votes,
            down_votes: row.down_votes,
        }
    }
}
