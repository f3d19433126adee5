//! Voting capabilities per participant type
//!
//! Which types may be voted on, and which voter types carry their own
//! up/down counters, is decided once when the coordinator is configured.
//! Nothing is inspected on the participant records at call time.

use std::collections::HashSet;

use crate::config::Config;

/// Registry of voteable types and counter-bearing voter types
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    voteable_types: HashSet<String>,
    counted_voter_types: HashSet<String>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            voteable_types: config.voteable_types.iter().cloned().collect(),
            counted_voter_types: config.counted_voter_types.iter().cloned().collect(),
        }
    }

    /// Mark a type tag as eligible for voting
    pub fn voteable(mut self, participant_type: impl Into<String>) -> Self {
        self.voteable_types.insert(participant_type.into());
        self
    }

    /// Mark a voter type tag as having its own up/down counters
    pub fn counted_voter(mut self, participant_type: impl Into<String>) -> Self {
        self.counted_voter_types.insert(participant_type.into());
        self
    }

    pub fn is_voteable(&self, participant_type: &str) -> bool {
        self.voteable_types.contains(participant_type)
    }

    pub fn has_voter_counters(&self, participant_type: &str) -> bool {
        self.counted_voter_types.contains(participant_type)
    }
}
