//! Make Voteable - up/down voting with transactional vote counters
//!
//! Lets a voter cast up or down votes on a voteable, records the vote per
//! (voter, voteable) pair, and keeps up/down counters on both participants
//! consistent with that record.
//!
//! ## Architecture
//!
//! ```text
//! VoteCoordinator (state machine, commit protocol)
//!     ↓
//! Repository Layer (db/votings.rs, db/counters.rs)
//!     ↓
//! SQLite Database (votings, vote_counters)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use make_voteable::{Capabilities, ParticipantKey, VoteCoordinator, VotingDb};
//!
//! let db = Arc::new(VotingDb::open_in_memory()?);
//! let votes = VoteCoordinator::new(db, Capabilities::new().voteable("Post").counted_voter("User"));
//!
//! let user = ParticipantKey::new("User", "1");
//! let post = ParticipantKey::new("Post", "42");
//! votes.up_vote(&user, &post)?;
//! assert!(votes.up_voted(&user, &post)?);
//! # Ok::<(), make_voteable::VoteError>(())
//! ```

pub mod capabilities;
pub mod config;
pub mod coordinator;
pub mod db;
pub mod error;
pub mod participant;
pub mod transition;

// Re-exports
pub use capabilities::Capabilities;
pub use config::Config;
pub use coordinator::{VoteChange, VoteCoordinator};
pub use db::{VoteCounts, Voting, VotingDb};
pub use error::VoteError;
pub use participant::{Participant, ParticipantKey};
pub use transition::{Direction, VoteState};
