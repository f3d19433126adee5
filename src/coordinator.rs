//! Vote coordinator
//!
//! Runs the vote state machine for a (voter, voteable) pair and keeps the
//! ledger and both participants' counters in step.
//!
//! ## Commit protocol
//!
//! ```text
//! check_voteable
//!     ↓
//! BEGIN IMMEDIATE ── find voting ── plan transition
//!     ↓
//! seed missing counter rows from the ledger
//!     ↓
//! ledger write (create / flip / delete)
//!     ↓
//! voteable counters += delta, voter counters += delta (if counted)
//!     ↓
//! COMMIT (any error: ROLLBACK)
//! ```
//!
//! A transition that loses a race (unique violation, lock timeout) is re-run
//! from the lookup up to `max_conflict_retries` times.

use std::sync::Arc;

use diesel::SqliteConnection;
use tracing::{debug, warn};

use crate::capabilities::Capabilities;
use crate::config::Config;
use crate::db::models::counter_roles;
use crate::db::{counters, votings, VoteCounts, Voting, VotingDb};
use crate::error::VoteError;
use crate::participant::{Participant, ParticipantKey};
use crate::transition::{self, LedgerWrite, Transition, VoteAction, VoteState};

/// What a successful vote operation changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteChange {
    pub from: VoteState,
    pub to: VoteState,
}

impl From<&Transition> for VoteChange {
    fn from(t: &Transition) -> Self {
        Self { from: t.from, to: t.to }
    }
}

/// Voting operations over a shared database
pub struct VoteCoordinator {
    db: Arc<VotingDb>,
    capabilities: Capabilities,
    max_conflict_retries: u32,
}

impl VoteCoordinator {
    pub fn new(db: Arc<VotingDb>, capabilities: Capabilities) -> Self {
        Self {
            db,
            capabilities,
            max_conflict_retries: 3,
        }
    }

    /// Build from config: capabilities and retry budget both come from it
    pub fn from_config(db: Arc<VotingDb>, config: &Config) -> Self {
        Self::new(db, Capabilities::from_config(config))
            .with_max_conflict_retries(config.max_conflict_retries)
    }

    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    // =========================================================================
    // Vote Operations
    // =========================================================================

    /// Up vote `voteable`. Switches an existing down vote to up.
    ///
    /// Fails with [`VoteError::AlreadyVoted`] if the voter already up voted.
    pub fn up_vote(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<VoteChange, VoteError> {
        self.apply(VoteAction::UpVote, voter, voteable)
    }

    /// Up vote, treating an existing up vote as success with no change
    pub fn up_vote_idempotent(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<Option<VoteChange>, VoteError> {
        self.apply_idempotent(VoteAction::UpVote, voter, voteable)
    }

    /// Down vote `voteable`. Switches an existing up vote to down.
    ///
    /// Fails with [`VoteError::AlreadyVoted`] if the voter already down voted.
    pub fn down_vote(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<VoteChange, VoteError> {
        self.apply(VoteAction::DownVote, voter, voteable)
    }

    /// Down vote, treating an existing down vote as success with no change
    pub fn down_vote_idempotent(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<Option<VoteChange>, VoteError> {
        self.apply_idempotent(VoteAction::DownVote, voter, voteable)
    }

    /// Clear the voter's vote on `voteable`
    ///
    /// Fails with [`VoteError::NotVoted`] if there is nothing to clear.
    pub fn unvote(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<VoteChange, VoteError> {
        self.apply(VoteAction::Unvote, voter, voteable)
    }

    /// Clear the vote, treating "not voted" as success with no change
    pub fn unvote_idempotent(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<Option<VoteChange>, VoteError> {
        self.apply_idempotent(VoteAction::Unvote, voter, voteable)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Vote state of the pair
    pub fn vote_state(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<VoteState, VoteError> {
        let voteable = voteable.participant_key();
        self.check_voteable(&voteable)?;
        let voter = voter.participant_key();

        let voting = self.db.with_conn(|conn| votings::find(conn, &voter, &voteable))?;
        Ok(voting.map_or(VoteState::None, |v| v.state()))
    }

    /// True if the voter has any vote on `voteable`
    pub fn voted(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<bool, VoteError> {
        Ok(self.vote_state(voter, voteable)? != VoteState::None)
    }

    /// True if the voter up voted `voteable`
    pub fn up_voted(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<bool, VoteError> {
        Ok(self.vote_state(voter, voteable)? == VoteState::Up)
    }

    /// True if the voter down voted `voteable`
    pub fn down_voted(
        &self,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<bool, VoteError> {
        Ok(self.vote_state(voter, voteable)? == VoteState::Down)
    }

    /// Persisted up/down totals on a voteable
    pub fn voteable_counts(&self, voteable: &impl Participant) -> Result<VoteCounts, VoteError> {
        let voteable = voteable.participant_key();
        self.check_voteable(&voteable)?;
        self.db.with_conn(|conn| {
            read_counts(conn, counter_roles::VOTEABLE, &voteable, votings::tally_for_voteable)
        })
    }

    /// Persisted up/down totals cast by a voter; `None` for voter types
    /// without counters
    pub fn voter_counts(&self, voter: &impl Participant) -> Result<Option<VoteCounts>, VoteError> {
        let voter = voter.participant_key();
        if !self.capabilities.has_voter_counters(&voter.participant_type) {
            return Ok(None);
        }
        self.db
            .with_conn(|conn| read_counts(conn, counter_roles::VOTER, &voter, votings::tally_for_voter))
            .map(Some)
    }

    /// Every voting on a voteable
    pub fn votings_for_voteable(&self, voteable: &impl Participant) -> Result<Vec<Voting>, VoteError> {
        let voteable = voteable.participant_key();
        self.check_voteable(&voteable)?;
        self.db.with_conn(|conn| votings::list_for_voteable(conn, &voteable))
    }

    /// Every voting cast by a voter
    pub fn votings_by_voter(&self, voter: &impl Participant) -> Result<Vec<Voting>, VoteError> {
        let voter = voter.participant_key();
        self.db.with_conn(|conn| votings::list_for_voter(conn, &voter))
    }

    // =========================================================================
    // Repair
    // =========================================================================

    /// Rebuild a voteable's counters from the ledger
    pub fn recount_voteable(&self, voteable: &impl Participant) -> Result<VoteCounts, VoteError> {
        let voteable = voteable.participant_key();
        self.check_voteable(&voteable)?;

        let counts = self.db.write_transaction(|conn| {
            let (up_votes, down_votes) = votings::tally_for_voteable(conn, &voteable)?;
            let counts = VoteCounts { up_votes, down_votes };
            counters::set(conn, counter_roles::VOTEABLE, &voteable, counts)?;
            Ok(counts)
        })?;

        debug!(voteable = %voteable, ?counts, "Recounted voteable");
        Ok(counts)
    }

    /// Rebuild a voter's counters from the ledger; `None` for voter types
    /// without counters
    pub fn recount_voter(&self, voter: &impl Participant) -> Result<Option<VoteCounts>, VoteError> {
        let voter = voter.participant_key();
        if !self.capabilities.has_voter_counters(&voter.participant_type) {
            return Ok(None);
        }

        let counts = self.db.write_transaction(|conn| {
            let (up_votes, down_votes) = votings::tally_for_voter(conn, &voter)?;
            let counts = VoteCounts { up_votes, down_votes };
            counters::set(conn, counter_roles::VOTER, &voter, counts)?;
            Ok(counts)
        })?;

        debug!(voter = %voter, ?counts, "Recounted voter");
        Ok(Some(counts))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn check_voteable(&self, voteable: &ParticipantKey) -> Result<(), VoteError> {
        if self.capabilities.is_voteable(&voteable.participant_type) {
            Ok(())
        } else {
            Err(VoteError::InvalidVoteable(voteable.participant_type.clone()))
        }
    }

    fn apply_idempotent(
        &self,
        action: VoteAction,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<Option<VoteChange>, VoteError> {
        match self.apply(action, voter, voteable) {
            Ok(change) => Ok(Some(change)),
            Err(e) if transition::is_absorbed(action, &e) => {
                debug!(?action, reason = %e, "Ignoring vote with no effect");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn apply(
        &self,
        action: VoteAction,
        voter: &impl Participant,
        voteable: &impl Participant,
    ) -> Result<VoteChange, VoteError> {
        let voteable = voteable.participant_key();
        self.check_voteable(&voteable)?;
        let voter = voter.participant_key();
        let count_voter = self.capabilities.has_voter_counters(&voter.participant_type);

        let mut attempt = 0;
        loop {
            let result = self.db.write_transaction(|conn| {
                commit_transition(conn, action, &voter, &voteable, count_voter)
            });

            match result {
                Ok(t) => {
                    debug!(
                        voter = %voter,
                        voteable = %voteable,
                        from = %t.from,
                        to = %t.to,
                        "Vote applied"
                    );
                    return Ok(VoteChange::from(&t));
                }
                Err(e) if e.is_retryable() && attempt < self.max_conflict_retries => {
                    attempt += 1;
                    warn!(
                        voter = %voter,
                        voteable = %voteable,
                        attempt,
                        error = %e,
                        "Vote transition conflicted, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// One transition inside an open write transaction
fn commit_transition(
    conn: &mut SqliteConnection,
    action: VoteAction,
    voter: &ParticipantKey,
    voteable: &ParticipantKey,
    count_voter: bool,
) -> Result<Transition, VoteError> {
    let existing = votings::find(conn, voter, voteable)?;
    let current = existing.as_ref().map_or(VoteState::None, Voting::state);
    let t = transition::plan(action, current)?;

    // Seed missing counter rows from the ledger before it changes, so a
    // participant whose counters were switched on after it already had
    // votings starts from its real totals
    seed_counter(conn, counter_roles::VOTEABLE, voteable, votings::tally_for_voteable)?;
    if count_voter {
        seed_counter(conn, counter_roles::VOTER, voter, votings::tally_for_voter)?;
    }

    match (t.write, existing) {
        (LedgerWrite::Create(direction), None) => {
            votings::create(conn, voter, voteable, direction)?;
        }
        (LedgerWrite::Flip(direction), Some(voting)) => {
            votings::update_direction(conn, &voting, direction)?;
        }
        (LedgerWrite::Delete, Some(voting)) => {
            votings::delete(conn, &voting)?;
        }
        (write, existing) => {
            return Err(VoteError::Transaction(format!(
                "Planned {:?} does not match stored voting {:?}",
                write, existing
            )));
        }
    }

    counters::adjust(conn, counter_roles::VOTEABLE, voteable, t.delta)?;
    if count_voter {
        counters::adjust(conn, counter_roles::VOTER, voter, t.delta)?;
    }

    Ok(t)
}

type TallyFn = fn(&mut SqliteConnection, &ParticipantKey) -> Result<(i64, i64), VoteError>;

/// Cached counters, or the ledger tally for a participant that has no row yet
fn read_counts(
    conn: &mut SqliteConnection,
    role: &str,
    participant: &ParticipantKey,
    tally: TallyFn,
) -> Result<VoteCounts, VoteError> {
    match counters::get(conn, role, participant)? {
        Some(row) => Ok(VoteCounts::from(&row)),
        None => {
            let (up_votes, down_votes) = tally(conn, participant)?;
            Ok(VoteCounts { up_votes, down_votes })
        }
    }
}

fn seed_counter(
    conn: &mut SqliteConnection,
    role: &str,
    participant: &ParticipantKey,
    tally: TallyFn,
) -> Result<(), VoteError> {
    if counters::get(conn, role, participant)?.is_some() {
        return Ok(());
    }

    let (up_votes, down_votes) = tally(conn, participant)?;
    if (up_votes, down_votes) != (0, 0) {
        debug!(role, participant = %participant, up_votes, down_votes, "Seeding counters from ledger");
        counters::set(conn, role, participant, VoteCounts { up_votes, down_votes })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator() -> VoteCoordinator {
        let db = Arc::new(VotingDb::open_in_memory().unwrap());
        let caps = Capabilities::new().voteable("Post").counted_voter("User");
        VoteCoordinator::new(db, caps)
    }

    fn user(id: &str) -> ParticipantKey {
        ParticipantKey::new("User", id)
    }

    fn bot(id: &str) -> ParticipantKey {
        ParticipantKey::new("Bot", id)
    }

    fn post(id: &str) -> ParticipantKey {
        ParticipantKey::new("Post", id)
    }

    fn counts(up_votes: i64, down_votes: i64) -> VoteCounts {
        VoteCounts { up_votes, down_votes }
    }

    #[test]
    fn test_up_vote_from_none() {
        let c = coordinator();

        let change = c.up_vote(&user("1"), &post("1")).unwrap();
        assert_eq!(change, VoteChange { from: VoteState::None, to: VoteState::Up });

        assert!(c.voted(&user("1"), &post("1")).unwrap());
        assert!(c.up_voted(&user("1"), &post("1")).unwrap());
        assert!(!c.down_voted(&user("1"), &post("1")).unwrap());
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(1, 0));
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(1, 0)));
    }

    #[test]
    fn test_down_vote_from_none() {
        let c = coordinator();

        c.down_vote(&user("1"), &post("1")).unwrap();

        assert!(c.down_voted(&user("1"), &post("1")).unwrap());
        assert!(!c.up_voted(&user("1"), &post("1")).unwrap());
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(0, 1));
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(0, 1)));
    }

    #[test]
    fn test_strict_repeat_fails_without_side_effects() {
        let c = coordinator();
        c.up_vote(&user("1"), &post("1")).unwrap();

        let err = c.up_vote(&user("1"), &post("1")).unwrap_err();
        assert!(matches!(err, VoteError::AlreadyVoted { up: true }));
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(1, 0));
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(1, 0)));

        c.unvote(&user("1"), &post("1")).unwrap();
        c.down_vote(&user("1"), &post("1")).unwrap();
        let err = c.down_vote(&user("1"), &post("1")).unwrap_err();
        assert!(matches!(err, VoteError::AlreadyVoted { up: false }));
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(0, 1));
    }

    #[test]
    fn test_idempotent_repeat_counts_once() {
        let c = coordinator();

        assert!(c.up_vote_idempotent(&user("1"), &post("1")).unwrap().is_some());
        assert!(c.up_vote_idempotent(&user("1"), &post("1")).unwrap().is_none());
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(1, 0));

        assert!(c.down_vote_idempotent(&user("2"), &post("1")).unwrap().is_some());
        assert!(c.down_vote_idempotent(&user("2"), &post("1")).unwrap().is_none());
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(1, 1));
    }

    #[test]
    fn test_idempotent_still_switches_direction() {
        let c = coordinator();
        c.up_vote(&user("1"), &post("1")).unwrap();

        let change = c.down_vote_idempotent(&user("1"), &post("1")).unwrap();
        assert_eq!(change, Some(VoteChange { from: VoteState::Up, to: VoteState::Down }));
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(0, 1));
    }

    #[test]
    fn test_switch_up_to_down_and_back() {
        let c = coordinator();
        c.up_vote(&user("1"), &post("1")).unwrap();

        c.down_vote(&user("1"), &post("1")).unwrap();
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(0, 1));
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(0, 1)));
        assert_eq!(c.votings_for_voteable(&post("1")).unwrap().len(), 1);

        c.up_vote(&user("1"), &post("1")).unwrap();
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(1, 0));
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(1, 0)));
        assert_eq!(c.votings_for_voteable(&post("1")).unwrap().len(), 1);
    }

    #[test]
    fn test_unvote() {
        let c = coordinator();

        assert!(matches!(c.unvote(&user("1"), &post("1")), Err(VoteError::NotVoted)));
        assert_eq!(c.unvote_idempotent(&user("1"), &post("1")).unwrap(), None);

        c.down_vote(&user("1"), &post("1")).unwrap();
        let change = c.unvote(&user("1"), &post("1")).unwrap();
        assert_eq!(change, VoteChange { from: VoteState::Down, to: VoteState::None });

        assert!(!c.voted(&user("1"), &post("1")).unwrap());
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(0, 0));
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(0, 0)));
    }

    #[test]
    fn test_uncounted_voter_type_skips_voter_counters() {
        let c = coordinator();

        c.up_vote(&bot("1"), &post("1")).unwrap();
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(1, 0));
        assert_eq!(c.voter_counts(&bot("1")).unwrap(), None);
        assert_eq!(c.recount_voter(&bot("1")).unwrap(), None);

        c.unvote(&bot("1"), &post("1")).unwrap();
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(0, 0));
    }

    #[test]
    fn test_invalid_voteable_rejected_everywhere() {
        let c = coordinator();
        let article = ParticipantKey::new("Article", "1");

        assert!(matches!(c.up_vote(&user("1"), &article), Err(VoteError::InvalidVoteable(_))));
        assert!(matches!(c.down_vote(&user("1"), &article), Err(VoteError::InvalidVoteable(_))));
        assert!(matches!(c.unvote(&user("1"), &article), Err(VoteError::InvalidVoteable(_))));
        assert!(matches!(
            c.up_vote_idempotent(&user("1"), &article),
            Err(VoteError::InvalidVoteable(_))
        ));
        assert!(matches!(
            c.unvote_idempotent(&user("1"), &article),
            Err(VoteError::InvalidVoteable(_))
        ));
        assert!(matches!(c.voted(&user("1"), &article), Err(VoteError::InvalidVoteable(_))));
        assert!(matches!(c.up_voted(&user("1"), &article), Err(VoteError::InvalidVoteable(_))));
        assert!(matches!(c.down_voted(&user("1"), &article), Err(VoteError::InvalidVoteable(_))));

        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(0, 0)));
        assert_eq!(c.votings_by_voter(&user("1")).unwrap().len(), 0);
    }

    #[test]
    fn test_queries_are_per_voter() {
        let c = coordinator();
        c.up_vote(&user("1"), &post("1")).unwrap();

        assert!(!c.voted(&user("2"), &post("1")).unwrap());
        assert!(!c.voted(&user("1"), &post("2")).unwrap());
        assert_eq!(c.vote_state(&user("1"), &post("1")).unwrap(), VoteState::Up);
    }

    #[test]
    fn test_recount_repairs_drift() {
        let c = coordinator();
        c.up_vote(&user("1"), &post("1")).unwrap();
        c.up_vote(&user("2"), &post("1")).unwrap();
        c.down_vote(&user("3"), &post("1")).unwrap();

        c.db
            .with_conn(|conn| {
                counters::set(conn, counter_roles::VOTEABLE, &post("1"), counts(9, 9))
            })
            .unwrap();

        assert_eq!(c.recount_voteable(&post("1")).unwrap(), counts(2, 1));
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(2, 1));
        assert_eq!(c.recount_voter(&user("3")).unwrap(), Some(counts(0, 1)));
    }

    #[test]
    fn test_failed_counter_update_rolls_back_ledger() {
        let c = coordinator();
        c.up_vote(&user("1"), &post("1")).unwrap();

        // Corrupt the cached counter so the unvote's decrement underflows
        c.db
            .with_conn(|conn| {
                counters::set(conn, counter_roles::VOTEABLE, &post("1"), counts(0, 0))
            })
            .unwrap();

        let err = c.unvote(&user("1"), &post("1")).unwrap_err();
        assert!(matches!(err, VoteError::Transaction(_)));

        // The voting survives and the voter's counter was not touched
        assert!(c.up_voted(&user("1"), &post("1")).unwrap());
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(1, 0)));
    }

    #[test]
    fn test_flip_then_unvote_commits() {
        let c = coordinator();
        c.up_vote(&user("1"), &post("1")).unwrap();

        let change = c.down_vote(&user("1"), &post("1")).unwrap();
        assert_eq!(change, VoteChange { from: VoteState::Up, to: VoteState::Down });
        assert_eq!(c.vote_state(&user("1"), &post("1")).unwrap(), VoteState::Down);
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(0, 1));

        c.unvote(&user("1"), &post("1")).unwrap();
        assert_eq!(c.vote_state(&user("1"), &post("1")).unwrap(), VoteState::None);
        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(0, 0));
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(0, 0)));
    }

    #[test]
    fn test_counters_track_ledger_through_mixed_sequence() {
        let c = coordinator();
        let voters = [user("1"), user("2"), user("3"), bot("1")];
        let posts = [post("1"), post("2")];

        let assert_in_step = |c: &VoteCoordinator, step: &str| {
            for p in &posts {
                let cached = c.voteable_counts(p).unwrap();
                assert_eq!(cached, c.recount_voteable(p).unwrap(), "{} after {}", p, step);
            }
            for v in &voters {
                let cached = c.voter_counts(v).unwrap();
                assert_eq!(cached, c.recount_voter(v).unwrap(), "{} after {}", v, step);
            }
        };

        for (i, v) in voters.iter().enumerate() {
            let p = &posts[i % posts.len()];
            c.up_vote(v, p).unwrap();
            assert_in_step(&c, "up");
            c.down_vote(v, p).unwrap();
            assert_in_step(&c, "flip down");
            c.up_vote(v, p).unwrap();
            assert_in_step(&c, "flip up");
            c.unvote(v, p).unwrap();
            assert_in_step(&c, "unvote");
            c.down_vote(v, p).unwrap();
            assert_in_step(&c, "re-vote");
            c.up_vote(v, &posts[(i + 1) % posts.len()]).unwrap();
            assert_in_step(&c, "second post");
        }

        assert_eq!(c.voteable_counts(&post("1")).unwrap(), counts(2, 2));
        assert_eq!(c.voteable_counts(&post("2")).unwrap(), counts(2, 2));
        assert_eq!(c.voter_counts(&user("1")).unwrap(), Some(counts(1, 1)));
    }

    #[test]
    fn test_enabling_voter_counters_after_votes_exist() {
        let db = Arc::new(VotingDb::open_in_memory().unwrap());
        let before = VoteCoordinator::new(db.clone(), Capabilities::new().voteable("Post"));
        before.up_vote(&user("1"), &post("1")).unwrap();
        before.down_vote(&user("1"), &post("2")).unwrap();
        assert_eq!(before.voter_counts(&user("1")).unwrap(), None);

        let after = VoteCoordinator::new(
            db,
            Capabilities::new().voteable("Post").counted_voter("User"),
        );
        // Reads fall back to the ledger until a row exists
        assert_eq!(after.voter_counts(&user("1")).unwrap(), Some(counts(1, 1)));

        // The first decrement seeds the row from the ledger instead of underflowing
        after.unvote(&user("1"), &post("1")).unwrap();
        assert_eq!(after.voter_counts(&user("1")).unwrap(), Some(counts(0, 1)));

        after.up_vote(&user("1"), &post("2")).unwrap();
        assert_eq!(after.voter_counts(&user("1")).unwrap(), Some(counts(1, 0)));
        assert_eq!(after.recount_voter(&user("1")).unwrap(), Some(counts(1, 0)));
    }
}
