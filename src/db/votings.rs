//! Voting ledger operations using Diesel
//!
//! Durable record of which voter voted which way on which voteable. Nothing
//! here touches counters; keeping them in step is the coordinator's job.

use diesel::prelude::*;
use uuid::Uuid;

use super::diesel_schema::votings;
use super::models::{current_timestamp, NewVoting, Voting};
use crate::error::VoteError;
use crate::participant::ParticipantKey;
use crate::transition::Direction;

// ============================================================================
// Read Operations
// ============================================================================

/// Find the voting for a (voter, voteable) pair
pub fn find(
    conn: &mut SqliteConnection,
    voter: &ParticipantKey,
    voteable: &ParticipantKey,
) -> Result<Option<Voting>, VoteError> {
    votings::table
        .filter(votings::voter_type.eq(&voter.participant_type))
        .filter(votings::voter_id.eq(&voter.participant_id))
        .filter(votings::voteable_type.eq(&voteable.participant_type))
        .filter(votings::voteable_id.eq(&voteable.participant_id))
        .select(Voting::as_select())
        .first(conn)
        .optional()
        .map_err(|e| VoteError::Transaction(format!("Query failed: {}", e)))
}

/// All votings cast on a voteable, oldest first
pub fn list_for_voteable(
    conn: &mut SqliteConnection,
    voteable: &ParticipantKey,
) -> Result<Vec<Voting>, VoteError> {
    votings::table
        .filter(votings::voteable_type.eq(&voteable.participant_type))
        .filter(votings::voteable_id.eq(&voteable.participant_id))
        .order((votings::created_at.asc(), votings::id.asc()))
        .select(Voting::as_select())
        .load(conn)
        .map_err(|e| VoteError::Transaction(format!("Query failed: {}", e)))
}

/// All votings cast by a voter, oldest first
pub fn list_for_voter(
    conn: &mut SqliteConnection,
    voter: &ParticipantKey,
) -> Result<Vec<Voting>, VoteError> {
    votings::table
        .filter(votings::voter_type.eq(&voter.participant_type))
        .filter(votings::voter_id.eq(&voter.participant_id))
        .order((votings::created_at.asc(), votings::id.asc()))
        .select(Voting::as_select())
        .load(conn)
        .map_err(|e| VoteError::Transaction(format!("Query failed: {}", e)))
}

/// (up, down) row counts on a voteable, straight from the ledger
pub fn tally_for_voteable(
    conn: &mut SqliteConnection,
    voteable: &ParticipantKey,
) -> Result<(i64, i64), VoteError> {
    let rows: Vec<(bool, i64)> = votings::table
        .filter(votings::voteable_type.eq(&voteable.participant_type))
        .filter(votings::voteable_id.eq(&voteable.participant_id))
        .group_by(votings::up_vote)
        .select((votings::up_vote, diesel::dsl::count_star()))
        .load(conn)
        .map_err(|e| VoteError::Transaction(format!("Tally query failed: {}", e)))?;

    Ok(split_tally(&rows))
}

/// (up, down) row counts cast by a voter, straight from the ledger
pub fn tally_for_voter(
    conn: &mut SqliteConnection,
    voter: &ParticipantKey,
) -> Result<(i64, i64), VoteError> {
    let rows: Vec<(bool, i64)> = votings::table
        .filter(votings::voter_type.eq(&voter.participant_type))
        .filter(votings::voter_id.eq(&voter.participant_id))
        .group_by(votings::up_vote)
        .select((votings::up_vote, diesel::dsl::count_star()))
        .load(conn)
        .map_err(|e| VoteError::Transaction(format!("Tally query failed: {}", e)))?;

    Ok(split_tally(&rows))
}

fn split_tally(rows: &[(bool, i64)]) -> (i64, i64) {
    rows.iter().fold((0, 0), |(up, down), (is_up, n)| {
        if *is_up {
            (up + n, down)
        } else {
            (up, down + n)
        }
    })
}

/// Total voting rows
pub fn voting_count(conn: &mut SqliteConnection) -> Result<i64, VoteError> {
    votings::table
        .count()
        .get_result(conn)
        .map_err(|e| VoteError::Transaction(format!("Count query failed: {}", e)))
}

// ============================================================================
// Write Operations
// ============================================================================

/// Insert a voting for a pair that has none
///
/// A second row for the same pair violates `idx_votings_pair` and comes back
/// as [`VoteError::DuplicateEntry`].
pub fn create(
    conn: &mut SqliteConnection,
    voter: &ParticipantKey,
    voteable: &ParticipantKey,
    direction: Direction,
) -> Result<Voting, VoteError> {
    let id = Uuid::new_v4().to_string();
    let now = current_timestamp();

    let new_voting = NewVoting {
        id: &id,
        voter_type: &voter.participant_type,
        voter_id: &voter.participant_id,
        voteable_type: &voteable.participant_type,
        voteable_id: &voteable.participant_id,
        up_vote: direction.is_up(),
        created_at: &now,
        updated_at: &now,
    };

    diesel::insert_into(votings::table)
        .values(&new_voting)
        .execute(conn)
        .map_err(|e| match VoteError::from(e) {
            VoteError::DuplicateEntry(_) => {
                VoteError::DuplicateEntry(format!("{} already voted on {}", voter, voteable))
            }
            other => other,
        })?;

    Ok(Voting {
        id,
        voter_type: voter.participant_type.clone(),
        voter_id: voter.participant_id.clone(),
        voteable_type: voteable.participant_type.clone(),
        voteable_id: voteable.participant_id.clone(),
        up_vote: direction.is_up(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Store a new direction on an existing voting
pub fn update_direction(
    conn: &mut SqliteConnection,
    voting: &Voting,
    direction: Direction,
) -> Result<Voting, VoteError> {
    let now = current_timestamp();

    let updated = diesel::update(votings::table.filter(votings::id.eq(&voting.id)))
        .set((
            votings::up_vote.eq(direction.is_up()),
            votings::updated_at.eq(&now),
        ))
        .execute(conn)?;

    if updated == 0 {
        return Err(VoteError::Transaction(format!("Voting {} disappeared", voting.id)));
    }

    Ok(Voting {
        up_vote: direction.is_up(),
        updated_at: now,
        ..voting.clone()
    })
}

/// Remove a voting
pub fn delete(conn: &mut SqliteConnection, voting: &Voting) -> Result<(), VoteError> {
    let deleted = diesel::delete(votings::table.filter(votings::id.eq(&voting.id)))
        .execute(conn)?;

    if deleted == 0 {
        return Err(VoteError::Transaction(format!("Voting {} disappeared", voting.id)));
    }

    Ok(())
}
