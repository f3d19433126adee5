//! Vote counter operations using Diesel
//!
//! Counters are adjusted in place with `col = col + delta` so concurrent votes
//! from different voters on the same voteable never lose an update.

use diesel::prelude::*;

use super::diesel_schema::vote_counters;
use super::models::{current_timestamp, NewVoteCounter, VoteCounter, VoteCounts};
use crate::error::VoteError;
use crate::participant::ParticipantKey;
use crate::transition::CounterDelta;

/// Read the counter row for a participant in `role`
pub fn get(
    conn: &mut SqliteConnection,
    role: &str,
    participant: &ParticipantKey,
) -> Result<Option<VoteCounter>, VoteError> {
    vote_counters::table
        .filter(vote_counters::role.eq(role))
        .filter(vote_counters::participant_type.eq(&participant.participant_type))
        .filter(vote_counters::participant_id.eq(&participant.participant_id))
        .select(VoteCounter::as_select())
        .first(conn)
        .optional()
        .map_err(|e| VoteError::Transaction(format!("Query failed: {}", e)))
}

/// Current totals; a participant without a row has zero votes
pub fn counts(
    conn: &mut SqliteConnection,
    role: &str,
    participant: &ParticipantKey,
) -> Result<VoteCounts, VoteError> {
    Ok(get(conn, role, participant)?
        .as_ref()
        .map(VoteCounts::from)
        .unwrap_or_default())
}

/// Atomically apply `delta` to a participant's counters, creating the row
/// on first use
///
/// The in-place update runs first so the CHECK constraints only ever see the
/// resulting totals. A seed row is inserted only when no row exists, which
/// makes a decrement on a missing row fail the CHECK like any other underflow.
/// Callers hold the write lock, so no row can appear between the two statements.
pub fn adjust(
    conn: &mut SqliteConnection,
    role: &str,
    participant: &ParticipantKey,
    delta: CounterDelta,
) -> Result<(), VoteError> {
    if delta == CounterDelta::default() {
        return Ok(());
    }

    let now = current_timestamp();
    let counter_failed = |e: diesel::result::Error| {
        VoteError::Transaction(format!(
            "Counter update failed for {} {}: {}",
            role, participant, e
        ))
    };

    let updated = diesel::update(
        vote_counters::table
            .filter(vote_counters::role.eq(role))
            .filter(vote_counters::participant_type.eq(&participant.participant_type))
            .filter(vote_counters::participant_id.eq(&participant.participant_id)),
    )
    .set((
        vote_counters::up_votes.eq(vote_counters::up_votes + delta.up),
        vote_counters::down_votes.eq(vote_counters::down_votes + delta.down),
        vote_counters::updated_at.eq(&now),
    ))
    .execute(conn)
    .map_err(counter_failed)?;

    if updated == 0 {
        let seed = NewVoteCounter {
            role,
            participant_type: &participant.participant_type,
            participant_id: &participant.participant_id,
            up_votes: delta.up,
            down_votes: delta.down,
            updated_at: &now,
        };

        diesel::insert_into(vote_counters::table)
            .values(&seed)
            .execute(conn)
            .map_err(counter_failed)?;
    }

    Ok(())
}

/// Overwrite a participant's counters with known totals
pub fn set(
    conn: &mut SqliteConnection,
    role: &str,
    participant: &ParticipantKey,
    counts: VoteCounts,
) -> Result<(), VoteError> {
    let now = current_timestamp();
    let row = NewVoteCounter {
        role,
        participant_type: &participant.participant_type,
        participant_id: &participant.participant_id,
        up_votes: counts.up_votes,
        down_votes: counts.down_votes,
        updated_at: &now,
    };

    diesel::insert_into(vote_counters::table)
        .values(&row)
        .on_conflict((
            vote_counters::role,
            vote_counters::participant_type,
            vote_counters::participant_id,
        ))
        .do_update()
        .set((
            vote_counters::up_votes.eq(counts.up_votes),
            vote_counters::down_votes.eq(counts.down_votes),
            vote_counters::updated_at.eq(&now),
        ))
        .execute(conn)
        .map_err(|e| VoteError::Transaction(format!("Counter reset failed: {}", e)))?;

    Ok(())
}

/// Total counter rows
pub fn counter_count(conn: &mut SqliteConnection) -> Result<i64, VoteError> {
    vote_counters::table
        .count()
        .get_result(conn)
        .map_err(|e| VoteError::Transaction(format!("Count query failed: {}", e)))
}
