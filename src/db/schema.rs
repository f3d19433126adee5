//! Database schema definitions

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use tracing::info;

use super::diesel_schema::schema_version;
use crate::error::VoteError;

/// Current schema version for migrations
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema
pub fn init_schema(conn: &mut SqliteConnection) -> Result<(), VoteError> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Creating new database schema v{}", SCHEMA_VERSION);
        conn.immediate_transaction(|conn| {
            create_tables(conn)?;
            set_schema_version(conn, SCHEMA_VERSION)
        })?;
    } else if current_version > SCHEMA_VERSION {
        return Err(VoteError::Transaction(format!(
            "Database schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        )));
    } else {
        info!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get current schema version (0 if not initialized)
fn get_schema_version(conn: &mut SqliteConnection) -> Result<i32, VoteError> {
    conn.batch_execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .map_err(|e| VoteError::Transaction(format!("Failed to create schema_version table: {}", e)))?;

    let version = schema_version::table
        .select(schema_version::version)
        .first::<i32>(conn)
        .optional()
        .map_err(|e| VoteError::Transaction(format!("Failed to read schema_version: {}", e)))?;

    Ok(version.unwrap_or(0))
}

/// Set schema version
fn set_schema_version(conn: &mut SqliteConnection, version: i32) -> Result<(), VoteError> {
    diesel::delete(schema_version::table)
        .execute(conn)
        .map_err(|e| VoteError::Transaction(format!("Failed to clear schema_version: {}", e)))?;
    diesel::insert_into(schema_version::table)
        .values(schema_version::version.eq(version))
        .execute(conn)
        .map_err(|e| VoteError::Transaction(format!("Failed to set schema_version: {}", e)))?;
    Ok(())
}

fn create_tables(conn: &mut SqliteConnection) -> Result<(), VoteError> {
    conn.batch_execute(VOTINGS_SCHEMA)
        .map_err(|e| VoteError::Transaction(format!("Failed to create votings table: {}", e)))?;

    conn.batch_execute(COUNTERS_SCHEMA)
        .map_err(|e| VoteError::Transaction(format!("Failed to create vote_counters table: {}", e)))?;

    Ok(())
}

/// Voting ledger. `up_vote` is never NULL: a row always has a direction,
/// and "no vote" is the absence of a row.
const VOTINGS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS votings (
    id TEXT PRIMARY KEY NOT NULL,
    voter_type TEXT NOT NULL,
    voter_id TEXT NOT NULL,
    voteable_type TEXT NOT NULL,
    voteable_id TEXT NOT NULL,
    up_vote INTEGER NOT NULL CHECK (up_vote IN (0, 1)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_votings_pair
    ON votings(voter_type, voter_id, voteable_type, voteable_id);
CREATE INDEX IF NOT EXISTS idx_votings_voteable
    ON votings(voteable_type, voteable_id);
"#;

/// Cached up/down aggregates per participant and role
const COUNTERS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS vote_counters (
    role TEXT NOT NULL CHECK (role IN ('voter', 'voteable')),
    participant_type TEXT NOT NULL,
    participant_id TEXT NOT NULL,
    up_votes INTEGER NOT NULL DEFAULT 0 CHECK (up_votes >= 0),
    down_votes INTEGER NOT NULL DEFAULT 0 CHECK (down_votes >= 0),
    updated_at TEXT NOT NULL,
    PRIMARY KEY (role, participant_type, participant_id)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_repeatable() {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        init_schema(&mut conn).unwrap();
        init_schema(&mut conn).unwrap();

        assert_eq!(get_schema_version(&mut conn).unwrap(), SCHEMA_VERSION);

        let rows: i64 = schema_version::table.count().get_result(&mut conn).unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        init_schema(&mut conn).unwrap();
        set_schema_version(&mut conn, SCHEMA_VERSION + 1).unwrap();

        assert!(matches!(init_schema(&mut conn), Err(VoteError::Transaction(_))));
    }

    #[test]
    fn test_direction_cannot_be_null() {
        let mut conn = SqliteConnection::establish(":memory:").unwrap();
        init_schema(&mut conn).unwrap();

        let result = conn.batch_execute(
            "INSERT INTO votings (id, voter_type, voter_id, voteable_type, voteable_id, up_vote, created_at, updated_at) \
             VALUES ('v1', 'User', '1', 'Post', '1', NULL, 'now', 'now')",
        );
        assert!(result.is_err());
    }
}
