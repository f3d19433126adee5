//! SQLite storage for the voting ledger and vote counters
//!
//! ## Tables
//!
//! - `votings` - One row per (voter, voteable) pair that currently has a vote
//! - `vote_counters` - Up/down aggregates per participant, split by role
//! - `schema_version` - Bootstrap bookkeeping
//!
//! Repository functions in [`votings`] and [`counters`] take a plain
//! `&mut SqliteConnection` so the coordinator can run several of them inside
//! one transaction.

pub mod counters;
pub mod diesel_schema;
pub mod models;
pub mod schema;
pub mod votings;

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::VoteError;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// PRAGMAs applied to every pooled connection
#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas {
    busy_timeout_ms: u64,
    wal: bool,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let mut pragmas = format!("PRAGMA busy_timeout = {};", self.busy_timeout_ms);
        if self.wal {
            // WAL lets readers proceed while a vote transaction holds the write lock
            pragmas.push_str(" PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
        }
        conn.batch_execute(&pragmas)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Pooled SQLite database holding votings and counters
pub struct VotingDb {
    pool: DbPool,
}

impl VotingDb {
    /// Open or create the voting database described by `config`
    pub fn open(config: &Config) -> Result<Self, VoteError> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!(
            path = %config.database_path.display(),
            pool_size = config.pool_size,
            "Opening SQLite database"
        );

        let manager = ConnectionManager::<SqliteConnection>::new(
            config.database_path.to_string_lossy().into_owned(),
        );
        let pool = Pool::builder()
            .max_size(config.pool_size.max(1))
            .connection_timeout(Duration::from_secs(config.connection_timeout_secs))
            .connection_customizer(Box::new(ConnectionPragmas {
                busy_timeout_ms: config.busy_timeout_ms,
                wal: true,
            }))
            .build(manager)
            .map_err(|e| VoteError::Pool(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    ///
    /// Every SQLite `:memory:` connection is its own database, so the pool is
    /// capped at a single connection.
    pub fn open_in_memory() -> Result<Self, VoteError> {
        debug!("Opening in-memory SQLite database");

        let manager = ConnectionManager::<SqliteConnection>::new(":memory:");
        let pool = Pool::builder()
            .max_size(1)
            .connection_customizer(Box::new(ConnectionPragmas {
                busy_timeout_ms: 0,
                wal: false,
            }))
            .build(manager)
            .map_err(|e| VoteError::Pool(format!("Failed to build pool: {}", e)))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<(), VoteError> {
        let mut conn = self.conn()?;
        schema::init_schema(&mut *conn)
    }

    /// Check out a pooled connection
    pub fn conn(&self) -> Result<DbConn, VoteError> {
        self.pool
            .get()
            .map_err(|e| VoteError::Pool(format!("Failed to get connection: {}", e)))
    }

    /// Run a read on a pooled connection
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, VoteError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, VoteError>,
    {
        let mut conn = self.conn()?;
        f(&mut *conn)
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction
    ///
    /// The write lock is taken before `f` reads anything, so the whole body is
    /// serialized against every other writer on the database. Any error rolls
    /// the transaction back.
    pub fn write_transaction<F, T>(&self, f: F) -> Result<T, VoteError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, VoteError>,
    {
        let mut conn = self.conn()?;
        conn.immediate_transaction(f)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats, VoteError> {
        self.with_conn(|conn| {
            Ok(DbStats {
                voting_count: votings::voting_count(conn)? as u64,
                counter_rows: counters::counter_count(conn)? as u64,
            })
        })
    }
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub voting_count: u64,
    pub counter_rows: u64,
}

// Re-exports
pub use models::{Voting, VoteCounter, VoteCounts};
