//! make-voteable operator CLI
//!
//! Casts, clears and inspects votes in a make-voteable database, and repairs
//! cached counters from the ledger.
//!
//! ## Usage
//!
//! ```bash
//! # Up vote Post 42 as User 7
//! make-voteable up User:7 Post:42
//!
//! # Down vote, ignoring an existing down vote
//! make-voteable down User:7 Post:42 --idempotent
//!
//! # Clear a vote
//! make-voteable unvote User:7 Post:42
//!
//! # Inspect
//! make-voteable status User:7 Post:42
//! make-voteable counts Post:42
//!
//! # Rebuild cached counters from the ledger
//! make-voteable recount Post:42
//! ```
//!
//! Voteable and counted voter types come from the config file, or from
//! `--voteable-type` / `--counted-voter-type`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use make_voteable::{Config, ParticipantKey, VoteCoordinator, VotingDb};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "make-voteable")]
#[command(about = "Up/down vote ledger with per-participant vote counters")]
struct Args {
    /// Path to config file
    #[arg(short, long, env = "MAKE_VOTEABLE_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(long, env = "MAKE_VOTEABLE_DATABASE")]
    database: Option<PathBuf>,

    /// Additional type tag eligible for voting (repeatable)
    #[arg(long = "voteable-type")]
    voteable_types: Vec<String>,

    /// Additional voter type tag carrying its own counters (repeatable)
    #[arg(long = "counted-voter-type")]
    counted_voter_types: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Up vote a voteable
    Up {
        voter: ParticipantKey,
        voteable: ParticipantKey,
        /// Treat an existing up vote as success
        #[arg(long)]
        idempotent: bool,
    },
    /// Down vote a voteable
    Down {
        voter: ParticipantKey,
        voteable: ParticipantKey,
        /// Treat an existing down vote as success
        #[arg(long)]
        idempotent: bool,
    },
    /// Clear a vote
    Unvote {
        voter: ParticipantKey,
        voteable: ParticipantKey,
        /// Treat a missing vote as success
        #[arg(long)]
        idempotent: bool,
    },
    /// Show the vote state of a pair
    Status {
        voter: ParticipantKey,
        voteable: ParticipantKey,
    },
    /// Show counters and votings for a voteable
    Counts { voteable: ParticipantKey },
    /// Rebuild a participant's counters from the ledger
    Recount {
        participant: ParticipantKey,
        /// Recount the participant's voter-side counters instead
        #[arg(long)]
        as_voter: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("make_voteable=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Load config
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => {
            let default_path = Config::default_config_path();
            if default_path.exists() {
                Config::load(&default_path)?
            } else {
                Config::default()
            }
        }
    };

    // Apply CLI overrides
    if let Some(database) = args.database {
        config.database_path = database;
    }
    config.voteable_types.extend(args.voteable_types);
    config.counted_voter_types.extend(args.counted_voter_types);

    info!(database = %config.database_path.display(), "Starting make-voteable");

    let db = Arc::new(VotingDb::open(&config)?);
    let votes = VoteCoordinator::from_config(db, &config);

    match args.command {
        Command::Up { voter, voteable, idempotent } => {
            let change = if idempotent {
                votes.up_vote_idempotent(&voter, &voteable)?
            } else {
                Some(votes.up_vote(&voter, &voteable)?)
            };
            report_change(change);
        }
        Command::Down { voter, voteable, idempotent } => {
            let change = if idempotent {
                votes.down_vote_idempotent(&voter, &voteable)?
            } else {
                Some(votes.down_vote(&voter, &voteable)?)
            };
            report_change(change);
        }
        Command::Unvote { voter, voteable, idempotent } => {
            let change = if idempotent {
                votes.unvote_idempotent(&voter, &voteable)?
            } else {
                Some(votes.unvote(&voter, &voteable)?)
            };
            report_change(change);
        }
        Command::Status { voter, voteable } => {
            let state = votes.vote_state(&voter, &voteable)?;
            println!(
                "{}",
                serde_json::json!({
                    "voter": voter.to_string(),
                    "voteable": voteable.to_string(),
                    "state": state,
                })
            );
        }
        Command::Counts { voteable } => {
            let counts = votes.voteable_counts(&voteable)?;
            let votings = votes.votings_for_voteable(&voteable)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "voteable": voteable.to_string(),
                    "counts": counts,
                    "votings": votings,
                }))?
            );
        }
        Command::Recount { participant, as_voter } => {
            let counts = if as_voter {
                votes
                    .recount_voter(&participant)?
                    .with_context(|| format!("{} has no voter counters", participant.participant_type))?
            } else {
                votes.recount_voteable(&participant)?
            };
            println!("{}", serde_json::to_string(&counts)?);
        }
    }

    Ok(())
}

fn report_change(change: Option<make_voteable::VoteChange>) {
    match change {
        Some(change) => println!("{} -> {}", change.from, change.to),
        None => println!("unchanged"),
    }
}
