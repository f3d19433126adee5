//! Error types for make-voteable

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Not a voteable type: {0}")]
    InvalidVoteable(String),

    #[error("Already {} voted", direction_word(.up))]
    AlreadyVoted { up: bool },

    #[error("Not voted")]
    NotVoted,

    #[error("Duplicate voting entry: {0}")]
    DuplicateEntry(String),

    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Invalid participant: {0}")]
    InvalidParticipant(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn direction_word(up: &bool) -> &'static str {
    if *up { "up" } else { "down" }
}

impl VoteError {
    /// Conflicts that a fresh attempt of the same transition can resolve
    pub fn is_retryable(&self) -> bool {
        matches!(self, VoteError::DuplicateEntry(_) | VoteError::Busy(_))
    }
}

impl From<DieselError> for VoteError {
    fn from(e: DieselError) -> Self {
        match e {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                VoteError::DuplicateEntry(info.message().to_string())
            }
            DieselError::DatabaseError(_, ref info)
                if info.message().contains("database is locked")
                    || info.message().contains("database is busy") =>
            {
                VoteError::Busy(info.message().to_string())
            }
            other => VoteError::Transaction(other.to_string()),
        }
    }
}

impl From<diesel::r2d2::PoolError> for VoteError {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        VoteError::Pool(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_voted_message() {
        assert_eq!(VoteError::AlreadyVoted { up: true }.to_string(), "Already up voted");
        assert_eq!(VoteError::AlreadyVoted { up: false }.to_string(), "Already down voted");
    }

    #[test]
    fn test_retryable() {
        assert!(VoteError::DuplicateEntry("pair".into()).is_retryable());
        assert!(VoteError::Busy("locked".into()).is_retryable());
        assert!(!VoteError::NotVoted.is_retryable());
        assert!(!VoteError::AlreadyVoted { up: true }.is_retryable());
        assert!(!VoteError::Transaction("boom".into()).is_retryable());
    }

    #[test]
    fn test_not_found_maps_to_transaction() {
        let err: VoteError = DieselError::NotFound.into();
        assert!(matches!(err, VoteError::Transaction(_)));
    }
}
