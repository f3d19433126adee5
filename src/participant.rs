//! Participant identity
//!
//! Voters and voteables are records owned by the host application. This crate
//! only ever sees them as a type tag plus an opaque id, which together form the
//! polymorphic key stored on every voting row and counter row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VoteError;

/// Host record that can take part in voting, either as voter or voteable
pub trait Participant {
    /// Type tag, e.g. "User" or "Post"
    fn participant_type(&self) -> &str;

    /// Identifier unique within the type tag
    fn participant_id(&self) -> String;

    fn participant_key(&self) -> ParticipantKey {
        ParticipantKey::new(self.participant_type(), self.participant_id())
    }
}

/// Composite (type, id) key of a participant
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantKey {
    pub participant_type: String,
    pub participant_id: String,
}

impl ParticipantKey {
    pub fn new(participant_type: impl Into<String>, participant_id: impl Into<String>) -> Self {
        Self {
            participant_type: participant_type.into(),
            participant_id: participant_id.into(),
        }
    }
}

impl Participant for ParticipantKey {
    fn participant_type(&self) -> &str {
        &self.participant_type
    }

    fn participant_id(&self) -> String {
        self.participant_id.clone()
    }

    fn participant_key(&self) -> ParticipantKey {
        self.clone()
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.participant_type, self.participant_id)
    }
}

/// Parses `Type:id`. The id may itself contain colons.
impl FromStr for ParticipantKey {
    type Err = VoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(Self::new(kind, id)),
            _ => Err(VoteError::InvalidParticipant(format!(
                "expected Type:id, got {:?}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Post {
        id: u64,
    }

    impl Participant for Post {
        fn participant_type(&self) -> &str {
            "Post"
        }

        fn participant_id(&self) -> String {
            self.id.to_string()
        }
    }

    #[test]
    fn test_host_type_key() {
        let post = Post { id: 42 };
        assert_eq!(post.participant_key(), ParticipantKey::new("Post", "42"));
    }

    #[test]
    fn test_parse_and_display() {
        let key: ParticipantKey = "User:7".parse().unwrap();
        assert_eq!(key.participant_type, "User");
        assert_eq!(key.participant_id, "7");
        assert_eq!(key.to_string(), "User:7");

        let key: ParticipantKey = "Doc:urn:abc".parse().unwrap();
        assert_eq!(key.participant_id, "urn:abc");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("User".parse::<ParticipantKey>().is_err());
        assert!(":7".parse::<ParticipantKey>().is_err());
        assert!("User:".parse::<ParticipantKey>().is_err());
    }
}
