//! Bracket error types.

use thiserror::Error;

use super::models::{BracketId, MatchId};
use crate::db::timeouts::TimeoutError;
use crate::tournament::TournamentId;

/// Bracket errors
#[derive(Debug, Error)]
pub enum BracketError {
    /// Input rejected before anything was changed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bracket not found
    #[error("Bracket not found: {0}")]
    BracketNotFound(BracketId),

    /// Match not found in the bracket
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// Match already has a result
    #[error("Match {0} is already completed")]
    AlreadyCompleted(MatchId),

    /// Match is missing a participant
    #[error("Match {0} does not have two participants")]
    IncompleteMatch(MatchId),

    /// A bracket already exists for the tournament
    #[error("Tournament {0} already has a bracket")]
    AlreadyBracketed(TournamentId),

    /// Stored bracket changed since it was read
    #[error("Bracket {bracket_id} was modified concurrently (expected version {expected})")]
    VersionConflict { bracket_id: BracketId, expected: i64 },

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bracket document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Persistence call did not finish in time
    #[error("Persistence timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl From<TimeoutError> for BracketError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(duration) => BracketError::Timeout(duration),
            TimeoutError::Database(e) => BracketError::Database(e),
        }
    }
}

impl BracketError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            BracketError::Database(_) | BracketError::Serialization(_) => {
                "Internal server error".to_string()
            }
            BracketError::Timeout(_) => "Storage temporarily unavailable".to_string(),
            _ => self.to_string(),
        }
    }

    /// Whether the error was produced by the storage collaborator
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            BracketError::Database(_) | BracketError::Serialization(_) | BracketError::Timeout(_)
        )
    }
}

/// Result type for bracket operations
pub type BracketResult<T> = Result<T, BracketError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_message_hides_database_details() {
        let err = BracketError::Database(sqlx::Error::RowNotFound);
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_persistence());
    }

    #[test]
    fn test_client_message_keeps_domain_errors() {
        let err = BracketError::AlreadyCompleted("r1m2".to_string());
        assert_eq!(err.client_message(), "Match r1m2 is already completed");
        assert!(!err.is_persistence());
    }

    #[test]
    fn test_timeout_conversion() {
        let err: BracketError = TimeoutError::Timeout(Duration::from_secs(5)).into();
        assert!(matches!(err, BracketError::Timeout(d) if d.as_secs() == 5));
    }
}
