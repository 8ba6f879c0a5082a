//! Tournament-side records the bracket core reads from and signals to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bracket::ParticipantId;

/// Tournament ID type
pub type TournamentId = i64;

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentState {
    /// Accepting registrations
    Registering,
    /// Bracket generated, matches being played
    InProgress,
    /// Final decided
    Finished,
    /// Tournament cancelled
    Cancelled,
}

impl std::fmt::Display for TournamentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentState::Registering => write!(f, "registering"),
            TournamentState::InProgress => write!(f, "in_progress"),
            TournamentState::Finished => write!(f, "finished"),
            TournamentState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Registration status of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    /// Signed up, attendance not yet confirmed
    Registered,
    /// Attendance confirmed, eligible for the bracket
    Confirmed,
    /// Left before the bracket was generated
    Withdrawn,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Registered => write!(f, "registered"),
            RegistrationStatus::Confirmed => write!(f, "confirmed"),
            RegistrationStatus::Withdrawn => write!(f, "withdrawn"),
        }
    }
}

/// Signal sent to the tournament record when the final is decided
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentFinish {
    pub tournament_id: TournamentId,
    pub winner_id: ParticipantId,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_strings_match_storage() {
        assert_eq!(TournamentState::InProgress.to_string(), "in_progress");
        assert_eq!(TournamentState::Finished.to_string(), "finished");
        assert_eq!(
            serde_json::to_string(&TournamentState::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_registration_status_strings() {
        assert_eq!(RegistrationStatus::Confirmed.to_string(), "confirmed");
        assert_eq!(
            serde_json::to_string(&RegistrationStatus::Withdrawn).unwrap(),
            "\"withdrawn\""
        );
    }
}
