//! Tournament records at the boundary of the bracket core.
//!
//! The bracket core never owns tournament state. It reads the confirmed
//! roster and, when a final is decided, hands a [`TournamentFinish`] to the
//! persistence layer so the tournament row is closed in the same write as
//! the bracket.

pub mod models;

pub use models::{RegistrationStatus, TournamentFinish, TournamentId, TournamentState};
