//! # Tourney Bracket
//!
//! Single-elimination bracket generation and progression for tournaments.
//!
//! The library turns a tournament's confirmed participants into a randomly
//! seeded knockout bracket, records match results, advances winners and
//! resolves byes and walkovers automatically until a champion is decided.
//!
//! ## Match lifecycle
//!
//! Every match moves through a small set of statuses:
//!
//! - **Waiting**: At most one opponent known, the other still to be decided
//! - **Pending**: Both opponents known, result can be recorded
//! - **Completed**: Result recorded (or a lone first-round entrant advanced)
//! - **Walkover**: Resolved automatically because no opponent can arrive
//! - **Bye**: No participant will ever reach this match
//!
//! ## Core Modules
//!
//! - [`bracket`]: Data model, builder, progression engine and [`BracketManager`]
//! - [`db`]: Storage traits with PostgreSQL and in-memory implementations
//! - [`tournament`]: Tournament-level records the bracket reports to
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tourney_bracket::{BracketManager, Participant};
//! use tourney_bracket::db::{MemoryBracketRepository, MemoryRoster};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), tourney_bracket::BracketError> {
//! let roster = Arc::new(MemoryRoster::new());
//! roster
//!     .set_confirmed(1, vec![Participant::new("ana", "Ana"), Participant::new("bo", "Bo")])
//!     .await;
//!
//! let manager = BracketManager::new(Arc::new(MemoryBracketRepository::new()), roster);
//! let bracket_id = manager.generate_bracket(1).await?;
//!
//! let outcome = manager.record_match_result(bracket_id, "r1m1", 3, 1).await?;
//! assert!(outcome.finish.is_some());
//! # Ok(())
//! # }
//! ```

/// Bracket data model, construction and progression.
pub mod bracket;
pub use bracket::{
    Bracket, BracketError, BracketId, BracketManager, BracketResult, BracketStatus, Match,
    MatchId, MatchOutcome, MatchStatus, Participant, ParticipantId, Round, RoundView, Slot,
};

/// Persistence layer.
pub mod db;

/// Tournament records.
pub mod tournament;
pub use tournament::{TournamentFinish, TournamentId, TournamentState};
