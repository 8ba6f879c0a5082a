//! Single-elimination brackets.
//!
//! A bracket is built once per tournament from its confirmed participants:
//! the roster is shuffled, padded to the next power of two with byes, and
//! every later round is laid out as empty matches linked forward to the
//! match their winner feeds. Recording a result advances the winner and
//! resolves any match that can no longer receive a second opponent.
//!
//! ## Example
//!
//! ```
//! use tourney_bracket::bracket::{Participant, build_from_seed_order, record_result};
//!
//! let seeded = ["a", "b", "c"]
//!     .into_iter()
//!     .map(|id| Participant::new(id, id.to_uppercase()))
//!     .collect();
//! let mut bracket = build_from_seed_order(1, seeded).unwrap();
//! assert_eq!(bracket.total_rounds, 2);
//!
//! let outcome = record_result(&mut bracket, "r1m1", 2, 0).unwrap();
//! assert_eq!(outcome.advanced_to.as_deref(), Some("r2m1"));
//! ```

pub mod builder;
pub mod errors;
pub mod manager;
pub mod models;
pub mod progression;
pub mod seeding;

pub use builder::{
    MIN_PARTICIPANTS, build_bracket, build_bracket_with, build_from_seed_order, total_rounds_for,
};
pub use errors::{BracketError, BracketResult};
pub use manager::BracketManager;
pub use models::{
    Bracket, BracketId, BracketStatus, Match, MatchId, MatchStatus, Participant, ParticipantId,
    Round, RoundView, Slot, match_id, round_name,
};
pub use progression::{MatchOutcome, propagate_walkovers, record_result};
pub use seeding::SeedRandomizer;
