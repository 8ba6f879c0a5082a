//! Bracket data models for single-elimination tournaments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::tournament::TournamentId;

/// Bracket ID type
pub type BracketId = Uuid;

/// Participant ID type
pub type ParticipantId = String;

/// Match ID type (`r{round}m{position}`)
pub type MatchId = String;

/// Build the identifier of the match at `round`/`position`.
pub fn match_id(round: u32, position: u32) -> MatchId {
    format!("r{round}m{position}")
}

/// A competitor placed into the bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Unique participant identifier
    pub id: ParticipantId,
    /// Name shown in the bracket
    pub display_name: String,
    /// Synthetic entry used to pad a roster
    #[serde(default)]
    pub is_filler: bool,
}

impl Participant {
    /// Create a real participant
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_filler: false,
        }
    }

    /// Create a filler entry
    pub fn filler(id: impl Into<ParticipantId>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            is_filler: true,
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    /// Structurally empty, will never receive a participant
    Bye,
    /// Resolved automatically because the opposing feed is permanently empty
    Walkover,
    /// Both slots filled, waiting for a result
    Pending,
    /// Waiting for upstream matches to fill its slots
    Waiting,
    /// Resolved
    Completed,
}

impl MatchStatus {
    /// Whether the match has a winner and accepts no further changes
    pub fn is_resolved(self) -> bool {
        matches!(self, MatchStatus::Completed | MatchStatus::Walkover)
    }

    /// Whether the match still needs something to happen
    pub fn is_open(self) -> bool {
        matches!(self, MatchStatus::Pending | MatchStatus::Waiting)
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Bye => write!(f, "bye"),
            MatchStatus::Walkover => write!(f, "walkover"),
            MatchStatus::Pending => write!(f, "pending"),
            MatchStatus::Waiting => write!(f, "waiting"),
            MatchStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Which side of a match a participant occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    A,
    B,
}

impl Slot {
    /// Slot fed by the match at `position` of the previous round.
    ///
    /// Odd positions feed slot A, even positions feed slot B.
    pub fn fed_by(position: u32) -> Self {
        if position % 2 == 1 { Slot::A } else { Slot::B }
    }

    /// The opposing slot
    pub fn other(self) -> Self {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// A single match in the bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    /// Round number (1-indexed)
    pub round: u32,
    /// Position within the round (1-indexed)
    pub position: u32,
    pub slot_a: Option<Participant>,
    pub slot_b: Option<Participant>,
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Option<Participant>,
    pub status: MatchStatus,
    /// Match that receives this match's winner (None for the final)
    pub next_match_id: Option<MatchId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Create an empty match waiting for its feeds
    pub fn placeholder(
        round: u32,
        position: u32,
        next_match_id: Option<MatchId>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: match_id(round, position),
            round,
            position,
            slot_a: None,
            slot_b: None,
            score_a: 0,
            score_b: 0,
            winner: None,
            status: MatchStatus::Waiting,
            next_match_id,
            created_at,
            updated_at: None,
        }
    }

    pub fn slot(&self, slot: Slot) -> Option<&Participant> {
        match slot {
            Slot::A => self.slot_a.as_ref(),
            Slot::B => self.slot_b.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: Slot) -> &mut Option<Participant> {
        match slot {
            Slot::A => &mut self.slot_a,
            Slot::B => &mut self.slot_b,
        }
    }

    /// Number of occupied slots
    pub fn occupants(&self) -> usize {
        usize::from(self.slot_a.is_some()) + usize::from(self.slot_b.is_some())
    }

    /// Whether both slots hold a participant
    pub fn is_full(&self) -> bool {
        self.occupants() == 2
    }

    /// Whether this is the final
    pub fn is_final(&self) -> bool {
        self.next_match_id.is_none()
    }

    /// Award the match to the lone occupant of `slot` with a 1-0 presence score.
    pub(crate) fn award_to(&mut self, slot: Slot, status: MatchStatus, now: DateTime<Utc>) {
        let (score_a, score_b) = match slot {
            Slot::A => (1, 0),
            Slot::B => (0, 1),
        };
        self.score_a = score_a;
        self.score_b = score_b;
        self.winner = self.slot(slot).cloned();
        self.status = status;
        self.updated_at = Some(now);
    }
}

/// Round metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Round number (1-indexed)
    pub number: u32,
    /// Display name ("Final", "Semifinal", ...)
    pub name: String,
    pub match_count: u32,
    /// Resolved matches (completed or walkover)
    pub completed_count: u32,
}

/// Display name of `round` in a bracket of `total_rounds`
pub fn round_name(round: u32, total_rounds: u32) -> String {
    match total_rounds.saturating_sub(round) {
        0 => "Final".to_string(),
        1 => "Semifinal".to_string(),
        2 => "Quarterfinal".to_string(),
        3 => "Round of 16".to_string(),
        _ => format!("Round {round}"),
    }
}

/// Bracket status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BracketStatus {
    /// Matches still to be played
    Active,
    /// Final resolved
    Finished,
}

impl std::fmt::Display for BracketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketStatus::Active => write!(f, "active"),
            BracketStatus::Finished => write!(f, "finished"),
        }
    }
}

impl std::str::FromStr for BracketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BracketStatus::Active),
            "finished" => Ok(BracketStatus::Finished),
            other => Err(format!("unknown bracket status: {other}")),
        }
    }
}

/// Full single-elimination bracket for one tournament run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub id: BracketId,
    pub tournament_id: TournamentId,
    /// Participant ids in registration order
    pub participants: Vec<ParticipantId>,
    pub matches: BTreeMap<MatchId, Match>,
    pub rounds: Vec<Round>,
    pub status: BracketStatus,
    pub current_round: u32,
    pub total_rounds: u32,
    /// Optimistic concurrency counter, bumped on every persisted update
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Bracket {
    /// Number of first-round slots
    pub fn size(&self) -> u32 {
        1 << self.total_rounds
    }

    pub fn get_match(&self, id: &str) -> Option<&Match> {
        self.matches.get(id)
    }

    pub fn match_at(&self, round: u32, position: u32) -> Option<&Match> {
        self.matches.get(&match_id(round, position))
    }

    /// Matches of `round`, ordered by position
    pub fn round_matches(&self, round: u32) -> Vec<&Match> {
        let mut matches: Vec<&Match> = self.matches.values().filter(|m| m.round == round).collect();
        matches.sort_by_key(|m| m.position);
        matches
    }

    /// The match with no forward link
    pub fn final_match(&self) -> Option<&Match> {
        self.matches.values().find(|m| m.is_final())
    }

    /// Overall winner once the final is resolved
    pub fn champion(&self) -> Option<&Participant> {
        self.final_match()
            .filter(|m| m.status.is_resolved())
            .and_then(|m| m.winner.as_ref())
    }

    pub fn is_finished(&self) -> bool {
        self.status == BracketStatus::Finished
    }

    /// Recompute round counters, the current round pointer and the status.
    ///
    /// Returns true if this call moved the bracket to `Finished`.
    pub(crate) fn refresh(&mut self) -> bool {
        for round in &mut self.rounds {
            round.completed_count = self
                .matches
                .values()
                .filter(|m| m.round == round.number && m.status.is_resolved())
                .count() as u32;
        }

        self.current_round = self
            .matches
            .values()
            .filter(|m| m.status.is_open())
            .map(|m| m.round)
            .min()
            .unwrap_or(self.total_rounds);

        let final_resolved = self.champion().is_some();
        let newly_finished = final_resolved && self.status == BracketStatus::Active;
        if newly_finished {
            self.status = BracketStatus::Finished;
        }
        newly_finished
    }
}

/// Round metadata together with its matches, for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundView {
    #[serde(flatten)]
    pub round: Round,
    pub matches: Vec<Match>,
}

impl Bracket {
    /// Round-by-round view reconstructed from the match map
    pub fn round_views(&self) -> Vec<RoundView> {
        self.rounds
            .iter()
            .map(|round| RoundView {
                round: round.clone(),
                matches: self.round_matches(round.number).into_iter().cloned().collect(),
            })
            .collect()
    }
}
