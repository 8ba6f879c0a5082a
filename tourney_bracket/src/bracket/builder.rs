//! Bracket construction from a list of confirmed participants.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use super::errors::{BracketError, BracketResult};
use super::models::{
    Bracket, BracketStatus, Match, MatchStatus, Participant, Round, Slot, match_id, round_name,
};
use super::progression::propagate_walkovers;
use super::seeding::SeedRandomizer;
use crate::tournament::TournamentId;

/// Minimum number of real participants for a bracket
pub const MIN_PARTICIPANTS: usize = 2;

/// Number of rounds needed for `participants` entrants: ceil(log2(n))
pub fn total_rounds_for(participants: usize) -> u32 {
    participants.max(1).next_power_of_two().trailing_zeros()
}

/// Build a bracket with a randomized seed order
pub fn build_bracket(
    tournament_id: TournamentId,
    participants: Vec<Participant>,
) -> BracketResult<Bracket> {
    build_bracket_with(tournament_id, participants, &mut SeedRandomizer::new())
}

/// Build a bracket, shuffling with the supplied randomizer
pub fn build_bracket_with<R: Rng>(
    tournament_id: TournamentId,
    participants: Vec<Participant>,
    randomizer: &mut SeedRandomizer<R>,
) -> BracketResult<Bracket> {
    let eligible = eligible_participants(participants)?;
    let registered = eligible.iter().map(|p| p.id.clone()).collect();

    let mut seeded = eligible;
    randomizer.shuffle(&mut seeded);

    Ok(assemble(tournament_id, registered, seeded, Utc::now()))
}

/// Build a bracket from an order that has already been decided.
///
/// Seeds are paired as given: indices 0 and 1 meet in match 1, 2 and 3 in
/// match 2, and so on.
pub fn build_from_seed_order(
    tournament_id: TournamentId,
    seeded: Vec<Participant>,
) -> BracketResult<Bracket> {
    let eligible = eligible_participants(seeded)?;
    let registered = eligible.iter().map(|p| p.id.clone()).collect();
    Ok(assemble(tournament_id, registered, eligible, Utc::now()))
}

/// Drop filler entries and check the remaining roster
fn eligible_participants(participants: Vec<Participant>) -> BracketResult<Vec<Participant>> {
    let total = participants.len();
    let eligible: Vec<Participant> = participants.into_iter().filter(|p| !p.is_filler).collect();
    if eligible.len() < total {
        log::debug!(
            "Dropped {} filler entries before seeding",
            total - eligible.len()
        );
    }

    if eligible.len() < MIN_PARTICIPANTS {
        return Err(BracketError::Validation(format!(
            "At least {MIN_PARTICIPANTS} participants are required, got {}",
            eligible.len()
        )));
    }

    let mut seen = HashSet::with_capacity(eligible.len());
    for participant in &eligible {
        if participant.id.trim().is_empty() {
            return Err(BracketError::Validation(
                "Participant id must not be empty".to_string(),
            ));
        }
        if !seen.insert(participant.id.as_str()) {
            return Err(BracketError::Validation(format!(
                "Participant {} appears more than once",
                participant.id
            )));
        }
    }

    Ok(eligible)
}

fn assemble(
    tournament_id: TournamentId,
    registered: Vec<String>,
    seeded: Vec<Participant>,
    now: DateTime<Utc>,
) -> Bracket {
    let total_rounds = total_rounds_for(seeded.len());
    let size = 1u32 << total_rounds;

    let rounds = (1..=total_rounds)
        .map(|number| Round {
            number,
            name: round_name(number, total_rounds),
            match_count: size >> number,
            completed_count: 0,
        })
        .collect();

    let forward_link = |round: u32, position: u32| {
        (round < total_rounds).then(|| match_id(round + 1, position.div_ceil(2)))
    };

    let mut matches = BTreeMap::new();
    let mut seeds = seeded.into_iter();

    for position in 1..=size / 2 {
        let mut m = Match::placeholder(1, position, forward_link(1, position), now);
        m.slot_a = seeds.next();
        m.slot_b = seeds.next();

        match (m.slot_a.is_some(), m.slot_b.is_some()) {
            (true, true) => m.status = MatchStatus::Pending,
            (true, false) => m.award_to(Slot::A, MatchStatus::Completed, now),
            (false, true) => m.award_to(Slot::B, MatchStatus::Completed, now),
            (false, false) => m.status = MatchStatus::Bye,
        }
        matches.insert(m.id.clone(), m);
    }

    for round in 2..=total_rounds {
        for position in 1..=size >> round {
            let m = Match::placeholder(round, position, forward_link(round, position), now);
            matches.insert(m.id.clone(), m);
        }
    }

    let resolved = propagate_walkovers(&mut matches, now);

    let mut bracket = Bracket {
        id: Uuid::new_v4(),
        tournament_id,
        participants: registered,
        matches,
        rounds,
        status: BracketStatus::Active,
        current_round: 1,
        total_rounds,
        version: 0,
        created_at: now,
        updated_at: None,
    };
    bracket.refresh();

    log::info!(
        "Built bracket {} for tournament {}: {} participants, {} slots, {} rounds, {} cascaded walkovers",
        bracket.id,
        tournament_id,
        bracket.participants.len(),
        size,
        total_rounds,
        resolved.len()
    );

    bracket
}
