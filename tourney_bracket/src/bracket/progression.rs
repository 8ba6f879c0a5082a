//! Match progression: result recording, winner advancement and walkover cascades.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use super::errors::{BracketError, BracketResult};
use super::models::{Bracket, Match, MatchId, MatchStatus, Participant, Slot, match_id};
use crate::tournament::TournamentFinish;

/// What a recorded result changed in the bracket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub match_id: MatchId,
    pub winner: Participant,
    /// Match the winner was placed into (None for the final)
    pub advanced_to: Option<MatchId>,
    /// Matches resolved automatically as a consequence of this result
    pub auto_resolved: Vec<MatchId>,
    /// Set when this result decided the tournament
    pub finish: Option<TournamentFinish>,
}

/// Record the result of a pending match and advance its winner.
///
/// Every precondition is checked before the bracket is touched, so on error
/// the bracket is unchanged.
///
/// # Errors
///
/// * `BracketError::MatchNotFound` - No match with this id
/// * `BracketError::AlreadyCompleted` - Match already resolved
/// * `BracketError::IncompleteMatch` - A slot is still empty
/// * `BracketError::Validation` - Tied score
pub fn record_result(
    bracket: &mut Bracket,
    match_id: &str,
    score_a: u32,
    score_b: u32,
) -> BracketResult<MatchOutcome> {
    let target = bracket
        .matches
        .get(match_id)
        .ok_or_else(|| BracketError::MatchNotFound(match_id.to_string()))?;

    if target.status.is_resolved() {
        return Err(BracketError::AlreadyCompleted(target.id.clone()));
    }
    if !target.is_full() {
        return Err(BracketError::IncompleteMatch(target.id.clone()));
    }
    if score_a == score_b {
        return Err(BracketError::Validation(format!(
            "Match {match_id} cannot end in a tie ({score_a}-{score_b})"
        )));
    }

    let now = Utc::now();
    let (winner, advanced_to) = {
        let Some(m) = bracket.matches.get_mut(match_id) else {
            return Err(BracketError::MatchNotFound(match_id.to_string()));
        };
        let winning_slot = if score_a > score_b { Slot::A } else { Slot::B };
        m.score_a = score_a;
        m.score_b = score_b;
        m.winner = m.slot(winning_slot).cloned();
        m.status = MatchStatus::Completed;
        m.updated_at = Some(now);

        let Some(winner) = m.winner.clone() else {
            return Err(BracketError::IncompleteMatch(m.id.clone()));
        };
        (winner, m.next_match_id.clone())
    };

    let auto_resolved = cascade(
        &mut bracket.matches,
        VecDeque::from([match_id.to_string()]),
        now,
    );

    let newly_finished = bracket.refresh();
    bracket.updated_at = Some(now);

    let finish = if newly_finished {
        bracket.champion().map(|champion| TournamentFinish {
            tournament_id: bracket.tournament_id,
            winner_id: champion.id.clone(),
            finished_at: now,
        })
    } else {
        None
    };

    log::info!(
        "Bracket {}: {} won {} ({}-{}){}",
        bracket.id,
        winner.id,
        match_id,
        score_a,
        score_b,
        advanced_to
            .as_deref()
            .map(|next| format!(", advances to {next}"))
            .unwrap_or_default()
    );
    if let Some(finish) = &finish {
        log::info!(
            "Bracket {} finished, tournament {} won by {}",
            bracket.id,
            finish.tournament_id,
            finish.winner_id
        );
    }

    Ok(MatchOutcome {
        match_id: match_id.to_string(),
        winner,
        advanced_to,
        auto_resolved,
        finish,
    })
}

/// Push every resolved winner forward and settle matches that can no longer
/// be contested, until nothing changes.
///
/// Returns the ids of matches this call moved to `walkover` or `bye`.
/// Running it again on its own output is a no-op.
pub fn propagate_walkovers(
    matches: &mut BTreeMap<MatchId, Match>,
    now: DateTime<Utc>,
) -> Vec<MatchId> {
    let settled: VecDeque<MatchId> = matches
        .values()
        .filter(|m| m.status.is_resolved() || m.status == MatchStatus::Bye)
        .map(|m| m.id.clone())
        .collect();

    cascade(matches, settled, now)
}

/// Work-queue fixpoint shared by the builder and result recording.
///
/// Each queued match is settled (resolved or bye). Its downstream match
/// receives the winner in the parity slot and is then re-evaluated:
/// - both slots filled: `pending`, a real result is required
/// - one occupant, opposing feed is a bye: `walkover`, queued
/// - both feeds are byes: `bye`, queued
/// - otherwise it keeps waiting on a live feed
fn cascade(
    matches: &mut BTreeMap<MatchId, Match>,
    mut queue: VecDeque<MatchId>,
    now: DateTime<Utc>,
) -> Vec<MatchId> {
    let mut settled = Vec::new();

    while let Some(source_id) = queue.pop_front() {
        let Some(source) = matches.get(&source_id) else {
            continue;
        };
        let Some(target_id) = source.next_match_id.clone() else {
            continue;
        };

        let slot = Slot::fed_by(source.position);
        let winner = if source.status.is_resolved() {
            source.winner.clone()
        } else {
            None
        };

        let target_round = source.round + 1;
        let target_position = source.position.div_ceil(2);
        let feed_is_bye = |feed_slot: Slot| {
            let feeder_position = match feed_slot {
                Slot::A => target_position * 2 - 1,
                Slot::B => target_position * 2,
            };
            matches
                .get(&match_id(source.round, feeder_position))
                .is_some_and(|feeder| feeder.status == MatchStatus::Bye)
        };
        let dead_a = feed_is_bye(Slot::A);
        let dead_b = feed_is_bye(Slot::B);

        let Some(target) = matches.get_mut(&target_id) else {
            log::warn!("Match {source_id} links to missing match {target_id}");
            continue;
        };
        debug_assert_eq!((target.round, target.position), (target_round, target_position));

        if target.status.is_resolved() || target.status == MatchStatus::Bye {
            continue;
        }

        if let Some(winner) = winner {
            if target.slot(slot).is_none() {
                *target.slot_mut(slot) = Some(winner);
                target.updated_at = Some(now);
            }
        }

        let lone_slot = match (target.slot_a.is_some(), target.slot_b.is_some()) {
            (true, true) => {
                if target.status == MatchStatus::Waiting {
                    target.status = MatchStatus::Pending;
                    target.updated_at = Some(now);
                }
                None
            }
            (true, false) if dead_b => Some(Slot::A),
            (false, true) if dead_a => Some(Slot::B),
            (false, false) if dead_a && dead_b => {
                target.status = MatchStatus::Bye;
                settled.push(target_id.clone());
                queue.push_back(target_id);
                continue;
            }
            _ => None,
        };

        if let Some(lone_slot) = lone_slot {
            debug_assert!(target.slot(lone_slot.other()).is_none());
            target.award_to(lone_slot, MatchStatus::Walkover, now);
            log::debug!("Match {target_id} resolved as walkover");
            settled.push(target_id.clone());
            queue.push_back(target_id);
        }
    }

    settled
}
