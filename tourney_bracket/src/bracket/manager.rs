//! Bracket manager: the caller-facing API over the builder, the progression
//! engine and the storage collaborators.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::builder::build_bracket;
use super::errors::{BracketError, BracketResult};
use super::models::{Bracket, BracketId};
use super::progression::{MatchOutcome, record_result};
use crate::db::repository::{BracketRepository, RosterRepository};
use crate::tournament::TournamentId;

/// Idle lock entries are pruned once the registry grows past this
const LOCK_REGISTRY_PRUNE_THRESHOLD: usize = 1024;

/// Registry of async mutexes, one per key
struct KeyedLocks<K> {
    locks: Arc<Mutex<HashMap<K, Arc<Mutex<()>>>>>,
}

impl<K> Clone for KeyedLocks<K> {
    fn clone(&self) -> Self {
        Self {
            locks: Arc::clone(&self.locks),
        }
    }
}

impl<K: Eq + Hash> KeyedLocks<K> {
    fn new() -> Self {
        Self {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn acquire(&self, key: K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            if locks.len() > LOCK_REGISTRY_PRUNE_THRESHOLD {
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(key).or_default())
        };

        lock.lock_owned().await
    }
}

/// Bracket manager
///
/// Operations on the same tournament or the same bracket are serialized in
/// process; the repository's version check covers writers in other
/// processes.
#[derive(Clone)]
pub struct BracketManager {
    brackets: Arc<dyn BracketRepository>,
    roster: Arc<dyn RosterRepository>,
    tournament_locks: KeyedLocks<TournamentId>,
    bracket_locks: KeyedLocks<BracketId>,
}

impl BracketManager {
    /// Create a new bracket manager
    pub fn new(brackets: Arc<dyn BracketRepository>, roster: Arc<dyn RosterRepository>) -> Self {
        Self {
            brackets,
            roster,
            tournament_locks: KeyedLocks::new(),
            bracket_locks: KeyedLocks::new(),
        }
    }

    /// Build and store the bracket of a tournament from its confirmed
    /// participants.
    ///
    /// # Errors
    ///
    /// * `BracketError::AlreadyBracketed` - The tournament already has a bracket
    /// * `BracketError::Validation` - Fewer than two eligible participants, or
    ///   a malformed roster
    pub async fn generate_bracket(&self, tournament_id: TournamentId) -> BracketResult<BracketId> {
        let _guard = self.tournament_locks.acquire(tournament_id).await;

        if self.brackets.find_by_tournament(tournament_id).await?.is_some() {
            return Err(BracketError::AlreadyBracketed(tournament_id));
        }

        let participants = self.roster.confirmed_participants(tournament_id).await?;
        let bracket = build_bracket(tournament_id, participants)?;
        self.brackets.insert_bracket(&bracket).await?;

        Ok(bracket.id)
    }

    /// Record a match result and persist the updated bracket.
    ///
    /// # Errors
    ///
    /// * `BracketError::BracketNotFound` - Unknown bracket
    /// * `BracketError::VersionConflict` - Another writer updated the bracket
    ///   between load and store; nothing was written
    /// * Any error of [`record_result`]
    pub async fn record_match_result(
        &self,
        bracket_id: BracketId,
        match_id: &str,
        score_a: u32,
        score_b: u32,
    ) -> BracketResult<MatchOutcome> {
        let _guard = self.bracket_locks.acquire(bracket_id).await;

        let mut bracket = self
            .brackets
            .get_bracket(bracket_id)
            .await?
            .ok_or(BracketError::BracketNotFound(bracket_id))?;

        let expected_version = bracket.version;
        let outcome = record_result(&mut bracket, match_id, score_a, score_b)?;
        bracket.version = expected_version + 1;

        self.brackets
            .update_bracket(&bracket, expected_version, outcome.finish.as_ref())
            .await?;

        if let Some(finish) = &outcome.finish {
            log::info!(
                "Tournament {} finished, winner {}",
                finish.tournament_id,
                finish.winner_id
            );
        }

        Ok(outcome)
    }

    /// Get a bracket by id
    pub async fn get_bracket(&self, bracket_id: BracketId) -> BracketResult<Bracket> {
        self.brackets
            .get_bracket(bracket_id)
            .await?
            .ok_or(BracketError::BracketNotFound(bracket_id))
    }

    /// Get the bracket of a tournament, if one was generated
    pub async fn get_bracket_for_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Option<Bracket>> {
        self.brackets.find_by_tournament(tournament_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::{MatchStatus, Participant};
    use crate::db::memory::{MemoryBracketRepository, MemoryRoster};

    async fn setup(tournament_id: TournamentId, players: usize) -> (BracketManager, Arc<MemoryBracketRepository>) {
        let repo = Arc::new(MemoryBracketRepository::new());
        let roster = Arc::new(MemoryRoster::new());
        roster
            .set_confirmed(
                tournament_id,
                (1..=players)
                    .map(|i| Participant::new(format!("p{i}"), format!("Player {i}")))
                    .collect(),
            )
            .await;

        (BracketManager::new(repo.clone(), roster), repo)
    }

    fn first_pending(bracket: &Bracket) -> Option<String> {
        bracket
            .matches
            .values()
            .filter(|m| m.status == MatchStatus::Pending)
            .min_by_key(|m| (m.round, m.position))
            .map(|m| m.id.clone())
    }

    #[tokio::test]
    async fn test_generate_bracket_once_per_tournament() {
        let (manager, _) = setup(1, 5).await;

        let bracket_id = manager.generate_bracket(1).await.unwrap();
        let bracket = manager.get_bracket(bracket_id).await.unwrap();
        assert_eq!(bracket.total_rounds, 3);
        assert_eq!(bracket.version, 0);

        let err = manager.generate_bracket(1).await.unwrap_err();
        assert!(matches!(err, BracketError::AlreadyBracketed(1)));
    }

    #[tokio::test]
    async fn test_generate_bracket_without_roster() {
        let (manager, repo) = setup(1, 5).await;

        let err = manager.generate_bracket(99).await.unwrap_err();
        assert!(matches!(err, BracketError::Validation(_)));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_concurrent_generate_creates_one_bracket() {
        let (manager, repo) = setup(7, 8).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.generate_bracket(7).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(BracketError::AlreadyBracketed(7)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_record_result_bumps_version() {
        let (manager, _) = setup(2, 4).await;
        let bracket_id = manager.generate_bracket(2).await.unwrap();

        let bracket = manager.get_bracket(bracket_id).await.unwrap();
        let match_id = first_pending(&bracket).unwrap();

        let outcome = manager
            .record_match_result(bracket_id, &match_id, 2, 1)
            .await
            .unwrap();
        assert_eq!(outcome.match_id, match_id);
        assert!(outcome.finish.is_none());

        let stored = manager.get_bracket(bracket_id).await.unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.get_match(&match_id).unwrap().status, MatchStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_result_leaves_stored_bracket() {
        let (manager, _) = setup(3, 4).await;
        let bracket_id = manager.generate_bracket(3).await.unwrap();
        let before = manager.get_bracket(bracket_id).await.unwrap();

        let err = manager
            .record_match_result(bracket_id, "r2m1", 1, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, BracketError::IncompleteMatch(_)));

        let err = manager
            .record_match_result(bracket_id, "r1m1", 3, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, BracketError::Validation(_)));

        assert_eq!(manager.get_bracket(bracket_id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_unknown_bracket() {
        let (manager, _) = setup(4, 4).await;
        let missing = uuid::Uuid::new_v4();

        assert!(matches!(
            manager.get_bracket(missing).await,
            Err(BracketError::BracketNotFound(id)) if id == missing
        ));
        assert!(matches!(
            manager.record_match_result(missing, "r1m1", 1, 0).await,
            Err(BracketError::BracketNotFound(_))
        ));
        assert!(manager.get_bracket_for_tournament(4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_results_for_same_match() {
        let (manager, _) = setup(5, 8).await;
        let bracket_id = manager.generate_bracket(5).await.unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.record_match_result(bracket_id, "r1m1", 1, 0).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(BracketError::AlreadyCompleted(id)) => assert_eq!(id, "r1m1"),
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(manager.get_bracket(bracket_id).await.unwrap().version, 1);
    }

    #[tokio::test]
    async fn test_playing_out_finishes_tournament() {
        let (manager, repo) = setup(6, 5).await;
        let bracket_id = manager.generate_bracket(6).await.unwrap();

        let mut finishes = Vec::new();
        while let Some(match_id) = first_pending(&manager.get_bracket(bracket_id).await.unwrap()) {
            let outcome = manager
                .record_match_result(bracket_id, &match_id, 3, 1)
                .await
                .unwrap();
            finishes.extend(outcome.finish);
        }

        assert_eq!(finishes.len(), 1);
        let bracket = manager.get_bracket(bracket_id).await.unwrap();
        assert!(bracket.is_finished());

        let finish = repo.tournament_finish(6).await.unwrap();
        assert_eq!(Some(&finish.winner_id), bracket.champion().map(|p| &p.id));
        assert_eq!(finish, finishes[0]);
    }
}
