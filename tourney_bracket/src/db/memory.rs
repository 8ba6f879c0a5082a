//! In-memory repositories.
//!
//! Used by tests and by the server's demo mode. Semantics match the
//! PostgreSQL implementations, including the version check on update.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::repository::{BracketRepository, RosterRepository};
use crate::bracket::{Bracket, BracketError, BracketId, BracketResult, Participant};
use crate::tournament::{TournamentFinish, TournamentId};

/// Bracket storage held in process memory
#[derive(Default)]
pub struct MemoryBracketRepository {
    brackets: RwLock<HashMap<BracketId, Bracket>>,
    finished: RwLock<HashMap<TournamentId, TournamentFinish>>,
}

impl MemoryBracketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish signal recorded for a tournament, if its final was decided
    pub async fn tournament_finish(&self, tournament_id: TournamentId) -> Option<TournamentFinish> {
        self.finished.read().await.get(&tournament_id).cloned()
    }

    /// Number of stored brackets
    pub async fn len(&self) -> usize {
        self.brackets.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.brackets.read().await.is_empty()
    }
}

#[async_trait]
impl BracketRepository for MemoryBracketRepository {
    async fn insert_bracket(&self, bracket: &Bracket) -> BracketResult<()> {
        let mut brackets = self.brackets.write().await;

        if brackets
            .values()
            .any(|b| b.tournament_id == bracket.tournament_id)
        {
            return Err(BracketError::AlreadyBracketed(bracket.tournament_id));
        }

        brackets.insert(bracket.id, bracket.clone());
        Ok(())
    }

    async fn get_bracket(&self, bracket_id: BracketId) -> BracketResult<Option<Bracket>> {
        Ok(self.brackets.read().await.get(&bracket_id).cloned())
    }

    async fn find_by_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Option<Bracket>> {
        Ok(self
            .brackets
            .read()
            .await
            .values()
            .find(|b| b.tournament_id == tournament_id)
            .cloned())
    }

    async fn update_bracket(
        &self,
        bracket: &Bracket,
        expected_version: i64,
        finish: Option<&TournamentFinish>,
    ) -> BracketResult<()> {
        // Lock order: brackets, then finished
        let mut brackets = self.brackets.write().await;
        let mut finished = self.finished.write().await;

        let stored = brackets
            .get_mut(&bracket.id)
            .ok_or(BracketError::BracketNotFound(bracket.id))?;

        if stored.version != expected_version {
            return Err(BracketError::VersionConflict {
                bracket_id: bracket.id,
                expected: expected_version,
            });
        }

        *stored = bracket.clone();
        if let Some(finish) = finish {
            finished.insert(finish.tournament_id, finish.clone());
        }

        Ok(())
    }
}

/// Roster held in process memory
#[derive(Default)]
pub struct MemoryRoster {
    participants: RwLock<HashMap<TournamentId, Vec<Participant>>>,
}

impl MemoryRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the confirmed participants of a tournament
    pub async fn set_confirmed(&self, tournament_id: TournamentId, participants: Vec<Participant>) {
        self.participants
            .write()
            .await
            .insert(tournament_id, participants);
    }
}

#[async_trait]
impl RosterRepository for MemoryRoster {
    async fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Vec<Participant>> {
        Ok(self
            .participants
            .read()
            .await
            .get(&tournament_id)
            .cloned()
            .unwrap_or_default())
    }
}
