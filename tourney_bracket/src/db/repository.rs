//! Repository trait definitions for testability and dependency injection.
//!
//! The bracket core talks to storage only through these traits. PostgreSQL
//! implementations live here; in-memory ones are in [`super::memory`].

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use super::timeouts::{DEFAULT_TRANSACTION_TIMEOUT, with_default_timeout, with_timeout};
use crate::bracket::{Bracket, BracketError, BracketId, BracketResult, Participant};
use crate::tournament::{RegistrationStatus, TournamentFinish, TournamentId, TournamentState};

/// Trait for bracket document storage
#[async_trait]
pub trait BracketRepository: Send + Sync {
    /// Store a freshly built bracket.
    ///
    /// Fails with `AlreadyBracketed` if the tournament already has one.
    async fn insert_bracket(&self, bracket: &Bracket) -> BracketResult<()>;

    /// Find bracket by ID
    async fn get_bracket(&self, bracket_id: BracketId) -> BracketResult<Option<Bracket>>;

    /// Find the bracket of a tournament
    async fn find_by_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Option<Bracket>>;

    /// Replace the stored bracket as one unit.
    ///
    /// The write only happens if the stored version still equals
    /// `expected_version`; otherwise `VersionConflict` is returned. When
    /// `finish` is set the tournament record is closed in the same write.
    async fn update_bracket(
        &self,
        bracket: &Bracket,
        expected_version: i64,
        finish: Option<&TournamentFinish>,
    ) -> BracketResult<()>;
}

/// Trait for the participant roster
#[async_trait]
pub trait RosterRepository: Send + Sync {
    /// Participants whose attendance is confirmed, in registration order
    async fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Vec<Participant>>;
}

/// Default PostgreSQL implementation of `BracketRepository`
pub struct PgBracketRepository {
    pool: PgPool,
}

impl PgBracketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn decode(row: &sqlx::postgres::PgRow) -> BracketResult<Bracket> {
        let mut bracket: Bracket = serde_json::from_value(row.get("document"))?;
        // The column is authoritative for optimistic locking
        bracket.version = row.get("version");
        Ok(bracket)
    }
}

#[async_trait]
impl BracketRepository for PgBracketRepository {
    async fn insert_bracket(&self, bracket: &Bracket) -> BracketResult<()> {
        let document = serde_json::to_value(bracket)?;

        let write = async {
            let mut tx = self.pool.begin().await?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO brackets (id, tournament_id, status, current_round, total_rounds, version, document, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (tournament_id) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(bracket.id)
            .bind(bracket.tournament_id)
            .bind(bracket.status.to_string())
            .bind(bracket.current_round as i32)
            .bind(bracket.total_rounds as i32)
            .bind(bracket.version)
            .bind(document)
            .bind(bracket.created_at.naive_utc())
            .fetch_optional(&mut *tx)
            .await?;

            if inserted.is_none() {
                return Ok(false);
            }

            sqlx::query("UPDATE tournaments SET state = $1, started_at = NOW() WHERE id = $2")
                .bind(TournamentState::InProgress.to_string())
                .bind(bracket.tournament_id)
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(true)
        };

        if !with_timeout(DEFAULT_TRANSACTION_TIMEOUT, write).await? {
            return Err(BracketError::AlreadyBracketed(bracket.tournament_id));
        }

        Ok(())
    }

    async fn get_bracket(&self, bracket_id: BracketId) -> BracketResult<Option<Bracket>> {
        let row = with_default_timeout(
            sqlx::query("SELECT version, document FROM brackets WHERE id = $1")
                .bind(bracket_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn find_by_tournament(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Option<Bracket>> {
        let row = with_default_timeout(
            sqlx::query("SELECT version, document FROM brackets WHERE tournament_id = $1")
                .bind(tournament_id)
                .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn update_bracket(
        &self,
        bracket: &Bracket,
        expected_version: i64,
        finish: Option<&TournamentFinish>,
    ) -> BracketResult<()> {
        let document = serde_json::to_value(bracket)?;

        let write = async {
            let mut tx = self.pool.begin().await?;

            // Compare-and-swap on the version column
            let result = sqlx::query(
                r#"
                UPDATE brackets
                SET document = $1, status = $2, current_round = $3, version = $4, updated_at = NOW()
                WHERE id = $5 AND version = $6
                "#,
            )
            .bind(document)
            .bind(bracket.status.to_string())
            .bind(bracket.current_round as i32)
            .bind(bracket.version)
            .bind(bracket.id)
            .bind(expected_version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let exists = sqlx::query("SELECT 1 FROM brackets WHERE id = $1")
                    .bind(bracket.id)
                    .fetch_optional(&mut *tx)
                    .await?;
                return Ok(Some(match exists {
                    Some(_) => BracketError::VersionConflict {
                        bracket_id: bracket.id,
                        expected: expected_version,
                    },
                    None => BracketError::BracketNotFound(bracket.id),
                }));
            }

            if let Some(finish) = finish {
                sqlx::query(
                    "UPDATE tournaments SET state = $1, winner_id = $2, finished_at = $3 WHERE id = $4",
                )
                .bind(TournamentState::Finished.to_string())
                .bind(&finish.winner_id)
                .bind(finish.finished_at.naive_utc())
                .bind(finish.tournament_id)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            Ok::<_, sqlx::Error>(None)
        };

        // Dropping the uncommitted transaction rolls it back
        match with_timeout(DEFAULT_TRANSACTION_TIMEOUT, write).await? {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Default PostgreSQL implementation of `RosterRepository`
pub struct PgRosterRepository {
    pool: PgPool,
}

impl PgRosterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterRepository for PgRosterRepository {
    async fn confirmed_participants(
        &self,
        tournament_id: TournamentId,
    ) -> BracketResult<Vec<Participant>> {
        let rows = with_default_timeout(
            sqlx::query(
                r#"
                SELECT participant_id, display_name, is_filler
                FROM tournament_participants
                WHERE tournament_id = $1 AND status = $2
                ORDER BY registered_at, participant_id
                "#,
            )
            .bind(tournament_id)
            .bind(RegistrationStatus::Confirmed.to_string())
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Participant {
                id: row.get("participant_id"),
                display_name: row.get("display_name"),
                is_filler: row.get("is_filler"),
            })
            .collect())
    }
}
