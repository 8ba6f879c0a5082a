//! Bracket API handlers.
//!
//! This module provides HTTP REST endpoints for bracket operations:
//! - Generating the bracket of a tournament from its confirmed participants
//! - Reading a bracket, whole or round by round
//! - Recording match results
//!
//! # Examples
//!
//! Generate a bracket:
//! ```bash
//! curl -X POST http://localhost:7070/api/v1/tournaments/42/bracket
//! ```
//!
//! Record a result:
//! ```bash
//! curl -X POST http://localhost:7070/api/v1/brackets/BRACKET_ID/matches/r1m1/result \
//!   -H "Content-Type: application/json" \
//!   -d '{"score_a": 3, "score_b": 1}'
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tourney_bracket::{
    Bracket, BracketError, BracketId, MatchOutcome, RoundView, TournamentId,
};

use super::AppState;
use super::request_id::RequestId;
use crate::{logging, metrics};

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateBracketResponse {
    pub bracket_id: BracketId,
    pub tournament_id: TournamentId,
}

#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    pub score_a: u32,
    pub score_b: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// HTTP status for a bracket error
pub fn status_for(err: &BracketError) -> StatusCode {
    match err {
        BracketError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        BracketError::BracketNotFound(_) | BracketError::MatchNotFound(_) => StatusCode::NOT_FOUND,
        BracketError::AlreadyCompleted(_)
        | BracketError::IncompleteMatch(_)
        | BracketError::AlreadyBracketed(_)
        | BracketError::VersionConflict { .. } => StatusCode::CONFLICT,
        BracketError::Database(_) | BracketError::Serialization(_) | BracketError::Timeout(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn api_error(request_id: &RequestId, operation: &str, err: BracketError) -> ApiError {
    logging::log_bracket_rejection(request_id.as_str(), operation, &err);
    (
        status_for(&err),
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

/// Generate the bracket of a tournament.
///
/// Reads the tournament's confirmed participants, seeds them at random and
/// stores the bracket. A tournament gets exactly one bracket.
///
/// # Response
///
/// Returns `201 Created`:
/// ```json
/// { "bracket_id": "5f0c...", "tournament_id": 42 }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Tournament already has a bracket
/// - `422 Unprocessable Entity`: Fewer than two eligible participants
pub async fn generate_bracket(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(tournament_id): Path<TournamentId>,
) -> Result<(StatusCode, Json<GenerateBracketResponse>), ApiError> {
    let bracket_id = state
        .bracket_manager
        .generate_bracket(tournament_id)
        .await
        .map_err(|e| api_error(&request_id, "generate_bracket", e))?;

    metrics::brackets_generated_total();
    logging::log_bracket_generated(request_id.as_str(), tournament_id, bracket_id);

    Ok((
        StatusCode::CREATED,
        Json(GenerateBracketResponse {
            bracket_id,
            tournament_id,
        }),
    ))
}

/// Get the bracket of a tournament.
///
/// # Errors
///
/// - `404 Not Found`: No bracket generated yet
pub async fn get_tournament_bracket(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Bracket>, ApiError> {
    match state
        .bracket_manager
        .get_bracket_for_tournament(tournament_id)
        .await
    {
        Ok(Some(bracket)) => Ok(Json(bracket)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Tournament {tournament_id} has no bracket"),
            }),
        )),
        Err(e) => Err(api_error(&request_id, "get_tournament_bracket", e)),
    }
}

/// Get a bracket with all of its matches.
///
/// # Errors
///
/// - `404 Not Found`: Unknown bracket
pub async fn get_bracket(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(bracket_id): Path<BracketId>,
) -> Result<Json<Bracket>, ApiError> {
    state
        .bracket_manager
        .get_bracket(bracket_id)
        .await
        .map(Json)
        .map_err(|e| api_error(&request_id, "get_bracket", e))
}

/// Get a bracket round by round.
///
/// # Response
///
/// Returns `200 OK` with rounds in play order, each with its matches ordered
/// by position:
/// ```json
/// [
///   { "number": 1, "name": "Semifinal", "match_count": 2, "completed_count": 1, "matches": [...] },
///   { "number": 2, "name": "Final", "match_count": 1, "completed_count": 0, "matches": [...] }
/// ]
/// ```
pub async fn get_rounds(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(bracket_id): Path<BracketId>,
) -> Result<Json<Vec<RoundView>>, ApiError> {
    state
        .bracket_manager
        .get_bracket(bracket_id)
        .await
        .map(|bracket| Json(bracket.round_views()))
        .map_err(|e| api_error(&request_id, "get_rounds", e))
}

/// Record the result of a match.
///
/// # Request Body
///
/// ```json
/// { "score_a": 3, "score_b": 1 }
/// ```
///
/// # Response
///
/// Returns `200 OK` with the outcome: the winner, the match they advanced to,
/// matches resolved as a consequence and, after the final, the finish record.
///
/// # Errors
///
/// - `404 Not Found`: Unknown bracket or match
/// - `409 Conflict`: Match already completed, still missing an opponent, or
///   the bracket was modified concurrently
/// - `422 Unprocessable Entity`: Tied score
pub async fn record_result(
    State(state): State<AppState>,
    request_id: RequestId,
    Path((bracket_id, match_id)): Path<(BracketId, String)>,
    Json(request): Json<RecordResultRequest>,
) -> Result<Json<MatchOutcome>, ApiError> {
    let outcome = match state
        .bracket_manager
        .record_match_result(bracket_id, &match_id, request.score_a, request.score_b)
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            metrics::match_results_total("rejected");
            return Err(api_error(&request_id, "record_result", e));
        }
    };

    if outcome.finish.is_some() {
        metrics::match_results_total("finished");
        metrics::brackets_finished_total();
    } else {
        metrics::match_results_total("advanced");
    }
    metrics::auto_resolved_matches_total(outcome.auto_resolved.len());
    logging::log_match_recorded(request_id.as_str(), bracket_id, &outcome);

    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let id = uuid::Uuid::new_v4();
        let cases = [
            (BracketError::Validation("tie".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (BracketError::BracketNotFound(id), StatusCode::NOT_FOUND),
            (BracketError::MatchNotFound("r1m9".into()), StatusCode::NOT_FOUND),
            (BracketError::AlreadyCompleted("r1m1".into()), StatusCode::CONFLICT),
            (BracketError::IncompleteMatch("r2m1".into()), StatusCode::CONFLICT),
            (BracketError::AlreadyBracketed(3), StatusCode::CONFLICT),
            (
                BracketError::VersionConflict {
                    bracket_id: id,
                    expected: 2,
                },
                StatusCode::CONFLICT,
            ),
            (
                BracketError::Timeout(Duration::from_secs(5)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(status_for(&err), status, "{err}");
        }
    }

    #[test]
    fn test_persistence_errors_are_sanitized() {
        let (status, Json(body)) = api_error(
            &RequestId("req".to_string()),
            "get_bracket",
            BracketError::Database(sqlx::Error::PoolTimedOut),
        );
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Internal server error");
    }
}
