//! Structured logging configuration.
//!
//! This module provides structured logging with request correlation and
//! bracket lifecycle events.

use tourney_bracket::{BracketId, MatchOutcome, TournamentId};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use tb_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a freshly generated bracket
pub fn log_bracket_generated(
    request_id: &str,
    tournament_id: TournamentId,
    bracket_id: BracketId,
) {
    tracing::info!(
        request_id = request_id,
        tournament_id = tournament_id,
        bracket_id = %bracket_id,
        "Bracket generated"
    );
}

/// Log an accepted match result
///
/// # Arguments
///
/// * `request_id` - Correlation id of the HTTP request
/// * `bracket_id` - Bracket the match belongs to
/// * `outcome` - What the result changed
pub fn log_match_recorded(request_id: &str, bracket_id: BracketId, outcome: &MatchOutcome) {
    tracing::info!(
        request_id = request_id,
        bracket_id = %bracket_id,
        match_id = %outcome.match_id,
        winner = %outcome.winner.id,
        advanced_to = outcome.advanced_to.as_deref(),
        auto_resolved = outcome.auto_resolved.len(),
        "Match result recorded"
    );

    if let Some(finish) = &outcome.finish {
        tracing::info!(
            request_id = request_id,
            tournament_id = finish.tournament_id,
            winner = %finish.winner_id,
            "TOURNAMENT: finished"
        );
    }
}

/// Log a rejected bracket operation
///
/// Persistence failures are logged at error level with the full error;
/// client mistakes at debug.
pub fn log_bracket_rejection(request_id: &str, operation: &str, error: &tourney_bracket::BracketError) {
    if error.is_persistence() {
        tracing::error!(
            request_id = request_id,
            operation = operation,
            error = %error,
            "Bracket operation failed"
        );
    } else {
        tracing::debug!(
            request_id = request_id,
            operation = operation,
            error = %error,
            "Bracket operation rejected"
        );
    }
}
