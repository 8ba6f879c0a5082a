//! Tournament bracket server.
//!
//! Serves bracket generation and result recording over HTTP, backed by
//! PostgreSQL or, for demos and local testing, by process memory.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use tb_server::{api, config::ServerConfig, logging, metrics};
use tourney_bracket::{
    BracketManager, Participant, TournamentId,
    db::{Database, MemoryBracketRepository, MemoryRoster, PgBracketRepository, PgRosterRepository},
};

const HELP: &str = "\
Run the tournament bracket server

USAGE:
  tb_server [OPTIONS]

OPTIONS:
  --bind          IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:7070]
  --db-url        URL      Database connection string  [default: env DATABASE_URL]
  --demo-players  N        With --in-memory, register N confirmed players in tournament 1

FLAGS:
  --in-memory              Keep brackets in memory instead of PostgreSQL
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  DB_MAX_CONNECTIONS       Connection pool size
  METRICS_BIND             Prometheus scrape address (disabled when unset)
  IN_MEMORY                Same as --in-memory when set to true
  RUST_LOG                 Log filter (default: info,sqlx=warn,hyper=warn)
";

/// Tournament that receives the demo roster
const DEMO_TOURNAMENT: TournamentId = 1;

struct Args {
    bind: Option<SocketAddr>,
    database_url: Option<String>,
    in_memory: bool,
    demo_players: usize,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        in_memory: pargs.contains("--in-memory"),
        demo_players: pargs.opt_value_from_str("--demo-players")?.unwrap_or(0),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        anyhow::bail!("Unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.database_url, args.in_memory)?;
    config.validate()?;

    if let Some(metrics_bind) = config.metrics_bind {
        metrics::init_metrics(metrics_bind).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exposed at http://{}/metrics", metrics_bind);
    }

    let (bracket_manager, pool) = if config.in_memory {
        info!("Using in-memory storage; brackets are lost on shutdown");
        let roster = Arc::new(MemoryRoster::new());
        if args.demo_players > 0 {
            let players = (1..=args.demo_players)
                .map(|i| Participant::new(format!("player{i}"), format!("Player {i}")))
                .collect();
            roster.set_confirmed(DEMO_TOURNAMENT, players).await;
            info!(
                "Registered {} demo players in tournament {}",
                args.demo_players, DEMO_TOURNAMENT
            );
        }

        let manager = BracketManager::new(Arc::new(MemoryBracketRepository::new()), roster);
        (manager, None)
    } else {
        if args.demo_players > 0 {
            log::warn!("--demo-players is ignored without --in-memory");
        }

        info!("Connecting to database");
        let db = Database::new(&config.database)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
        db.apply_schema()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to apply database schema: {}", e))?;
        info!("Database connected successfully");

        let pool = Arc::new(db.pool().clone());
        let manager = BracketManager::new(
            Arc::new(PgBracketRepository::new(db.pool().clone())),
            Arc::new(PgRosterRepository::new(db.pool().clone())),
        );
        (manager, Some(pool))
    };

    let api_state = api::AppState {
        bracket_manager: Arc::new(bracket_manager),
        pool,
    };

    let app = api::create_router(api_state);

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
