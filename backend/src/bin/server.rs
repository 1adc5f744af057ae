//! Timetable HTTP Server Binary
//!
//! This is the main entry point for the timetable REST API server.
//! It loads configuration, initializes the repository, sets up the HTTP
//! router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! # Run with an empty in-memory repository
//! cargo run --bin timetable-server
//!
//! # Seed the registry and point at a remote solver
//! SEED_PATH=seed.json SOLVER_URL=http://solver:8000/generate \
//!   cargo run --bin timetable-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`, `PORT`: bind address (default: 0.0.0.0:8080)
//! - `REPOSITORY_TYPE`: repository backend (default: local)
//! - `SEED_PATH`: JSON registry seed file
//! - `SOLVER_URL`, `SOLVER_TIMEOUT_SECS`: schedule solver endpoint
//! - `SESSION_IDLE_MINS`: idle edit sessions are dropped after this long (default: 120)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use timetable_backend::config::AppConfig;
use timetable_backend::db::RepositoryFactory;
use timetable_backend::http::{create_router_with_limit, AppState};
use timetable_backend::services::{HttpScheduleGenerator, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting timetable server");

    let config = AppConfig::load()?;

    let repository = RepositoryFactory::from_config(&config)?;
    info!(repository = %config.repository.repo_type, "Repository initialized successfully");

    let generator = HttpScheduleGenerator::from_settings(&config.solver)?;
    info!(
        solver = %config.solver.url,
        timeout_secs = config.solver.timeout_secs,
        "Solver client configured"
    );

    let sessions =
        SessionStore::with_idle_timeout(chrono::Duration::minutes(config.server.session_idle_mins));
    let state = AppState::new(repository, Arc::new(generator)).with_sessions(sessions);
    let app = create_router_with_limit(state, config.server.body_limit_mb * 1024 * 1024);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
