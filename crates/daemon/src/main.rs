//! SquadUp daemon
//!
//! Opens the ticket database and runs the auto-expiry sweeper until
//! interrupted. Command handling (create/join/vote) arrives through the
//! transport collaborators, which share the database handle built here.

use std::sync::{Arc, Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use squadup_core::{Config, Database, TicketFilter, TicketStatus};

mod sweep;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting SquadUp daemon");

    if let Err(e) = run().await {
        tracing::error!("Daemon failed: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> squadup_core::Result<()> {
    let config_path = std::env::args().nth(1).map(std::path::PathBuf::from);
    let config = Config::load(config_path.as_deref())?;

    let db_path = config.database_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db = Database::open(&db_path)?;
    tracing::info!(
        path = %db_path.display(),
        schema_version = db.schema_version(),
        "Database opened"
    );

    let open_tickets = db
        .tickets()
        .list(&TicketFilter {
            status: Some(TicketStatus::Open),
            ..Default::default()
        })?
        .len();
    tracing::info!(open_tickets, "Ticket store ready");

    let db = Arc::new(Mutex::new(db));

    if config.sweeper.enabled {
        tokio::spawn(sweep::run_loop(Arc::clone(&db), config.sweeper.clone()));
    } else {
        tracing::warn!("Expiry sweeper disabled by configuration");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}
