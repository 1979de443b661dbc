//! Periodic expiry sweep task

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, error, info};

use squadup_core::{created_before_ttl, sweep_once, Database, SweeperConfig};

/// Run the sweep loop forever. A failed tick is logged and the next
/// tick proceeds normally.
pub async fn run_loop(db: Arc<Mutex<Database>>, config: SweeperConfig) {
    let policy = created_before_ttl(config.ttl());
    let mut interval = tokio::time::interval(config.interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(
        interval_secs = config.interval_secs,
        ttl_minutes = config.ttl_minutes,
        "Expiry sweeper started"
    );

    loop {
        interval.tick().await;

        let result = {
            let db = match db.lock() {
                Ok(db) => db,
                Err(poisoned) => {
                    error!("Database lock poisoned, sweeper stopping");
                    drop(poisoned);
                    return;
                }
            };
            sweep_once(&db, &policy, Utc::now())
        };

        match result {
            Ok(0) => debug!("Sweep tick found nothing to close"),
            Ok(closed) => info!(closed, "Sweep tick closed expired tickets"),
            Err(e) => error!("Sweep tick failed: {}", e),
        }
    }
}
