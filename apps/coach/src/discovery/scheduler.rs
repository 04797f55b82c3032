//! Periodic scan scheduler. A plain interval task; the first tick fires one
//! interval after startup, not immediately.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::discovery;
use crate::state::AppState;

pub fn spawn(state: AppState) -> JoinHandle<()> {
    let interval_secs = (state.config.scrape_interval_hours * 3600.0).max(1.0) as u64;
    info!(
        "Scan scheduler started (interval={}h)",
        state.config.scrape_interval_hours
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        ticker.tick().await; // consume the immediate first tick

        loop {
            ticker.tick().await;
            info!("Scheduled scan starting");
            if let Err(e) = discovery::run_all(&state).await {
                error!("Scheduled scan error: {e}");
            }
        }
    })
}
