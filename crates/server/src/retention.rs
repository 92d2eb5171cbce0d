//! Order retention sweep.
//!
//! Completed orders carry an `archived_at` timestamp; once it is older than
//! the retention window they are deleted outright. The sweep runs hourly
//! in a background task spawned at startup.

use std::time::Duration;

use chrono::Utc;

use crate::db::OrderRepository;
use crate::state::AppState;

/// Archived orders are kept for seven days.
const RETENTION_DAYS: i64 = 7;

/// Sweep interval.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Spawn the hourly retention sweep.
pub fn spawn_retention_sweep(state: AppState) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            sweep_once(&state).await;
        }
    });
}

async fn sweep_once(state: &AppState) {
    let cutoff = Utc::now() - chrono::Duration::days(RETENTION_DAYS);
    match OrderRepository::new(state.pool())
        .delete_archived_before(cutoff)
        .await
    {
        Ok(0) => {}
        Ok(removed) => {
            tracing::info!(removed, "retention sweep removed archived orders");
        }
        Err(e) => {
            tracing::warn!(error = %e, "retention sweep failed");
        }
    }
}
