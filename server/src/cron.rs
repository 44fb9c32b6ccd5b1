use std::time::Duration;

use tracing::{debug, error, info};

use crate::state::AppState;

/// How often expired sessions are swept out of the store
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Periodically drop expired sessions. Runs until the process exits.
pub async fn run_cron(app_state: AppState) -> crate::Result<()> {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        sweep_expired_sessions(&app_state).await;
    }
}

/// Returns the number of sessions removed
pub async fn sweep_expired_sessions(state: &AppState) -> usize {
    match state.sessions.purge_expired().await {
        Ok(0) => {
            debug!("No expired sessions to remove");
            0
        }
        Ok(removed) => {
            info!("Removed {} expired sessions", removed);
            removed
        }
        Err(err) => {
            error!("Failed to purge expired sessions: {:?}", err);
            0
        }
    }
}
