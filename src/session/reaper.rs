//! Idle-session reaper background loop
//!
//! Abandoned hazard sessions would otherwise accumulate in the durable
//! store forever. The reaper forfeits sessions idle past the policy window
//! on a fixed interval; forfeiture settles as a full loss.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tracing::{error, info};

use super::SessionManager;

/// Spawn the periodic reaper. The returned handle can be aborted at
/// shutdown; an in-flight sweep finishes its current session first because
/// each forfeiture settles before moving on.
pub fn spawn(manager: Arc<SessionManager>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();
            match manager.reap_idle(now).await {
                Ok(0) => {}
                Ok(reaped) => info!(reaped, "idle sessions forfeited"),
                Err(err) => error!(%err, "reaper sweep failed"),
            }
        }
    })
}
