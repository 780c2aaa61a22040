pub mod page;
pub mod routes;

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::session::SessionStore;

pub use routes::create_routes;

/// Periodically drop sessions idle for longer than `ttl`.
pub fn spawn_session_reaper(sessions: SessionStore, ttl: Duration) -> JoinHandle<()> {
    let max_idle = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
    let period = (ttl / 4).max(Duration::from_secs(1));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let removed = sessions.purge_idle(max_idle);
            if removed > 0 {
                debug!("Expired {} idle UI session(s)", removed);
            }
        }
    })
}
