use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use log::{debug, info};
use tokio::time::interval;

use crate::commands::Sessions;

const CHECK_INTERVAL_SECONDS: u64 = 60;

pub async fn reap_idle_sessions_task(sessions: Sessions, max_idle: Duration) {
    info!(
        "Starting background task to expire sessions idle for more than {} minutes...",
        max_idle.num_minutes()
    );
    let mut interval = interval(StdDuration::from_secs(CHECK_INTERVAL_SECONDS));

    loop {
        interval.tick().await;
        let now = Utc::now();
        let mut registry = sessions.lock().await;
        let expired = registry.reap_idle(now, max_idle);
        if expired.is_empty() {
            debug!("No idle sessions at {}", now.to_rfc3339());
        } else {
            info!(
                "Expired {} idle session(s), {} remaining.",
                expired.len(),
                registry.len()
            );
        }
    }
}
