use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use joinme_db::KeyValueStore;

/// Background task that removes store rows past their expiry. Expired rows
/// are already invisible to reads; this only reclaims their space.
pub async fn run_reaper_loop(store: Arc<dyn KeyValueStore>, every: Duration) {
    let mut interval = tokio::time::interval(every);

    loop {
        interval.tick().await;

        match reap_once(store.clone()).await {
            Ok(count) => {
                if count > 0 {
                    info!("Reaper: removed {} expired item(s)", count);
                }
            }
            Err(e) => {
                warn!("Reaper error: {}", e);
            }
        }
    }
}

async fn reap_once(store: Arc<dyn KeyValueStore>) -> anyhow::Result<usize> {
    let count = tokio::task::spawn_blocking(move || store.reap_expired(Utc::now())).await??;
    Ok(count)
}
