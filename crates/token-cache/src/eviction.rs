use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::UserInfoCache;

/// Background task purging expired cache entries at a fixed interval.
pub struct EvictionTask {
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

impl EvictionTask {
    /// Spawns the sweep on the current runtime.
    pub fn start(cache: UserInfoCache, interval: Duration) -> Self {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            log::debug!("Cache eviction running every {interval:?}");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = cache.purge_expired();

                        if evicted > 0 {
                            log::debug!("Evicted {evicted} expired cache entries");
                        }
                    }
                }
            }

            log::debug!("Cache eviction stopped");
        });

        Self { shutdown, handle }
    }

    /// Stops the sweep and waits for it to finish.
    pub async fn stop(self) {
        self.shutdown.cancel();

        if let Err(e) = self.handle.await {
            log::error!("Cache eviction task failed: {e}");
        }
    }
}
