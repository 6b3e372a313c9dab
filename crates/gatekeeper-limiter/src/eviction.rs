//! Optional background sweeper that drops idle buckets.
//!
//! Off by default: without it the store keeps one entry per principal ever
//! seen for the life of the process.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use gatekeeper_core::config::EvictionConfig;

use crate::store::BucketStore;

/// Periodically evicts idle buckets until the shutdown signal fires.
#[derive(Debug)]
pub struct IdleSweeper {
    store: Arc<BucketStore>,
    idle_timeout: Duration,
    interval: Duration,
}

impl IdleSweeper {
    /// Creates a sweeper from eviction configuration.
    pub fn new(store: Arc<BucketStore>, config: &EvictionConfig) -> Self {
        Self {
            store,
            idle_timeout: Duration::from_secs(config.idle_timeout_seconds),
            interval: Duration::from_secs(config.sweep_interval_seconds),
        }
    }

    /// Runs one sweep and returns the number of evicted buckets.
    pub fn sweep(&self) -> usize {
        let evicted = self.store.evict_idle(self.idle_timeout);
        if evicted > 0 {
            tracing::info!(
                evicted,
                remaining = self.store.len(),
                "Evicted idle rate limit buckets"
            );
        }
        evicted
    }

    /// Sweeps on every tick until `cancel` flips to `true`.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            idle_timeout_seconds = self.idle_timeout.as_secs(),
            interval_seconds = self.interval.as_secs(),
            "Idle bucket sweeper started"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.sweep();
                }
            }
        }

        tracing::info!("Idle bucket sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;
    use crate::store::PrincipalKey;
    use crate::tier::BucketConfig;

    fn eviction_config() -> EvictionConfig {
        EvictionConfig {
            enabled: true,
            idle_timeout_seconds: 60,
            sweep_interval_seconds: 10,
        }
    }

    #[test]
    fn test_sweep_evicts_idle_buckets() {
        let clock = MockClock::new();
        let store = Arc::new(BucketStore::with_clock(Arc::new(clock.clone())));
        let config = BucketConfig::new(5, 5, Duration::from_secs(60)).unwrap();
        store.get_or_create(&PrincipalKey::Anonymous, &config);

        let sweeper = IdleSweeper::new(Arc::clone(&store), &eviction_config());
        assert_eq!(sweeper.sweep(), 0);

        clock.advance(Duration::from_secs(61));
        assert_eq!(sweeper.sweep(), 1);
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_shutdown() {
        let store = Arc::new(BucketStore::new());
        let sweeper = IdleSweeper::new(store, &eviction_config());
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { sweeper.run(rx).await });
        time::sleep(Duration::from_secs(25)).await;
        tx.send(true).unwrap();

        time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweeper did not stop")
            .unwrap();
    }
}
