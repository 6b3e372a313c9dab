//! Concurrent principal → bucket map.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

use crate::bucket::TokenBucket;
use crate::clock::{Clock, SystemClock};
use crate::tier::BucketConfig;

/// Identity used to partition buckets.
///
/// All unauthenticated callers collapse onto [`PrincipalKey::Anonymous`] and
/// share a single bucket. Authenticated keys are matched exactly
/// (case-sensitive) and can never collide with the anonymous key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrincipalKey {
    /// The shared key of every unauthenticated caller.
    Anonymous,
    /// An authenticated principal id.
    Principal(String),
}

impl PrincipalKey {
    /// Key for an authenticated principal id.
    pub fn principal(id: impl Into<String>) -> Self {
        Self::Principal(id.into())
    }
}

impl fmt::Display for PrincipalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => f.write_str("<anonymous>"),
            Self::Principal(id) => f.write_str(id),
        }
    }
}

/// Process-wide bucket map.
///
/// A bucket is created the first time its key is seen and keeps the config
/// it was created with: a later tier change for the same key does not resize
/// it. Entries are never removed unless [`BucketStore::evict_idle`] is called.
#[derive(Debug)]
pub struct BucketStore {
    buckets: DashMap<PrincipalKey, Arc<TokenBucket>>,
    clock: Arc<dyn Clock>,
}

impl BucketStore {
    /// Creates an empty store driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Creates an empty store driven by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            clock,
        }
    }

    /// Returns the bucket for `key`, creating a full one from `config` if absent.
    ///
    /// Creation goes through the map's entry API, so concurrent first callers
    /// for the same key all receive the one instance that was inserted.
    pub fn get_or_create(&self, key: &PrincipalKey, config: &BucketConfig) -> Arc<TokenBucket> {
        if let Some(bucket) = self.buckets.get(key) {
            return Arc::clone(bucket.value());
        }

        let entry = self.buckets.entry(key.clone()).or_insert_with(|| {
            debug!(
                principal = %key,
                capacity = config.capacity(),
                refill_amount = config.refill_amount(),
                "Creating token bucket"
            );
            Arc::new(TokenBucket::new(*config, Arc::clone(&self.clock)))
        });

        Arc::clone(entry.value())
    }

    /// Returns the bucket for `key` if one exists.
    pub fn get(&self, key: &PrincipalKey) -> Option<Arc<TokenBucket>> {
        self.buckets.get(key).map(|b| Arc::clone(b.value()))
    }

    /// Number of tracked principals.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether no principal has been seen yet.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Removes buckets idle for longer than `max_idle` that have refilled
    /// to capacity.
    ///
    /// Returns the number of buckets removed. A depleted bucket is kept no
    /// matter how long it has been idle, so eviction never grants tokens
    /// the principal would not already have.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = self.clock.now();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| bucket.idle_for(now) <= max_idle || !bucket.is_full_at(now));
        before.saturating_sub(self.buckets.len())
    }
}

impl Default for BucketStore {
    fn default() -> Self {
        Self::new()
    }
}
