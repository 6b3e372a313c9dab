//! Time sources for token refill.
//!
//! Buckets never read the system clock directly; they ask the [`Clock`]
//! owned by the [`BucketStore`](crate::store::BucketStore) so tests can
//! freeze or advance time deterministically.

use std::fmt::Debug;
use std::time::Instant;

/// Monotonic time source.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// System clock implementation using `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use std::sync::{Arc, Mutex, PoisonError};
    use std::time::{Duration, Instant};

    use super::Clock;

    /// Manually driven clock for tests.
    ///
    /// Clones share the same underlying instant, so advancing one clone
    /// advances them all.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        current: Arc<Mutex<Instant>>,
    }

    impl MockClock {
        /// Create a mock clock frozen at the current instant.
        pub fn new() -> Self {
            Self::starting_at(Instant::now())
        }

        /// Create a mock clock frozen at `start`.
        pub fn starting_at(start: Instant) -> Self {
            Self {
                current: Arc::new(Mutex::new(start)),
            }
        }

        /// Advance the clock by `duration`.
        pub fn advance(&self, duration: Duration) {
            let mut now = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            *now += duration;
        }

        /// Set the clock to a specific instant.
        pub fn set(&self, instant: Instant) {
            *self.current.lock().unwrap_or_else(PoisonError::into_inner) = instant;
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> Instant {
            *self.current.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}
