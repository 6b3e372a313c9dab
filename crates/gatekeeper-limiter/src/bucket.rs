//! Greedy-refill token bucket.
//!
//! Tokens come back one at a time, every `window / refill_amount`, rather
//! than in a lump at each window boundary. Progress toward the next token is
//! carried between calls, so a caller idle for 2.5 windows gets
//! `2.5 * refill_amount` tokens (rounded down to whole tokens) and keeps the
//! leftover half-token of progress.
//!
//! Progress is tracked in integer "units" of `nanoseconds * refill_amount`;
//! one token is worth `window_nanos` units. This keeps the arithmetic exact.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::tier::BucketConfig;

/// Outcome of a consumption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumptionProbe {
    /// Whether the tokens were taken.
    pub granted: bool,
    /// Tokens left after this attempt.
    pub remaining: u64,
    /// Nanoseconds until the next single token is restored. Zero when granted.
    pub nanos_to_next_token: u64,
}

impl ConsumptionProbe {
    /// Wait until the next token as a `Duration`.
    pub fn retry_after(&self) -> Duration {
        Duration::from_nanos(self.nanos_to_next_token)
    }
}

#[derive(Debug)]
struct BucketState {
    available: u64,
    last_refill: Instant,
    /// Progress toward the next token, always `< window_nanos`.
    carry: u128,
    last_touched: Instant,
}

/// A single principal's token bucket.
#[derive(Debug)]
pub struct TokenBucket {
    config: BucketConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Creates a full bucket.
    pub fn new(config: BucketConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            config,
            clock,
            state: Mutex::new(BucketState {
                available: config.capacity(),
                last_refill: now,
                carry: 0,
                last_touched: now,
            }),
        }
    }

    /// Maximum number of tokens.
    pub fn capacity(&self) -> u64 {
        self.config.capacity()
    }

    /// Token count as of the last consumption attempt, without refilling.
    pub fn available_tokens(&self) -> u64 {
        self.lock().available
    }

    /// Time since the last consumption attempt.
    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.lock().last_touched)
    }

    /// Whether the bucket would hold `capacity` tokens after refilling to `now`.
    ///
    /// A full bucket carries no sub-token progress, so dropping it and later
    /// recreating it is indistinguishable from keeping it.
    pub fn is_full_at(&self, now: Instant) -> bool {
        let mut state = self.lock();
        self.refill(&mut state, now);
        state.available >= self.config.capacity()
    }

    /// Attempts to take `cost` tokens now.
    pub fn try_consume(&self, cost: u64) -> ConsumptionProbe {
        self.try_consume_at(cost, self.clock.now())
    }

    /// Attempts to take `cost` tokens at `now`.
    ///
    /// Refill, check and decrement happen under the bucket lock, so
    /// concurrent callers can never spend the same token twice.
    pub fn try_consume_at(&self, cost: u64, now: Instant) -> ConsumptionProbe {
        let mut state = self.lock();
        state.last_touched = state.last_touched.max(now);
        self.refill(&mut state, now);

        if state.available >= cost {
            state.available -= cost;
            return ConsumptionProbe {
                granted: true,
                remaining: state.available,
                nanos_to_next_token: 0,
            };
        }

        ConsumptionProbe {
            granted: false,
            remaining: state.available,
            nanos_to_next_token: self.nanos_to_next_token(&state),
        }
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let capacity = self.config.capacity();

        // A clock that moved backwards contributes nothing.
        if now <= state.last_refill {
            return;
        }

        if state.available >= capacity {
            state.last_refill = now;
            state.carry = 0;
            return;
        }

        let window_nanos = self.config.window().as_nanos();
        let elapsed = now.duration_since(state.last_refill).as_nanos();
        let progress = state
            .carry
            .saturating_add(elapsed.saturating_mul(u128::from(self.config.refill_amount())));

        let tokens = u64::try_from(progress / window_nanos).unwrap_or(u64::MAX);
        state.carry = progress % window_nanos;
        state.last_refill = now;
        state.available = state.available.saturating_add(tokens).min(capacity);

        if state.available == capacity {
            state.carry = 0;
        }
    }

    fn nanos_to_next_token(&self, state: &BucketState) -> u64 {
        let window_nanos = self.config.window().as_nanos();
        let refill = u128::from(self.config.refill_amount());
        let missing = window_nanos - state.carry;
        let nanos = missing.div_ceil(refill).max(1);
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
