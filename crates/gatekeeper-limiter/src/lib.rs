//! # gatekeeper-limiter
//!
//! Per-principal admission control.
//!
//! ## Modules
//!
//! - `clock`: injectable time source
//! - `bucket`: the greedy-refill token bucket
//! - `tier`: caller classification and per-tier bucket sizing
//! - `store`: concurrent principal → bucket map with atomic get-or-create
//! - `admission`: the per-request consume-or-reject decision
//! - `eviction`: optional background sweeper for idle buckets

pub mod admission;
pub mod bucket;
pub mod clock;
pub mod eviction;
pub mod store;
pub mod tier;

pub use admission::{Admission, AdmissionController};
pub use bucket::{ConsumptionProbe, TokenBucket};
pub use clock::{Clock, SystemClock};
pub use eviction::IdleSweeper;
pub use store::{BucketStore, PrincipalKey};
pub use tier::{BucketConfig, Tier, TierPolicy};

#[cfg(any(test, feature = "test-helpers"))]
pub use clock::MockClock;
