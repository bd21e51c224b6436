//! Rate-limited, strictly sequential task queue for external APIs.
//!
//! Used by the card pipeline to pace text-to-speech requests. See
//! [`RateLimitedQueue`] for the ordering and retry guarantees.

mod config;
mod queue;

pub use config::RateLimitConfig;
pub use queue::{QueueError, RateLimitSignal, RateLimitedQueue};
