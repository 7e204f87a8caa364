//! Injectable time source.
//!
//! Every timestamp comparison in the subsystem goes through [`Clock`] so that
//! tests can drive time deterministically.

/// Time source abstraction. Timestamps are unix milliseconds; 0 means never.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}
