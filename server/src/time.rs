//! Time source abstraction.
//!
//! Token expiry and account creation timestamps read the clock through
//! [`TimeSource`], so tests can pin or advance time explicitly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Abstraction over time operations.
pub trait TimeSource: Send + Sync {
    /// Get the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> u64;

    /// Get the current time in whole seconds since Unix epoch.
    fn now_secs(&self) -> u64 {
        self.now_ms() / 1000
    }
}

/// Real time source using the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    #[allow(clippy::cast_possible_truncation)] // Milliseconds won't overflow u64 for billions of years
    fn now_ms(&self) -> u64 {
        // A clock set before 1970 reads as the epoch.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_millis() as u64)
    }
}

/// A manually driven time source.
///
/// Time only moves when told to. Unlike a `Cell`-based clock this one is
/// atomic, so it can be shared with services running on a multi-threaded
/// runtime.
///
/// # Example
///
/// ```
/// use authn::time::{ManualTimeSource, TimeSource};
///
/// let time = ManualTimeSource::new(1000);
/// assert_eq!(time.now_ms(), 1000);
///
/// time.advance(100);
/// assert_eq!(time.now_ms(), 1100);
/// ```
#[derive(Debug)]
pub struct ManualTimeSource {
    current_time_ms: AtomicU64,
}

impl ManualTimeSource {
    #[must_use]
    pub const fn new(initial_time_ms: u64) -> Self {
        Self {
            current_time_ms: AtomicU64::new(initial_time_ms),
        }
    }

    /// Start at `1_700_000_000_000` (approximately November 2023).
    #[must_use]
    pub const fn default_start() -> Self {
        Self::new(1_700_000_000_000)
    }

    /// Advance time by the given number of milliseconds, saturating at `u64::MAX`.
    pub fn advance(&self, ms: u64) {
        let _ = self
            .current_time_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(ms))
            });
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.current_time_ms.load(Ordering::SeqCst)
    }
}
