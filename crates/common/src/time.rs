//! Time abstraction for testability
//!
//! Provides a trait-based approach to time operations that allows for
//! deterministic testing without relying on actual time passage.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Trait for time operations to enable testing
///
/// This trait provides an abstraction over time operations, allowing code
/// to work with either real system time or mocked time for testing.
pub trait Clock: Send + Sync {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
    }
}

/// Real system clock implementation
///
/// Use this in production code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Mock clock for deterministic testing
///
/// Allows tests to control time manually: advance it without waiting.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
    base_system_time: SystemTime,
}

impl MockClock {
    /// Create a new mock clock
    ///
    /// The clock starts at the current real time but can be advanced
    /// manually without real time passing.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
            base_system_time: SystemTime::now(),
        }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        // Test utility: panic on poisoned mutex to fail tests early
        #[allow(clippy::expect_used)]
        let mut elapsed = self.elapsed.lock().expect("mutex poisoned");
        *elapsed += duration;
    }

    /// Get the current simulated elapsed time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        #[allow(clippy::expect_used)]
        let elapsed = self.elapsed.lock().expect("mutex poisoned");
        *elapsed
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        #[allow(clippy::expect_used)]
        let elapsed = self.elapsed.lock().expect("mutex poisoned");
        self.start + *elapsed
    }

    fn system_time(&self) -> SystemTime {
        #[allow(clippy::expect_used)]
        let elapsed = self.elapsed.lock().expect("mutex poisoned");
        self.base_system_time + *elapsed
    }
}
