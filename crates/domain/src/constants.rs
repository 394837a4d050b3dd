//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Provider ceilings
pub const MAX_SCHEDULE_BATCH_SIZE: usize = 100;
pub const MAX_AVAILABILITY_INTERVAL_MINUTES: u32 = 1440;

// Request defaults
pub const DEFAULT_AVAILABILITY_INTERVAL_MINUTES: u32 = 30;
pub const DEFAULT_MEETING_DURATION_MINUTES: u32 = 30;
pub const DEFAULT_MEETING_WINDOW_DAYS: i64 = 7;
pub const DEFAULT_MAX_CANDIDATES: u32 = 20;

// Timezone defaults
pub const DEFAULT_TIME_ZONE: &str = "UTC";
pub const DEFAULT_WINDOWS_TIME_ZONE: &str = "UTC";

// Cache configuration
pub const TIMEZONE_CACHE_TTL_SECS: u64 = 3600;
pub const TIMEZONE_CACHE_MAX_CAPACITY: u64 = 10_000;
pub const ROOM_CACHE_TTL_SECS: u64 = 86_400;
pub const ROOM_CACHE_MAX_SNAPSHOTS: usize = 8;

// Retry policy for mutating provider calls
pub const RETRY_MAX_ATTEMPTS: u32 = 3;
pub const RETRY_BASE_DELAY_MS: u64 = 1000;
pub const RETRY_MAX_DELAY_MS: u64 = 10_000;
pub const RETRY_JITTER_FRACTION: f64 = 0.3;

// Attendee resolution fan-out ceiling
pub const ATTENDEE_LOOKUP_CONCURRENCY: usize = 8;
