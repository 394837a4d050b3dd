//! # Syncline Common
//!
//! Cross-cutting utilities shared across Syncline crates.
//!
//! This crate contains:
//! - Time abstraction (`Clock`) for deterministic testing
//! - TTL snapshot caching with injected clocks
//! - Retry execution with exponential backoff and jitter
//!
//! ## Architecture
//! - No dependencies on other Syncline crates
//! - No domain knowledge; purely mechanical helpers

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod cache;
pub mod retry;
pub mod time;

pub use cache::{CacheLookup, TtlCache};
pub use retry::{RetryOutcome, RetryPolicy, RetryRunner};
pub use time::{Clock, MockClock, SystemClock};
