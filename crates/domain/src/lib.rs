//! # Syncline Domain
//!
//! Business domain types and models for Syncline.
//!
//! This crate contains:
//! - The canonical, provider-agnostic calendar model
//! - Domain error types and Result definitions
//! - Domain constants (provider ceilings, defaults, cache TTLs)
//!
//! ## Architecture
//! - No dependencies on other Syncline crates
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

pub use errors::{Result, SynclineError};
pub use types::*;
