//! # Syncline Infrastructure
//!
//! Provider adapters for the calendar integration. The only adapter today
//! is the Graph calendar integration under [`integrations::graph`]; it
//! implements transport, normalization, caching, and the retry behavior the
//! orchestrators depend on.

#![forbid(unsafe_code)]

pub mod integrations;

pub use integrations::graph;
