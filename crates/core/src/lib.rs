//! # Syncline Core
//!
//! Pure port interfaces - no infrastructure dependencies.
//!
//! This crate contains the traits that infrastructure adapters implement
//! and that the calendar integration consumes. All external collaborators
//! (people lookup, token acquisition) are reached through these seams.

pub mod people_ports;

pub use people_ports::{PeopleLookup, PersonMatch};
