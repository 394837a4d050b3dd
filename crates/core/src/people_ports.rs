//! People lookup port
//!
//! Used by attendee resolution to turn bare display names into addresses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use syncline_domain::Result;

/// Best directory match for a person search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonMatch {
    pub address: String,
    pub display_name: String,
}

/// Trait for resolving display names against a people directory.
#[async_trait]
pub trait PeopleLookup: Send + Sync {
    /// Find the best match for `name`, or `None` when the directory has no
    /// usable candidate. Errors are reserved for transport failures.
    async fn search_by_name(&self, name: &str) -> Result<Option<PersonMatch>>;
}
