//! Attendee resolution
//!
//! Caller attendee input mixes verified email addresses with bare display
//! names. Addresses are accepted as-is; names go through the people lookup
//! port with per-call memoization and a bounded concurrent fan-out.
//! Resolution never fails the surrounding operation: names that cannot be
//! resolved are dropped with a warning.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use syncline_core::PeopleLookup;
use syncline_domain::constants::ATTENDEE_LOOKUP_CONCURRENCY;
use syncline_domain::{Attendee, AttendeeInput, AttendeeKind, AttendeeResolution};

use super::is_valid_email;

/// Resolves attendee inputs into concrete addresses.
pub struct AttendeeResolver {
    people: Arc<dyn PeopleLookup>,
    concurrency: usize,
}

impl AttendeeResolver {
    pub fn new(people: Arc<dyn PeopleLookup>) -> Self {
        Self { people, concurrency: ATTENDEE_LOOKUP_CONCURRENCY }
    }

    /// Resolve every input that can be resolved.
    ///
    /// Inputs with a syntactically valid address skip the directory.
    /// Remaining inputs are keyed by display name; duplicate names share a
    /// single lookup. Output order groups direct addresses before resolved
    /// names and is not guaranteed to match input order.
    pub async fn resolve(&self, inputs: &[AttendeeInput]) -> Vec<Attendee> {
        let mut resolved = Vec::with_capacity(inputs.len());
        // name -> attendee kinds queued under that name
        let mut pending: HashMap<String, Vec<AttendeeKind>> = HashMap::new();

        for input in inputs {
            match input.address.as_deref().filter(|a| is_valid_email(a)) {
                Some(address) => resolved.push(Attendee {
                    address: address.to_string(),
                    name: input.name.clone(),
                    kind: input.kind,
                    resolution: AttendeeResolution::VerifiedAddress,
                }),
                None => {
                    // A non-email address field is treated as a name too.
                    let name = input
                        .name
                        .as_deref()
                        .or(input.address.as_deref())
                        .map(str::trim)
                        .filter(|n| !n.is_empty());
                    match name {
                        Some(name) => pending.entry(name.to_string()).or_default().push(input.kind),
                        None => debug!("skipping attendee input with no address or name"),
                    }
                }
            }
        }

        if pending.is_empty() {
            return resolved;
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let lookups = pending.keys().cloned().map(|name| {
            let semaphore = Arc::clone(&semaphore);
            let people = Arc::clone(&self.people);
            async move {
                // Closing the semaphore is not part of this flow; treat an
                // acquire failure like a lookup miss.
                let Ok(_permit) = semaphore.acquire().await else {
                    return (name, None);
                };
                let outcome = people.search_by_name(&name).await;
                (name, outcome.ok().flatten())
            }
        });

        for (name, outcome) in join_all(lookups).await {
            let Some(kinds) = pending.remove(&name) else { continue };
            match outcome {
                Some(person) => {
                    for kind in kinds {
                        resolved.push(Attendee {
                            address: person.address.clone(),
                            name: Some(person.display_name.clone()),
                            kind,
                            resolution: AttendeeResolution::ResolvedFromName,
                        });
                    }
                }
                None => {
                    warn!(name = %name, "attendee name could not be resolved, dropping");
                }
            }
        }

        resolved
    }
}
