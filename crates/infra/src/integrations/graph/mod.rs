//! Graph calendar integration
//!
//! Module layout:
//! - `client`: HTTP transport, token acquisition, status classification
//! - `errors`: integration error type and domain mapping
//! - `normalize`: wire DTOs and conversion to canonical types
//! - `timezone`: alias resolution and per-user mailbox zone cache
//! - `attendees`: name-to-address resolution with bounded fan-out
//! - `availability`: batched free/busy queries
//! - `meeting_times`: meeting-time suggestions
//! - `rooms`: cached room directory with client-side filters
//! - `events`: event CRUD orchestration with retries and concurrency control

pub mod attendees;
pub mod availability;
pub mod client;
pub mod errors;
pub mod events;
pub mod meeting_times;
pub mod normalize;
pub mod rooms;
pub mod timezone;

pub use attendees::AttendeeResolver;
pub use availability::AvailabilityClient;
pub use client::{AccessTokenProvider, GraphClient, StaticTokenProvider, GRAPH_API_BASE};
pub use errors::{GraphError, GraphErrorKind};
pub use events::EventService;
pub use meeting_times::MeetingTimeFinder;
pub use rooms::RoomDirectory;
pub use timezone::TimezoneResolver;

use chrono::{DateTime, NaiveDateTime};

/// Shorten an identifier for log output.
pub(crate) fn redact_id(id: &str) -> String {
    if id.chars().count() <= 8 {
        id.to_string()
    } else {
        let head: String = id.chars().take(8).collect();
        format!("{head}…")
    }
}

/// Minimal syntactic email check: one `@`, non-empty local part, and a
/// dotted domain.
pub(crate) fn is_valid_email(candidate: &str) -> bool {
    let mut parts = candidate.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    !local.is_empty()
        && !domain.is_empty()
        && !candidate.contains(' ')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && candidate.matches('@').count() == 1
}

/// Parse a caller-supplied date-time string. Accepts RFC 3339 or a bare
/// `YYYY-MM-DDTHH:MM:SS` local form.
pub(crate) fn parse_date_time(value: &str, field: &str) -> Result<NaiveDateTime, GraphError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|_| {
            GraphError::validation(format!("{field} is not a valid ISO 8601 date-time: {value}"))
        })
}

/// Validate a caller-supplied date-time string without keeping the parse.
pub(crate) fn validate_date_time(value: &str, field: &str) -> Result<(), GraphError> {
    parse_date_time(value, field).map(|_| ())
}
