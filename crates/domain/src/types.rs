//! Canonical calendar model and caller-facing inputs
//!
//! These are the application's provider-agnostic shapes. Raw provider
//! payloads are normalized into these types before they reach a caller;
//! caller inputs are validated and expanded into provider payloads from
//! these types. Serde renames follow the client's camelCase convention.

use serde::{Deserialize, Serialize};

/// A date-time paired with the timezone it is expressed in.
///
/// Before transmission the `time_zone` is always a concrete resolved
/// identifier, never an unresolved alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    pub date_time: String,
    pub time_zone: String,
}

/// Event body with its content type (`text` or `html`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    pub content_type: String,
    pub content: String,
}

/// Attendee participation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendeeKind {
    Required,
    Optional,
    Resource,
}

impl Default for AttendeeKind {
    fn default() -> Self {
        Self::Required
    }
}

/// How an attendee's address was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeResolution {
    /// The caller supplied a syntactically valid email address.
    VerifiedAddress,
    /// The address was resolved from a display name via people lookup.
    ResolvedFromName,
}

/// A resolved event attendee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub address: String,
    pub name: Option<String>,
    pub kind: AttendeeKind,
    pub resolution: AttendeeResolution,
}

/// Raw attendee input as supplied by a caller.
///
/// Either field may be missing; entries without a usable address are routed
/// through name resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeInput {
    pub address: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub kind: AttendeeKind,
}

impl AttendeeInput {
    /// Attendee known only by email address.
    pub fn email(address: impl Into<String>) -> Self {
        Self { address: Some(address.into()), name: None, kind: AttendeeKind::Required }
    }

    /// Attendee known only by display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { address: None, name: Some(name.into()), kind: AttendeeKind::Required }
    }
}

/// Canonical calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub subject: Option<String>,
    pub body: Option<EventBody>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    pub location: Option<String>,
    pub attendees: Vec<Attendee>,
    pub is_online_meeting: bool,
    /// Concurrency token used for optimistic updates.
    pub etag: Option<String>,
    pub response_status: Option<String>,
}

/// Input for creating an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    pub subject: String,
    pub body: Option<EventBody>,
    /// Start date-time, e.g. `2026-03-01T09:00:00`.
    pub start: String,
    pub end: String,
    /// Caller-preferred zone; any known alias is accepted.
    pub time_zone: Option<String>,
    pub location: Option<String>,
    pub attendees: Vec<AttendeeInput>,
    pub is_online_meeting: bool,
}

/// Partial update; only supplied fields are patched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub subject: Option<String>,
    pub body: Option<EventBody>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub time_zone: Option<String>,
    pub location: Option<String>,
    pub attendees: Option<Vec<AttendeeInput>>,
    pub is_online_meeting: Option<bool>,
}

impl EventPatch {
    /// True when no field is set; such a patch has nothing to send.
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.body.is_none()
            && self.start.is_none()
            && self.end.is_none()
            && self.location.is_none()
            && self.attendees.is_none()
            && self.is_online_meeting.is_none()
    }
}

/// Reply choices for a meeting invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventResponse {
    Accept,
    Decline,
    TentativelyAccept,
}

impl EventResponse {
    /// Provider action segment for this response.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Decline => "decline",
            Self::TentativelyAccept => "tentativelyAccept",
        }
    }
}

/// Options for cancelling an event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOptions {
    /// True sends a cancellation notice; false deletes silently.
    pub notify_attendees: bool,
    pub comment: Option<String>,
}

/// Confirmation returned by respond/cancel operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfirmation {
    pub event_id: String,
    pub action: String,
}

/// Options for a free/busy query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityOptions {
    /// View resolution in minutes; must be within (0, 1440].
    pub interval_minutes: Option<u32>,
    pub time_zone: Option<String>,
}

/// One busy/free block inside a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub subject: Option<String>,
    pub status: String,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    pub is_private: bool,
}

/// Working-hours descriptor for a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub days_of_week: Vec<String>,
    pub start_time: String,
    pub end_time: String,
    pub time_zone: Option<String>,
}

/// Normalized free/busy result for a single mailbox.
///
/// `availability_view` is a fixed-width string with one status character per
/// interval: 0 free, 1 tentative, 2 busy, 3 out-of-office, 4 elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResult {
    pub email: String,
    pub availability_view: String,
    pub working_hours: Option<WorkingHours>,
    pub schedule_items: Vec<ScheduleItem>,
    pub is_busy: bool,
}

/// A candidate or constraint time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

/// Options for a meeting-time suggestion query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTimeOptions {
    /// Attendee email addresses; omitted from the request when empty.
    pub attendees: Vec<String>,
    /// Candidate windows; defaults to [now, now + 7 days] when empty.
    pub time_slots: Vec<TimeWindow>,
    pub time_zone: Option<String>,
    pub duration_minutes: Option<u32>,
    pub max_candidates: Option<u32>,
}

/// One suggested meeting time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTimeSuggestion {
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub confidence: Option<f64>,
    pub organizer_availability: Option<String>,
    pub suggestion_reason: Option<String>,
}

/// Meeting-time query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTimeResult {
    pub suggestions: Vec<MeetingTimeSuggestion>,
    /// Provider-supplied reason when no suggestion was produced.
    pub empty_reason: Option<String>,
}

/// A bookable room from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub display_name: String,
    pub email_address: Option<String>,
    pub address: Option<String>,
    pub building: Option<String>,
    pub floor: Option<String>,
    pub capacity: Option<u32>,
    pub has_audio: bool,
    pub has_video: bool,
    pub has_display: bool,
}

/// Filters over the room directory; all supplied filters must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFilters {
    pub building: Option<String>,
    pub floor: Option<String>,
    /// Rooms with unspecified capacity never satisfy this filter.
    pub min_capacity: Option<u32>,
    #[serde(default)]
    pub requires_audio: bool,
    #[serde(default)]
    pub requires_video: bool,
    #[serde(default)]
    pub requires_display: bool,
}

/// Room directory query result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListing {
    pub rooms: Vec<Room>,
    /// Continuation token passed through from the provider unchanged.
    pub paging_token: Option<String>,
    /// True when served from an expired cache after a fetch failure.
    pub stale: bool,
}
