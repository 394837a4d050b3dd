//! Provider payload normalization
//!
//! Raw Graph JSON shapes live here as serde DTOs together with the
//! conversions into the canonical domain types. Feature modules never hand
//! a raw DTO to a caller.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use syncline_domain::{
    Attendee, AttendeeKind, AttendeeResolution, AvailabilityResult, CalendarEvent, EventBody,
    EventDateTime, MeetingTimeSuggestion, Room, ScheduleItem, WorkingHours,
};

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeZoneDto {
    pub date_time: String,
    pub time_zone: Option<String>,
}

impl DateTimeZoneDto {
    fn into_domain(self) -> EventDateTime {
        EventDateTime {
            date_time: self.date_time,
            time_zone: self.time_zone.unwrap_or_else(|| "UTC".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBodyDto {
    pub content_type: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAddressDto {
    pub address: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeDto {
    pub email_address: Option<EmailAddressDto>,
    #[serde(rename = "type")]
    pub attendee_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseStatusDto {
    pub response: Option<String>,
}

/// A calendar event as Graph returns it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDto {
    pub id: String,
    #[serde(rename = "@odata.etag")]
    pub etag: Option<String>,
    pub change_key: Option<String>,
    pub subject: Option<String>,
    pub body: Option<ItemBodyDto>,
    pub start: Option<DateTimeZoneDto>,
    pub end: Option<DateTimeZoneDto>,
    pub location: Option<LocationDto>,
    #[serde(default)]
    pub attendees: Vec<AttendeeDto>,
    #[serde(default)]
    pub is_online_meeting: bool,
    pub response_status: Option<ResponseStatusDto>,
}

impl EventDto {
    /// Concurrency token, preferring the OData etag over the change key.
    pub fn concurrency_token(&self) -> Option<String> {
        self.etag.clone().or_else(|| self.change_key.clone())
    }
}

fn attendee_kind(raw: Option<&str>) -> AttendeeKind {
    match raw {
        Some("optional") => AttendeeKind::Optional,
        Some("resource") => AttendeeKind::Resource,
        _ => AttendeeKind::Required,
    }
}

/// Convert a raw event into the canonical model.
///
/// The concurrency token prefers the OData etag and falls back to the
/// change key; attendees without an address are dropped.
pub fn normalize_event(dto: EventDto) -> CalendarEvent {
    let etag = dto.etag.or(dto.change_key);
    let attendees = dto
        .attendees
        .into_iter()
        .filter_map(|a| {
            let email = a.email_address?;
            let address = email.address?;
            Some(Attendee {
                address,
                name: email.name,
                kind: attendee_kind(a.attendee_type.as_deref()),
                resolution: AttendeeResolution::VerifiedAddress,
            })
        })
        .collect();

    CalendarEvent {
        id: dto.id,
        subject: dto.subject,
        body: dto.body.and_then(|b| {
            Some(EventBody {
                content_type: b.content_type.unwrap_or_else(|| "text".to_string()),
                content: b.content?,
            })
        }),
        start: dto.start.map(DateTimeZoneDto::into_domain),
        end: dto.end.map(DateTimeZoneDto::into_domain),
        location: dto.location.and_then(|l| l.display_name),
        attendees,
        is_online_meeting: dto.is_online_meeting,
        etag,
        response_status: dto.response_status.and_then(|r| r.response),
    }
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItemDto {
    pub subject: Option<String>,
    pub status: Option<String>,
    pub start: Option<DateTimeZoneDto>,
    pub end: Option<DateTimeZoneDto>,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHoursDto {
    #[serde(default)]
    pub days_of_week: Vec<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_zone: Option<TimeZoneNameDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeZoneNameDto {
    pub name: Option<String>,
}

/// One mailbox schedule from a `getSchedule` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    pub schedule_id: Option<String>,
    pub availability_view: Option<String>,
    #[serde(default)]
    pub schedule_items: Vec<ScheduleItemDto>,
    pub working_hours: Option<WorkingHoursDto>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleResponseDto {
    #[serde(default)]
    pub value: Vec<ScheduleDto>,
}

/// Convert one schedule into a per-mailbox availability result.
///
/// A mailbox is busy when any interval in the view is busy (`2`) or
/// out-of-office (`3`).
pub fn normalize_schedule(dto: ScheduleDto) -> AvailabilityResult {
    let availability_view = dto.availability_view.unwrap_or_default();
    let is_busy = availability_view.chars().any(|c| c == '2' || c == '3');

    AvailabilityResult {
        email: dto.schedule_id.unwrap_or_default(),
        is_busy,
        availability_view,
        working_hours: dto.working_hours.map(|wh| WorkingHours {
            days_of_week: wh.days_of_week,
            start_time: wh.start_time.unwrap_or_default(),
            end_time: wh.end_time.unwrap_or_default(),
            time_zone: wh.time_zone.and_then(|tz| tz.name),
        }),
        schedule_items: dto
            .schedule_items
            .into_iter()
            .map(|item| ScheduleItem {
                subject: item.subject,
                status: item.status.unwrap_or_else(|| "busy".to_string()),
                start: item.start.map(DateTimeZoneDto::into_domain),
                end: item.end.map(DateTimeZoneDto::into_domain),
                is_private: item.is_private,
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Meeting times
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotDto {
    pub start: DateTimeZoneDto,
    pub end: DateTimeZoneDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeAvailabilityDto {
    pub availability: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSuggestionDto {
    pub meeting_time_slot: Option<TimeSlotDto>,
    pub confidence: Option<f64>,
    pub organizer_availability: Option<String>,
    pub suggestion_reason: Option<String>,
    #[serde(default)]
    pub attendee_availability: Vec<AttendeeAvailabilityDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingTimesResponseDto {
    #[serde(default)]
    pub meeting_time_suggestions: Vec<MeetingSuggestionDto>,
    pub empty_suggestions_reason: Option<String>,
}

/// Convert one suggestion; `None` when the provider omitted the slot.
pub fn normalize_suggestion(dto: MeetingSuggestionDto) -> Option<MeetingTimeSuggestion> {
    let slot = dto.meeting_time_slot?;
    Some(MeetingTimeSuggestion {
        start: slot.start.into_domain(),
        end: slot.end.into_domain(),
        confidence: dto.confidence,
        organizer_availability: dto.organizer_availability,
        suggestion_reason: dto.suggestion_reason,
    })
}

// ---------------------------------------------------------------------------
// Rooms
// ---------------------------------------------------------------------------

static BUILDING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:building|bldg\.?)\s*([A-Za-z0-9]+)")
        .expect("building regex must compile")
});

static FLOOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:floor|fl\.?)\s*(\d+)|\b(\d+)(?:st|nd|rd|th)\s+floor")
        .expect("floor regex must compile")
});

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalAddressDto {
    pub street: Option<String>,
    pub city: Option<String>,
}

/// A room as returned by the places endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: String,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    pub address: Option<PhysicalAddressDto>,
    pub building: Option<String>,
    pub floor_number: Option<i32>,
    pub floor_label: Option<String>,
    pub capacity: Option<u32>,
    pub audio_device_name: Option<String>,
    pub video_device_name: Option<String>,
    pub display_device_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoomsResponseDto {
    #[serde(default)]
    pub value: Vec<RoomDto>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Derive a building identifier from a room display name.
pub fn building_from_name(name: &str) -> Option<String> {
    BUILDING_PATTERN.captures(name).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

/// Derive a floor from a room display name ("Floor 3", "3rd floor").
pub fn floor_from_name(name: &str) -> Option<String> {
    FLOOR_PATTERN
        .captures(name)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
}

/// Convert a raw room, filling building/floor from the display name when
/// the structured fields are absent.
pub fn normalize_room(dto: RoomDto) -> Room {
    let display_name = dto.display_name.unwrap_or_default();
    let building = dto
        .building
        .filter(|b| !b.is_empty())
        .or_else(|| building_from_name(&display_name));
    let floor = dto
        .floor_label
        .filter(|f| !f.is_empty())
        .or_else(|| dto.floor_number.map(|n| n.to_string()))
        .or_else(|| floor_from_name(&display_name));
    let address = dto.address.and_then(|a| match (a.street, a.city) {
        (Some(street), Some(city)) => Some(format!("{street}, {city}")),
        (Some(street), None) => Some(street),
        (None, Some(city)) => Some(city),
        (None, None) => None,
    });

    Room {
        id: dto.id,
        display_name,
        email_address: dto.email_address,
        address,
        building,
        floor,
        capacity: dto.capacity,
        has_audio: dto.audio_device_name.is_some(),
        has_video: dto.video_device_name.is_some(),
        has_display: dto.display_device_name.is_some(),
    }
}
