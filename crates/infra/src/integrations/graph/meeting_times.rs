//! Meeting-time suggestions
//!
//! Wraps the provider's findMeetingTimes action. Missing options are
//! defaulted before the request: the candidate window falls back to the
//! next seven days, the duration to thirty minutes, expressed in the
//! resolved timezone.

use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use chrono_tz::Tz;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use syncline_domain::constants::{
    DEFAULT_MAX_CANDIDATES, DEFAULT_MEETING_DURATION_MINUTES, DEFAULT_MEETING_WINDOW_DAYS,
};
use syncline_domain::{MeetingTimeOptions, MeetingTimeResult, Result, TimeWindow};

use super::client::{parse_json, GraphClient};
use super::errors::{GraphError, GraphErrorKind};
use super::normalize::{normalize_suggestion, MeetingTimesResponseDto};
use super::timezone::TimezoneResolver;
use super::{is_valid_email, validate_date_time};

/// Client for meeting-time suggestion queries.
pub struct MeetingTimeFinder {
    client: Arc<GraphClient>,
    timezones: Arc<TimezoneResolver>,
    account: String,
}

impl MeetingTimeFinder {
    pub fn new(
        client: Arc<GraphClient>,
        timezones: Arc<TimezoneResolver>,
        account: impl Into<String>,
    ) -> Self {
        Self { client, timezones, account: account.into() }
    }

    /// Ask the provider for candidate meeting times.
    #[instrument(skip(self, options), fields(attendees = options.attendees.len()))]
    pub async fn find_meeting_times(&self, options: &MeetingTimeOptions) -> Result<MeetingTimeResult> {
        validate_options(options)?;

        let time_zone =
            self.timezones.resolve_zone(options.time_zone.as_deref(), &self.account).await;
        let slots = match options.time_slots.is_empty() {
            false => options.time_slots.clone(),
            true => vec![default_window(&time_zone)],
        };
        let duration = options.duration_minutes.unwrap_or(DEFAULT_MEETING_DURATION_MINUTES);
        let max_candidates = options.max_candidates.unwrap_or(DEFAULT_MAX_CANDIDATES);

        let mut body = json!({
            "timeConstraint": {
                "timeslots": slots.iter().map(|slot| json!({
                    "start": {"dateTime": slot.start, "timeZone": time_zone},
                    "end": {"dateTime": slot.end, "timeZone": time_zone},
                })).collect::<Vec<Value>>(),
            },
            "meetingDuration": format!("PT{duration}M"),
            "maxCandidates": max_candidates,
        });
        if !options.attendees.is_empty() {
            body["attendees"] = options
                .attendees
                .iter()
                .map(|email| {
                    json!({"type": "required", "emailAddress": {"address": email}})
                })
                .collect();
        }

        let operation = "findMeetingTimes";
        let request = self
            .client
            .request(Method::POST, "/me/findMeetingTimes")
            .await
            .map_err(GraphError::into_domain_error)?
            .json(&body);
        let response = self.client.execute(request, operation).await.map_err(classify)?;
        let response = self.client.check_status(response, operation).await.map_err(classify)?;
        let parsed: MeetingTimesResponseDto =
            parse_json(response, operation).await.map_err(classify)?;

        let suggestions: Vec<_> = parsed
            .meeting_time_suggestions
            .into_iter()
            .filter_map(normalize_suggestion)
            .collect();
        debug!(
            suggestions = suggestions.len(),
            empty_reason = parsed.empty_suggestions_reason.as_deref().unwrap_or(""),
            "meeting time query finished"
        );

        Ok(MeetingTimeResult { suggestions, empty_reason: parsed.empty_suggestions_reason })
    }
}

/// Reword provider failures with causes specific to this action, keeping
/// the original error as context.
fn classify(err: GraphError) -> syncline_domain::SynclineError {
    let reworded = match err.kind() {
        GraphErrorKind::Validation => GraphError::validation(
            "the provider rejected the meeting time constraints as invalid",
        )
        .with_context(err.to_string()),
        GraphErrorKind::PermissionDenied => GraphError::new(
            GraphErrorKind::PermissionDenied,
            "meeting time lookup denied, attendees may be outside the organization",
        )
        .with_context(err.to_string()),
        _ => err,
    };
    reworded.into_domain_error()
}

fn validate_options(options: &MeetingTimeOptions) -> Result<()> {
    for email in &options.attendees {
        if !is_valid_email(email) {
            return Err(GraphError::validation("meeting time attendees must be email addresses")
                .into_domain_error());
        }
    }
    for slot in &options.time_slots {
        validate_date_time(&slot.start, "timeSlot.start").map_err(GraphError::into_domain_error)?;
        validate_date_time(&slot.end, "timeSlot.end").map_err(GraphError::into_domain_error)?;
    }
    if let Some(duration) = options.duration_minutes {
        if duration == 0 {
            return Err(GraphError::validation("meeting duration must be positive")
                .into_domain_error());
        }
    }
    Ok(())
}

/// Default candidate window: now until seven days out, in `time_zone`.
fn default_window(time_zone: &str) -> TimeWindow {
    let now = match time_zone.parse::<Tz>() {
        Ok(tz) => Utc::now().with_timezone(&tz).naive_local(),
        Err(_) => Utc::now().naive_utc(),
    };
    let end = now + ChronoDuration::days(DEFAULT_MEETING_WINDOW_DAYS);
    TimeWindow {
        start: now.format("%Y-%m-%dT%H:%M:%S").to_string(),
        end: end.format("%Y-%m-%dT%H:%M:%S").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_spans_seven_days() {
        let window = default_window("UTC");
        let start = chrono::NaiveDateTime::parse_from_str(&window.start, "%Y-%m-%dT%H:%M:%S")
            .expect("window start parses");
        let end = chrono::NaiveDateTime::parse_from_str(&window.end, "%Y-%m-%dT%H:%M:%S")
            .expect("window end parses");
        assert_eq!(end - start, ChronoDuration::days(DEFAULT_MEETING_WINDOW_DAYS));
    }

    #[test]
    fn default_window_survives_unknown_zone_spellings() {
        // Falls back to UTC arithmetic rather than panicking.
        let window = default_window("Custom Standard Time");
        assert!(window.start < window.end);
    }

    #[test]
    fn options_validation_flags_bad_input() {
        let bad_attendee = MeetingTimeOptions {
            attendees: vec!["Kim Larsen".to_string()],
            ..Default::default()
        };
        assert!(validate_options(&bad_attendee).is_err());

        let bad_slot = MeetingTimeOptions {
            time_slots: vec![TimeWindow { start: "soon".into(), end: "later".into() }],
            ..Default::default()
        };
        assert!(validate_options(&bad_slot).is_err());

        let zero_duration =
            MeetingTimeOptions { duration_minutes: Some(0), ..Default::default() };
        assert!(validate_options(&zero_duration).is_err());

        assert!(validate_options(&MeetingTimeOptions::default()).is_ok());
    }
}
