//! Integration tests for meeting-time suggestions
//!
//! **Coverage:**
//! - Defaults: seven-day window, PT30M duration, attendees key omitted
//! - Explicit constraints pass through with the resolved zone
//! - Suggestion parsing and the empty-suggestions reason
//! - Error causes specific to this action (403 cross-tenant)

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{graph_client, timezone_resolver};
use syncline_domain::{MeetingTimeOptions, SynclineError, TimeWindow};
use syncline_infra::graph::MeetingTimeFinder;

// ============================================================================
// Test Helpers
// ============================================================================

fn finder(server: &MockServer) -> MeetingTimeFinder {
    let client = graph_client(server);
    let timezones = timezone_resolver(Arc::clone(&client));
    MeetingTimeFinder::new(client, timezones, "me")
}

fn utc_options() -> MeetingTimeOptions {
    MeetingTimeOptions { time_zone: Some("UTC".into()), ..Default::default() }
}

fn suggestions_body() -> serde_json::Value {
    json!({
        "meetingTimeSuggestions": [
            {
                "confidence": 100.0,
                "organizerAvailability": "free",
                "suggestionReason": "Suggested because it is one of the nearest times when all attendees are available.",
                "meetingTimeSlot": {
                    "start": {"dateTime": "2026-03-02T09:00:00", "timeZone": "UTC"},
                    "end": {"dateTime": "2026-03-02T09:30:00", "timeZone": "UTC"}
                }
            },
            {
                // No slot: dropped during normalization.
                "confidence": 50.0
            }
        ],
        "emptySuggestionsReason": ""
    })
}

// ============================================================================
// Defaults
// ============================================================================

#[tokio::test]
async fn missing_options_are_defaulted_in_the_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/findMeetingTimes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(suggestions_body()))
        .expect(1)
        .mount(&server)
        .await;

    finder(&server).find_meeting_times(&utc_options()).await.expect("query ok");

    let requests = server.received_requests().await.expect("requests recorded");
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("request body is json");

    assert_eq!(body["meetingDuration"], "PT30M");
    assert_eq!(body["maxCandidates"], 20);
    assert!(body.get("attendees").is_none(), "empty attendee list must be omitted");

    let slots = body["timeConstraint"]["timeslots"].as_array().expect("one default slot");
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0]["start"]["timeZone"], "UTC");
}

#[tokio::test]
async fn explicit_constraints_pass_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/findMeetingTimes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(suggestions_body()))
        .expect(1)
        .mount(&server)
        .await;

    let options = MeetingTimeOptions {
        attendees: vec!["kim@contoso.com".into(), "ana@contoso.com".into()],
        time_slots: vec![TimeWindow {
            start: "2026-03-02T08:00:00".into(),
            end: "2026-03-02T18:00:00".into(),
        }],
        time_zone: Some("Europe/Oslo".into()),
        duration_minutes: Some(45),
        max_candidates: Some(5),
    };
    finder(&server).find_meeting_times(&options).await.expect("query ok");

    let requests = server.received_requests().await.expect("requests recorded");
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("request body is json");

    assert_eq!(body["meetingDuration"], "PT45M");
    assert_eq!(body["maxCandidates"], 5);
    assert_eq!(body["attendees"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["attendees"][0]["type"], "required");
    assert_eq!(body["timeConstraint"]["timeslots"][0]["start"]["timeZone"], "Europe/Oslo");
}

// ============================================================================
// Response handling
// ============================================================================

#[tokio::test]
async fn suggestions_are_normalized_and_slotless_entries_dropped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/findMeetingTimes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(suggestions_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = finder(&server).find_meeting_times(&utc_options()).await.expect("query ok");
    assert_eq!(result.suggestions.len(), 1);
    assert_eq!(result.suggestions[0].start.date_time, "2026-03-02T09:00:00");
    assert_eq!(result.suggestions[0].confidence, Some(100.0));
}

#[tokio::test]
async fn the_empty_suggestions_reason_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/findMeetingTimes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meetingTimeSuggestions": [],
            "emptySuggestionsReason": "AttendeesUnavailable"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = finder(&server).find_meeting_times(&utc_options()).await.expect("query ok");
    assert!(result.suggestions.is_empty());
    assert_eq!(result.empty_reason.as_deref(), Some("AttendeesUnavailable"));
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test]
async fn denied_lookups_mention_the_likely_cause() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/findMeetingTimes"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = finder(&server).find_meeting_times(&utc_options()).await.expect_err("must fail");
    assert!(matches!(err, SynclineError::PermissionDenied(_)));
    assert!(err.to_string().contains("outside the organization"));
}

#[tokio::test]
async fn provider_rejections_surface_as_invalid_input() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/findMeetingTimes"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let err = finder(&server).find_meeting_times(&utc_options()).await.expect_err("must fail");
    assert!(matches!(err, SynclineError::InvalidInput(_)));
}
