//! Integration tests for event CRUD against a mocked provider
//!
//! **Coverage:**
//! - Create: transient 503s retried, then success; validation failures fail fast
//! - Update: etag fetch → If-Match patch → single refetch-retry on 412
//! - Respond/cancel: success on empty bodies, silent delete vs notify cancel
//!
//! **Infrastructure:**
//! - WireMock HTTP server standing in for the provider
//! - Real EventService with a fast retry policy

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{fast_retry, graph_client, timezone_resolver, FakeDirectory};
use syncline_domain::{
    AttendeeInput, CancelOptions, EventDraft, EventPatch, EventResponse, SynclineError,
};
use syncline_infra::graph::{AttendeeResolver, EventService};

// ============================================================================
// Test Helpers
// ============================================================================

fn event_service(server: &MockServer) -> EventService {
    let client = graph_client(server);
    let timezones = timezone_resolver(Arc::clone(&client));
    let attendees = AttendeeResolver::new(Arc::new(FakeDirectory));
    EventService::with_retry(client, timezones, attendees, "me", fast_retry())
}

fn sample_draft() -> EventDraft {
    EventDraft {
        subject: "Quarterly Review".into(),
        start: "2026-03-01T09:00:00".into(),
        end: "2026-03-01T10:00:00".into(),
        time_zone: Some("Europe/Oslo".into()),
        attendees: vec![AttendeeInput::email("kim@contoso.com")],
        ..Default::default()
    }
}

fn event_body(id: &str, etag: &str) -> serde_json::Value {
    json!({
        "id": id,
        "@odata.etag": etag,
        "subject": "Quarterly Review",
        "start": {"dateTime": "2026-03-01T09:00:00", "timeZone": "Europe/Berlin"},
        "end": {"dateTime": "2026-03-01T10:00:00", "timeZone": "Europe/Berlin"},
        "attendees": [
            {"emailAddress": {"address": "kim@contoso.com", "name": "Kim"}, "type": "required"}
        ]
    })
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_retries_transient_errors_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/events"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/me/events"))
        .respond_with(ResponseTemplate::new(201).set_body_json(event_body("ev-1", "W/\"v1\"")))
        .expect(1)
        .mount(&server)
        .await;

    let event = event_service(&server).create_event(&sample_draft()).await.expect("create ok");
    assert_eq!(event.id, "ev-1");
    assert_eq!(event.attendees.len(), 1);
}

#[tokio::test]
async fn create_sends_the_oslo_prefer_header_and_a_transaction_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/events"))
        .and(header("Prefer", "outlook.timezone=\"W. Europe Standard Time\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(event_body("ev-2", "W/\"v1\"")))
        .expect(1)
        .mount(&server)
        .await;

    event_service(&server).create_event(&sample_draft()).await.expect("create ok");

    let requests = server.received_requests().await.expect("requests recorded");
    let body: serde_json::Value =
        serde_json::from_slice(&requests[0].body).expect("request body is json");
    assert!(body["transactionId"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(body["start"]["timeZone"], "Europe/Oslo");
    assert_eq!(body["attendees"][0]["emailAddress"]["address"], "kim@contoso.com");
}

#[tokio::test]
async fn create_does_not_retry_validation_rejections() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/events"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "bad payload"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = event_service(&server).create_event(&sample_draft()).await.expect_err("must fail");
    assert!(matches!(err, SynclineError::InvalidInput(_)));
}

#[tokio::test]
async fn create_rejects_bad_drafts_before_any_request() {
    let server = MockServer::start().await;

    let mut draft = sample_draft();
    draft.end = "2026-03-01T08:00:00".into();

    let err = event_service(&server).create_event(&draft).await.expect_err("must fail");
    assert!(matches!(err, SynclineError::InvalidInput(_)));
    assert!(server.received_requests().await.expect("requests recorded").is_empty());
}

// ============================================================================
// Update with optimistic concurrency
// ============================================================================

#[tokio::test]
async fn update_refetches_and_retries_once_on_conflict() {
    let server = MockServer::start().await;

    // First fetch returns v1, the refetch after the conflict returns v2.
    Mock::given(method("GET"))
        .and(path("/me/events/ev-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("ev-9", "W/\"v1\"")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/events/ev-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("ev-9", "W/\"v2\"")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/me/events/ev-9"))
        .and(header("If-Match", "W/\"v1\""))
        .respond_with(ResponseTemplate::new(412))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/me/events/ev-9"))
        .and(header("If-Match", "W/\"v2\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("ev-9", "W/\"v3\"")))
        .expect(1)
        .mount(&server)
        .await;

    let patch = EventPatch { subject: Some("Moved".into()), ..Default::default() };
    let event = event_service(&server).update_event("ev-9", &patch).await.expect("update ok");
    assert_eq!(event.etag.as_deref(), Some("W/\"v3\""));
}

#[tokio::test]
async fn update_propagates_a_second_conflict_without_a_third_attempt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/events/ev-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("ev-9", "W/\"v1\"")))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/me/events/ev-9"))
        .respond_with(ResponseTemplate::new(412))
        .expect(2)
        .mount(&server)
        .await;

    let patch = EventPatch { subject: Some("Moved".into()), ..Default::default() };
    let err = event_service(&server).update_event("ev-9", &patch).await.expect_err("must fail");
    assert!(matches!(err, SynclineError::Conflict(_)));
}

#[tokio::test]
async fn update_rejects_empty_patches_before_any_request() {
    let server = MockServer::start().await;

    let err = event_service(&server)
        .update_event("ev-9", &EventPatch::default())
        .await
        .expect_err("must fail");
    assert!(matches!(err, SynclineError::InvalidInput(_)));
    assert!(server.received_requests().await.expect("requests recorded").is_empty());
}

// ============================================================================
// Respond and cancel
// ============================================================================

#[tokio::test]
async fn respond_accepts_an_empty_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/events/ev-3/accept"))
        .and(body_partial_json(json!({"sendResponse": true, "comment": "see you there"})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let confirmation = event_service(&server)
        .respond_to_event("ev-3", EventResponse::Accept, Some("see you there"))
        .await
        .expect("respond ok");
    assert_eq!(confirmation.event_id, "ev-3");
    assert_eq!(confirmation.action, "accept");
}

#[tokio::test]
async fn cancel_with_notification_posts_the_cancel_action() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/me/events/ev-4/cancel"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let options =
        CancelOptions { notify_attendees: true, comment: Some("room flooded".into()) };
    let confirmation =
        event_service(&server).cancel_event("ev-4", &options).await.expect("cancel ok");
    assert_eq!(confirmation.action, "cancel");
}

#[tokio::test]
async fn silent_cancel_deletes_the_event() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/me/events/ev-5"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let confirmation = event_service(&server)
        .cancel_event("ev-5", &CancelOptions::default())
        .await
        .expect("delete ok");
    assert_eq!(confirmation.action, "delete");
}

#[tokio::test]
async fn get_event_normalizes_the_provider_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/events/ev-6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_body("ev-6", "W/\"v1\"")))
        .expect(1)
        .mount(&server)
        .await;

    let event = event_service(&server).get_event("ev-6").await.expect("get ok");
    assert_eq!(event.subject.as_deref(), Some("Quarterly Review"));
    assert_eq!(event.start.as_ref().map(|s| s.time_zone.as_str()), Some("Europe/Berlin"));
}
