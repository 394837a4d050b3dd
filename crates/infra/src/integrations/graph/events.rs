//! Event CRUD orchestration
//!
//! Create, read, update, respond, and cancel flows for calendar events.
//! Mutating calls run under the shared retry policy; updates use optimistic
//! concurrency with the event's etag and perform exactly one refetch-and-
//! retry when the provider reports a token mismatch. Create requests carry
//! a transaction id so a retried request cannot produce a duplicate event.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use syncline_common::{RetryPolicy, RetryRunner};
use syncline_domain::constants::{
    RETRY_BASE_DELAY_MS, RETRY_JITTER_FRACTION, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY_MS,
};
use syncline_domain::{
    Attendee, CalendarEvent, CancelOptions, EventBody, EventConfirmation, EventDraft, EventPatch,
    EventResponse, Result,
};

use super::attendees::AttendeeResolver;
use super::client::{parse_json, GraphClient};
use super::errors::{GraphError, GraphErrorKind};
use super::normalize::{normalize_event, EventDto};
use super::timezone::{to_provider_alias, TimezoneResolver};
use super::{parse_date_time, redact_id};

/// Orchestrates event operations for the signed-in user's calendar.
pub struct EventService {
    client: Arc<GraphClient>,
    timezones: Arc<TimezoneResolver>,
    attendees: AttendeeResolver,
    retry: RetryRunner,
    account: String,
}

impl EventService {
    pub fn new(
        client: Arc<GraphClient>,
        timezones: Arc<TimezoneResolver>,
        attendees: AttendeeResolver,
        account: impl Into<String>,
    ) -> Self {
        let policy = RetryPolicy {
            max_attempts: RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
            jitter: RETRY_JITTER_FRACTION,
        };
        Self::with_retry(client, timezones, attendees, account, RetryRunner::new(policy))
    }

    /// Construct with a custom retry runner (tests use a fast policy).
    pub fn with_retry(
        client: Arc<GraphClient>,
        timezones: Arc<TimezoneResolver>,
        attendees: AttendeeResolver,
        account: impl Into<String>,
        retry: RetryRunner,
    ) -> Self {
        Self { client, timezones, attendees, retry, account: account.into() }
    }

    /// Create an event from a draft.
    #[instrument(skip(self, draft))]
    pub async fn create_event(&self, draft: &EventDraft) -> Result<CalendarEvent> {
        validate_draft(draft)?;

        let zone = self.timezones.resolve_zone(draft.time_zone.as_deref(), &self.account).await;
        let attendees = self.attendees.resolve(&draft.attendees).await;
        let prefer_zone = to_provider_alias(&zone);

        let mut payload = build_event_payload(
            Some(&draft.subject),
            draft.body.as_ref(),
            Some(&draft.start),
            Some(&draft.end),
            &zone,
            draft.location.as_deref(),
            Some(&attendees),
            Some(draft.is_online_meeting),
        );
        // Same transaction id across retries keeps a retried create
        // idempotent on the provider side.
        payload.insert("transactionId".to_string(), Value::String(Uuid::new_v4().to_string()));
        let payload = Value::Object(payload);

        let operation = "createEvent";
        let payload = &payload;
        let prefer_zone = prefer_zone.as_str();
        let outcome = self
            .retry
            .run(
                move || async move {
                    let request = self
                        .client
                        .request(Method::POST, "/me/events")
                        .await?
                        .header("Prefer", prefer_header(prefer_zone))
                        .json(payload);
                    self.send(request, operation).await
                },
                GraphError::is_retryable,
            )
            .await;

        let attempts = outcome.attempts;
        let dto = outcome.result.map_err(|e| e.with_attempts(attempts).into_domain_error())?;
        let event = normalize_event(dto);
        info!(
            event = %redact_id(&event.id),
            attendees = event.attendees.len(),
            attempts,
            "event created"
        );
        Ok(event)
    }

    /// Fetch a single event.
    #[instrument(skip(self))]
    pub async fn get_event(&self, event_id: &str) -> Result<CalendarEvent> {
        let zone = self.timezones.resolve_user_time_zone(&self.account).await;
        let dto = self
            .fetch_event_dto(event_id, &to_provider_alias(&zone))
            .await
            .map_err(GraphError::into_domain_error)?;
        Ok(normalize_event(dto))
    }

    /// Apply a partial update under optimistic concurrency.
    ///
    /// The current etag is fetched first and sent as `If-Match`. On a
    /// concurrency conflict the event is refetched and the patch retried
    /// exactly once; a second conflict propagates.
    #[instrument(skip(self, patch))]
    pub async fn update_event(&self, event_id: &str, patch: &EventPatch) -> Result<CalendarEvent> {
        validate_patch(patch)?;

        let zone = self.timezones.resolve_zone(patch.time_zone.as_deref(), &self.account).await;
        let prefer_zone = to_provider_alias(&zone);
        let resolved_attendees = match &patch.attendees {
            Some(inputs) => Some(self.attendees.resolve(inputs).await),
            None => None,
        };
        let payload = Value::Object(build_event_payload(
            patch.subject.as_deref(),
            patch.body.as_ref(),
            patch.start.as_deref(),
            patch.end.as_deref(),
            &zone,
            patch.location.as_deref(),
            resolved_attendees.as_deref(),
            patch.is_online_meeting,
        ));

        let operation = "updateEvent";
        let mut etag =
            self.fetch_event_dto(event_id, &prefer_zone).await.map_err(GraphError::into_domain_error)?.concurrency_token();

        let path = format!("/me/events/{event_id}");
        for conflict_retry in 0..=1u32 {
            let payload_ref = &payload;
            let prefer = prefer_zone.as_str();
            let path_ref = path.as_str();
            let etag_ref = &etag;
            let outcome = self
                .retry
                .run(
                    move || async move {
                        let mut request = self
                            .client
                            .request(Method::PATCH, path_ref)
                            .await?
                            .header("Prefer", prefer_header(prefer))
                            .json(payload_ref);
                        if let Some(etag) = etag_ref {
                            request = request.header("If-Match", etag.as_str());
                        }
                        self.send(request, operation).await
                    },
                    GraphError::is_retryable,
                )
                .await;

            let attempts = outcome.attempts;
            match outcome.result {
                Ok(dto) => {
                    let event = normalize_event(dto);
                    info!(event = %redact_id(&event.id), attempts, "event updated");
                    return Ok(event);
                }
                Err(err)
                    if err.kind() == GraphErrorKind::ConcurrencyConflict
                        && conflict_retry == 0 =>
                {
                    warn!(
                        event = %redact_id(event_id),
                        "concurrency token rejected, refetching event"
                    );
                    etag = self
                        .fetch_event_dto(event_id, &prefer_zone)
                        .await
                        .map_err(GraphError::into_domain_error)?
                        .concurrency_token();
                }
                Err(err) => {
                    return Err(err.with_attempts(attempts).into_domain_error());
                }
            }
        }

        // Both conflict rounds return out of the loop above.
        Err(GraphError::new(GraphErrorKind::Other, "update retry loop exhausted")
            .into_domain_error())
    }

    /// Reply to an invitation.
    #[instrument(skip(self, comment))]
    pub async fn respond_to_event(
        &self,
        event_id: &str,
        response: EventResponse,
        comment: Option<&str>,
    ) -> Result<EventConfirmation> {
        let action = response.action();
        let mut body = Map::new();
        body.insert("sendResponse".to_string(), Value::Bool(true));
        if let Some(comment) = comment {
            body.insert("comment".to_string(), Value::String(comment.to_string()));
        }
        let body = Value::Object(body);

        let path = format!("/me/events/{event_id}/{action}");
        self.execute_action(event_id, action, &path, Some(&body)).await
    }

    /// Cancel an event.
    ///
    /// With `notify_attendees` the provider's cancel action sends notices;
    /// without it the event is deleted silently.
    #[instrument(skip(self, options))]
    pub async fn cancel_event(
        &self,
        event_id: &str,
        options: &CancelOptions,
    ) -> Result<EventConfirmation> {
        if options.notify_attendees {
            let mut body = Map::new();
            if let Some(comment) = &options.comment {
                body.insert("comment".to_string(), Value::String(comment.clone()));
            }
            let body = Value::Object(body);
            let path = format!("/me/events/{event_id}/cancel");
            self.execute_action(event_id, "cancel", &path, Some(&body)).await
        } else {
            self.execute_action(event_id, "delete", &format!("/me/events/{event_id}"), None).await
        }
    }

    /// Run a respond/cancel style action under retry. Any success status
    /// confirms the action; the provider may return an empty body or echo
    /// the event id.
    async fn execute_action(
        &self,
        event_id: &str,
        action: &str,
        path: &str,
        body: Option<&Value>,
    ) -> Result<EventConfirmation> {
        let method = if action == "delete" { Method::DELETE } else { Method::POST };
        let method_ref = &method;
        let body_ref = body;
        let outcome = self
            .retry
            .run(
                move || async move {
                    let mut request = self.client.request(method_ref.clone(), path).await?;
                    if let Some(body) = body_ref {
                        request = request.json(body);
                    }
                    let response = self.client.execute(request, action).await?;
                    self.client.check_status(response, action).await?;
                    Ok(())
                },
                GraphError::is_retryable,
            )
            .await;

        let attempts = outcome.attempts;
        outcome.result.map_err(|e: GraphError| e.with_attempts(attempts).into_domain_error())?;
        debug!(event = %redact_id(event_id), action, attempts, "event action confirmed");
        Ok(EventConfirmation { event_id: event_id.to_string(), action: action.to_string() })
    }

    async fn fetch_event_dto(
        &self,
        event_id: &str,
        prefer_zone: &str,
    ) -> std::result::Result<EventDto, GraphError> {
        let operation = "getEvent";
        let request = self
            .client
            .request(Method::GET, &format!("/me/events/{event_id}"))
            .await?
            .header("Prefer", prefer_header(prefer_zone));
        self.send(request, operation).await
    }

    async fn send(
        &self,
        request: RequestBuilder,
        operation: &str,
    ) -> std::result::Result<EventDto, GraphError> {
        let response = self.client.execute(request, operation).await?;
        let response = self.client.check_status(response, operation).await?;
        parse_json(response, operation).await
    }
}

fn prefer_header(windows_zone: &str) -> String {
    format!("outlook.timezone=\"{windows_zone}\"")
}

fn validate_draft(draft: &EventDraft) -> Result<()> {
    if draft.subject.trim().is_empty() {
        return Err(GraphError::validation("event subject must not be empty").into_domain_error());
    }
    let start = parse_date_time(&draft.start, "start").map_err(GraphError::into_domain_error)?;
    let end = parse_date_time(&draft.end, "end").map_err(GraphError::into_domain_error)?;
    if start >= end {
        return Err(GraphError::validation("event start must precede end").into_domain_error());
    }
    Ok(())
}

fn validate_patch(patch: &EventPatch) -> Result<()> {
    if patch.is_empty() {
        return Err(GraphError::validation("update patch has no fields to apply")
            .into_domain_error());
    }
    if let Some(subject) = &patch.subject {
        if subject.trim().is_empty() {
            return Err(
                GraphError::validation("event subject must not be empty").into_domain_error()
            );
        }
    }
    if let Some(start) = &patch.start {
        parse_date_time(start, "start").map_err(GraphError::into_domain_error)?;
    }
    if let Some(end) = &patch.end {
        parse_date_time(end, "end").map_err(GraphError::into_domain_error)?;
    }
    Ok(())
}

/// Build the provider payload for create and patch requests. Only supplied
/// fields appear in the output; date-times carry the resolved zone.
#[allow(clippy::too_many_arguments)]
fn build_event_payload(
    subject: Option<&str>,
    body: Option<&EventBody>,
    start: Option<&str>,
    end: Option<&str>,
    zone: &str,
    location: Option<&str>,
    attendees: Option<&[Attendee]>,
    is_online_meeting: Option<bool>,
) -> Map<String, Value> {
    let mut payload = Map::new();

    if let Some(subject) = subject {
        payload.insert("subject".to_string(), Value::String(subject.to_string()));
    }
    if let Some(body) = body {
        payload.insert(
            "body".to_string(),
            serde_json::json!({"contentType": body.content_type, "content": body.content}),
        );
    }
    if let Some(start) = start {
        payload.insert(
            "start".to_string(),
            serde_json::json!({"dateTime": start, "timeZone": zone}),
        );
    }
    if let Some(end) = end {
        payload
            .insert("end".to_string(), serde_json::json!({"dateTime": end, "timeZone": zone}));
    }
    if let Some(location) = location {
        payload.insert("location".to_string(), serde_json::json!({"displayName": location}));
    }
    if let Some(attendees) = attendees {
        let wire: Vec<Value> = attendees
            .iter()
            .map(|a| {
                let mut email = Map::new();
                email.insert("address".to_string(), Value::String(a.address.clone()));
                if let Some(name) = &a.name {
                    email.insert("name".to_string(), Value::String(name.clone()));
                }
                serde_json::json!({
                    "emailAddress": Value::Object(email),
                    "type": serde_json::to_value(a.kind).unwrap_or(Value::String("required".into())),
                })
            })
            .collect();
        payload.insert("attendees".to_string(), Value::Array(wire));
    }
    if let Some(online) = is_online_meeting {
        payload.insert("isOnlineMeeting".to_string(), Value::Bool(online));
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_validation_rejects_blank_subjects_and_inverted_windows() {
        let mut draft = EventDraft {
            subject: "Planning".into(),
            start: "2026-03-01T09:00:00".into(),
            end: "2026-03-01T10:00:00".into(),
            ..Default::default()
        };
        assert!(validate_draft(&draft).is_ok());

        draft.subject = "   ".into();
        assert!(validate_draft(&draft).is_err());

        draft.subject = "Planning".into();
        draft.end = "2026-03-01T08:00:00".into();
        assert!(validate_draft(&draft).is_err());
    }

    #[test]
    fn patch_validation_rejects_empty_patches() {
        assert!(validate_patch(&EventPatch::default()).is_err());

        let patch = EventPatch { subject: Some("Moved".into()), ..Default::default() };
        assert!(validate_patch(&patch).is_ok());

        let bad = EventPatch { start: Some("tomorrow".into()), ..Default::default() };
        assert!(validate_patch(&bad).is_err());
    }

    #[test]
    fn payload_contains_only_supplied_fields() {
        let payload = build_event_payload(
            Some("Moved"),
            None,
            Some("2026-03-01T10:00:00"),
            None,
            "Europe/Oslo",
            None,
            None,
            None,
        );

        assert_eq!(payload.len(), 2);
        assert_eq!(payload["subject"], "Moved");
        assert_eq!(payload["start"]["dateTime"], "2026-03-01T10:00:00");
        assert_eq!(payload["start"]["timeZone"], "Europe/Oslo");
        assert!(!payload.contains_key("end"));
        assert!(!payload.contains_key("attendees"));
    }

    #[test]
    fn normalized_event_round_trips_through_a_full_patch() {
        let dto: EventDto = serde_json::from_value(json!({
            "id": "e1",
            "subject": "Quarterly Review",
            "start": {"dateTime": "2026-03-01T09:00:00", "timeZone": "Europe/Berlin"},
            "end": {"dateTime": "2026-03-01T10:30:00", "timeZone": "Europe/Berlin"},
            "attendees": [
                {"emailAddress": {"address": "kim@contoso.com", "name": "Kim"}, "type": "required"}
            ]
        }))
        .unwrap();
        let event = normalize_event(dto);

        let start = event.start.clone().unwrap();
        let payload = build_event_payload(
            event.subject.as_deref(),
            event.body.as_ref(),
            event.start.as_ref().map(|s| s.date_time.as_str()),
            event.end.as_ref().map(|e| e.date_time.as_str()),
            &start.time_zone,
            event.location.as_deref(),
            Some(&event.attendees),
            Some(event.is_online_meeting),
        );

        assert_eq!(payload["subject"], "Quarterly Review");
        assert_eq!(payload["start"]["dateTime"], "2026-03-01T09:00:00");
        assert_eq!(payload["start"]["timeZone"], "Europe/Berlin");
        assert_eq!(payload["end"]["dateTime"], "2026-03-01T10:30:00");
        assert_eq!(payload["attendees"][0]["emailAddress"]["address"], "kim@contoso.com");
        assert_eq!(payload["attendees"][0]["type"], "required");
    }

    #[test]
    fn prefer_header_quotes_the_zone() {
        assert_eq!(
            prefer_header("W. Europe Standard Time"),
            "outlook.timezone=\"W. Europe Standard Time\""
        );
    }

    #[test]
    fn attendee_payload_keeps_kind_and_name() {
        let attendees = vec![Attendee {
            address: "ana@contoso.com".into(),
            name: Some("Ana".into()),
            kind: syncline_domain::AttendeeKind::Optional,
            resolution: syncline_domain::AttendeeResolution::VerifiedAddress,
        }];
        let payload =
            build_event_payload(None, None, None, None, "UTC", None, Some(&attendees), None);
        assert_eq!(payload["attendees"][0]["type"], "optional");
        assert_eq!(payload["attendees"][0]["emailAddress"]["name"], "Ana");
    }
}
