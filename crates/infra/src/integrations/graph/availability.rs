//! Batched free/busy queries
//!
//! The provider's schedule endpoint accepts at most 100 mailboxes per call,
//! so larger requests are split into sequential batches. A batch failure
//! aborts the whole query; the surfaced error carries only the batch index
//! and recipient count, never the addresses themselves.

use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::{debug, instrument};

use syncline_domain::constants::{
    DEFAULT_AVAILABILITY_INTERVAL_MINUTES, MAX_AVAILABILITY_INTERVAL_MINUTES,
    MAX_SCHEDULE_BATCH_SIZE,
};
use syncline_domain::{AvailabilityOptions, AvailabilityResult, Result};

use super::client::{parse_json, GraphClient};
use super::errors::GraphError;
use super::normalize::{normalize_schedule, ScheduleResponseDto};
use super::timezone::TimezoneResolver;
use super::{is_valid_email, parse_date_time};

/// Free/busy query client for the signed-in user's view of other mailboxes.
pub struct AvailabilityClient {
    client: Arc<GraphClient>,
    timezones: Arc<TimezoneResolver>,
    /// Identity used for timezone resolution, `me` for the session user.
    account: String,
}

impl AvailabilityClient {
    pub fn new(
        client: Arc<GraphClient>,
        timezones: Arc<TimezoneResolver>,
        account: impl Into<String>,
    ) -> Self {
        Self { client, timezones, account: account.into() }
    }

    /// Query free/busy for `emails` over `[start, end)`.
    ///
    /// Results arrive in batch order, one entry per schedule the provider
    /// returned.
    #[instrument(skip(self, emails), fields(emails = emails.len()))]
    pub async fn get_availability(
        &self,
        emails: &[String],
        start: &str,
        end: &str,
        options: &AvailabilityOptions,
    ) -> Result<Vec<AvailabilityResult>> {
        let interval = validate_query(emails, start, end, options)?;
        let time_zone =
            self.timezones.resolve_zone(options.time_zone.as_deref(), &self.account).await;

        let batches: Vec<&[String]> = emails.chunks(MAX_SCHEDULE_BATCH_SIZE).collect();
        let batch_count = batches.len();
        let mut results = Vec::with_capacity(emails.len());

        for (batch_index, batch) in batches.into_iter().enumerate() {
            debug!(batch_index, batch_size = batch.len(), "requesting schedule batch");
            let schedules = self
                .fetch_batch(batch, start, end, &time_zone, interval)
                .await
                .map_err(|e| {
                    e.with_context(format!(
                        "batch index {batch_index} of {batch_count} ({} recipients)",
                        batch.len()
                    ))
                })?;
            results.extend(schedules);
        }

        Ok(results)
    }

    async fn fetch_batch(
        &self,
        emails: &[String],
        start: &str,
        end: &str,
        time_zone: &str,
        interval: u32,
    ) -> std::result::Result<Vec<AvailabilityResult>, GraphError> {
        let operation = "getSchedule";
        let body = json!({
            "schedules": emails,
            "startTime": {"dateTime": start, "timeZone": time_zone},
            "endTime": {"dateTime": end, "timeZone": time_zone},
            "availabilityViewInterval": interval,
        });

        let request = self
            .client
            .request(Method::POST, "/me/calendar/getSchedule")
            .await?
            .json(&body);
        let response = self.client.execute(request, operation).await?;
        let response = self.client.check_status(response, operation).await?;
        let parsed: ScheduleResponseDto = parse_json(response, operation).await?;

        Ok(parsed.value.into_iter().map(normalize_schedule).collect())
    }
}

/// Validate query inputs, returning the effective view interval.
fn validate_query(
    emails: &[String],
    start: &str,
    end: &str,
    options: &AvailabilityOptions,
) -> std::result::Result<u32, GraphError> {
    if emails.is_empty() {
        return Err(GraphError::validation("availability query requires at least one email"));
    }
    for email in emails {
        if !is_valid_email(email) {
            return Err(GraphError::validation("availability query contains an invalid email"));
        }
    }

    let start_at = parse_date_time(start, "start")?;
    let end_at = parse_date_time(end, "end")?;
    if start_at >= end_at {
        return Err(GraphError::validation("availability window start must precede end"));
    }

    let interval = options.interval_minutes.unwrap_or(DEFAULT_AVAILABILITY_INTERVAL_MINUTES);
    if interval == 0 || interval > MAX_AVAILABILITY_INTERVAL_MINUTES {
        return Err(GraphError::validation(format!(
            "availability interval must be within 1..={MAX_AVAILABILITY_INTERVAL_MINUTES} minutes"
        )));
    }

    Ok(interval)
}
