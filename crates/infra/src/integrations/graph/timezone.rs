//! Timezone resolution
//!
//! Maps caller-supplied zone aliases and mailbox settings to canonical IANA
//! identifiers, and canonical identifiers to the Windows names the provider
//! expects in `Prefer` headers. Mailbox lookups are cached per user; lookup
//! failures degrade to the UTC default rather than failing the operation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use once_cell::sync::Lazy;
use reqwest::Method;
use serde::Deserialize;
use tracing::{debug, warn};

use syncline_domain::constants::{
    DEFAULT_TIME_ZONE, DEFAULT_WINDOWS_TIME_ZONE, TIMEZONE_CACHE_MAX_CAPACITY,
    TIMEZONE_CACHE_TTL_SECS,
};

use super::client::{parse_json, GraphClient};
use super::errors::{GraphError, GraphErrorKind};
use super::redact_id;

/// Informal names, abbreviations, and Windows zone names to IANA.
/// Keys are lowercase; lookups lowercase the input first.
static ALIAS_TO_IANA: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Informal city / country names
        ("oslo", "Europe/Oslo"),
        ("norway", "Europe/Oslo"),
        ("stockholm", "Europe/Stockholm"),
        ("copenhagen", "Europe/Copenhagen"),
        ("berlin", "Europe/Berlin"),
        ("amsterdam", "Europe/Amsterdam"),
        ("paris", "Europe/Paris"),
        ("madrid", "Europe/Madrid"),
        ("london", "Europe/London"),
        ("dublin", "Europe/Dublin"),
        ("helsinki", "Europe/Helsinki"),
        ("warsaw", "Europe/Warsaw"),
        ("new york", "America/New_York"),
        ("chicago", "America/Chicago"),
        ("denver", "America/Denver"),
        ("los angeles", "America/Los_Angeles"),
        ("tokyo", "Asia/Tokyo"),
        ("shanghai", "Asia/Shanghai"),
        ("singapore", "Asia/Singapore"),
        ("sydney", "Australia/Sydney"),
        ("mumbai", "Asia/Kolkata"),
        // Common abbreviations
        ("utc", "UTC"),
        ("gmt", "Europe/London"),
        ("cet", "Europe/Berlin"),
        ("cest", "Europe/Berlin"),
        ("eet", "Europe/Helsinki"),
        ("est", "America/New_York"),
        ("edt", "America/New_York"),
        ("cst", "America/Chicago"),
        ("mst", "America/Denver"),
        ("pst", "America/Los_Angeles"),
        ("pdt", "America/Los_Angeles"),
        ("ist", "Asia/Kolkata"),
        ("jst", "Asia/Tokyo"),
        ("pacific time", "America/Los_Angeles"),
        ("eastern time", "America/New_York"),
        ("central time", "America/Chicago"),
        ("mountain time", "America/Denver"),
        // Windows zone names as returned by mailbox settings
        ("w. europe standard time", "Europe/Berlin"),
        ("central europe standard time", "Europe/Budapest"),
        ("central european standard time", "Europe/Warsaw"),
        ("romance standard time", "Europe/Paris"),
        ("gmt standard time", "Europe/London"),
        ("greenwich standard time", "Atlantic/Reykjavik"),
        ("fle standard time", "Europe/Helsinki"),
        ("e. europe standard time", "Europe/Chisinau"),
        ("eastern standard time", "America/New_York"),
        ("central standard time", "America/Chicago"),
        ("mountain standard time", "America/Denver"),
        ("pacific standard time", "America/Los_Angeles"),
        ("india standard time", "Asia/Kolkata"),
        ("china standard time", "Asia/Shanghai"),
        ("tokyo standard time", "Asia/Tokyo"),
        ("singapore standard time", "Asia/Singapore"),
        ("aus eastern standard time", "Australia/Sydney"),
    ])
});

/// Canonical IANA identifiers to the Windows names used on the wire.
static IANA_TO_WINDOWS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("UTC", "UTC"),
        ("Etc/UTC", "UTC"),
        ("Europe/Berlin", "W. Europe Standard Time"),
        ("Europe/Amsterdam", "W. Europe Standard Time"),
        ("Europe/Stockholm", "W. Europe Standard Time"),
        ("Europe/Copenhagen", "W. Europe Standard Time"),
        ("Europe/Zurich", "W. Europe Standard Time"),
        ("Europe/Vienna", "W. Europe Standard Time"),
        ("Europe/Paris", "Romance Standard Time"),
        ("Europe/Brussels", "Romance Standard Time"),
        ("Europe/Madrid", "Romance Standard Time"),
        ("Europe/London", "GMT Standard Time"),
        ("Europe/Dublin", "GMT Standard Time"),
        ("Europe/Lisbon", "GMT Standard Time"),
        ("Europe/Warsaw", "Central European Standard Time"),
        ("Europe/Budapest", "Central Europe Standard Time"),
        ("Europe/Prague", "Central Europe Standard Time"),
        ("Europe/Helsinki", "FLE Standard Time"),
        ("Europe/Kiev", "FLE Standard Time"),
        ("Atlantic/Reykjavik", "Greenwich Standard Time"),
        ("America/New_York", "Eastern Standard Time"),
        ("America/Chicago", "Central Standard Time"),
        ("America/Denver", "Mountain Standard Time"),
        ("America/Los_Angeles", "Pacific Standard Time"),
        ("Asia/Kolkata", "India Standard Time"),
        ("Asia/Shanghai", "China Standard Time"),
        ("Asia/Tokyo", "Tokyo Standard Time"),
        ("Asia/Singapore", "Singapore Standard Time"),
        ("Australia/Sydney", "AUS Eastern Standard Time"),
    ])
});

/// Resolve any accepted zone spelling to a canonical IANA identifier.
///
/// Exact IANA identifiers pass through; known aliases (informal names,
/// abbreviations, Windows names) are mapped; anything else is `None`.
pub fn to_canonical(zone: &str) -> Option<String> {
    let trimmed = zone.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.parse::<chrono_tz::Tz>().is_ok() {
        return Some(trimmed.to_string());
    }
    ALIAS_TO_IANA.get(trimmed.to_lowercase().as_str()).map(|s| (*s).to_string())
}

/// Map a canonical zone to the Windows name the provider expects.
///
/// `Europe/Oslo` has no own Windows zone and shares `W. Europe Standard
/// Time`; unmapped IANA-looking identifiers fall back to the UTC default;
/// anything else is passed through unchanged.
pub fn to_provider_alias(zone: &str) -> String {
    if zone == "Europe/Oslo" {
        return "W. Europe Standard Time".to_string();
    }
    if let Some(windows) = IANA_TO_WINDOWS.get(zone) {
        return (*windows).to_string();
    }
    if zone.contains('/') {
        return DEFAULT_WINDOWS_TIME_ZONE.to_string();
    }
    zone.to_string()
}

/// Ordered zone resolution strategies; the first one that yields a zone
/// wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneSource {
    CallerSupplied,
    MailboxSetting,
    Default,
}

const ZONE_SOURCES: [ZoneSource; 3] =
    [ZoneSource::CallerSupplied, ZoneSource::MailboxSetting, ZoneSource::Default];

#[derive(Debug, Deserialize)]
struct TimeZoneSettingDto {
    value: Option<String>,
}

/// Resolves the effective timezone for a user, caching mailbox lookups.
pub struct TimezoneResolver {
    client: Arc<GraphClient>,
    cache: Cache<String, String>,
}

impl TimezoneResolver {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self::with_ttl(client, Duration::from_secs(TIMEZONE_CACHE_TTL_SECS))
    }

    pub fn with_ttl(client: Arc<GraphClient>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(TIMEZONE_CACHE_MAX_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { client, cache }
    }

    /// Resolve the effective zone: caller-supplied first, then the user's
    /// mailbox setting, then the UTC default. Never fails.
    pub async fn resolve_zone(&self, caller_zone: Option<&str>, user_id: &str) -> String {
        for source in ZONE_SOURCES {
            let resolved = match source {
                ZoneSource::CallerSupplied => match caller_zone {
                    Some(zone) => {
                        let canonical = to_canonical(zone);
                        if canonical.is_none() {
                            warn!(zone = %zone, "unrecognized caller timezone, falling back");
                        }
                        canonical
                    }
                    None => None,
                },
                ZoneSource::MailboxSetting => Some(self.resolve_user_time_zone(user_id).await),
                ZoneSource::Default => Some(DEFAULT_TIME_ZONE.to_string()),
            };
            if let Some(zone) = resolved {
                return zone;
            }
        }
        DEFAULT_TIME_ZONE.to_string()
    }

    /// Fetch and cache the user's mailbox timezone, canonicalized to IANA.
    ///
    /// Any failure (denied access, transport, unknown zone name) resolves
    /// to the UTC default and is cached so a misconfigured mailbox is not
    /// re-queried on every call.
    pub async fn resolve_user_time_zone(&self, user_id: &str) -> String {
        if let Some(zone) = self.cache.get(user_id) {
            debug!(user = %redact_id(user_id), zone = %zone, "timezone cache hit");
            return zone;
        }

        let zone = match self.fetch_mailbox_time_zone(user_id).await {
            Ok(raw) => match to_canonical(&raw) {
                Some(canonical) => canonical,
                None => {
                    warn!(
                        user = %redact_id(user_id),
                        zone = %raw,
                        "mailbox timezone not recognized, using default"
                    );
                    DEFAULT_TIME_ZONE.to_string()
                }
            },
            Err(err) if err.kind() == GraphErrorKind::PermissionDenied => {
                debug!(user = %redact_id(user_id), "mailbox settings access denied, using default");
                DEFAULT_TIME_ZONE.to_string()
            }
            Err(err) => {
                warn!(user = %redact_id(user_id), error = %err, "mailbox timezone lookup failed");
                DEFAULT_TIME_ZONE.to_string()
            }
        };

        self.cache.insert(user_id.to_string(), zone.clone());
        zone
    }

    async fn fetch_mailbox_time_zone(&self, user_id: &str) -> Result<String, GraphError> {
        let operation = "mailboxTimeZone";
        let path = if user_id == "me" {
            "/me/mailboxSettings/timeZone".to_string()
        } else {
            format!("/users/{user_id}/mailboxSettings/timeZone")
        };

        let request = self.client.request(Method::GET, &path).await?;
        let response = self.client.execute(request, operation).await?;
        let response = self.client.check_status(response, operation).await?;
        let setting: TimeZoneSettingDto = parse_json(response, operation).await?;
        setting.value.ok_or_else(|| {
            GraphError::new(GraphErrorKind::Other, "mailbox settings returned no timezone value")
        })
    }
}
