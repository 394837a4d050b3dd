//! Room directory
//!
//! The room list changes rarely, so the first page is cached for a day and
//! filters are applied client-side against the cached snapshot. When a
//! refresh fails and an expired snapshot exists, the stale snapshot is
//! served with its `stale` flag set instead of failing the caller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use tracing::{debug, instrument, warn};

use syncline_common::{CacheLookup, Clock, SystemClock, TtlCache};
use syncline_domain::constants::{ROOM_CACHE_MAX_SNAPSHOTS, ROOM_CACHE_TTL_SECS};
use syncline_domain::{Result, Room, RoomFilters, RoomListing};

use super::client::{parse_json, GraphClient};
use super::errors::GraphError;
use super::normalize::{normalize_room, RoomsResponseDto};

const SNAPSHOT_KEY: &str = "first-page";

#[derive(Debug, Clone)]
struct RoomSnapshot {
    rooms: Vec<Room>,
    paging_token: Option<String>,
}

/// Cached directory of bookable rooms.
pub struct RoomDirectory<C: Clock = SystemClock> {
    client: Arc<GraphClient>,
    cache: TtlCache<String, RoomSnapshot, C>,
}

impl RoomDirectory<SystemClock> {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Self::with_clock(client, SystemClock)
    }
}

impl<C: Clock> RoomDirectory<C> {
    pub fn with_clock(client: Arc<GraphClient>, clock: C) -> Self {
        let cache = TtlCache::with_clock(
            Duration::from_secs(ROOM_CACHE_TTL_SECS),
            ROOM_CACHE_MAX_SNAPSHOTS,
            clock,
        );
        Self { client, cache }
    }

    /// List rooms matching `filters`.
    ///
    /// The unfiltered first page is cached; supplying `paging_token` or
    /// setting `bypass_cache` always reaches the provider. Continuation
    /// pages are never cached.
    #[instrument(skip(self, filters, paging_token))]
    pub async fn get_rooms(
        &self,
        filters: &RoomFilters,
        paging_token: Option<&str>,
        bypass_cache: bool,
    ) -> Result<RoomListing> {
        let cacheable = paging_token.is_none();

        if cacheable && !bypass_cache {
            if let Some(snapshot) = self.cache.lookup(&SNAPSHOT_KEY.to_string()).fresh() {
                debug!(rooms = snapshot.rooms.len(), "room snapshot cache hit");
                return Ok(listing_from(snapshot, filters, false));
            }
        }

        match self.fetch_rooms(paging_token).await {
            Ok(snapshot) => {
                if cacheable {
                    self.cache.insert(SNAPSHOT_KEY.to_string(), snapshot.clone());
                }
                Ok(listing_from(snapshot, filters, false))
            }
            Err(err) => {
                if cacheable {
                    if let CacheLookup::Stale(snapshot) =
                        self.cache.lookup(&SNAPSHOT_KEY.to_string())
                    {
                        warn!(error = %err, "room refresh failed, serving stale snapshot");
                        return Ok(listing_from(snapshot, filters, true));
                    }
                }
                Err(err
                    .with_context(format!(
                        "endpoint /places/microsoft.graph.room, filters {}",
                        summarize_filters(filters)
                    ))
                    .into_domain_error())
            }
        }
    }

    async fn fetch_rooms(
        &self,
        paging_token: Option<&str>,
    ) -> std::result::Result<RoomSnapshot, GraphError> {
        let operation = "listRooms";
        let mut request =
            self.client.request(Method::GET, "/places/microsoft.graph.room").await?;
        if let Some(token) = paging_token {
            request = request.query(&[("$skiptoken", token)]);
        }

        let response = self.client.execute(request, operation).await?;
        let response = self.client.check_status(response, operation).await?;
        let parsed: RoomsResponseDto = parse_json(response, operation).await?;

        Ok(RoomSnapshot {
            rooms: parsed.value.into_iter().map(normalize_room).collect(),
            paging_token: parsed.next_link,
        })
    }
}

fn listing_from(snapshot: RoomSnapshot, filters: &RoomFilters, stale: bool) -> RoomListing {
    RoomListing {
        rooms: apply_filters(snapshot.rooms, filters),
        paging_token: snapshot.paging_token,
        stale,
    }
}

/// Filter summary safe for error context: names of active filters only.
fn summarize_filters(filters: &RoomFilters) -> String {
    let mut active = Vec::new();
    if filters.building.is_some() {
        active.push("building");
    }
    if filters.floor.is_some() {
        active.push("floor");
    }
    if filters.min_capacity.is_some() {
        active.push("minCapacity");
    }
    if filters.requires_audio {
        active.push("audio");
    }
    if filters.requires_video {
        active.push("video");
    }
    if filters.requires_display {
        active.push("display");
    }
    if active.is_empty() {
        "none".to_string()
    } else {
        active.join("+")
    }
}

/// Apply all supplied filters; every active filter must match.
fn apply_filters(rooms: Vec<Room>, filters: &RoomFilters) -> Vec<Room> {
    rooms
        .into_iter()
        .filter(|room| {
            if let Some(building) = &filters.building {
                if !matches_building(room, building) {
                    return false;
                }
            }
            if let Some(floor) = &filters.floor {
                if !matches_floor(room, floor) {
                    return false;
                }
            }
            if let Some(min) = filters.min_capacity {
                // Unknown capacity never satisfies a capacity requirement.
                if room.capacity.map_or(true, |c| c < min) {
                    return false;
                }
            }
            if filters.requires_audio && !room.has_audio {
                return false;
            }
            if filters.requires_video && !room.has_video {
                return false;
            }
            if filters.requires_display && !room.has_display {
                return false;
            }
            true
        })
        .collect()
}

/// Case-insensitive substring match across the fields that can carry a
/// building name.
fn matches_building(room: &Room, wanted: &str) -> bool {
    let wanted = wanted.to_lowercase();
    let fields = [
        room.building.as_deref(),
        Some(room.display_name.as_str()),
        room.address.as_deref(),
        room.email_address.as_deref(),
    ];
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&wanted))
}

/// Exact match on the derived floor, with a display-name fallback for
/// rooms whose floor was never derived.
fn matches_floor(room: &Room, wanted: &str) -> bool {
    if let Some(floor) = &room.floor {
        return floor == wanted;
    }
    room.display_name.to_lowercase().contains(&format!("floor {}", wanted.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str, floor: Option<&str>, capacity: Option<u32>) -> Room {
        Room {
            id: name.to_string(),
            display_name: name.to_string(),
            email_address: None,
            address: None,
            building: None,
            floor: floor.map(String::from),
            capacity,
            has_audio: false,
            has_video: false,
            has_display: false,
        }
    }

    #[test]
    fn floor_filter_is_exact_on_derived_floors() {
        let rooms = vec![
            room("Floor 3 Huddle", Some("3"), None),
            room("Floor 4 Huddle", Some("4"), None),
            room("Floor 30 Huddle", Some("30"), None),
        ];
        let filters = RoomFilters { floor: Some("3".into()), ..Default::default() };

        let matched = apply_filters(rooms, &filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].display_name, "Floor 3 Huddle");
    }

    #[test]
    fn min_capacity_excludes_small_and_unspecified_rooms() {
        let rooms = vec![
            room("Small", None, Some(8)),
            room("Unknown", None, None),
            room("Large", None, Some(12)),
        ];
        let filters = RoomFilters { min_capacity: Some(10), ..Default::default() };

        let matched = apply_filters(rooms, &filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].display_name, "Large");
    }

    #[test]
    fn building_filter_searches_multiple_fields() {
        let mut by_field = room("War Room", None, None);
        by_field.building = Some("HQ".into());
        let by_name = room("HQ Annex Stand-up", None, None);
        let mut by_address = room("Quiet Room", None, None);
        by_address.address = Some("HQ Campus, Oslo".into());
        let unrelated = room("Garage", None, None);

        let filters = RoomFilters { building: Some("hq".into()), ..Default::default() };
        let matched = apply_filters(vec![by_field, by_name, by_address, unrelated], &filters);
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn equipment_filters_compose_with_and_semantics() {
        let mut equipped = room("AV Room", None, None);
        equipped.has_audio = true;
        equipped.has_video = true;
        let mut audio_only = room("Phone Booth", None, None);
        audio_only.has_audio = true;

        let filters = RoomFilters {
            requires_audio: true,
            requires_video: true,
            ..Default::default()
        };
        let matched = apply_filters(vec![equipped, audio_only], &filters);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].display_name, "AV Room");
    }

    #[test]
    fn filter_summary_names_active_filters_only() {
        let filters = RoomFilters {
            building: Some("HQ".into()),
            min_capacity: Some(10),
            requires_video: true,
            ..Default::default()
        };
        assert_eq!(summarize_filters(&filters), "building+minCapacity+video");
        assert_eq!(summarize_filters(&RoomFilters::default()), "none");
    }
}
