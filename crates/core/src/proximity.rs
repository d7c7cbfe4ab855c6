use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Activity, CommuteInfo, CommuteMethod, GeoPoint};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Activities within this distance of a group seed share a day slot.
pub const DEFAULT_PROXIMITY_RADIUS_KM: f64 = 5.0;

/// Great-circle distance between two points, in kilometers.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Name-to-coordinate table for activities that do not carry coordinates
/// themselves. Itinerary entries are often phrased as "Visit <place>", so a
/// direct miss retries without that prefix.
#[derive(Debug, Clone, Default)]
pub struct CoordinateLookup {
    places: HashMap<String, GeoPoint>,
}

impl CoordinateLookup {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a str, f64, f64)>) -> Self {
        Self {
            places: entries
                .into_iter()
                .map(|(name, lat, lng)| (name.to_string(), GeoPoint { lat, lng }))
                .collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> Option<GeoPoint> {
        self.places.get(name).copied().or_else(|| {
            name.strip_prefix("Visit ")
                .and_then(|stripped| self.places.get(stripped).copied())
        })
    }
}

/// Greedy single-pass clustering seeded by input order. Each unvisited
/// activity opens a group and pulls in every remaining activity within
/// `radius_km` of *the seed* (no transitive closure). Activities without a
/// resolvable coordinate are never distance-compared and stay singletons.
/// The result is a partition: group order follows seed order, member order
/// follows discovery order.
pub fn group_by_proximity(
    activities: &[Activity],
    radius_km: f64,
    lookup: &CoordinateLookup,
) -> Vec<Vec<Activity>> {
    let coords: Vec<Option<GeoPoint>> = activities
        .iter()
        .map(|activity| lookup.resolve(&activity.name))
        .collect();

    let mut visited = vec![false; activities.len()];
    let mut groups = Vec::new();

    for (i, seed) in activities.iter().enumerate() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let mut group = vec![seed.clone()];
        if let Some(seed_point) = coords[i] {
            for (j, other) in activities.iter().enumerate() {
                if visited[j] {
                    continue;
                }
                let Some(other_point) = coords[j] else {
                    continue;
                };
                if haversine_km(seed_point, other_point) <= radius_km {
                    visited[j] = true;
                    group.push(other.clone());
                }
            }
        }

        groups.push(group);
    }

    groups
}

/// Thresholds for the commute recommendation. The cutoffs are policy, not
/// logic: deployments tune them rather than fork the function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommutePolicy {
    pub private_cab_min_group: usize,
    pub cab_cost: f64,
    pub cab_duration_minutes: u32,
    pub cab_distance_km: f64,
    pub scooter_cost: f64,
    pub scooter_duration_minutes: u32,
    pub scooter_distance_km: f64,
}

impl Default for CommutePolicy {
    fn default() -> Self {
        Self {
            private_cab_min_group: 3,
            cab_cost: 800.0,
            cab_duration_minutes: 45,
            cab_distance_km: 12.0,
            scooter_cost: 150.0,
            scooter_duration_minutes: 20,
            scooter_distance_km: 4.0,
        }
    }
}

/// Larger groups imply a day tour with more ground to cover, so they get a
/// private cab; small groups ride scooters.
pub fn commute_for_group(group_size: usize, policy: &CommutePolicy) -> CommuteInfo {
    if group_size >= policy.private_cab_min_group {
        CommuteInfo {
            method: CommuteMethod::PrivateCab,
            cost: policy.cab_cost,
            duration_minutes: policy.cab_duration_minutes,
            distance_km: policy.cab_distance_km,
        }
    } else {
        CommuteInfo {
            method: CommuteMethod::Scooter,
            cost: policy.scooter_cost,
            duration_minutes: policy.scooter_duration_minutes,
            distance_km: policy.scooter_distance_km,
        }
    }
}
