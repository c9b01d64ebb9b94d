use std::collections::HashMap;

use foundation::{LngLat, StationId};
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_true() -> bool {
    true
}

/// One station as published by the availability feed.
///
/// `num_bikes_available` counts every rentable bike, e-bikes included;
/// `num_ebikes_available` is the electric subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub station_id: StationId,
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default = "default_true")]
    pub is_installed: bool,
    #[serde(default = "default_true")]
    pub is_renting: bool,
    #[serde(default)]
    pub num_bikes_available: u32,
    #[serde(default)]
    pub num_ebikes_available: u32,
    #[serde(default)]
    pub num_docks_available: u32,
}

impl StationRecord {
    pub fn new(id: impl Into<String>, coordinates: LngLat) -> Self {
        Self {
            station_id: StationId::new(id),
            name: String::new(),
            lat: coordinates.lat,
            lon: coordinates.lng,
            is_installed: true,
            is_renting: true,
            num_bikes_available: 0,
            num_ebikes_available: 0,
            num_docks_available: 0,
        }
    }

    pub fn with_availability(mut self, bikes: u32, ebikes: u32, docks: u32) -> Self {
        self.num_bikes_available = bikes;
        self.num_ebikes_available = ebikes.min(bikes);
        self.num_docks_available = docks;
        self
    }

    pub fn coordinates(&self) -> LngLat {
        LngLat::new(self.lon, self.lat)
    }

    /// Bikes a rider can actually take right now. A station that is not
    /// renting has none, whatever the feed reports.
    pub fn rentable_bikes(&self) -> u32 {
        if self.is_renting {
            self.num_bikes_available
        } else {
            0
        }
    }

    pub fn rentable_ebikes(&self) -> u32 {
        if self.is_renting {
            self.num_ebikes_available.min(self.num_bikes_available)
        } else {
            0
        }
    }

    pub fn rentable_classic_bikes(&self) -> u32 {
        self.rentable_bikes() - self.rentable_ebikes()
    }
}

/// Immutable set of stations for one data refresh.
///
/// Replaced wholesale whenever the poller delivers a new feed.
#[derive(Debug, Clone, Default)]
pub struct StationSnapshot {
    stations: Vec<StationRecord>,
    by_id: HashMap<StationId, usize>,
}

impl StationSnapshot {
    /// Builds a snapshot, keeping the first record for any repeated id.
    pub fn from_records(records: Vec<StationRecord>) -> Self {
        let mut stations = Vec::with_capacity(records.len());
        let mut by_id = HashMap::with_capacity(records.len());
        for record in records {
            if by_id.contains_key(&record.station_id) {
                debug!(station = %record.station_id, "duplicate station id in feed; keeping first");
                continue;
            }
            by_id.insert(record.station_id.clone(), stations.len());
            stations.push(record);
        }
        Self { stations, by_id }
    }

    /// Parses a JSON array of station records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<StationRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn get(&self, id: &StationId) -> Option<&StationRecord> {
        self.by_id.get(id).map(|&i| &self.stations[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationRecord> + '_ {
        self.stations.iter()
    }

    /// Stations eligible for the map: installed, with finite coordinates.
    pub fn installed(&self) -> Vec<StationRecord> {
        self.stations
            .iter()
            .filter(|s| s.is_installed && s.coordinates().is_finite())
            .cloned()
            .collect()
    }
}
