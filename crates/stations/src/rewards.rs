use std::collections::HashMap;

use foundation::StationId;
use serde::{Deserialize, Serialize};

/// Incentive points offered for taking a bike from, or returning one to, a
/// station.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardAnnotation {
    #[serde(default)]
    pub pickup_points: u32,
    #[serde(default)]
    pub dropoff_points: u32,
}

impl RewardAnnotation {
    pub fn new(pickup_points: u32, dropoff_points: u32) -> Self {
        Self {
            pickup_points,
            dropoff_points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pickup_points == 0 && self.dropoff_points == 0
    }

    /// Larger of the two directions.
    pub fn peak(&self) -> u32 {
        self.pickup_points.max(self.dropoff_points)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RewardEntry {
    station_id: StationId,
    #[serde(flatten)]
    reward: RewardAnnotation,
}

/// Reward annotations keyed by station id. Absent stations carry no reward.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardTable {
    entries: HashMap<StationId, RewardAnnotation>,
}

impl RewardTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: StationId, reward: RewardAnnotation) {
        if reward.is_empty() {
            self.entries.remove(&id);
        } else {
            self.entries.insert(id, reward);
        }
    }

    pub fn get(&self, id: &StationId) -> Option<RewardAnnotation> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses `[{"station_id": .., "pickup_points": .., "dropoff_points": ..}]`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let list: Vec<RewardEntry> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for entry in list {
            table.insert(entry.station_id, entry.reward);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::{RewardAnnotation, RewardTable};
    use foundation::StationId;

    #[test]
    fn parses_and_drops_zero_entries() {
        let json = r#"[
            {"station_id":"a","pickup_points":3,"dropoff_points":1},
            {"station_id":"b"}
        ]"#;
        let table = RewardTable::from_json(json).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get(&StationId::new("a")),
            Some(RewardAnnotation::new(3, 1))
        );
        assert_eq!(table.get(&StationId::new("b")), None);
    }

    #[test]
    fn peak_takes_larger_direction() {
        assert_eq!(RewardAnnotation::new(2, 5).peak(), 5);
        assert_eq!(RewardAnnotation::new(4, 0).peak(), 4);
    }
}
