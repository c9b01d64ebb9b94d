use std::collections::HashMap;

use foundation::StationId;
use serde::{Deserialize, Serialize};

/// Route selection and hover state, owned by the application store.
///
/// This crate only ever reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionState {
    pub start: Option<StationId>,
    pub end: Option<StationId>,
    pub waypoints: Vec<StationId>,
    pub hovered: Option<StationId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start(mut self, id: impl Into<String>) -> Self {
        self.start = Some(StationId::new(id));
        self
    }

    pub fn with_end(mut self, id: impl Into<String>) -> Self {
        self.end = Some(StationId::new(id));
        self
    }

    pub fn with_waypoint(mut self, id: impl Into<String>) -> Self {
        self.waypoints.push(StationId::new(id));
        self
    }

    pub fn with_hovered(mut self, id: impl Into<String>) -> Self {
        self.hovered = Some(StationId::new(id));
        self
    }

    /// Ordered stops `start, waypoints…, end` once both endpoints are chosen.
    pub fn route_stops(&self) -> Option<Vec<StationId>> {
        let start = self.start.as_ref()?;
        let end = self.end.as_ref()?;
        let mut stops = Vec::with_capacity(self.waypoints.len() + 2);
        stops.push(start.clone());
        stops.extend(self.waypoints.iter().cloned());
        stops.push(end.clone());
        Some(stops)
    }
}

/// Part a station plays in the current route.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum RouteRole {
    #[default]
    None,
    Start,
    End,
    Waypoint,
}

impl RouteRole {
    pub fn is_route(self) -> bool {
        !matches!(self, RouteRole::None)
    }
}

/// Resolved styling role of one station: its route part plus hover.
///
/// Ordering follows display priority: hovered > start/end > waypoint > plain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct StationRole {
    pub route: RouteRole,
    pub hovered: bool,
}

impl StationRole {
    pub const PLAIN: Self = Self {
        route: RouteRole::None,
        hovered: false,
    };

    pub fn rank(self) -> u8 {
        if self.hovered {
            return 3;
        }
        match self.route {
            RouteRole::Start | RouteRole::End => 2,
            RouteRole::Waypoint => 1,
            RouteRole::None => 0,
        }
    }
}

/// Per-pass lookup from station id to role.
///
/// Built once from a `SelectionState` so resolving a role is a single hash
/// lookup instead of a scan over the waypoint list.
#[derive(Debug, Clone, Default)]
pub struct SelectionIndex {
    routes: HashMap<StationId, RouteRole>,
    hovered: Option<StationId>,
}

impl SelectionIndex {
    pub fn new(selection: &SelectionState) -> Self {
        let mut routes = HashMap::with_capacity(selection.waypoints.len() + 2);
        for id in &selection.waypoints {
            routes.insert(id.clone(), RouteRole::Waypoint);
        }
        // Endpoints win over a waypoint entry for the same station, start over end.
        if let Some(end) = &selection.end {
            routes.insert(end.clone(), RouteRole::End);
        }
        if let Some(start) = &selection.start {
            routes.insert(start.clone(), RouteRole::Start);
        }
        Self {
            routes,
            hovered: selection.hovered.clone(),
        }
    }

    pub fn role(&self, id: &StationId) -> StationRole {
        StationRole {
            route: self.routes.get(id).copied().unwrap_or_default(),
            hovered: self.hovered.as_ref() == Some(id),
        }
    }
}
