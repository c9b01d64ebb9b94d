use foundation::{LngLat, haversine_m};
use runtime::{LatestWins, Ticket};
use stations::{SelectionState, StationSnapshot};
use tracing::{debug, warn};

use crate::client::DirectionsClient;
use crate::error::RouteError;
use crate::request::{RouteKey, RouteProfile, RouteRequest};
use crate::response::{ManeuverStep, RouteResponse};

/// A directions request that has been issued but not resolved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRoute {
    pub ticket: Ticket,
    pub key: RouteKey,
    pub request: RouteRequest,
}

/// A resolved route, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub key: RouteKey,
    pub geometry: Vec<LngLat>,
    pub steps: Vec<ManeuverStep>,
    pub distance_m: f64,
    pub duration_s: Option<f64>,
    /// True when the backend failed and `geometry` is a straight line
    /// through the stops.
    pub fallback: bool,
}

/// Last-writer-wins route sequencing.
///
/// Every change of the route-defining selection issues a new ticket; a
/// resolution is only turned into a [`PlannedRoute`] when its ticket is still
/// the newest, so a slow answer for an old selection is dropped.
#[derive(Debug, Default)]
pub struct RoutePlanner {
    guard: LatestWins,
    pending: Option<PendingRoute>,
    current: Option<RouteKey>,
}

impl RoutePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of the route most recently requested or drawn.
    pub fn current(&self) -> Option<&RouteKey> {
        self.current.as_ref()
    }

    /// Starts a request for `selection`.
    ///
    /// Returns `None` when the selection has no complete route (which also
    /// cancels anything in flight) or when the same route was already
    /// requested.
    pub fn begin(
        &mut self,
        selection: &SelectionState,
        stations: &StationSnapshot,
        profile: RouteProfile,
    ) -> Option<PendingRoute> {
        let Some(stops) = selection.route_stops() else {
            self.cancel();
            return None;
        };
        let key = RouteKey { stops, profile };
        if self.current.as_ref() == Some(&key) {
            return None;
        }

        let mut coordinates = Vec::with_capacity(key.stops.len());
        for id in &key.stops {
            let Some(station) = stations.get(id) else {
                debug!(station = %id, "route stop not in snapshot");
                self.cancel();
                return None;
            };
            coordinates.push(station.coordinates());
        }

        let pending = PendingRoute {
            ticket: self.guard.issue(),
            key: key.clone(),
            request: RouteRequest {
                coordinates,
                profile,
            },
        };
        self.current = Some(key);
        self.pending = Some(pending.clone());
        Some(pending)
    }

    /// Forgets the current route and invalidates any request in flight.
    pub fn cancel(&mut self) {
        self.guard.invalidate();
        self.pending = None;
        self.current = None;
    }

    /// Turns a resolution into a drawable route.
    ///
    /// Stale tickets yield `None`. Backend failures are logged and replaced
    /// with a straight line through the requested stops.
    pub fn finish(
        &mut self,
        ticket: Ticket,
        result: Result<RouteResponse, RouteError>,
    ) -> Option<PlannedRoute> {
        if !self.guard.try_apply(ticket) {
            debug!(ticket = ticket.0, "discarding stale route");
            return None;
        }
        let pending = self.pending.take()?;

        Some(match result {
            Ok(response) => PlannedRoute {
                key: pending.key,
                geometry: response.geometry,
                steps: response.steps,
                distance_m: response.distance_m,
                duration_s: Some(response.duration_s),
                fallback: false,
            },
            Err(err) => {
                warn!(
                    error = %err,
                    stops = pending.key.stops.len(),
                    "route fetch failed; drawing straight line"
                );
                let geometry = pending.request.coordinates;
                PlannedRoute {
                    key: pending.key,
                    distance_m: polyline_length(&geometry),
                    geometry,
                    steps: Vec::new(),
                    duration_s: None,
                    fallback: true,
                }
            }
        })
    }

    /// `begin` + fetch + `finish` in one go.
    pub async fn plan(
        &mut self,
        client: &dyn DirectionsClient,
        selection: &SelectionState,
        stations: &StationSnapshot,
        profile: RouteProfile,
    ) -> Option<PlannedRoute> {
        let pending = self.begin(selection, stations, profile)?;
        let result = client.route(&pending.request).await;
        self.finish(pending.ticket, result)
    }
}

fn polyline_length(line: &[LngLat]) -> f64 {
    line.windows(2).map(|w| haversine_m(w[0], w[1])).sum()
}
