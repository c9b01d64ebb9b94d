use foundation::LngLatBounds;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::latest::{LatestWins, Ticket};

/// Camera state as reported by the map engine.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportState {
    pub bounds: LngLatBounds,
    /// Fractional zoom level.
    pub zoom: f64,
}

impl ViewportState {
    pub fn new(bounds: LngLatBounds, zoom: f64) -> Self {
        Self { bounds, zoom }
    }

    /// Integer zoom used as the spatial index key.
    pub fn floored_zoom(&self) -> i32 {
        if self.zoom.is_finite() {
            self.zoom.floor() as i32
        } else {
            0
        }
    }
}

/// A settled viewport, tagged with the ticket that orders it against others.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportSnapshot {
    pub ticket: Ticket,
    pub state: ViewportState,
}

/// Camera events forwarded from the map engine.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapEvent {
    /// Initial placement once the engine has finished loading.
    Load(ViewportState),
    /// Intermediate drag frame.
    Move(ViewportState),
    /// Intermediate zoom frame.
    Zoom(ViewportState),
    MoveEnd(ViewportState),
    ZoomEnd(ViewportState),
}

impl MapEvent {
    pub fn state(&self) -> ViewportState {
        match self {
            MapEvent::Load(s)
            | MapEvent::Move(s)
            | MapEvent::Zoom(s)
            | MapEvent::MoveEnd(s)
            | MapEvent::ZoomEnd(s) => *s,
        }
    }

    pub fn is_settle(&self) -> bool {
        matches!(
            self,
            MapEvent::Load(_) | MapEvent::MoveEnd(_) | MapEvent::ZoomEnd(_)
        )
    }
}

/// Samples the camera on settle events only.
///
/// Intermediate move/zoom frames are dropped so that the spatial query and
/// marker reconciliation run once per gesture instead of once per frame.
#[derive(Debug, Default)]
pub struct ViewportTracker {
    current: Option<ViewportSnapshot>,
    sequence: LatestWins,
    dropped_frames: u64,
}

impl ViewportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one engine event. Returns the new snapshot for settle events.
    pub fn observe(&mut self, event: MapEvent) -> Option<ViewportSnapshot> {
        if !event.is_settle() {
            self.dropped_frames += 1;
            return None;
        }
        let snapshot = ViewportSnapshot {
            ticket: self.sequence.issue(),
            state: event.state(),
        };
        trace!(
            seq = snapshot.ticket.0,
            zoom = snapshot.state.zoom,
            "viewport settled"
        );
        self.current = Some(snapshot);
        Some(snapshot)
    }

    pub fn current(&self) -> Option<ViewportSnapshot> {
        self.current
    }

    /// Re-stamps the current viewport with a fresh ticket.
    ///
    /// Used when the data behind the viewport changes (new station snapshot,
    /// new rewards) so that results computed for the old data are superseded.
    pub fn reissue(&mut self) -> Option<ViewportSnapshot> {
        let state = self.current?.state;
        let snapshot = ViewportSnapshot {
            ticket: self.sequence.issue(),
            state,
        };
        self.current = Some(snapshot);
        Some(snapshot)
    }

    /// Number of intermediate frames ignored so far.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        self.sequence.is_current(ticket)
    }

    /// Accepts a query result computed for `ticket`.
    ///
    /// Results for superseded viewports are rejected.
    pub fn accept_result(&mut self, ticket: Ticket) -> bool {
        self.sequence.try_apply(ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::{MapEvent, ViewportState, ViewportTracker};
    use foundation::LngLatBounds;

    fn state(zoom: f64) -> ViewportState {
        ViewportState::new(LngLatBounds::new(-74.1, 40.6, -73.8, 40.9), zoom)
    }

    #[test]
    fn intermediate_frames_are_ignored() {
        let mut t = ViewportTracker::new();
        assert!(t.observe(MapEvent::Move(state(12.0))).is_none());
        assert!(t.observe(MapEvent::Zoom(state(12.5))).is_none());
        assert!(t.current().is_none());
        assert_eq!(t.dropped_frames(), 2);

        let snap = t.observe(MapEvent::ZoomEnd(state(12.7))).expect("settle");
        assert_eq!(snap.state.zoom, 12.7);
        assert_eq!(t.current(), Some(snap));
    }

    #[test]
    fn settles_are_strictly_ordered() {
        let mut t = ViewportTracker::new();
        let a = t.observe(MapEvent::Load(state(11.0))).unwrap();
        let b = t.observe(MapEvent::MoveEnd(state(11.0))).unwrap();
        assert!(b.ticket > a.ticket);
        assert!(!t.is_latest(a.ticket));
        assert!(!t.accept_result(a.ticket));
        assert!(t.accept_result(b.ticket));
    }

    #[test]
    fn reissue_supersedes_pending_results() {
        let mut t = ViewportTracker::new();
        assert!(t.reissue().is_none());
        let a = t.observe(MapEvent::MoveEnd(state(13.0))).unwrap();
        let b = t.reissue().unwrap();
        assert_eq!(a.state, b.state);
        assert!(!t.accept_result(a.ticket));
        assert!(t.accept_result(b.ticket));
    }

    #[test]
    fn floored_zoom_handles_fractions_and_nan() {
        assert_eq!(state(13.99).floored_zoom(), 13);
        assert_eq!(state(14.0).floored_zoom(), 14);
        assert_eq!(state(f64::NAN).floored_zoom(), 0);
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let json = r#"{
            "type": "move_end",
            "bounds": {"west": 0.0, "south": 0.0, "east": 1.0, "north": 1.0},
            "zoom": 15.5
        }"#;
        let ev: MapEvent = serde_json::from_str(json).unwrap();
        assert!(ev.is_settle());
        assert_eq!(ev.state().zoom, 15.5);
    }
}
