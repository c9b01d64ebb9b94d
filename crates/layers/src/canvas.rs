use foundation::LngLat;
use serde::Serialize;
use stations::FeatureKey;

use crate::content::{MarkerAppearance, MarkerContent};

/// Opaque handle to a marker object living on the canvas.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerHandle(pub u64);

/// In-place change to an existing marker. `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerPatch {
    pub position: Option<LngLat>,
    pub content: Option<MarkerContent>,
    pub appearance: Option<MarkerAppearance>,
}

impl MarkerPatch {
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.content.is_none() && self.appearance.is_none()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraCommand {
    FlyTo { center: LngLat, zoom: f64 },
}

/// The map engine, as far as the station layer is concerned.
///
/// Implementations own the actual DOM/GPU objects; the layer only ever holds
/// handles. `create_marker` attaches a click target carrying `key` so the
/// host can route activations back through [`crate::StationLayer`].
pub trait MapCanvas {
    /// Marker operations issued before the engine has loaded are dropped.
    fn is_loaded(&self) -> bool;

    fn create_marker(
        &mut self,
        at: LngLat,
        content: &MarkerContent,
        appearance: MarkerAppearance,
        key: &FeatureKey,
    ) -> MarkerHandle;

    fn update_marker(&mut self, handle: MarkerHandle, patch: &MarkerPatch);

    /// Detaches the marker and its listeners.
    fn remove_marker(&mut self, handle: MarkerHandle);

    fn fly_to(&mut self, command: CameraCommand);

    fn draw_route(&mut self, line: &[LngLat]);

    fn clear_route(&mut self);
}

/// One call recorded by [`RecordingCanvas`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CanvasOp {
    Create {
        handle: MarkerHandle,
        key: String,
        at: LngLat,
        content: MarkerContent,
        appearance: MarkerAppearance,
    },
    Update {
        handle: MarkerHandle,
        patch: MarkerPatch,
    },
    Remove {
        handle: MarkerHandle,
    },
    Camera {
        command: CameraCommand,
    },
    DrawRoute {
        points: usize,
    },
    ClearRoute,
}

/// Canvas that records every call instead of drawing.
///
/// Used by the `bikemap` replay tool and by tests.
#[derive(Debug, Clone)]
pub struct RecordingCanvas {
    loaded: bool,
    next_handle: u64,
    ops: Vec<CanvasOp>,
    live: usize,
    route: Vec<LngLat>,
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self {
            loaded: true,
            next_handle: 1,
            ops: Vec::new(),
            live: 0,
            route: Vec::new(),
        }
    }
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unloaded() -> Self {
        Self {
            loaded: false,
            ..Self::default()
        }
    }

    pub fn set_loaded(&mut self, loaded: bool) {
        self.loaded = loaded;
    }

    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Returns and clears the recorded calls.
    pub fn take_ops(&mut self) -> Vec<CanvasOp> {
        std::mem::take(&mut self.ops)
    }

    /// Markers currently attached.
    pub fn live_markers(&self) -> usize {
        self.live
    }

    pub fn route(&self) -> &[LngLat] {
        &self.route
    }
}

impl MapCanvas for RecordingCanvas {
    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn create_marker(
        &mut self,
        at: LngLat,
        content: &MarkerContent,
        appearance: MarkerAppearance,
        key: &FeatureKey,
    ) -> MarkerHandle {
        let handle = MarkerHandle(self.next_handle);
        self.next_handle += 1;
        self.live += 1;
        self.ops.push(CanvasOp::Create {
            handle,
            key: key.to_string(),
            at,
            content: content.clone(),
            appearance,
        });
        handle
    }

    fn update_marker(&mut self, handle: MarkerHandle, patch: &MarkerPatch) {
        self.ops.push(CanvasOp::Update {
            handle,
            patch: patch.clone(),
        });
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.live = self.live.saturating_sub(1);
        self.ops.push(CanvasOp::Remove { handle });
    }

    fn fly_to(&mut self, command: CameraCommand) {
        self.ops.push(CanvasOp::Camera { command });
    }

    fn draw_route(&mut self, line: &[LngLat]) {
        self.route = line.to_vec();
        self.ops.push(CanvasOp::DrawRoute { points: line.len() });
    }

    fn clear_route(&mut self) {
        self.route.clear();
        self.ops.push(CanvasOp::ClearRoute);
    }
}
