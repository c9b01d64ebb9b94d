use routing::{ManeuverStep, PlannedRoute};
use tracing::debug;

use crate::canvas::MapCanvas;

/// Receiver for turn-by-turn steps (the navigation panel).
pub trait NavigationSteps {
    fn show_steps(&mut self, steps: &[ManeuverStep]);
    fn clear(&mut self);
}

/// Draws `route` and hands its steps to `sink`.
///
/// Returns `false` without touching either side when the canvas is not
/// loaded yet.
pub fn show_route(
    route: &PlannedRoute,
    canvas: &mut dyn MapCanvas,
    sink: &mut dyn NavigationSteps,
) -> bool {
    if !canvas.is_loaded() {
        return false;
    }
    debug!(
        points = route.geometry.len(),
        steps = route.steps.len(),
        fallback = route.fallback,
        "drawing route"
    );
    canvas.draw_route(&route.geometry);
    if route.steps.is_empty() {
        sink.clear();
    } else {
        sink.show_steps(&route.steps);
    }
    true
}

pub fn clear_route(canvas: &mut dyn MapCanvas, sink: &mut dyn NavigationSteps) {
    if canvas.is_loaded() {
        canvas.clear_route();
    }
    sink.clear();
}

/// Step sink that just keeps the last steps it was given.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StepLog {
    pub steps: Vec<ManeuverStep>,
}

impl NavigationSteps for StepLog {
    fn show_steps(&mut self, steps: &[ManeuverStep]) {
        self.steps = steps.to_vec();
    }

    fn clear(&mut self) {
        self.steps.clear();
    }
}
