//! Scripted sessions against a [`RecordingCanvas`].
//!
//! A script is a JSON array of steps, for example:
//!
//! ```json
//! [
//!   {"step": "locate", "position": null},
//!   {"step": "map", "event": {
//!     "type": "load",
//!     "bounds": {"west": -74.05, "south": 40.68, "east": -73.9, "north": 40.82},
//!     "zoom": 12.0
//!   }},
//!   {"step": "click_cluster", "nth": 0},
//!   {"step": "select", "selection": {"start": "72", "hovered": "79"}}
//! ]
//! ```

use foundation::LngLat;
use layers::{CanvasOp, GeolocationError, MarkerClick, PassOutcome, RecordingCanvas, StationLayer};
use runtime::MapEvent;
use serde::{Deserialize, Serialize};
use stations::{FeatureKey, SelectionState, StationRecord, StationSnapshot};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Initial camera placement; `null` simulates a denied location request.
    Locate { position: Option<LngLat> },
    Map { event: MapEvent },
    Select { selection: SelectionState },
    /// Clicks the n-th live cluster, in key order.
    ClickCluster { nth: usize },
    /// Replaces the station feed.
    Stations { records: Vec<StationRecord> },
    /// Flips the canvas loaded flag.
    CanvasLoaded { loaded: bool },
}

impl ScriptStep {
    fn label(&self) -> &'static str {
        match self {
            ScriptStep::Locate { .. } => "locate",
            ScriptStep::Map { .. } => "map",
            ScriptStep::Select { .. } => "select",
            ScriptStep::ClickCluster { .. } => "click_cluster",
            ScriptStep::Stations { .. } => "stations",
            ScriptStep::CanvasLoaded { .. } => "canvas_loaded",
        }
    }
}

/// What one step did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub step: &'static str,
    pub outcome: String,
    pub live_markers: usize,
    pub ops: Vec<CanvasOp>,
}

pub fn run_script(
    layer: &mut StationLayer,
    canvas: &mut RecordingCanvas,
    steps: Vec<ScriptStep>,
) -> Vec<StepReport> {
    steps
        .into_iter()
        .enumerate()
        .map(|(index, step)| {
            let label = step.label();
            let outcome = run_step(layer, canvas, step);
            StepReport {
                index,
                step: label,
                outcome,
                live_markers: layer.registry().len(),
                ops: canvas.take_ops(),
            }
        })
        .collect()
}

fn run_step(layer: &mut StationLayer, canvas: &mut RecordingCanvas, step: ScriptStep) -> String {
    match step {
        ScriptStep::Locate { position } => {
            let located = position.ok_or(GeolocationError::Denied);
            format!("{:?}", layer.initial_camera(located, canvas))
        }
        ScriptStep::Map { event } => describe(layer.on_map_event(event, canvas)),
        ScriptStep::Select { selection } => describe(layer.on_selection(selection, canvas)),
        ScriptStep::ClickCluster { nth } => {
            let mut clusters: Vec<FeatureKey> = layer
                .registry()
                .keys()
                .filter(|k| matches!(k, FeatureKey::Cluster(_)))
                .cloned()
                .collect();
            clusters.sort();
            match clusters.get(nth) {
                Some(key) => match layer.on_marker_click(key, canvas) {
                    MarkerClick::Expanded(command) => format!("{command:?}"),
                    other => format!("{other:?}"),
                },
                None => format!("no cluster #{nth} ({} live)", clusters.len()),
            }
        }
        ScriptStep::Stations { records } => {
            describe(layer.on_stations(StationSnapshot::from_records(records), canvas))
        }
        ScriptStep::CanvasLoaded { loaded } => {
            canvas.set_loaded(loaded);
            format!("loaded={loaded}")
        }
    }
}

fn describe(outcome: PassOutcome) -> String {
    match outcome {
        PassOutcome::Applied(s) => format!(
            "applied: +{} ~{} -{} ({} lookups)",
            s.created, s.updated, s.removed, s.lookups
        ),
        other => format!("{other:?}"),
    }
}
