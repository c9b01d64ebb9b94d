use foundation::{LngLat, StationId};
use runtime::metrics::{
    MARKERS_LIVE, OVERLAY_PASSES, OVERLAY_RESTYLED, QUERY_STALE_DROPPED, RECONCILE_CREATED,
    RECONCILE_LOOKUPS, RECONCILE_PASSES, RECONCILE_REMOVED, RECONCILE_SKIPPED, RECONCILE_UPDATED,
};
use runtime::{MapEvent, Metrics, Ticket, ViewportSnapshot, ViewportTracker};
use stations::{
    ClusterFeature, ClusterId, FeatureKey, RewardTable, SelectionIndex, SelectionState,
    SpatialIndex, StationSnapshot,
};
use tracing::{debug, info, warn};

use crate::canvas::{CameraCommand, MapCanvas};
use crate::config::LayerConfig;
use crate::expansion::{ClusterExpansionController, GeolocationError, initial_camera};
use crate::factory::MarkerFactory;
use crate::layer::{Layer, LayerId};
use crate::overlay::selection_overlay;
use crate::reconcile::{ReconcileContext, ReconcilePlan, reconcile};
use crate::registry::{ApplyStats, MarkerRegistry};
use crate::symbology::marker_tier;

/// Spatial query output for one viewport snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub ticket: Ticket,
    /// Fractional zoom the tier is chosen from.
    pub zoom: f64,
    pub features: Vec<ClusterFeature>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SkipReason {
    CanvasNotLoaded,
    NoViewport,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PassStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    pub lookups: usize,
}

impl PassStats {
    fn new(plan: &ReconcilePlan, applied: ApplyStats) -> Self {
        Self {
            created: applied.created,
            updated: applied.updated,
            removed: applied.removed,
            lookups: plan.lookups,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    Applied(PassStats),
    /// Nothing happened; the next trigger runs a full pass.
    Skipped(SkipReason),
    /// The result belonged to a superseded viewport.
    StaleDropped,
    /// Intermediate camera frame.
    Ignored,
}

/// What a marker click resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerClick {
    Expanded(CameraCommand),
    Station(StationId),
    Unknown,
}

/// Owns everything needed to keep station markers on a [`MapCanvas`] in
/// line with the data, the viewport and the selection.
///
/// All entry points take the canvas by reference; the layer never holds on
/// to it.
#[derive(Debug)]
pub struct StationLayer {
    id: LayerId,
    config: LayerConfig,
    factory: MarkerFactory,
    expansion: ClusterExpansionController,
    tracker: ViewportTracker,
    stations: StationSnapshot,
    index: SpatialIndex,
    rewards: RewardTable,
    selection: SelectionState,
    registry: MarkerRegistry,
    metrics: Metrics,
}

impl StationLayer {
    pub fn new(id: u64, config: LayerConfig) -> Self {
        Self {
            id: LayerId(id),
            factory: MarkerFactory::new(&config.markers),
            expansion: ClusterExpansionController::new(&config.camera),
            index: SpatialIndex::build(Vec::new(), config.clustering),
            config,
            tracker: ViewportTracker::new(),
            stations: StationSnapshot::default(),
            rewards: RewardTable::new(),
            selection: SelectionState::default(),
            registry: MarkerRegistry::new(),
            metrics: Metrics::new(),
        }
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn stations(&self) -> &StationSnapshot {
        &self.stations
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn viewport(&self) -> Option<ViewportSnapshot> {
        self.tracker.current()
    }

    /// Feeds a camera event and, on settle, runs a full pass.
    pub fn on_map_event(&mut self, event: MapEvent, canvas: &mut dyn MapCanvas) -> PassOutcome {
        let Some(snapshot) = self.observe(event) else {
            return PassOutcome::Ignored;
        };
        let result = self.request_query(snapshot);
        self.apply_query_result(result, canvas)
    }

    /// Tracks a camera event without querying. Returns the settled snapshot.
    pub fn observe(&mut self, event: MapEvent) -> Option<ViewportSnapshot> {
        self.tracker.observe(event)
    }

    /// Runs the spatial query for `snapshot`.
    pub fn request_query(&self, snapshot: ViewportSnapshot) -> QueryResult {
        let state = snapshot.state;
        QueryResult {
            ticket: snapshot.ticket,
            zoom: state.zoom,
            features: self.index.query(&state.bounds, state.floored_zoom()),
        }
    }

    /// Reconciles markers against `result` if it is still the newest.
    pub fn apply_query_result(
        &mut self,
        result: QueryResult,
        canvas: &mut dyn MapCanvas,
    ) -> PassOutcome {
        if !self.tracker.is_latest(result.ticket) {
            self.metrics.inc(QUERY_STALE_DROPPED, 1);
            debug!(ticket = result.ticket.0, "dropping stale query result");
            return PassOutcome::StaleDropped;
        }
        if !canvas.is_loaded() {
            self.metrics.inc(RECONCILE_SKIPPED, 1);
            debug!("canvas not loaded; skipping reconciliation");
            return PassOutcome::Skipped(SkipReason::CanvasNotLoaded);
        }
        if !self.tracker.accept_result(result.ticket) {
            self.metrics.inc(QUERY_STALE_DROPPED, 1);
            return PassOutcome::StaleDropped;
        }

        let tier = marker_tier(result.zoom, &self.config.markers.breakpoints);
        let selection = SelectionIndex::new(&self.selection);
        let ctx = ReconcileContext {
            tier,
            selection: &selection,
            rewards: &self.rewards,
            factory: &self.factory,
        };
        let plan = reconcile(&result.features, &self.registry, &ctx);
        let applied = self.registry.apply(&plan, canvas);
        let stats = PassStats::new(&plan, applied);

        self.metrics.inc(RECONCILE_PASSES, 1);
        self.metrics.inc(RECONCILE_CREATED, stats.created as u64);
        self.metrics.inc(RECONCILE_UPDATED, stats.updated as u64);
        self.metrics.inc(RECONCILE_REMOVED, stats.removed as u64);
        self.metrics.inc(RECONCILE_LOOKUPS, stats.lookups as u64);
        let live = self.registry.len();
        self.metrics.set_gauge(MARKERS_LIVE, live as i64);
        debug!(
            ticket = result.ticket.0,
            ?tier,
            created = stats.created,
            updated = stats.updated,
            removed = stats.removed,
            live,
            "reconciled markers"
        );
        PassOutcome::Applied(stats)
    }

    /// Replaces the station snapshot and re-runs the pass at the last
    /// viewport. Markers from the old snapshot stay up until then.
    pub fn on_stations(
        &mut self,
        stations: StationSnapshot,
        canvas: &mut dyn MapCanvas,
    ) -> PassOutcome {
        let installed = stations.installed();
        info!(
            total = stations.len(),
            installed = installed.len(),
            "rebuilding station index"
        );
        self.index = SpatialIndex::build(installed, self.config.clustering);
        self.stations = stations;
        self.refresh(canvas)
    }

    pub fn on_rewards(&mut self, rewards: RewardTable, canvas: &mut dyn MapCanvas) -> PassOutcome {
        self.rewards = rewards;
        self.refresh(canvas)
    }

    /// Re-runs the pass at the current viewport with a fresh ticket.
    pub fn refresh(&mut self, canvas: &mut dyn MapCanvas) -> PassOutcome {
        let Some(snapshot) = self.tracker.reissue() else {
            return PassOutcome::Skipped(SkipReason::NoViewport);
        };
        let result = self.request_query(snapshot);
        self.apply_query_result(result, canvas)
    }

    /// Hover/selection change: restyles live station markers only.
    pub fn on_selection(
        &mut self,
        selection: SelectionState,
        canvas: &mut dyn MapCanvas,
    ) -> PassOutcome {
        self.selection = selection;
        if !canvas.is_loaded() {
            self.metrics.inc(RECONCILE_SKIPPED, 1);
            return PassOutcome::Skipped(SkipReason::CanvasNotLoaded);
        }
        let index = SelectionIndex::new(&self.selection);
        let plan = selection_overlay(
            &self.registry,
            &index,
            &self.stations,
            &self.rewards,
            &self.factory,
        );
        let applied = self.registry.apply(&plan, canvas);
        self.metrics.inc(OVERLAY_PASSES, 1);
        self.metrics.inc(OVERLAY_RESTYLED, applied.updated as u64);
        debug!(restyled = applied.updated, "selection overlay applied");
        PassOutcome::Applied(PassStats::new(&plan, applied))
    }

    pub fn on_cluster_click(
        &mut self,
        id: ClusterId,
        canvas: &mut dyn MapCanvas,
    ) -> Option<CameraCommand> {
        let Some(command) = self.expansion.on_cluster_activated(&self.index, id) else {
            warn!(cluster = %id, "click on unknown cluster");
            return None;
        };
        if canvas.is_loaded() {
            canvas.fly_to(command);
        }
        Some(command)
    }

    /// Routes a click coming back from a marker's click target.
    pub fn on_marker_click(&mut self, key: &FeatureKey, canvas: &mut dyn MapCanvas) -> MarkerClick {
        match key {
            FeatureKey::Cluster(id) => match self.on_cluster_click(*id, canvas) {
                Some(command) => MarkerClick::Expanded(command),
                None => MarkerClick::Unknown,
            },
            FeatureKey::Station(id) if self.stations.get(id).is_some() => {
                MarkerClick::Station(id.clone())
            }
            FeatureKey::Station(_) => MarkerClick::Unknown,
        }
    }

    /// Positions the camera once at startup.
    pub fn initial_camera(
        &self,
        located: Result<LngLat, GeolocationError>,
        canvas: &mut dyn MapCanvas,
    ) -> CameraCommand {
        let command = initial_camera(located, &self.stations, &self.config.camera);
        if canvas.is_loaded() {
            canvas.fly_to(command);
        }
        command
    }

    /// Coordinates of the selected route stops, in order.
    pub fn route_coordinates(&self) -> Option<Vec<LngLat>> {
        let stops = self.selection.route_stops()?;
        stops
            .iter()
            .map(|id| self.stations.get(id).map(|s| s.coordinates()))
            .collect()
    }

    /// Detaches every marker, e.g. when the layer is torn down.
    ///
    /// Returns `false` without touching the canvas or the registry while the
    /// canvas is not loaded.
    pub fn clear(&mut self, canvas: &mut dyn MapCanvas) -> bool {
        if !canvas.is_loaded() {
            debug!("canvas not loaded; keeping markers");
            return false;
        }
        self.registry.clear(canvas);
        self.metrics.set_gauge(MARKERS_LIVE, 0);
        true
    }
}

impl Layer for StationLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn object_count(&self) -> usize {
        self.registry.len()
    }
}
