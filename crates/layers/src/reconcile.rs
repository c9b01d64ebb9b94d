use std::collections::HashSet;

use foundation::LngLat;
use stations::{ClusterFeature, FeatureKey, RewardTable, SelectionIndex, StationRole};

use crate::canvas::MarkerPatch;
use crate::content::{MarkerAppearance, MarkerContent};
use crate::factory::MarkerFactory;
use crate::registry::{MarkerRegistry, MaterializedMarker};
use crate::symbology::MarkerTier;

/// Desired state of one marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub key: FeatureKey,
    pub position: LngLat,
    /// `None` for cluster bubbles.
    pub tier: Option<MarkerTier>,
    pub role: StationRole,
    pub content: MarkerContent,
    pub appearance: MarkerAppearance,
}

impl MarkerSpec {
    /// Fields of `self` that differ from what is on the canvas.
    fn diff(&self, current: &MaterializedMarker) -> MarkerPatch {
        MarkerPatch {
            position: (self.position != current.position).then_some(self.position),
            content: (self.content != current.content).then(|| self.content.clone()),
            appearance: (self.appearance != current.appearance).then_some(self.appearance),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerEffect {
    Create(MarkerSpec),
    /// Patch an existing marker in place; the handle is kept.
    Update {
        spec: MarkerSpec,
        patch: MarkerPatch,
    },
    /// Role-driven change from the selection overlay.
    Restyle {
        key: FeatureKey,
        role: StationRole,
        patch: MarkerPatch,
    },
    Remove { key: FeatureKey },
}

impl MarkerEffect {
    pub fn key(&self) -> &FeatureKey {
        match self {
            MarkerEffect::Create(spec) | MarkerEffect::Update { spec, .. } => &spec.key,
            MarkerEffect::Restyle { key, .. } | MarkerEffect::Remove { key } => key,
        }
    }
}

/// Ordered list of effects for one pass. Removals come first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcilePlan {
    pub effects: Vec<MarkerEffect>,
    /// Registry lookups performed while planning.
    pub lookups: usize,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn created(&self) -> usize {
        self.count(|e| matches!(e, MarkerEffect::Create(_)))
    }

    pub fn updated(&self) -> usize {
        self.count(|e| matches!(e, MarkerEffect::Update { .. }))
            + self.count(|e| matches!(e, MarkerEffect::Restyle { .. }))
    }

    pub fn removed(&self) -> usize {
        self.count(|e| matches!(e, MarkerEffect::Remove { .. }))
    }

    fn count(&self, pred: impl Fn(&MarkerEffect) -> bool) -> usize {
        self.effects.iter().filter(|e| pred(e)).count()
    }
}

/// Inputs that shape how a desired feature is drawn.
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    pub tier: MarkerTier,
    pub selection: &'a SelectionIndex,
    pub rewards: &'a RewardTable,
    pub factory: &'a MarkerFactory,
}

impl ReconcileContext<'_> {
    pub fn spec(&self, feature: &ClusterFeature) -> MarkerSpec {
        match feature {
            ClusterFeature::Cluster {
                id,
                coordinates,
                point_count,
                ..
            } => MarkerSpec {
                key: FeatureKey::Cluster(*id),
                position: *coordinates,
                tier: None,
                role: StationRole::PLAIN,
                content: self.factory.render_cluster(*point_count),
                appearance: self.factory.cluster_appearance(),
            },
            ClusterFeature::Point { station } => {
                let factory = self.factory;
                let role = self.selection.role(&station.station_id);
                let reward = self.rewards.get(&station.station_id);
                MarkerSpec {
                    key: FeatureKey::Station(station.station_id.clone()),
                    position: station.coordinates(),
                    tier: Some(self.tier),
                    role,
                    content: factory.render_station(station, self.tier, role, reward),
                    appearance: factory.appearance(role),
                }
            }
        }
    }
}

/// Plans the minimal set of canvas effects that turns `registry` into
/// exactly the markers for `desired`.
///
/// Runs in O(|desired| + |registry|): one registry lookup per desired feature
/// and one membership check per materialized marker. Repeated keys in
/// `desired` are collapsed, first occurrence wins.
pub fn reconcile(
    desired: &[ClusterFeature],
    registry: &MarkerRegistry,
    ctx: &ReconcileContext<'_>,
) -> ReconcilePlan {
    let mut seen: HashSet<FeatureKey> = HashSet::with_capacity(desired.len());
    let mut upserts = Vec::new();
    let mut lookups = 0;

    for feature in desired {
        let key = feature.key();
        if seen.contains(&key) {
            continue;
        }
        let spec = ctx.spec(feature);
        seen.insert(key);

        lookups += 1;
        match registry.get(&spec.key) {
            None => upserts.push(MarkerEffect::Create(spec)),
            Some(current) => {
                let patch = spec.diff(current);
                if !patch.is_empty() {
                    upserts.push(MarkerEffect::Update { spec, patch });
                }
            }
        }
    }

    let mut removed: Vec<FeatureKey> = Vec::new();
    for key in registry.keys() {
        lookups += 1;
        if !seen.contains(key) {
            removed.push(key.clone());
        }
    }
    removed.sort_unstable();

    let mut effects: Vec<MarkerEffect> = removed
        .into_iter()
        .map(|key| MarkerEffect::Remove { key })
        .collect();
    effects.extend(upserts);

    ReconcilePlan { effects, lookups }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use foundation::{LngLat, StationId};
    use pretty_assertions::assert_eq;
    use stations::{ClusterId, SelectionState, StationRecord};

    fn point(id: &str, lng: f64, bikes: u32) -> ClusterFeature {
        let at = LngLat::new(lng, 40.7);
        let station = StationRecord::new(id, at).with_availability(bikes, 0, 4);
        ClusterFeature::Point { station }
    }

    fn cluster(id: u64, count: u32) -> ClusterFeature {
        ClusterFeature::Cluster {
            id: ClusterId(id),
            coordinates: LngLat::new(-74.0, 40.7),
            point_count: count,
            expansion_zoom: 14,
        }
    }

    struct Fixture {
        selection: SelectionIndex,
        rewards: RewardTable,
        factory: MarkerFactory,
    }

    impl Fixture {
        fn new(selection: &SelectionState) -> Self {
            Self {
                selection: SelectionIndex::new(selection),
                rewards: RewardTable::new(),
                factory: MarkerFactory::default(),
            }
        }

        fn ctx(&self, tier: MarkerTier) -> ReconcileContext<'_> {
            ReconcileContext {
                tier,
                selection: &self.selection,
                rewards: &self.rewards,
                factory: &self.factory,
            }
        }
    }

    fn run(
        desired: &[ClusterFeature],
        registry: &mut MarkerRegistry,
        canvas: &mut RecordingCanvas,
        ctx: &ReconcileContext<'_>,
    ) -> ReconcilePlan {
        let plan = reconcile(desired, registry, ctx);
        registry.apply(&plan, canvas);
        plan
    }

    fn sorted_keys(registry: &MarkerRegistry) -> Vec<FeatureKey> {
        let mut keys: Vec<FeatureKey> = registry.keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn registry_matches_latest_query_after_each_pass() {
        let fx = Fixture::new(&SelectionState::new());
        let ctx = fx.ctx(MarkerTier::Simple);
        let mut registry = MarkerRegistry::new();
        let mut canvas = RecordingCanvas::new();

        let first = vec![point("a", -74.0, 3), point("b", -73.9, 0), cluster(99, 4)];
        run(&first, &mut registry, &mut canvas, &ctx);
        assert_eq!(
            sorted_keys(&registry),
            vec![
                FeatureKey::Cluster(ClusterId(99)),
                FeatureKey::Station(StationId::new("a")),
                FeatureKey::Station(StationId::new("b")),
            ]
        );

        let second = vec![point("b", -73.9, 0), point("c", -73.8, 1)];
        let plan = run(&second, &mut registry, &mut canvas, &ctx);
        assert_eq!((plan.created(), plan.updated(), plan.removed()), (1, 0, 2));
        assert_eq!(
            sorted_keys(&registry),
            vec![
                FeatureKey::Station(StationId::new("b")),
                FeatureKey::Station(StationId::new("c")),
            ]
        );
        assert_eq!(canvas.live_markers(), 2);
        // Removals are planned before creations.
        assert!(matches!(plan.effects[0], MarkerEffect::Remove { .. }));
    }

    #[test]
    fn unchanged_inputs_produce_an_empty_plan() {
        let fx = Fixture::new(&SelectionState::new().with_start("a"));
        let ctx = fx.ctx(MarkerTier::Compact);
        let mut registry = MarkerRegistry::new();
        let mut canvas = RecordingCanvas::new();
        let desired = vec![point("a", -74.0, 3), point("b", -73.9, 9), cluster(7, 12)];

        run(&desired, &mut registry, &mut canvas, &ctx);
        canvas.take_ops();
        let again = run(&desired, &mut registry, &mut canvas, &ctx);
        assert!(again.is_empty());
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn attribute_changes_update_in_place() {
        let fx = Fixture::new(&SelectionState::new());
        let ctx = fx.ctx(MarkerTier::Compact);
        let mut registry = MarkerRegistry::new();
        let mut canvas = RecordingCanvas::new();

        run(&[point("a", -74.0, 3)], &mut registry, &mut canvas, &ctx);
        let handle = registry
            .get(&FeatureKey::Station(StationId::new("a")))
            .map(|m| m.handle);

        let plan = run(&[point("a", -74.0, 8)], &mut registry, &mut canvas, &ctx);
        assert_eq!((plan.created(), plan.updated(), plan.removed()), (0, 1, 0));
        let MarkerEffect::Update { patch, .. } = &plan.effects[0] else {
            panic!("expected an update");
        };
        assert!(patch.content.is_some());
        assert_eq!(patch.position, None);
        assert_eq!(patch.appearance, None);
        assert_eq!(
            registry
                .get(&FeatureKey::Station(StationId::new("a")))
                .map(|m| m.handle),
            handle
        );
    }

    #[test]
    fn tier_change_swaps_content_under_the_same_handle() {
        let fx = Fixture::new(&SelectionState::new());
        let mut registry = MarkerRegistry::new();
        let mut canvas = RecordingCanvas::new();
        let desired = vec![point("a", -74.0, 3)];

        let simple = fx.ctx(MarkerTier::Simple);
        let detailed = fx.ctx(MarkerTier::Detailed);
        run(&desired, &mut registry, &mut canvas, &simple);
        let plan = run(&desired, &mut registry, &mut canvas, &detailed);
        assert_eq!((plan.created(), plan.updated(), plan.removed()), (0, 1, 0));
        let marker = registry
            .get(&FeatureKey::Station(StationId::new("a")))
            .expect("still materialized");
        assert_eq!(marker.tier, Some(MarkerTier::Detailed));
        assert_eq!(marker.handle, crate::canvas::MarkerHandle(1));
    }

    #[test]
    fn point_to_cluster_is_remove_plus_create() {
        let fx = Fixture::new(&SelectionState::new());
        let ctx = fx.ctx(MarkerTier::Simple);
        let mut registry = MarkerRegistry::new();
        let mut canvas = RecordingCanvas::new();

        let pair = [point("a", -74.0, 1), point("b", -74.0, 1)];
        run(&pair, &mut registry, &mut canvas, &ctx);
        let plan = run(&[cluster(42, 2)], &mut registry, &mut canvas, &ctx);
        assert_eq!((plan.created(), plan.updated(), plan.removed()), (1, 0, 2));
    }

    #[test]
    fn duplicate_keys_collapse_to_first() {
        let fx = Fixture::new(&SelectionState::new());
        let ctx = fx.ctx(MarkerTier::Compact);
        let registry = MarkerRegistry::new();
        let desired = [point("a", -74.0, 1), point("a", -73.0, 9)];
        let plan = reconcile(&desired, &registry, &ctx);
        assert_eq!(plan.created(), 1);
        let MarkerEffect::Create(spec) = &plan.effects[0] else {
            panic!("expected a create");
        };
        assert_eq!(spec.position, LngLat::new(-74.0, 40.7));
    }

    #[test]
    fn work_is_linear_in_desired_plus_materialized() {
        let fx = Fixture::new(&SelectionState::new());
        let ctx = fx.ctx(MarkerTier::Simple);

        let lookups_for = |n: usize| {
            let mut registry = MarkerRegistry::new();
            let mut canvas = RecordingCanvas::new();
            let old: Vec<ClusterFeature> = (0..n)
                .map(|i| point(&format!("old{i}"), -74.0 + i as f64 * 1e-4, 1))
                .collect();
            run(&old, &mut registry, &mut canvas, &ctx);
            let new: Vec<ClusterFeature> = (0..n)
                .map(|i| point(&format!("new{i}"), -74.0 + i as f64 * 1e-4, 1))
                .collect();
            let plan = reconcile(&new, &registry, &ctx);
            assert_eq!(plan.lookups, new.len() + registry.len());
            plan.lookups
        };

        let small = lookups_for(500);
        let large = lookups_for(1000);
        assert!(large <= 2 * small);
    }
}
