use std::collections::HashMap;

use foundation::LngLat;
use stations::{FeatureKey, StationRole};
use tracing::trace;

use crate::canvas::{MapCanvas, MarkerHandle};
use crate::content::{MarkerAppearance, MarkerContent};
use crate::reconcile::{MarkerEffect, ReconcilePlan};
use crate::symbology::MarkerTier;

/// A marker currently attached to the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedMarker {
    pub key: FeatureKey,
    pub handle: MarkerHandle,
    pub position: LngLat,
    pub tier: Option<MarkerTier>,
    pub role: StationRole,
    pub content: MarkerContent,
    pub appearance: MarkerAppearance,
}

/// Counts of what one [`MarkerRegistry::apply`] call did.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Id-keyed set of materialized markers; at most one per key.
#[derive(Debug, Clone, Default)]
pub struct MarkerRegistry {
    markers: HashMap<FeatureKey, MaterializedMarker>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn get(&self, key: &FeatureKey) -> Option<&MaterializedMarker> {
        self.markers.get(key)
    }

    pub fn contains(&self, key: &FeatureKey) -> bool {
        self.markers.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FeatureKey> + '_ {
        self.markers.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterializedMarker> + '_ {
        self.markers.values()
    }

    /// Executes `plan` against `canvas` and records the outcome.
    ///
    /// Effects naming keys the registry does not hold (or already holds, for
    /// creates) are skipped, so a plan computed against a different registry
    /// state cannot leave two markers for one key.
    pub fn apply(&mut self, plan: &ReconcilePlan, canvas: &mut dyn MapCanvas) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for effect in &plan.effects {
            match effect {
                MarkerEffect::Remove { key } => {
                    if let Some(marker) = self.markers.remove(key) {
                        canvas.remove_marker(marker.handle);
                        stats.removed += 1;
                    }
                }
                MarkerEffect::Create(spec) => {
                    if self.markers.contains_key(&spec.key) {
                        trace!(key = %spec.key, "create for live marker skipped");
                        continue;
                    }
                    let handle = canvas.create_marker(
                        spec.position,
                        &spec.content,
                        spec.appearance,
                        &spec.key,
                    );
                    self.markers.insert(
                        spec.key.clone(),
                        MaterializedMarker {
                            key: spec.key.clone(),
                            handle,
                            position: spec.position,
                            tier: spec.tier,
                            role: spec.role,
                            content: spec.content.clone(),
                            appearance: spec.appearance,
                        },
                    );
                    stats.created += 1;
                }
                MarkerEffect::Update { spec, patch } => {
                    let Some(marker) = self.markers.get_mut(&spec.key) else {
                        continue;
                    };
                    canvas.update_marker(marker.handle, patch);
                    marker.position = spec.position;
                    marker.tier = spec.tier;
                    marker.role = spec.role;
                    marker.content = spec.content.clone();
                    marker.appearance = spec.appearance;
                    stats.updated += 1;
                }
                MarkerEffect::Restyle { key, role, patch } => {
                    let Some(marker) = self.markers.get_mut(key) else {
                        continue;
                    };
                    canvas.update_marker(marker.handle, patch);
                    marker.role = *role;
                    if let Some(content) = &patch.content {
                        marker.content = content.clone();
                    }
                    if let Some(appearance) = patch.appearance {
                        marker.appearance = appearance;
                    }
                    stats.updated += 1;
                }
            }
        }
        stats
    }

    /// Detaches every marker.
    pub fn clear(&mut self, canvas: &mut dyn MapCanvas) {
        for (_, marker) in self.markers.drain() {
            canvas.remove_marker(marker.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasOp, MarkerPatch, RecordingCanvas};
    use crate::factory::MarkerFactory;
    use crate::reconcile::MarkerSpec;
    use foundation::StationId;

    fn spec(id: &str) -> MarkerSpec {
        let factory = MarkerFactory::default();
        MarkerSpec {
            key: FeatureKey::Station(StationId::new(id)),
            position: LngLat::new(0.0, 0.0),
            tier: Some(MarkerTier::Simple),
            role: StationRole::PLAIN,
            content: factory.render_cluster(1),
            appearance: factory.appearance(StationRole::PLAIN),
        }
    }

    #[test]
    fn duplicate_create_never_yields_two_markers() {
        let mut registry = MarkerRegistry::new();
        let mut canvas = RecordingCanvas::new();
        let plan = ReconcilePlan {
            effects: vec![
                MarkerEffect::Create(spec("a")),
                MarkerEffect::Create(spec("a")),
            ],
            lookups: 0,
        };
        let stats = registry.apply(&plan, &mut canvas);
        assert_eq!(stats.created, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(canvas.live_markers(), 1);
    }

    #[test]
    fn effects_for_unknown_keys_are_ignored() {
        let mut registry = MarkerRegistry::new();
        let mut canvas = RecordingCanvas::new();
        let key = FeatureKey::Station(StationId::new("ghost"));
        let plan = ReconcilePlan {
            effects: vec![
                MarkerEffect::Remove { key: key.clone() },
                MarkerEffect::Restyle {
                    key,
                    role: StationRole::PLAIN,
                    patch: MarkerPatch::default(),
                },
            ],
            lookups: 0,
        };
        assert_eq!(registry.apply(&plan, &mut canvas), ApplyStats::default());
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn clear_detaches_everything() {
        let mut registry = MarkerRegistry::new();
        let mut canvas = RecordingCanvas::new();
        let plan = ReconcilePlan {
            effects: vec![
                MarkerEffect::Create(spec("a")),
                MarkerEffect::Create(spec("b")),
            ],
            lookups: 0,
        };
        registry.apply(&plan, &mut canvas);
        registry.clear(&mut canvas);
        assert!(registry.is_empty());
        assert_eq!(canvas.live_markers(), 0);
        assert_eq!(
            canvas
                .ops()
                .iter()
                .filter(|op| matches!(op, CanvasOp::Remove { .. }))
                .count(),
            2
        );
    }
}
