use stations::{FeatureKey, RewardTable, SelectionIndex, StationSnapshot};

use crate::canvas::MarkerPatch;
use crate::factory::MarkerFactory;
use crate::reconcile::{MarkerEffect, ReconcilePlan};
use crate::registry::MarkerRegistry;

/// Restyles already-materialized station markers after a hover or selection
/// change, without touching the spatial index.
///
/// Only markers whose role changed are re-rendered, and only those whose
/// content or appearance actually differs produce a `Restyle` effect.
/// Clusters are left alone.
pub fn selection_overlay(
    registry: &MarkerRegistry,
    selection: &SelectionIndex,
    stations: &StationSnapshot,
    rewards: &RewardTable,
    factory: &MarkerFactory,
) -> ReconcilePlan {
    let mut effects = Vec::new();
    let mut lookups = 0;

    for marker in registry.iter() {
        let FeatureKey::Station(id) = &marker.key else {
            continue;
        };
        lookups += 1;
        let role = selection.role(id);
        if role == marker.role {
            continue;
        }

        let content = match (marker.tier, stations.get(id)) {
            (Some(tier), Some(station)) => {
                factory.update_marker_type(&marker.content, tier, station, role, rewards.get(id))
            }
            _ => None,
        };
        let appearance = factory.appearance(role);
        let patch = MarkerPatch {
            position: None,
            content,
            appearance: (appearance != marker.appearance).then_some(appearance),
        };
        if patch.is_empty() {
            continue;
        }
        effects.push(MarkerEffect::Restyle {
            key: marker.key.clone(),
            role,
            patch,
        });
    }

    effects.sort_unstable_by(|a, b| a.key().cmp(b.key()));
    ReconcilePlan { effects, lookups }
}
