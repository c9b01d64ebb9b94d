use stations::{RewardAnnotation, StationRecord, StationRole};

use crate::config::MarkerConfig;
use crate::content::{
    ContainerSize, Glyph, MarkerAppearance, MarkerBody, MarkerContent, RewardBadge,
    cluster_diameter, container_size,
};
use crate::symbology::{
    MarkerTier, Z_CLUSTER, availability_color, palette, reward_color, reward_tier, route_letter,
    station_color, z_index,
};

/// Produces marker content descriptors.
///
/// Pure: identical inputs always produce identical content, which is what
/// lets the reconciler skip canvas updates by comparing descriptors.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerFactory {
    hover_growth_px: u32,
}

impl Default for MarkerFactory {
    fn default() -> Self {
        Self::new(&MarkerConfig::default())
    }
}

impl MarkerFactory {
    pub fn new(config: &MarkerConfig) -> Self {
        Self {
            hover_growth_px: config.hover_growth_px,
        }
    }

    pub fn render_station(
        &self,
        station: &StationRecord,
        tier: MarkerTier,
        role: StationRole,
        reward: Option<RewardAnnotation>,
    ) -> MarkerContent {
        let is_route = role.route.is_route();
        let size = container_size(tier, is_route);
        let bikes = station.rentable_bikes();

        let body = match (tier, is_route) {
            (MarkerTier::Simple, _) | (MarkerTier::Compact, true) => MarkerBody::Circle {
                color: station_color(role, bikes),
                diameter: size.width,
                label: None,
            },
            (MarkerTier::Detailed, true) => MarkerBody::Circle {
                color: station_color(role, bikes),
                diameter: size.width,
                label: route_letter(role.route),
            },
            (MarkerTier::Compact, false) => MarkerBody::InfoBox {
                bikes,
                glyph: glyph(station),
                color: availability_color(bikes),
                border: reward
                    .and_then(|r| reward_tier(r.peak()))
                    .map(reward_color),
            },
            (MarkerTier::Detailed, false) => MarkerBody::Card {
                badge: reward.and_then(badge),
                classic: station.rentable_classic_bikes(),
                ebikes: station.rentable_ebikes(),
                docks: station.num_docks_available,
                accent: availability_color(bikes),
            },
        };

        MarkerContent { size, body }
    }

    pub fn render_cluster(&self, count: u32) -> MarkerContent {
        let diameter = cluster_diameter(count);
        MarkerContent {
            size: ContainerSize::square(diameter),
            body: MarkerBody::Cluster {
                count,
                label: abbreviate(count),
                diameter,
                color: palette::CLUSTER,
            },
        }
    }

    pub fn appearance(&self, role: StationRole) -> MarkerAppearance {
        MarkerAppearance {
            z_index: z_index(role),
            grow_px: if role.hovered {
                self.hover_growth_px
            } else {
                0
            },
        }
    }

    pub fn cluster_appearance(&self) -> MarkerAppearance {
        MarkerAppearance {
            z_index: Z_CLUSTER,
            grow_px: 0,
        }
    }

    /// Re-renders an existing station marker for `new_tier`.
    ///
    /// Returns `None` when the content would not change, so callers can skip
    /// the canvas round-trip. The marker keeps its handle either way.
    pub fn update_marker_type(
        &self,
        existing: &MarkerContent,
        new_tier: MarkerTier,
        station: &StationRecord,
        role: StationRole,
        reward: Option<RewardAnnotation>,
    ) -> Option<MarkerContent> {
        let next = self.render_station(station, new_tier, role, reward);
        (next != *existing).then_some(next)
    }
}

fn glyph(station: &StationRecord) -> Glyph {
    if station.rentable_ebikes() > 0 {
        Glyph::Lightning
    } else if station.rentable_bikes() > 0 {
        Glyph::Bike
    } else {
        Glyph::EmptySet
    }
}

fn badge(reward: RewardAnnotation) -> Option<RewardBadge> {
    if reward.is_empty() {
        return None;
    }
    Some(if reward.pickup_points == reward.dropoff_points {
        RewardBadge::Combined {
            points: reward.pickup_points,
        }
    } else {
        RewardBadge::Directional {
            pickup: reward.pickup_points,
            dropoff: reward.dropoff_points,
        }
    })
}

/// Truncates rather than rounds, so a label never claims more than the count.
fn abbreviate(count: u32) -> String {
    let tenths = count / 100;
    if count < 1000 {
        count.to_string()
    } else if tenths < 100 {
        format!("{}.{}k", tenths / 10, tenths % 10)
    } else {
        format!("{}k", count / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{COMPACT_PLAIN, DETAILED_PLAIN};
    use foundation::LngLat;
    use pretty_assertions::assert_eq;
    use stations::RouteRole;

    fn station(bikes: u32, ebikes: u32, docks: u32) -> StationRecord {
        StationRecord::new("s", LngLat::new(-74.0, 40.7)).with_availability(bikes, ebikes, docks)
    }

    fn role(route: RouteRole) -> StationRole {
        StationRole {
            route,
            hovered: false,
        }
    }

    #[test]
    fn reward_badge_never_changes_container_size() {
        let f = MarkerFactory::default();
        let s = station(3, 1, 4);
        for tier in [
            MarkerTier::Simple,
            MarkerTier::Compact,
            MarkerTier::Detailed,
        ] {
            for r in [RouteRole::None, RouteRole::Start, RouteRole::Waypoint] {
                let bare = f.render_station(&s, tier, role(r), None);
                let rewarded =
                    f.render_station(&s, tier, role(r), Some(RewardAnnotation::new(6, 2)));
                assert_eq!(bare.size, rewarded.size, "{tier:?} {r:?}");
            }
        }
    }

    #[test]
    fn compact_info_box_picks_glyph_and_border() {
        let f = MarkerFactory::default();
        let content = f.render_station(
            &station(4, 2, 1),
            MarkerTier::Compact,
            StationRole::PLAIN,
            Some(RewardAnnotation::new(1, 3)),
        );
        assert_eq!(content.size, COMPACT_PLAIN);
        assert_eq!(
            content.body,
            MarkerBody::InfoBox {
                bikes: 4,
                glyph: Glyph::Lightning,
                color: palette::FEW_BIKES,
                border: Some(palette::REWARD_B),
            }
        );

        let empty = f.render_station(
            &station(0, 0, 9),
            MarkerTier::Compact,
            StationRole::PLAIN,
            None,
        );
        let MarkerBody::InfoBox { glyph, border, .. } = empty.body else {
            panic!("expected an info box");
        };
        assert_eq!(glyph, Glyph::EmptySet);
        assert_eq!(border, None);

        let classic = f.render_station(
            &station(2, 0, 9),
            MarkerTier::Compact,
            StationRole::PLAIN,
            None,
        );
        let MarkerBody::InfoBox { glyph, .. } = classic.body else {
            panic!("expected an info box");
        };
        assert_eq!(glyph, Glyph::Bike);
    }

    #[test]
    fn non_renting_station_renders_as_empty() {
        let f = MarkerFactory::default();
        let mut s = station(8, 3, 2);
        s.is_renting = false;
        let content = f.render_station(&s, MarkerTier::Compact, StationRole::PLAIN, None);
        assert_eq!(
            content.body,
            MarkerBody::InfoBox {
                bikes: 0,
                glyph: Glyph::EmptySet,
                color: palette::NO_BIKES,
                border: None,
            }
        );
    }

    #[test]
    fn detailed_card_splits_counts_and_reward_directions() {
        let f = MarkerFactory::default();
        let content = f.render_station(
            &station(7, 2, 5),
            MarkerTier::Detailed,
            StationRole::PLAIN,
            Some(RewardAnnotation::new(2, 4)),
        );
        assert_eq!(content.size, DETAILED_PLAIN);
        assert_eq!(
            content.body,
            MarkerBody::Card {
                badge: Some(RewardBadge::Directional {
                    pickup: 2,
                    dropoff: 4,
                }),
                classic: 5,
                ebikes: 2,
                docks: 5,
                accent: palette::MANY_BIKES,
            }
        );

        let equal = f.render_station(
            &station(7, 2, 5),
            MarkerTier::Detailed,
            StationRole::PLAIN,
            Some(RewardAnnotation::new(3, 3)),
        );
        assert!(matches!(
            equal.body,
            MarkerBody::Card {
                badge: Some(RewardBadge::Combined { points: 3 }),
                ..
            }
        ));
    }

    #[test]
    fn detailed_route_circle_carries_letter() {
        let f = MarkerFactory::default();
        let content = f.render_station(
            &station(0, 0, 0),
            MarkerTier::Detailed,
            role(RouteRole::End),
            None,
        );
        assert_eq!(
            content.body,
            MarkerBody::Circle {
                color: palette::END,
                diameter: 30,
                label: Some('E'),
            }
        );
    }

    #[test]
    fn tier_swap_returns_none_when_content_is_unchanged() {
        let f = MarkerFactory::default();
        let s = station(3, 0, 3);
        let simple = f.render_station(&s, MarkerTier::Simple, StationRole::PLAIN, None);
        assert_eq!(
            f.update_marker_type(&simple, MarkerTier::Simple, &s, StationRole::PLAIN, None),
            None
        );
        let compact = f
            .update_marker_type(&simple, MarkerTier::Compact, &s, StationRole::PLAIN, None)
            .expect("tier change swaps content");
        assert_eq!(compact.size, COMPACT_PLAIN);
    }

    #[test]
    fn hover_only_changes_appearance() {
        let f = MarkerFactory::default();
        let s = station(3, 0, 3);
        let hovered = StationRole {
            route: RouteRole::None,
            hovered: true,
        };
        assert_eq!(
            f.render_station(&s, MarkerTier::Compact, hovered, None),
            f.render_station(&s, MarkerTier::Compact, StationRole::PLAIN, None)
        );
        assert_eq!(f.appearance(hovered).grow_px, 4);
        assert_eq!(f.appearance(StationRole::PLAIN).grow_px, 0);
    }

    #[test]
    fn cluster_labels_abbreviate_large_counts() {
        let f = MarkerFactory::default();
        let small = f.render_cluster(3);
        assert_eq!(small.size, ContainerSize::square(30));
        assert!(matches!(&small.body, MarkerBody::Cluster { label, .. } if label == "3"));
        assert_eq!(
            f.render_cluster(1234).body,
            MarkerBody::Cluster {
                count: 1234,
                label: "1.2k".to_string(),
                diameter: 46,
                color: palette::CLUSTER,
            }
        );
        assert_eq!(abbreviate(23_400), "23k");
    }

    #[test]
    fn cluster_labels_never_round_up() {
        assert_eq!(abbreviate(999), "999");
        assert_eq!(abbreviate(1000), "1.0k");
        assert_eq!(abbreviate(1999), "1.9k");
        assert_eq!(abbreviate(9960), "9.9k");
        assert_eq!(abbreviate(9999), "9.9k");
        assert_eq!(abbreviate(10_000), "10k");
        assert_eq!(abbreviate(10_999), "10k");
    }
}
