use std::collections::HashMap;
use std::fmt;

use foundation::{LngLat, LngLatBounds, StationId, Vec2, project, unproject};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::StationRecord;
use crate::spatial::kdtree::KdTree;

/// Tuning for the hierarchical clustering.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterOptions {
    /// Cluster radius in screen pixels.
    pub radius: f64,
    /// Tile extent the radius is expressed against.
    pub extent: f64,
    pub min_zoom: u8,
    /// Highest zoom that still clusters; above it every station is a point.
    pub max_zoom: u8,
    /// Minimum number of stations that form a cluster.
    pub min_points: u32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius: 60.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 16,
            min_points: 2,
        }
    }
}

impl ClusterOptions {
    // Zoom is packed into the low 5 bits of a cluster id.
    const MAX_SUPPORTED_ZOOM: u8 = 30;

    fn sanitized(self) -> Self {
        let max_zoom = self.max_zoom.min(Self::MAX_SUPPORTED_ZOOM);
        Self {
            radius: if self.radius.is_finite() && self.radius > 0.0 {
                self.radius
            } else {
                Self::default().radius
            },
            extent: if self.extent.is_finite() && self.extent > 0.0 {
                self.extent
            } else {
                Self::default().extent
            },
            min_zoom: self.min_zoom.min(max_zoom),
            max_zoom,
            min_points: self.min_points.max(2),
        }
    }
}

/// Stable identifier of a cluster.
///
/// Encodes the zoom level the cluster was formed from and the index of its
/// seed item on that level, so identical inputs always produce identical ids.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub u64);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster:{}", self.0)
    }
}

/// Logical identity of anything the map shows for a station set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureKey {
    Cluster(ClusterId),
    Station(StationId),
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Cluster(id) => id.fmt(f),
            FeatureKey::Station(id) => write!(f, "station:{id}"),
        }
    }
}

/// One visible item of a query result.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterFeature {
    Cluster {
        id: ClusterId,
        coordinates: LngLat,
        point_count: u32,
        expansion_zoom: u8,
    },
    Point {
        station: StationRecord,
    },
}

impl ClusterFeature {
    pub fn key(&self) -> FeatureKey {
        match self {
            ClusterFeature::Cluster { id, .. } => FeatureKey::Cluster(*id),
            ClusterFeature::Point { station } => FeatureKey::Station(station.station_id.clone()),
        }
    }

    pub fn coordinates(&self) -> LngLat {
        match self {
            ClusterFeature::Cluster { coordinates, .. } => *coordinates,
            ClusterFeature::Point { station } => station.coordinates(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum NodeKind {
    Station(u32),
    Cluster(ClusterId),
}

#[derive(Debug, Clone)]
struct Node {
    point: Vec2,
    num_points: u32,
    kind: NodeKind,
    /// Cluster this node was merged into on the next lower zoom.
    parent: Option<ClusterId>,
}

#[derive(Debug, Clone, Default)]
struct Level {
    nodes: Vec<Node>,
    tree: KdTree,
}

impl Level {
    fn new(nodes: Vec<Node>) -> Self {
        let points: Vec<Vec2> = nodes.iter().map(|n| n.point).collect();
        Self {
            tree: KdTree::build(&points),
            nodes,
        }
    }
}

/// Queryable clustering index over one station snapshot.
///
/// One level per integer zoom in `min_zoom..=max_zoom + 1`; the top level
/// holds the raw stations and each lower level greedily merges the level
/// above it within `radius` pixels.
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    options: ClusterOptions,
    stations: Vec<StationRecord>,
    /// `levels[z - min_zoom]`.
    levels: Vec<Level>,
    /// Where each cluster lives: (level, node).
    clusters: HashMap<ClusterId, (usize, usize)>,
}

impl SpatialIndex {
    /// Builds the index. Callers pass installed stations only; records with
    /// non-finite coordinates are skipped.
    pub fn build(stations: Vec<StationRecord>, options: ClusterOptions) -> Self {
        let options = options.sanitized();
        let stations: Vec<StationRecord> = stations
            .into_iter()
            .filter(|s| s.coordinates().is_finite())
            .collect();
        let total = stations.len() as u64;

        let leaves: Vec<Node> = stations
            .iter()
            .enumerate()
            .map(|(i, s)| Node {
                point: project(s.coordinates()),
                num_points: 1,
                kind: NodeKind::Station(i as u32),
                parent: None,
            })
            .collect();

        // Built top-down, reversed at the end so index == zoom - min_zoom.
        let mut built: Vec<Level> = vec![Level::new(leaves)];
        for zoom in (options.min_zoom..=options.max_zoom).rev() {
            let Some(above) = built.last_mut() else {
                break;
            };
            let nodes = cluster_level(above, zoom, &options, total);
            built.push(Level::new(nodes));
        }
        built.reverse();

        let mut clusters = HashMap::new();
        for (li, level) in built.iter().enumerate() {
            for (ni, node) in level.nodes.iter().enumerate() {
                // Unmerged clusters are copied down to lower zooms; keep the
                // highest level, which is where the cluster was formed.
                if let NodeKind::Cluster(id) = node.kind {
                    clusters.insert(id, (li, ni));
                }
            }
        }

        debug!(
            stations = stations.len(),
            clusters = clusters.len(),
            levels = built.len(),
            "spatial index built"
        );

        Self {
            options,
            stations,
            levels: built,
            clusters,
        }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Clusters and points visible in `bbox` at integer `zoom`.
    ///
    /// Never fails: empty indexes and non-finite bounds yield an empty list.
    pub fn query(&self, bbox: &LngLatBounds, zoom: i32) -> Vec<ClusterFeature> {
        if self.stations.is_empty() || !bbox.is_finite() {
            return Vec::new();
        }

        let mut west = ((bbox.west + 180.0).rem_euclid(360.0)) - 180.0;
        let mut east = ((bbox.east + 180.0).rem_euclid(360.0)) - 180.0;
        let south = bbox.south.clamp(-90.0, 90.0);
        let north = bbox.north.clamp(-90.0, 90.0);
        if bbox.east - bbox.west >= 360.0 {
            west = -180.0;
            east = 180.0;
        } else if bbox.east == 180.0 {
            east = 180.0;
        }
        if south > north {
            return Vec::new();
        }

        if west > east {
            let west_half = LngLatBounds::new(west, south, 180.0, north);
            let east_half = LngLatBounds::new(-180.0, south, east, north);
            let mut out = self.query(&west_half, zoom);
            out.extend(self.query(&east_half, zoom));
            return out;
        }

        let level = self.level_for_zoom(zoom);
        let min = project(LngLat::new(west, north));
        let max = project(LngLat::new(east, south));
        level
            .tree
            .range(min, max)
            .into_iter()
            .filter_map(|i| self.feature(&level.nodes[i as usize]))
            .collect()
    }

    /// Zoom at which `id` first splits into more than one child.
    ///
    /// Returns `None` for ids this index does not know.
    pub fn expansion_zoom(&self, id: ClusterId) -> Option<u8> {
        let (level, _) = *self.clusters.get(&id)?;
        let mut zoom = self.zoom_of_level(level);
        let mut current = id;
        while zoom <= self.options.max_zoom {
            let children = self.child_nodes(current)?;
            zoom += 1;
            match children.as_slice() {
                [only] => match only.kind {
                    NodeKind::Cluster(next) => current = next,
                    NodeKind::Station(_) => break,
                },
                _ => break,
            }
        }
        Some(zoom)
    }

    /// Aggregate coordinate and size of a cluster.
    pub fn cluster(&self, id: ClusterId) -> Option<(LngLat, u32)> {
        let (li, ni) = *self.clusters.get(&id)?;
        let node = &self.levels[li].nodes[ni];
        Some((unproject(node.point), node.num_points))
    }

    /// Immediate children of a cluster, one zoom level up.
    pub fn children(&self, id: ClusterId) -> Option<Vec<ClusterFeature>> {
        let nodes = self.child_nodes(id)?;
        Some(nodes.into_iter().filter_map(|n| self.feature(n)).collect())
    }

    /// Up to `limit` stations contained in a cluster, in index order.
    pub fn leaves(&self, id: ClusterId, limit: usize) -> Vec<StationRecord> {
        let mut out = Vec::new();
        self.collect_leaves(id, limit, &mut out);
        out
    }

    fn collect_leaves(&self, id: ClusterId, limit: usize, out: &mut Vec<StationRecord>) {
        let Some(children) = self.child_nodes(id) else {
            return;
        };
        for child in children {
            if out.len() >= limit {
                return;
            }
            match child.kind {
                NodeKind::Station(i) => out.push(self.stations[i as usize].clone()),
                NodeKind::Cluster(next) => self.collect_leaves(next, limit, out),
            }
        }
    }

    fn child_nodes(&self, id: ClusterId) -> Option<Vec<&Node>> {
        let (li, ni) = *self.clusters.get(&id)?;
        let cluster = &self.levels[li].nodes[ni];
        // Children live one level up; the seed sits at the cluster's origin.
        let child_level = self.levels.get(li + 1)?;
        let zoom = self.zoom_of_level(li);
        let r = self.radius_at(zoom);
        let seed = decode_seed(id, self.stations.len() as u64)?;
        let origin = child_level.nodes.get(seed)?.point;
        let children: Vec<&Node> = child_level
            .tree
            .within(origin, r)
            .into_iter()
            .map(|i| &child_level.nodes[i as usize])
            .filter(|n| n.parent == Some(id))
            .collect();
        debug_assert_eq!(
            children.iter().map(|n| n.num_points).sum::<u32>(),
            cluster.num_points
        );
        if children.is_empty() {
            None
        } else {
            Some(children)
        }
    }

    fn feature(&self, node: &Node) -> Option<ClusterFeature> {
        match node.kind {
            NodeKind::Station(i) => Some(ClusterFeature::Point {
                station: self.stations.get(i as usize)?.clone(),
            }),
            NodeKind::Cluster(id) => Some(ClusterFeature::Cluster {
                id,
                coordinates: unproject(node.point),
                point_count: node.num_points,
                expansion_zoom: self
                    .expansion_zoom(id)
                    .unwrap_or(self.options.max_zoom + 1),
            }),
        }
    }

    fn level_for_zoom(&self, zoom: i32) -> &Level {
        let min = self.options.min_zoom as i32;
        let max = self.options.max_zoom as i32 + 1;
        let z = zoom.clamp(min, max);
        &self.levels[(z - min) as usize]
    }

    fn zoom_of_level(&self, level: usize) -> u8 {
        self.options.min_zoom + level as u8
    }

    fn radius_at(&self, zoom: u8) -> f64 {
        self.options.radius / (self.options.extent * 2f64.powi(zoom as i32))
    }
}

fn encode_id(seed: usize, zoom: u8, total: u64) -> ClusterId {
    ClusterId(((seed as u64) << 5) + (zoom as u64 + 1) + total)
}

fn decode_seed(id: ClusterId, total: u64) -> Option<usize> {
    let raw = id.0.checked_sub(total)?;
    Some((raw >> 5) as usize)
}

/// Greedily merges the nodes of `above` (zoom + 1) into the nodes of `zoom`.
///
/// Nodes absorbed into a cluster get their `parent` set so the hierarchy can
/// be walked back up later.
fn cluster_level(above: &mut Level, zoom: u8, options: &ClusterOptions, total: u64) -> Vec<Node> {
    let r = options.radius / (options.extent * 2f64.powi(zoom as i32));
    let mut visited = vec![false; above.nodes.len()];
    let mut out = Vec::new();

    for i in 0..above.nodes.len() {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let seed = above.nodes[i].point;
        let seed_points = above.nodes[i].num_points;
        let neighbors = above.tree.within(seed, r);

        let mut count = seed_points;
        for &j in &neighbors {
            if !visited[j as usize] {
                count += above.nodes[j as usize].num_points;
            }
        }

        if count > seed_points && count >= options.min_points {
            let id = encode_id(i, zoom, total);
            let mut weighted = seed * seed_points as f64;
            for &j in &neighbors {
                let j = j as usize;
                if visited[j] {
                    continue;
                }
                visited[j] = true;
                let n = &mut above.nodes[j];
                weighted = weighted + n.point * n.num_points as f64;
                n.parent = Some(id);
            }
            above.nodes[i].parent = Some(id);
            out.push(Node {
                point: weighted * (1.0 / count as f64),
                num_points: count,
                kind: NodeKind::Cluster(id),
                parent: None,
            });
        } else {
            out.push(Node {
                parent: None,
                ..above.nodes[i].clone()
            });
            if count > 1 {
                for &j in &neighbors {
                    let j = j as usize;
                    if visited[j] {
                        continue;
                    }
                    visited[j] = true;
                    out.push(Node {
                        parent: None,
                        ..above.nodes[j].clone()
                    });
                }
            }
        }
    }

    out
}
