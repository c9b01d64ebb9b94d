use foundation::Vec2;
use foundation::math::precision::stable_total_cmp_f64;

/// A deterministic static 2D tree over projected points.
///
/// Ordering contract:
/// - `range` and `within` return item indices in ascending order.
///
/// Items are identified by their position in the slice passed to `build`.
#[derive(Debug, Clone, Default)]
pub struct KdTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Rect {
    min: Vec2,
    max: Vec2,
}

impl Rect {
    fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    fn distance_sq_to(&self, p: Vec2) -> f64 {
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        dx * dx + dy * dy
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Rect,
        items: Vec<Item>,
    },
    Internal {
        bounds: Rect,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Item {
    index: u32,
    point: Vec2,
}

const LEAF_MAX: usize = 16;

impl KdTree {
    /// Builds the tree. Non-finite points are never returned by queries.
    pub fn build(points: &[Vec2]) -> Self {
        let mut items: Vec<Item> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_finite())
            .map(|(i, p)| Item {
                index: i as u32,
                point: *p,
            })
            .collect();
        let mut nodes = Vec::new();
        if !items.is_empty() {
            let _root = build_node(&mut nodes, &mut items);
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Items inside the axis-aligned box `[min, max]` (edges inclusive).
    pub fn range(&self, min: Vec2, max: Vec2) -> Vec<u32> {
        let query = Rect { min, max };
        self.collect(|bounds| bounds.intersects(&query), |p| query.contains(p))
    }

    /// Items within `radius` of `center` (inclusive).
    pub fn within(&self, center: Vec2, radius: f64) -> Vec<u32> {
        let r2 = radius * radius;
        self.collect(
            |bounds| bounds.distance_sq_to(center) <= r2,
            |p| p.distance_sq(center) <= r2,
        )
    }

    fn collect(&self, visit: impl Fn(&Rect) -> bool, accept: impl Fn(Vec2) -> bool) -> Vec<u32> {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<u32> = Vec::new();
        let mut stack: Vec<usize> = vec![0];

        while let Some(idx) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { bounds, items } => {
                    if !visit(bounds) {
                        continue;
                    }
                    hits.extend(items.iter().filter(|i| accept(i.point)).map(|i| i.index));
                }
                Node::Internal {
                    bounds,
                    left,
                    right,
                } => {
                    if !visit(bounds) {
                        continue;
                    }
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        hits.sort_unstable();
        hits
    }
}

fn build_node(nodes: &mut Vec<Node>, items: &mut [Item]) -> usize {
    let bounds = bounds_for_items(items);
    if items.len() <= LEAF_MAX {
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            bounds,
            items: items.to_vec(),
        });
        return idx;
    }

    let axis_x = bounds.max.x - bounds.min.x >= bounds.max.y - bounds.min.y;
    items.sort_by(|a, b| {
        let (ca, cb) = if axis_x {
            (a.point.x, b.point.x)
        } else {
            (a.point.y, b.point.y)
        };
        stable_total_cmp_f64(ca, cb).then_with(|| a.index.cmp(&b.index))
    });

    let mid = items.len() / 2;
    let (left_items, right_items) = items.split_at_mut(mid);

    let idx = nodes.len();
    // Placeholder; patched once both children exist.
    nodes.push(Node::Leaf {
        bounds,
        items: Vec::new(),
    });

    let left = build_node(nodes, left_items);
    let right = build_node(nodes, right_items);

    nodes[idx] = Node::Internal {
        bounds,
        left,
        right,
    };
    idx
}

fn bounds_for_items(items: &[Item]) -> Rect {
    let mut r = Rect {
        min: items[0].point,
        max: items[0].point,
    };
    for item in &items[1..] {
        r.min.x = r.min.x.min(item.point.x);
        r.min.y = r.min.y.min(item.point.y);
        r.max.x = r.max.x.max(item.point.x);
        r.max.y = r.max.y.max(item.point.y);
    }
    r
}
