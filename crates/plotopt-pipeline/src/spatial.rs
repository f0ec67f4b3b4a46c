//! Spatial index: a bulk-loaded bounding-box tree over 2D points.
//!
//! The index is built once from a fixed set of `(id, point)` pairs and
//! then only shrinks. Leaves hold the points themselves; every node
//! carries the bounding box of everything beneath it, which is what lets
//! [`knn`](crate::knn) prune whole subtrees during nearest-neighbor search.
//!
//! Construction uses sort-tile-recursive packing: points are sorted by x
//! into vertical slabs, each slab is sorted by y, and consecutive runs
//! become child subtrees. Removal walks only the subtrees whose bounds
//! contain the removed point, prunes nodes that become empty, and
//! tightens bounding boxes on the way back up. There is no rebalancing;
//! removal can only make boxes smaller, so search stays correct.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::types::Point;

/// Maximum number of children (or points, for a leaf) per node.
pub const MAX_NODE_ENTRIES: usize = 9;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Smallest x coordinate covered.
    pub min_x: f64,
    /// Smallest y coordinate covered.
    pub min_y: f64,
    /// Largest x coordinate covered.
    pub max_x: f64,
    /// Largest y coordinate covered.
    pub max_y: f64,
}

impl Bounds {
    /// The box that covers nothing; the identity for [`union`](Self::union).
    pub const EMPTY: Self = Self {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// The degenerate box `[x, x] x [y, y]`.
    #[must_use]
    pub const fn from_point(p: Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Smallest box covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Returns `true` if the box covers no points.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Returns `true` if `p` lies inside or on the edge of the box.
    #[must_use]
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Squared distance from `p` to the nearest point of the box.
    ///
    /// Zero when `p` is inside. Never larger than the squared distance
    /// from `p` to any point the box covers, so it is a valid lower bound
    /// for best-first search. Infinite for [`EMPTY`](Self::EMPTY).
    #[must_use]
    pub fn distance_squared(self, p: Point) -> f64 {
        let dx = axis_gap(p.x, self.min_x, self.max_x);
        let dy = axis_gap(p.y, self.min_y, self.max_y);
        dx.mul_add(dx, dy * dy)
    }
}

/// Distance from `k` to the interval `[min, max]` along one axis.
fn axis_gap(k: f64, min: f64, max: f64) -> f64 {
    if k < min {
        min - k
    } else if k > max {
        k - max
    } else {
        0.0
    }
}

/// A point stored in a leaf, tagged with its caller-assigned id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Item {
    pub id: usize,
    pub point: Point,
}

/// A node of the bounding-box tree.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf { bounds: Bounds, items: Vec<Item> },
    Branch { bounds: Bounds, children: Vec<Self> },
}

impl Node {
    fn leaf(items: Vec<Item>) -> Self {
        Self::Leaf {
            bounds: bounds_of_items(&items),
            items,
        }
    }

    fn branch(children: Vec<Self>) -> Self {
        Self::Branch {
            bounds: bounds_of_children(&children),
            children,
        }
    }

    pub(crate) const fn bounds(&self) -> Bounds {
        match self {
            Self::Leaf { bounds, .. } | Self::Branch { bounds, .. } => *bounds,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Leaf { items, .. } => items.is_empty(),
            Self::Branch { children, .. } => children.is_empty(),
        }
    }

    /// Remove `id`, located at `point`, from this subtree.
    ///
    /// Returns `true` if the item was found. Emptied children are pruned
    /// and bounds are recomputed along the path that held the item.
    fn remove(&mut self, id: usize, point: Point) -> bool {
        if !self.bounds().contains(point) {
            return false;
        }
        match self {
            Self::Leaf { bounds, items } => {
                let Some(pos) = items.iter().position(|item| item.id == id) else {
                    return false;
                };
                items.remove(pos);
                *bounds = bounds_of_items(items);
                true
            }
            Self::Branch { bounds, children } => {
                let Some(pos) = children
                    .iter_mut()
                    .position(|child| child.remove(id, point))
                else {
                    return false;
                };
                if children[pos].is_empty() {
                    children.remove(pos);
                }
                *bounds = bounds_of_children(children);
                true
            }
        }
    }
}

fn bounds_of_items(items: &[Item]) -> Bounds {
    items
        .iter()
        .fold(Bounds::EMPTY, |b, item| b.union(Bounds::from_point(item.point)))
}

fn bounds_of_children(children: &[Node]) -> Bounds {
    children
        .iter()
        .fold(Bounds::EMPTY, |b, child| b.union(child.bounds()))
}

/// Height of the shallowest full tree that can hold `count` items.
fn tree_height(count: usize) -> u32 {
    let mut height = 1;
    let mut capacity = MAX_NODE_ENTRIES;
    while capacity < count {
        capacity = capacity.saturating_mul(MAX_NODE_ENTRIES);
        height += 1;
    }
    height
}

/// Smallest integer whose square is at least `n`.
const fn ceil_sqrt(n: usize) -> usize {
    let root = n.isqrt();
    if root * root < n { root + 1 } else { root }
}

/// Sort-tile-recursive packing of `items` into a subtree.
fn pack(items: &mut [Item]) -> Node {
    if items.len() <= MAX_NODE_ENTRIES {
        return Node::leaf(items.to_vec());
    }

    let subtree_capacity = MAX_NODE_ENTRIES.pow(tree_height(items.len()) - 1);
    let child_count = items.len().div_ceil(subtree_capacity);
    let per_child = items.len().div_ceil(child_count);
    let per_slab = per_child * ceil_sqrt(child_count);

    items.sort_unstable_by(|a, b| a.point.x.total_cmp(&b.point.x));

    let mut children = Vec::with_capacity(child_count);
    for slab in items.chunks_mut(per_slab) {
        slab.sort_unstable_by(|a, b| a.point.y.total_cmp(&b.point.y));
        for group in slab.chunks_mut(per_child) {
            children.push(pack(group));
        }
    }

    Node::branch(children)
}

/// A shrinking set of 2D points keyed by integer id.
///
/// Coordinates must be finite; the path transforms validate their input
/// before building an index.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    root: Node,
    live: HashMap<usize, Point>,
}

impl SpatialIndex {
    /// Bulk-load an index over `ids`, looking up each id's position with
    /// `coordinate_of`.
    ///
    /// Runs in O(n log n). An id that appears more than once is indexed
    /// at its first occurrence only.
    #[must_use]
    pub fn build<I, F>(ids: I, mut coordinate_of: F) -> Self
    where
        I: IntoIterator<Item = usize>,
        F: FnMut(usize) -> Point,
    {
        let mut live = HashMap::new();
        let mut items = Vec::new();
        for id in ids {
            if let Entry::Vacant(slot) = live.entry(id) {
                let point = coordinate_of(id);
                slot.insert(point);
                items.push(Item { id, point });
            }
        }

        Self {
            root: pack(&mut items),
            live,
        }
    }

    /// Remove `id` from the index.
    ///
    /// Returns `false` and leaves the index untouched if `id` is not
    /// present.
    pub fn remove(&mut self, id: usize) -> bool {
        let Some(point) = self.live.remove(&id) else {
            return false;
        };
        let removed = self.root.remove(id, point);

        // Collapse single-child roots so searches start below them.
        loop {
            let only_child = match &mut self.root {
                Node::Branch { children, .. } if children.len() == 1 => children.pop(),
                _ => None,
            };
            let Some(child) = only_child else {
                break;
            };
            self.root = child;
        }
        if self.root.is_empty() {
            self.root = Node::leaf(Vec::new());
        }

        removed
    }

    /// Number of ids currently in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if every id has been removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Returns `true` if `id` is currently in the index.
    #[must_use]
    pub fn contains(&self, id: usize) -> bool {
        self.live.contains_key(&id)
    }

    /// Position of `id`, if it is currently in the index.
    #[must_use]
    pub fn point(&self, id: usize) -> Option<Point> {
        self.live.get(&id).copied()
    }

    /// Bounding box of every point still in the index.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        self.root.bounds()
    }

    pub(crate) const fn root(&self) -> &Node {
        &self.root
    }
}
