//! Nearest-neighbor queries over a [`SpatialIndex`].
//!
//! Best-first search: a min-priority queue holds tree nodes keyed by the
//! squared distance from the query point to their bounding box, and
//! points keyed by their exact squared distance. The box distance never
//! exceeds the distance to anything inside the box, so when a point
//! reaches the front of the queue nothing still queued can be closer,
//! and the point is accepted immediately.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::spatial::{Item, Node, SpatialIndex};
use crate::types::Point;

/// A queued node or point.
enum Candidate<'a> {
    Node(&'a Node),
    Item(Item),
}

struct Queued<'a> {
    distance_sq: f64,
    candidate: Candidate<'a>,
}

impl Queued<'_> {
    /// Tie-break among equal distances already queued: points before
    /// nodes, then lower ids first.
    const fn rank(&self) -> (u8, usize) {
        match self.candidate {
            Candidate::Item(item) => (0, item.id),
            Candidate::Node(_) => (1, 0),
        }
    }
}

impl Ord for Queued<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the greatest element; invert so the nearest wins.
        other
            .distance_sq
            .total_cmp(&self.distance_sq)
            .then_with(|| other.rank().cmp(&self.rank()))
    }
}

impl PartialOrd for Queued<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Queued<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Queued<'_> {}

/// The ids of the `k` points nearest to `point`, closest first.
///
/// Returns fewer than `k` ids when the index holds fewer than `k` points.
/// Points at exactly the same distance come out in tree traversal order,
/// which is deterministic but otherwise unspecified.
#[must_use]
pub fn nearest(index: &SpatialIndex, point: Point, k: usize) -> Vec<usize> {
    nearest_filtered(index, point, k, None, |_| true)
}

/// The id of the single point nearest to `point`, if the index is not
/// empty.
#[must_use]
pub fn nearest_one(index: &SpatialIndex, point: Point) -> Option<usize> {
    nearest(index, point, 1).first().copied()
}

/// Like [`nearest`], but only ids accepted by `predicate` are returned,
/// and, when `max_distance` is given, only points no farther than
/// `max_distance` from `point`.
///
/// Subtrees whose bounding box lies beyond `max_distance` are never
/// visited. A negative or NaN `max_distance` matches nothing.
#[must_use]
pub fn nearest_filtered<P>(
    index: &SpatialIndex,
    point: Point,
    k: usize,
    max_distance: Option<f64>,
    mut predicate: P,
) -> Vec<usize>
where
    P: FnMut(usize) -> bool,
{
    let mut found = Vec::with_capacity(k.min(index.len()));
    if k == 0 || index.is_empty() {
        return found;
    }
    let limit_sq = match max_distance {
        None => f64::INFINITY,
        Some(d) if d >= 0.0 => d * d,
        Some(_) => return found,
    };

    let mut queue = BinaryHeap::new();
    let root = index.root();
    let root_distance = root.bounds().distance_squared(point);
    if root_distance <= limit_sq {
        queue.push(Queued {
            distance_sq: root_distance,
            candidate: Candidate::Node(root),
        });
    }

    while let Some(Queued { candidate, .. }) = queue.pop() {
        match candidate {
            Candidate::Item(item) => {
                if predicate(item.id) {
                    found.push(item.id);
                    if found.len() == k {
                        break;
                    }
                }
            }
            Candidate::Node(Node::Leaf { items, .. }) => {
                for &item in items {
                    let distance_sq = item.point.distance_squared(point);
                    if distance_sq <= limit_sq {
                        queue.push(Queued {
                            distance_sq,
                            candidate: Candidate::Item(item),
                        });
                    }
                }
            }
            Candidate::Node(Node::Branch { children, .. }) => {
                for child in children {
                    let distance_sq = child.bounds().distance_squared(point);
                    if distance_sq <= limit_sq {
                        queue.push(Queued {
                            distance_sq,
                            candidate: Candidate::Node(child),
                        });
                    }
                }
            }
        }
    }

    found
}
