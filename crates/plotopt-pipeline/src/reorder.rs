//! Path reordering: sequence and orient paths to cut pen-up travel.
//!
//! Greedy nearest-neighbor heuristic over path endpoints. Every path
//! contributes two endpoints to a [`SpatialIndex`]; starting from the end
//! of the first path, the nearest remaining endpoint picks the next path,
//! which is reversed when the match was its end. No backtracking, so the
//! tour is not optimal, but each step is a logarithmic-time query instead
//! of a scan over every remaining path.
//!
//! Endpoint ids are arithmetic: path `i` owns `2i` (start) and `2i + 1`
//! (end). Both ids of a path leave the index together.

use crate::knn;
use crate::spatial::SpatialIndex;
use crate::types::{OptimizeError, Point, Polyline, validate_paths};

/// Endpoint id of the start of path `path`.
const fn start_id(path: usize) -> usize {
    2 * path
}

/// Endpoint id of the end of path `path`.
const fn end_id(path: usize) -> usize {
    2 * path + 1
}

/// Index of the path that owns endpoint `id`.
const fn path_of(id: usize) -> usize {
    id / 2
}

/// Returns `true` if `id` is a path's start.
const fn is_start(id: usize) -> bool {
    id % 2 == 0
}

/// The other endpoint of the same path.
const fn partner(id: usize) -> usize {
    id ^ 1
}

/// Reorder and orient paths to reduce total pen-up travel.
///
/// The first path stays first and keeps its direction. After it, the
/// path whose start or end is nearest the current pen position comes
/// next, reversed if its end was the nearer match. The output is a
/// permutation of the input with some paths reversed.
///
/// When several endpoints are exactly equidistant, which one wins is
/// determined by the index's traversal order.
///
/// # Errors
///
/// Returns [`OptimizeError::EmptyPath`] or
/// [`OptimizeError::NonFiniteCoordinate`] for malformed paths.
pub fn reorder(paths: &[Polyline]) -> Result<Vec<Polyline>, OptimizeError> {
    validate_paths(paths)?;

    let endpoints: Vec<(Point, Point)> = paths.iter().filter_map(Polyline::endpoints).collect();
    let endpoint = |id: usize| {
        let (start, end) = endpoints[path_of(id)];
        if is_start(id) { start } else { end }
    };

    let Some((first, rest)) = paths.split_first() else {
        return Ok(Vec::new());
    };
    if rest.is_empty() {
        return Ok(vec![first.clone()]);
    }

    // The first path is placed up front, so only the others are searched.
    let mut index = SpatialIndex::build(start_id(1)..=end_id(paths.len() - 1), endpoint);

    let mut ordered = Vec::with_capacity(paths.len());
    ordered.push(first.clone());
    let mut cursor = endpoint(end_id(0));
    let mut reversed = 0usize;

    while let Some(id) = knn::nearest_one(&index, cursor) {
        let path = path_of(id);
        debug_assert_eq!(index.point(id), Some(endpoint(id)));
        debug_assert!(index.contains(partner(id)), "endpoint {id} lost its partner");
        index.remove(start_id(path));
        index.remove(end_id(path));

        if is_start(id) {
            ordered.push(paths[path].clone());
        } else {
            ordered.push(paths[path].reversed());
            reversed += 1;
        }
        cursor = endpoint(partner(id));
    }

    tracing::debug!(paths = ordered.len(), reversed, "reordered paths");

    Ok(ordered)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::diagnostics::travel_distance;

    fn line(points: &[(f64, f64)]) -> Polyline {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn endpoint_id_arithmetic() {
        assert_eq!(start_id(3), 6);
        assert_eq!(end_id(3), 7);
        assert_eq!(path_of(6), 3);
        assert_eq!(path_of(7), 3);
        assert!(is_start(6));
        assert!(!is_start(7));
        assert_eq!(partner(6), 7);
        assert_eq!(partner(7), 6);
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(reorder(&[]).unwrap().is_empty());
    }

    #[test]
    fn single_point_returned_unchanged() {
        let paths = vec![line(&[(0.0, 0.0)])];
        assert_eq!(reorder(&paths).unwrap(), paths);
    }

    #[test]
    fn single_path_returned_unchanged() {
        let paths = vec![line(&[(0.0, 0.0), (1.0, 0.0)])];
        assert_eq!(reorder(&paths).unwrap(), paths);
    }

    #[test]
    fn reverses_a_line() {
        // After the first path the pen sits at (10, 0), nearer the second
        // path's end than its start.
        let paths = vec![
            line(&[(0.0, 0.0), (10.0, 0.0)]),
            line(&[(0.0, 1.0), (10.0, 1.0)]),
        ];
        assert_eq!(
            reorder(&paths).unwrap(),
            vec![
                line(&[(0.0, 0.0), (10.0, 0.0)]),
                line(&[(10.0, 1.0), (0.0, 1.0)]),
            ]
        );
    }

    #[test]
    fn reorders_lines() {
        let paths = vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(2.0, 0.0), (3.0, 0.0)]),
            line(&[(1.0, 0.0), (2.0, 0.0)]),
        ];
        assert_eq!(
            reorder(&paths).unwrap(),
            vec![
                line(&[(0.0, 0.0), (1.0, 0.0)]),
                line(&[(1.0, 0.0), (2.0, 0.0)]),
                line(&[(2.0, 0.0), (3.0, 0.0)]),
            ]
        );
    }

    #[test]
    fn nearer_path_visited_first() {
        // P0 ends at (0,0). P1 starts at (100, 100). P2 starts at (1, 1).
        let p0 = line(&[(0.0, 0.0)]);
        let p1 = line(&[(100.0, 100.0), (101.0, 100.0)]);
        let p2 = line(&[(1.0, 1.0), (2.0, 1.0)]);

        let result = reorder(&[p0.clone(), p1.clone(), p2.clone()]).unwrap();
        assert_eq!(result, vec![p0, p2, p1]);
    }

    #[test]
    fn first_path_never_moves_or_flips() {
        // The first path's start is far from everything; it still leads.
        let paths = vec![
            line(&[(500.0, 500.0), (0.0, 0.0)]),
            line(&[(1.0, 0.0), (2.0, 0.0)]),
        ];
        let result = reorder(&paths).unwrap();
        assert_eq!(result[0], paths[0]);
    }

    #[test]
    fn point_paths_are_consumed_once() {
        let paths = vec![
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(5.0, 0.0)]),
            line(&[(2.0, 0.0)]),
            line(&[(3.0, 0.0)]),
        ];
        assert_eq!(
            reorder(&paths).unwrap(),
            vec![
                line(&[(0.0, 0.0), (1.0, 0.0)]),
                line(&[(2.0, 0.0)]),
                line(&[(3.0, 0.0)]),
                line(&[(5.0, 0.0)]),
            ]
        );
    }

    #[test]
    fn cursor_follows_the_far_end_of_a_reversed_path() {
        // P1 is entered at its end (1, 5) and left at its start (1, 9);
        // P2 starts right there.
        let paths = vec![
            line(&[(0.0, 0.0), (0.0, 5.0)]),
            line(&[(1.0, 9.0), (1.0, 5.0)]),
            line(&[(1.0, 9.5), (1.0, 20.0)]),
            line(&[(3.0, 5.0), (3.0, 6.0)]),
        ];
        let result = reorder(&paths).unwrap();
        assert_eq!(result[1], paths[1].reversed());
        assert_eq!(result[2], paths[2]);
        assert_eq!(result[3], paths[3].reversed());
    }

    #[test]
    fn rejects_empty_path() {
        let paths = vec![line(&[(0.0, 0.0)]), line(&[(1.0, 0.0)]), Polyline::default()];
        assert_eq!(reorder(&paths), Err(OptimizeError::EmptyPath { index: 2 }));
    }

    #[test]
    fn rejects_nan() {
        let paths = vec![line(&[(0.0, 0.0)]), line(&[(f64::NAN, 0.0)])];
        assert_eq!(
            reorder(&paths),
            Err(OptimizeError::NonFiniteCoordinate { path: 1, point: 0 })
        );
    }

    #[test]
    fn preserves_all_paths() {
        let paths: Vec<Polyline> = (0..10)
            .map(|i| {
                let x = f64::from(i) * 10.0;
                line(&[(x, 0.0), (x + 1.0, 0.0)])
            })
            .collect();

        assert_eq!(reorder(&paths).unwrap().len(), 10);
    }

    #[test]
    fn total_travel_reduced_vs_original_order() {
        // Deliberately bad ordering: paths alternate between two clusters.
        let original = [
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(50.0, 0.0), (51.0, 0.0)]),
            line(&[(2.0, 0.0), (3.0, 0.0)]),
            line(&[(52.0, 0.0), (53.0, 0.0)]),
        ];
        let optimized = reorder(&original).unwrap();

        let travel_original = travel_distance(&original);
        let travel_optimized = travel_distance(&optimized);

        assert!(
            travel_optimized < travel_original,
            "expected optimized travel ({travel_optimized}) < original ({travel_original})",
        );
    }

    #[test]
    fn matches_a_linear_scan_greedy() {
        // Distinct distances everywhere, so the greedy choice is unique.
        let paths: Vec<Polyline> = (0..60_u32)
            .map(|i| {
                let t = f64::from(i);
                let start = Point::new((t * 7.13).rem_euclid(83.0), (t * 2.91).rem_euclid(47.0));
                let end = Point::new(start.x + (t * 0.37).sin(), start.y + (t * 0.53).cos());
                Polyline::new(vec![start, end])
            })
            .collect();

        let result = reorder(&paths).unwrap();
        assert_eq!(result, scan_greedy(&paths));
    }

    /// O(n²) reference: the same greedy rule with a linear scan.
    fn scan_greedy(paths: &[Polyline]) -> Vec<Polyline> {
        let mut remaining: Vec<usize> = (1..paths.len()).collect();
        let mut ordered = vec![paths[0].clone()];
        let mut cursor = *paths[0].last().unwrap();
        while !remaining.is_empty() {
            let mut best = (f64::INFINITY, 0, false);
            for (slot, &i) in remaining.iter().enumerate() {
                let (start, end) = paths[i].endpoints().unwrap();
                let ds = cursor.distance_squared(start);
                let de = cursor.distance_squared(end);
                if ds < best.0 {
                    best = (ds, slot, false);
                }
                if de < best.0 {
                    best = (de, slot, true);
                }
            }
            let i = remaining.remove(best.1);
            let next = if best.2 {
                paths[i].reversed()
            } else {
                paths[i].clone()
            };
            cursor = *next.last().unwrap();
            ordered.push(next);
        }
        ordered
    }

    mod properties {
        use proptest::prelude::*;

        use super::super::reorder;
        use crate::types::{Point, Polyline};

        fn arb_paths() -> impl Strategy<Value = Vec<Polyline>> {
            let point = (-25i32..25, -25i32..25)
                .prop_map(|(x, y)| Point::new(f64::from(x), f64::from(y)));
            prop::collection::vec(
                prop::collection::vec(point, 1..4).prop_map(Polyline::new),
                0..40,
            )
        }

        proptest! {
            #[test]
            fn reorder_is_a_permutation_up_to_reversal(paths in arb_paths()) {
                let result = reorder(&paths).unwrap();
                prop_assert_eq!(result.len(), paths.len());
                if let Some(first) = paths.first() {
                    prop_assert_eq!(&result[0], first);
                }

                let mut unused: Vec<&Polyline> = paths.iter().collect();
                for out in &result {
                    let reversed = out.reversed();
                    let pos = unused.iter().position(|p| *p == out || **p == reversed);
                    prop_assert!(pos.is_some(), "{:?} is not an input path", out);
                    if let Some(pos) = pos {
                        unused.swap_remove(pos);
                    }
                }
                prop_assert!(unused.is_empty());
            }

            #[test]
            fn each_step_takes_a_nearest_endpoint(paths in arb_paths()) {
                let result = reorder(&paths).unwrap();
                for (step, pair) in result.windows(2).enumerate() {
                    let cursor = *pair[0].last().unwrap();
                    let taken = cursor.distance_squared(*pair[1].first().unwrap());
                    // Nothing placed later could have been reached more cheaply.
                    for later in &result[step + 1..] {
                        let (start, end) = later.endpoints().unwrap();
                        prop_assert!(taken <= cursor.distance_squared(start));
                        prop_assert!(taken <= cursor.distance_squared(end));
                    }
                }
            }
        }
    }
}
