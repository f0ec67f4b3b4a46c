//! Path merging: fuse consecutive paths whose endpoints nearly touch.
//!
//! Vector exporters often split a single visual stroke into several
//! paths that meet end-to-start. Drawing them separately costs a pen lift
//! and a pen drop at every seam. Merging only looks at *adjacent* paths in
//! drawing order; it never reorders.

use crate::types::{OptimizeError, Point, Polyline, check_non_negative, validate_paths};

/// Default join distance for [`merge`].
pub const DEFAULT_MERGE_TOLERANCE: f64 = 0.5;

/// Join adjacent paths where one ends within `tolerance` of where the
/// next begins.
///
/// Paths are scanned left to right. When the start of the next path is
/// within `tolerance` of the last point of the current output path, the
/// next path's points are appended, minus any leading points that are
/// themselves within `tolerance` of the join point. If that run is the
/// whole path, its last point is still appended, so the following join
/// is measured from there. Otherwise the next path starts a new output
/// path.
///
/// With a tolerance of at least 0.1,
/// `[[(0, 0), (10, 0)], [(10.1, 0), (20, 0)]]` becomes
/// `[[(0, 0), (10, 0), (20, 0)]]`.
///
/// # Errors
///
/// Returns [`OptimizeError::InvalidConfig`] for a negative or non-finite
/// tolerance, and [`OptimizeError::EmptyPath`] or
/// [`OptimizeError::NonFiniteCoordinate`] for malformed paths.
pub fn merge(paths: &[Polyline], tolerance: f64) -> Result<Vec<Polyline>, OptimizeError> {
    check_non_negative("merge tolerance", tolerance)?;
    validate_paths(paths)?;

    let tolerance_sq = tolerance * tolerance;
    let mut merged: Vec<Vec<Point>> = Vec::with_capacity(paths.len());

    for path in paths {
        if let Some(current) = merged.last_mut()
            && let (Some(&join), Some(&start)) = (current.last(), path.first())
            && join.distance_squared(start) <= tolerance_sq
        {
            // A path lying wholly within tolerance of the join still
            // contributes its last point.
            let points = path.points();
            let skip = points
                .iter()
                .position(|p| join.distance_squared(*p) > tolerance_sq)
                .unwrap_or_else(|| points.len().saturating_sub(1));
            current.extend_from_slice(&points[skip..]);
        } else {
            merged.push(path.points().to_vec());
        }
    }

    tracing::debug!(
        tolerance,
        paths_before = paths.len(),
        paths_after = merged.len(),
        "merged adjacent paths"
    );

    Ok(merged.into_iter().map(Polyline::new).collect())
}
