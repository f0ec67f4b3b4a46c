//! Path filtering: drop paths too short to be worth a pen lift.
//!
//! Rasterized or traced artwork tends to contain specks and stubs that
//! add travel time without adding anything visible.

use crate::types::{OptimizeError, Polyline, check_non_negative, validate_paths};

/// Keep only the paths whose total length is at least `minimum_length`.
///
/// The boundary is inclusive: a path exactly `minimum_length` long
/// survives. Single-point paths have length zero. Order is preserved and
/// surviving paths are returned unchanged.
///
/// # Errors
///
/// Returns [`OptimizeError::InvalidConfig`] for a negative or non-finite
/// minimum length, and [`OptimizeError::EmptyPath`] or
/// [`OptimizeError::NonFiniteCoordinate`] for malformed paths.
pub fn elide_shorter_than(
    paths: &[Polyline],
    minimum_length: f64,
) -> Result<Vec<Polyline>, OptimizeError> {
    check_non_negative("minimum path length", minimum_length)?;
    validate_paths(paths)?;

    let kept: Vec<Polyline> = paths
        .iter()
        .filter(|path| path.length() >= minimum_length)
        .cloned()
        .collect();

    tracing::debug!(
        minimum_length,
        paths_before = paths.len(),
        paths_after = kept.len(),
        "elided short paths"
    );

    Ok(kept)
}
