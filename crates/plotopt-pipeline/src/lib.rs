//! plotopt-pipeline: Path post-processing for pen plotters (sans-IO).
//!
//! Takes a collection of polylines, each one pen-down stroke, and reduces
//! the time a plotter spends moving with the pen up:
//! merge -> elide short paths -> greedy nearest-endpoint reorder.
//!
//! The reorder stage runs on a dynamic bounding-box tree
//! ([`spatial::SpatialIndex`]) queried by best-first nearest-neighbor
//! search ([`knn`]), so each step finds the closest remaining endpoint
//! without scanning every path.
//!
//! This crate has **no I/O dependencies**. Parsing drawings and talking
//! to hardware belong to the caller.

pub mod diagnostics;
pub mod filter;
pub mod knn;
pub mod merge;
pub mod reorder;
pub mod spatial;
pub mod types;

use serde::{Deserialize, Serialize};

pub use diagnostics::{
    OptimizeDiagnostics, OptimizeSummary, StageDiagnostics, StageMetrics, total_length,
    travel_distance,
};
pub use filter::elide_shorter_than;
pub use merge::{DEFAULT_MERGE_TOLERANCE, merge};
pub use reorder::reorder;
pub use spatial::{Bounds, SpatialIndex};
pub use types::{OptimizeConfig, OptimizeError, Point, Polyline};

/// Result of a full [`optimize`] run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeResult {
    /// The optimized paths, in plotting order.
    pub paths: Vec<Polyline>,
    /// Timing and counts for each stage.
    pub diagnostics: OptimizeDiagnostics,
}

/// Run every enabled optimization stage over `paths`.
///
/// # Pipeline steps
///
/// 1. Merge paths whose end touches the next path's start (if
///    `config.merge`)
/// 2. Elide paths shorter than `config.minimum_path_length` (if it is
///    greater than zero)
/// 3. Reorder paths to minimize pen-up travel (if `config.reorder`)
///
/// With every stage switched off the input is returned unchanged.
///
/// # Errors
///
/// Returns [`OptimizeError::InvalidConfig`] if the configuration fails
/// [`OptimizeConfig::validate`].
/// Returns [`OptimizeError::EmptyPath`] if any path has no points.
/// Returns [`OptimizeError::NonFiniteCoordinate`] if any coordinate is
/// NaN or infinite.
pub fn optimize(
    paths: &[Polyline],
    config: &OptimizeConfig,
) -> Result<OptimizeResult, OptimizeError> {
    config.validate()?;
    types::validate_paths(paths)?;

    let total_start = web_time::Instant::now();
    let input_travel = travel_distance(paths);
    let mut current = paths.to_vec();

    // 1. Merge.
    let merge_diag = if config.merge {
        let start = web_time::Instant::now();
        let merged = merge::merge(&current, config.merge_tolerance)?;
        let diag = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Merge {
                tolerance: config.merge_tolerance,
                paths_before: current.len(),
                paths_after: merged.len(),
                points_before: diagnostics::total_points(&current),
                points_after: diagnostics::total_points(&merged),
            },
        };
        current = merged;
        Some(diag)
    } else {
        None
    };

    // 2. Filter.
    let filter_diag = if config.minimum_path_length > 0.0 {
        let start = web_time::Instant::now();
        let kept = filter::elide_shorter_than(&current, config.minimum_path_length)?;
        let diag = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Filter {
                minimum_length: config.minimum_path_length,
                paths_before: current.len(),
                paths_after: kept.len(),
                length_elided: total_length(&current) - total_length(&kept),
            },
        };
        current = kept;
        Some(diag)
    } else {
        None
    };

    // 3. Reorder.
    let reorder_diag = if config.reorder {
        let start = web_time::Instant::now();
        let ordered = reorder::reorder(&current)?;
        let diag = StageDiagnostics {
            duration: start.elapsed(),
            metrics: StageMetrics::Reorder {
                path_count: ordered.len(),
                travel_before: travel_distance(&current),
                travel_after: travel_distance(&ordered),
            },
        };
        current = ordered;
        Some(diag)
    } else {
        None
    };

    let summary = OptimizeSummary {
        input_path_count: paths.len(),
        output_path_count: current.len(),
        input_point_count: diagnostics::total_points(paths),
        output_point_count: diagnostics::total_points(&current),
        input_travel,
        output_travel: travel_distance(&current),
    };

    tracing::debug!(
        paths_before = summary.input_path_count,
        paths_after = summary.output_path_count,
        travel_before = summary.input_travel,
        travel_after = summary.output_travel,
        "optimized paths"
    );

    Ok(OptimizeResult {
        paths: current,
        diagnostics: OptimizeDiagnostics {
            merge: merge_diag,
            filter: filter_diag,
            reorder: reorder_diag,
            total_duration: total_start.elapsed(),
            summary,
        },
    })
}
