//! Optimizer diagnostics: timing, counts, and travel for each stage.
//!
//! Every call to [`optimize`](crate::optimize) collects diagnostics
//! alongside the optimized paths, so callers can see how much pen-up
//! travel each stage saved and where the time went.
//!
//! Duration measurements use [`std::time::Duration`] (platform-agnostic).
//! Timestamps are captured internally via the `web-time` crate, which
//! uses `performance.now()` on WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::Polyline;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single [`optimize`](crate::optimize) run.
///
/// Stages that were switched off in the configuration are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeDiagnostics {
    /// Merge of adjacent paths.
    pub merge: Option<StageDiagnostics>,
    /// Elision of short paths.
    pub filter: Option<StageDiagnostics>,
    /// Greedy reordering.
    pub reorder: Option<StageDiagnostics>,
    /// Total wall-clock duration of the whole run (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Before/after totals across all stages.
    pub summary: OptimizeSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Merge metrics.
    Merge {
        /// Join tolerance used.
        tolerance: f64,
        /// Number of paths before merging.
        paths_before: usize,
        /// Number of paths after merging.
        paths_after: usize,
        /// Total points before merging.
        points_before: usize,
        /// Total points after merging (seam points are dropped).
        points_after: usize,
    },
    /// Filter metrics.
    Filter {
        /// Minimum path length used.
        minimum_length: f64,
        /// Number of paths before filtering.
        paths_before: usize,
        /// Number of paths after filtering.
        paths_after: usize,
        /// Total pen-down length removed.
        length_elided: f64,
    },
    /// Reorder metrics.
    Reorder {
        /// Number of paths sequenced.
        path_count: usize,
        /// Pen-up travel in input order.
        travel_before: f64,
        /// Pen-up travel in output order.
        travel_after: f64,
    },
}

/// High-level totals for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeSummary {
    /// Number of input paths.
    pub input_path_count: usize,
    /// Number of output paths.
    pub output_path_count: usize,
    /// Total points across the input.
    pub input_point_count: usize,
    /// Total points across the output.
    pub output_point_count: usize,
    /// Pen-up travel of the input order.
    pub input_travel: f64,
    /// Pen-up travel of the output order.
    pub output_travel: f64,
}

impl OptimizeDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Optimize Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<12} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        let stages = [
            ("Merge", &self.merge),
            ("Filter", &self.filter),
            ("Reorder", &self.reorder),
        ];
        for (name, diag) in stages {
            let Some(diag) = diag else {
                lines.push(format!("{name:<12} {:>10} {:>10}  skipped", "-", "-"));
                continue;
            };
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<12} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        let s = &self.summary;
        lines.push(String::new());
        lines.push(format!(
            "Paths: {} -> {}  |  Points: {} -> {}  |  Pen-up travel: {:.2} -> {:.2}",
            s.input_path_count,
            s.output_path_count,
            s.input_point_count,
            s.output_point_count,
            s.input_travel,
            s.output_travel,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Merge {
            tolerance,
            paths_before,
            paths_after,
            points_before,
            points_after,
        } => format!(
            "tol={tolerance:.2} {paths_before}->{paths_after} paths, {points_before}->{points_after} pts",
        ),
        StageMetrics::Filter {
            minimum_length,
            paths_before,
            paths_after,
            length_elided,
        } => format!(
            "min={minimum_length:.2} {paths_before}->{paths_after} paths, {length_elided:.2} length elided",
        ),
        StageMetrics::Reorder {
            path_count,
            travel_before,
            travel_after,
        } => {
            let saved = if *travel_before > 0.0 {
                (1.0 - travel_after / travel_before) * 100.0
            } else {
                0.0
            };
            format!(
                "{path_count} paths, travel {travel_before:.2}->{travel_after:.2} ({saved:.1}% saved)",
            )
        }
    }
}

/// Total pen-up distance: the sum of gaps from the end of each path to
/// the start of the next.
///
/// Empty paths contribute nothing.
#[must_use]
pub fn travel_distance(paths: &[Polyline]) -> f64 {
    paths
        .windows(2)
        .filter_map(|pair| Some(pair[0].last()?.distance(*pair[1].first()?)))
        .sum()
}

/// Total pen-down distance: the sum of all path lengths.
#[must_use]
pub fn total_length(paths: &[Polyline]) -> f64 {
    paths.iter().map(Polyline::length).sum()
}

/// Total points across a slice of polylines.
pub(crate) fn total_points(polylines: &[Polyline]) -> usize {
    polylines.iter().map(Polyline::len).sum()
}
