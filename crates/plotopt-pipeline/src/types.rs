//! Shared types for the plotopt path pipeline.

use std::ops::Sub;

use serde::{Deserialize, Serialize};

/// A 2D point in drawing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared length of this point read as a vector from the origin.
    #[must_use]
    pub fn length_squared(self) -> f64 {
        self.x.mul_add(self.x, self.y * self.y)
    }

    /// Length of this point read as a vector from the origin.
    #[must_use]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        (self - other).length_squared()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Returns `true` if both coordinates are finite (neither NaN nor infinite).
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A directed sequence of connected points: one pen-down stroke.
///
/// Point order is the drawing direction. The container may hold zero
/// points, but every transform in this crate rejects such a path with
/// [`OptimizeError::EmptyPath`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns the `(start, end)` pair, if any.
    ///
    /// For a single-point polyline both entries are the same point.
    #[must_use]
    pub fn endpoints(&self) -> Option<(Point, Point)> {
        Some((*self.0.first()?, *self.0.last()?))
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polyline and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Total Euclidean length: the sum of all segment lengths.
    ///
    /// Zero for polylines with fewer than two points.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// A copy of this polyline traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self(self.0.iter().rev().copied().collect())
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self(points)
    }
}

impl FromIterator<Point> for Polyline {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Configuration for [`optimize`](crate::optimize).
///
/// Stages run in the fixed order merge -> filter -> reorder. Each stage
/// can be switched off independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizeConfig {
    /// Whether to join adjacent paths whose endpoints nearly touch.
    pub merge: bool,

    /// Maximum gap between the end of one path and the start of the
    /// next for the two to be merged.
    ///
    /// Must be finite and non-negative. Zero joins only exactly
    /// coincident endpoints.
    pub merge_tolerance: f64,

    /// Paths shorter than this total length are dropped.
    ///
    /// Must be finite and non-negative. Zero disables the filter stage.
    pub minimum_path_length: f64,

    /// Whether to reorder (and possibly reverse) paths to reduce pen-up
    /// travel.
    pub reorder: bool,
}

impl OptimizeConfig {
    /// Default for [`merge`](Self::merge).
    pub const DEFAULT_MERGE: bool = true;
    /// Default for [`merge_tolerance`](Self::merge_tolerance).
    pub const DEFAULT_MERGE_TOLERANCE: f64 = crate::merge::DEFAULT_MERGE_TOLERANCE;
    /// Default for [`minimum_path_length`](Self::minimum_path_length).
    pub const DEFAULT_MINIMUM_PATH_LENGTH: f64 = 0.0;
    /// Default for [`reorder`](Self::reorder).
    pub const DEFAULT_REORDER: bool = true;

    /// Check the numeric fields.
    ///
    /// # Errors
    ///
    /// Returns [`OptimizeError::InvalidConfig`] if `merge_tolerance` or
    /// `minimum_path_length` is negative, NaN, or infinite.
    pub fn validate(&self) -> Result<(), OptimizeError> {
        check_non_negative("merge_tolerance", self.merge_tolerance)?;
        check_non_negative("minimum_path_length", self.minimum_path_length)
    }
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            merge: Self::DEFAULT_MERGE,
            merge_tolerance: Self::DEFAULT_MERGE_TOLERANCE,
            minimum_path_length: Self::DEFAULT_MINIMUM_PATH_LENGTH,
            reorder: Self::DEFAULT_REORDER,
        }
    }
}

/// Errors that can occur while optimizing a path collection.
///
/// Every transform validates its whole input up front, so an error
/// means no output was produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum OptimizeError {
    /// A path in the collection has no points.
    #[error("path {index} has no points")]
    EmptyPath {
        /// Position of the offending path in the input collection.
        index: usize,
    },

    /// A point has a NaN or infinite coordinate.
    #[error("path {path} has a non-finite coordinate at point {point}")]
    NonFiniteCoordinate {
        /// Position of the offending path in the input collection.
        path: usize,
        /// Position of the offending point within that path.
        point: usize,
    },

    /// A numeric parameter is out of range.
    #[error("invalid optimize configuration: {0}")]
    InvalidConfig(String),
}

/// Reject zero-point paths and non-finite coordinates.
pub(crate) fn validate_paths(paths: &[Polyline]) -> Result<(), OptimizeError> {
    for (index, path) in paths.iter().enumerate() {
        if path.is_empty() {
            tracing::warn!(index, "rejecting empty path");
            return Err(OptimizeError::EmptyPath { index });
        }
        if let Some(point) = path.points().iter().position(|p| !p.is_finite()) {
            tracing::warn!(path = index, point, "rejecting non-finite coordinate");
            return Err(OptimizeError::NonFiniteCoordinate { path: index, point });
        }
    }
    Ok(())
}

/// Reject negative, NaN, and infinite values for a distance parameter.
pub(crate) fn check_non_negative(name: &str, value: f64) -> Result<(), OptimizeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        tracing::warn!(name, value, "rejecting distance parameter");
        Err(OptimizeError::InvalidConfig(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}
