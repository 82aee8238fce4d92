//! Grid interpolation shared by the correction and polar tables.
//!
//! Both tables are looked up the same way: find the four corner values
//! surrounding a point and interpolate between them. The x axis is the
//! column axis (boat speed, wind speed) and the y axis is the row axis
//! (angles).
//!
//! Exact grid lines are routed around explicitly. A generic bilinear
//! formula divides by zero whenever a coordinate sits exactly on a row or
//! column, so the four-way branch in [`interpolate`] must stay as it is.

use std::fmt;

/// Position of a value on one axis, bracketed by two grid coordinates.
///
/// `lower == upper` means the value sits exactly on a grid line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Bracket {
    pub fn new(value: f64, lower: f64, upper: f64) -> Self {
        Self { value, lower, upper }
    }

    /// True when the value lies exactly on a grid line.
    pub fn is_exact(&self) -> bool {
        self.lower == self.upper
    }
}

/// The four table values surrounding a query point.
///
/// `x1y1` is (lower row, lower column), `x2y1` is (lower row, upper column),
/// `x1y2` is (upper row, lower column), `x2y2` is (upper row, upper column).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corners {
    pub x1y1: f64,
    pub x2y1: f64,
    pub x1y2: f64,
    pub x2y2: f64,
}

impl Corners {
    pub fn min(&self) -> f64 {
        self.x1y1.min(self.x2y1).min(self.x1y2).min(self.x2y2)
    }

    pub fn max(&self) -> f64 {
        self.x1y1.max(self.x2y1).max(self.x1y2).max(self.x2y2)
    }
}

/// Interpolate between corner values at `x` (column axis) and `y` (row axis).
pub fn interpolate(corners: &Corners, x: Bracket, y: Bracket) -> f64 {
    if x.is_exact() && y.is_exact() {
        // Both row & column hit the grid
        corners.x1y1
    } else if x.is_exact() {
        linear(y, corners.x1y1, corners.x1y2)
    } else if y.is_exact() {
        linear(x, corners.x1y1, corners.x2y1)
    } else {
        bilinear(corners, x, y)
    }
}

/// Linear interpolation between `y1` at `axis.lower` and `y2` at `axis.upper`.
pub fn linear(axis: Bracket, y1: f64, y2: f64) -> f64 {
    y1 + (y2 - y1) * ((axis.value - axis.lower) / (axis.upper - axis.lower))
}

/// Interpolate along x at both rows, then along y between the two results.
fn bilinear(c: &Corners, x: Bracket, y: Bracket) -> f64 {
    debug_assert!(!x.is_exact(), "bilinear interpolation needs distinct x values");
    debug_assert!(!y.is_exact(), "bilinear interpolation needs distinct y values");

    let x_span = x.upper - x.lower;
    let r1 = (x.upper - x.value) / x_span * c.x1y1 + (x.value - x.lower) / x_span * c.x2y1;
    let r2 = (x.upper - x.value) / x_span * c.x1y2 + (x.value - x.lower) / x_span * c.x2y2;

    let y_span = y.upper - y.lower;
    (y.upper - y.value) / y_span * r1 + (y.value - y.lower) / y_span * r2
}

/// Round to one decimal place, halves away from zero.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Table axis a lookup value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    ApparentWindAngle,
    BoatSpeed,
    TrueWindAngle,
    TrueWindSpeed,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::ApparentWindAngle => write!(f, "apparent wind angle"),
            Axis::BoatSpeed => write!(f, "boat speed"),
            Axis::TrueWindAngle => write!(f, "true wind angle"),
            Axis::TrueWindSpeed => write!(f, "true wind speed"),
        }
    }
}

/// Errors returned by table lookups.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    /// The query value is not covered by the table (or is not finite).
    #[error("{axis} {value} outside table range {min}..={max}")]
    OutOfRange {
        axis: Axis,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Check that `value` is finite and inside `min..=max`.
pub(crate) fn check_range(axis: Axis, value: f64, min: f64, max: f64) -> Result<(), LookupError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(LookupError::OutOfRange {
            axis,
            value,
            min,
            max,
        })
    }
}
