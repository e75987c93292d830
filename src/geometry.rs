//! Geometry utilities: points, 2D affine transforms, and segment math.
//!
//! [`Transform`] follows the canvas-matrix convention `[a, b, c, d, e, f]`:
//!
//! ```text
//! x' = a·x + c·y + e
//! y' = b·x + d·y + f
//! ```
//!
//! `lhs.multiply(rhs)` applies `rhs` first. Relationship transforms store a
//! dependent marker's matrix relative to its owning segment's matrix, so that
//! a rigid-body edit of the segment can be replayed onto the marker.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// A point in surface or screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// This point shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// 2D affine transform in canvas-matrix order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self { a: 1.0, b: 0.0, c: 0.0, d: 1.0, e: 0.0, f: 0.0 };

    #[must_use]
    pub fn translate(dx: f64, dy: f64) -> Self {
        Self { e: dx, f: dy, ..Self::IDENTITY }
    }

    /// Clockwise rotation in screen space (y grows downward).
    #[must_use]
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self { a: cos, b: sin, c: -sin, d: cos, e: 0.0, f: 0.0 }
    }

    #[must_use]
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { a: sx, d: sy, ..Self::IDENTITY }
    }

    /// Horizontal skew by `degrees`.
    #[must_use]
    pub fn skew_x(degrees: f64) -> Self {
        Self { c: degrees.to_radians().tan(), ..Self::IDENTITY }
    }

    /// `op` applied about `pivot` instead of the origin.
    #[must_use]
    pub fn about(pivot: Point, op: Self) -> Self {
        Self::translate(pivot.x, pivot.y).multiply(op).multiply(Self::translate(-pivot.x, -pivot.y))
    }

    /// Matrix product `self × rhs`; the result applies `rhs` first.
    #[must_use]
    pub fn multiply(self, rhs: Self) -> Self {
        Self {
            a: self.a * rhs.a + self.c * rhs.b,
            b: self.b * rhs.a + self.d * rhs.b,
            c: self.a * rhs.c + self.c * rhs.d,
            d: self.b * rhs.c + self.d * rhs.d,
            e: self.a * rhs.e + self.c * rhs.f + self.e,
            f: self.b * rhs.e + self.d * rhs.f + self.f,
        }
    }

    #[must_use]
    pub fn determinant(self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse transform.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` when the matrix is singular.
    pub fn invert(self) -> Result<Self, MeasureError> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON || !det.is_finite() {
            return Err(MeasureError::DegenerateGeometry);
        }
        let r = 1.0 / det;
        let a = self.d * r;
        let b = -self.b * r;
        let c = -self.c * r;
        let d = self.a * r;
        Ok(Self { a, b, c, d, e: -(a * self.e + c * self.f), f: -(b * self.e + d * self.f) })
    }

    /// Map a point through this transform.
    #[must_use]
    pub fn apply(self, p: Point) -> Point {
        Point { x: self.a * p.x + self.c * p.y + self.e, y: self.b * p.x + self.d * p.y + self.f }
    }

    /// QR-style decomposition into translation, rotation, scale and skew.
    #[must_use]
    pub fn decompose(self) -> Pose {
        let denom = self.a * self.a + self.b * self.b;
        let scale_x = denom.sqrt();
        let (scale_y, skew_x) = if scale_x > 0.0 {
            (self.determinant() / scale_x, (self.a * self.c + self.b * self.d).atan2(denom).to_degrees())
        } else {
            (0.0, 0.0)
        };
        Pose {
            position: Point::new(self.e, self.f),
            angle: self.b.atan2(self.a).to_degrees(),
            scale_x,
            scale_y,
            skew_x,
        }
    }
}

/// A decomposed placement: where a marker sits and how it is oriented.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    /// Rotation in degrees.
    pub angle: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Horizontal skew in degrees.
    pub skew_x: f64,
}

impl Pose {
    /// Unscaled, unskewed pose at `position` rotated by `angle` degrees.
    #[must_use]
    pub fn at(position: Point, angle: f64) -> Self {
        Self { position, angle, scale_x: 1.0, scale_y: 1.0, skew_x: 0.0 }
    }

    /// Compose back into a matrix: translate · rotate · scale · skew.
    #[must_use]
    pub fn matrix(self) -> Transform {
        Transform::translate(self.position.x, self.position.y)
            .multiply(Transform::rotate(self.angle))
            .multiply(Transform::scale(self.scale_x, self.scale_y))
            .multiply(Transform::skew_x(self.skew_x))
    }
}

// =============================================================
// Segment math
// =============================================================

/// Angle in degrees of a tick perpendicular to the segment `p1 → p2`.
#[must_use]
pub fn perpendicular_angle(p1: Point, p2: Point) -> f64 {
    (p2.y - p1.y).atan2(p2.x - p1.x).to_degrees() + 90.0
}

/// Euclidean distance.
#[must_use]
pub fn length(p1: Point, p2: Point) -> f64 {
    (p2.x - p1.x).hypot(p2.y - p1.y)
}

#[must_use]
pub fn midpoint(p1: Point, p2: Point) -> Point {
    Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0)
}

/// Snap `p` so that `anchor → p` is exactly horizontal or vertical.
///
/// The axis with the larger absolute delta wins; a tie snaps vertical.
#[must_use]
pub fn axis_lock(anchor: Point, p: Point) -> Point {
    if (p.x - anchor.x).abs() > (p.y - anchor.y).abs() {
        Point::new(p.x, anchor.y)
    } else {
        Point::new(anchor.x, p.y)
    }
}

/// Shortest distance from `p` to the segment `a → b`.
#[must_use]
pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    if len_sq < SINGULAR_EPSILON {
        return length(p, a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    length(p, Point::new(a.x + t * dx, a.y + t * dy))
}

// =============================================================
// Relationships
// =============================================================

/// Express `child` relative to `parent`: `parent⁻¹ × child`.
///
/// # Errors
///
/// Returns `DegenerateGeometry` when `parent` is singular.
pub fn compose_relationship(parent: Transform, child: Transform) -> Result<Transform, MeasureError> {
    Ok(parent.invert()?.multiply(child))
}

/// Recover a child's matrix from its parent and stored relationship.
#[must_use]
pub fn apply_relationship(parent: Transform, relationship: Transform) -> Transform {
    parent.multiply(relationship)
}
