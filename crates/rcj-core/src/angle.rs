use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::Vector2;

/// Maps `value` into the half-open range `[lo, hi)` by shifting it by whole
/// multiples of `hi - lo`.
///
/// Works for any unit, so `normalize(a, -PI, PI)` and `normalize(d, -180.0, 180.0)`
/// are both valid. Values already inside the range are returned untouched, which
/// makes the function exactly idempotent.
pub fn normalize(value: f64, lo: f64, hi: f64) -> f64 {
    debug_assert!(lo < hi, "normalize called with an empty range");
    if (lo..hi).contains(&value) || !value.is_finite() {
        return value;
    }
    let span = hi - lo;
    let mut wrapped = lo + (value - lo).rem_euclid(span);
    // rem_euclid may round up to exactly `span` for tiny negative offsets
    if wrapped >= hi {
        wrapped -= span;
    }
    if wrapped < lo {
        wrapped = lo;
    }
    wrapped
}

/// Bearing from point 1 to point 2, `atan2(y2 - y1, x2 - x1)`, in radians.
pub fn angle_between_points(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (y2 - y1).atan2(x2 - x1)
}

/// Degrees to radians.
pub fn d2r(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Radians to degrees.
pub fn r2d(radians: f64) -> f64 {
    radians.to_degrees()
}

/// An angle in radians, always in (-pi, pi]. This type supports safe arithmetic
/// operations:
///
/// ```ignore
/// # use rcj_core::Angle;
/// let a = Angle::from_degrees(90.0);
/// let b = Angle::from_degrees(45.0);
/// let c = a + b;
/// assert_eq!(c.degrees(), 135.0);
/// ```
#[derive(Debug, Clone, Copy, PartialOrd, Serialize, Deserialize)]
#[typeshare(serialized_as = "f64")]
pub struct Angle(f64);

impl Angle {
    pub const PI: Angle = Angle(PI);
    pub const PI_2: Angle = Angle(PI / 2.0);

    /// Create a new angle from radians.
    pub fn from_radians(radians: f64) -> Self {
        Angle(wrap_angle(radians))
    }

    /// Create a new angle from degrees.
    pub fn from_degrees(degrees: f64) -> Self {
        Self::from_radians(degrees.to_radians())
    }

    /// Heading from the two horizontal compass components.
    ///
    /// A quarter turn is added so that heading zero faces the opponent goal.
    pub fn from_compass(c0: f64, c1: f64) -> Self {
        Self::from_radians(c0.atan2(c1) + PI / 2.0)
    }

    /// Compute the smallest signed counter-clockwise angle from point a to point b.
    pub fn between_points(a: Vector2, b: Vector2) -> Self {
        Self::from_radians(angle_between_points(a.x, a.y, b.x, b.y))
    }

    /// Get the angle in radians.
    pub fn radians(&self) -> f64 {
        self.0
    }

    /// Get the angle in degrees.
    pub fn degrees(&self) -> f64 {
        self.0.to_degrees()
    }

    /// Rotate a vector by this angle.
    pub fn rotate_vector(&self, v: &Vector2) -> Vector2 {
        let rot = nalgebra::Rotation2::new(self.0);
        rot * v
    }

    /// Get the absolute value of the angle
    pub fn abs(&self) -> f64 {
        self.0.abs()
    }
}

impl std::ops::Add for Angle {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Angle::from_radians(self.0 + other.0)
    }
}

impl std::ops::Sub for Angle {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Angle::from_radians(self.0 - other.0)
    }
}

impl std::ops::Neg for Angle {
    type Output = Self;

    fn neg(self) -> Self {
        Angle::from_radians(-self.0)
    }
}

impl std::fmt::Display for Angle {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} rad", self.0)
    }
}

impl Default for Angle {
    fn default() -> Self {
        Self::from_radians(0.0)
    }
}

impl PartialEq for Angle {
    fn eq(&self, other: &Self) -> bool {
        let diff: f64 = (self.radians() - other.radians()).abs();
        const TOLERANCE: f64 = 1e-5; // about sqrt of f32 precision
        !(TOLERANCE..=(2.0 * PI - TOLERANCE)).contains(&diff)
    }
}

fn wrap_angle(angle: f64) -> f64 {
    let mut angle = angle % (2.0 * PI);
    if angle <= -PI {
        angle += 2.0 * PI;
    } else if angle > PI {
        angle -= 2.0 * PI;
    }
    angle
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_wrap_angle() {
        assert_eq!(wrap_angle(0.0), 0.0);
        assert_eq!(wrap_angle(PI), PI);
        assert_eq!(wrap_angle(-PI), PI);
        assert_relative_eq!(wrap_angle(PI / 2.0 + 2.0 * PI), PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut a = -25.0;
        while a < 25.0 {
            let once = normalize(a, -PI, PI);
            assert!((-PI..PI).contains(&once), "{a} -> {once}");
            assert_eq!(normalize(once, -PI, PI), once);
            a += 0.37;
        }
    }

    #[test]
    fn normalize_degrees() {
        assert_relative_eq!(normalize(190.0, -180.0, 180.0), -170.0);
        assert_relative_eq!(normalize(-190.0, -180.0, 180.0), 170.0);
        assert_relative_eq!(normalize(540.0, -180.0, 180.0), -180.0);
        assert_eq!(normalize(45.0, -180.0, 180.0), 45.0);
        assert_relative_eq!(normalize(-30.0, 0.0, 360.0), 330.0);
    }

    #[test]
    fn normalize_upper_bound_is_exclusive() {
        assert_relative_eq!(normalize(PI, -PI, PI), -PI);
        assert_relative_eq!(normalize(180.0, -180.0, 180.0), -180.0);
    }

    #[test]
    fn between_points() {
        assert_relative_eq!(angle_between_points(0.0, 0.0, 1.0, 1.0), PI / 4.0);
        assert_relative_eq!(angle_between_points(1.0, 1.0, 0.0, 0.0), -3.0 * PI / 4.0);
        let angle = Angle::between_points(Vector2::new(0.0, 0.0), Vector2::new(0.0, -2.0));
        assert_relative_eq!(angle.degrees(), -90.0, epsilon = 1e-9);
    }

    #[test]
    fn degree_conversions() {
        assert_relative_eq!(d2r(180.0), PI);
        assert_relative_eq!(r2d(PI / 2.0), 90.0);
        assert_relative_eq!(r2d(d2r(37.5)), 37.5, epsilon = 1e-12);
    }

    #[test]
    fn compass_heading() {
        // North straight ahead on the second axis -> facing the opponent goal
        assert_relative_eq!(Angle::from_compass(-1.0, 0.0).radians(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(Angle::from_compass(0.0, 1.0).radians(), PI / 2.0, epsilon = 1e-12);
        assert_relative_eq!(Angle::from_compass(1.0, 0.0).radians(), PI, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_sub() {
        let a = Angle::from_degrees(180.0);
        let b = Angle::from_degrees(-179.0);
        assert_relative_eq!((a - b).degrees(), -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_rotate() {
        let a = Angle::from_degrees(90.0);
        let r = a.rotate_vector(&Vector2::new(1.0, 0.0));
        assert_relative_eq!(r.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(r.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_angle_eq_wraps() {
        assert_eq!(Angle::from_degrees(180.0), Angle::from_degrees(-180.0));
        assert_ne!(Angle::from_degrees(10.0), Angle::from_degrees(-10.0));
    }
}
