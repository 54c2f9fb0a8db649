//! Differential-drive steering policies.
//!
//! All policies work in the team frame. Headings follow the compass convention:
//! a robot with heading `h` drives forward along `(sin h, -cos h)`, and positive
//! headings are counter-clockwise.

use std::f64::consts::{FRAC_PI_2, PI};

use rcj_core::{angle_between_points, normalize, r2d, Angle, ControllerSettings, Vector2};

/// Velocity pair for the `(left, right)` wheel motors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    pub left: f64,
    pub right: f64,
}

impl WheelSpeeds {
    pub const STOP: WheelSpeeds = WheelSpeeds {
        left: 0.0,
        right: 0.0,
    };

    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Limit both wheels to `±max`. Non-finite values become zero.
    pub fn clamp(self, max: f64) -> Self {
        let limit = |v: f64| if v.is_finite() { v.clamp(-max, max) } else { 0.0 };
        Self {
            left: limit(self.left),
            right: limit(self.right),
        }
    }
}

/// Unit vector towards `target` in the robot frame (x forward, y left).
pub fn local_direction(position: Vector2, heading: Angle, target: Vector2) -> Vector2 {
    let field = angle_between_points(position.x, position.y, target.x, target.y);
    let local = field - (heading.radians() - FRAC_PI_2);
    Vector2::new(local.cos(), local.sin())
}

/// Discretize a robot-frame ball direction: `0` when the ball is straight
/// ahead, `1` when it is to the right and `-1` when it is to the left.
pub fn ball_offset(local_direction: Vector2, dead_band: f64) -> i8 {
    if local_direction.y.abs() <= dead_band {
        0
    } else if local_direction.y < 0.0 {
        1
    } else {
        -1
    }
}

/// Direct pursuit: drive straight while the ball is ahead, otherwise turn in
/// place towards it.
pub fn go_to_ball(offset: i8, settings: &ControllerSettings) -> WheelSpeeds {
    if offset == 0 {
        return WheelSpeeds::new(settings.nominal_velocity, settings.nominal_velocity);
    }
    let offset = offset as f64;
    WheelSpeeds::new(offset * settings.pursuit_gain, -offset * settings.pursuit_gain)
}

/// Bearing error towards `target` in degrees, folded into `[-90, 90]`.
///
/// The second value is true when the fold happened, meaning the robot's back is
/// the end closer to facing the target.
pub fn bearing_error(position: Vector2, heading: Angle, target: Vector2) -> (f64, bool) {
    let bearing = angle_between_points(position.x, position.y, target.x, target.y);
    let deg = normalize(r2d(bearing + FRAC_PI_2), -180.0, 180.0);
    let error = normalize(deg - heading.degrees(), -180.0, 180.0);
    if error > 90.0 {
        (error - 180.0, true)
    } else if error < -90.0 {
        (error + 180.0, true)
    } else {
        (error, false)
    }
}

/// Point approach.
///
/// The outer wheel runs at full speed and the inner one is slowed by
/// `|error|/9·0.5 + (1/distance)·0.5`. When `|error·distance|` is within
/// `threshold` both wheels run at full speed. Targets behind the robot are
/// approached in reverse.
pub fn go_to_point(
    position: Vector2,
    heading: Angle,
    target: Vector2,
    threshold: f64,
    settings: &ControllerSettings,
) -> WheelSpeeds {
    let max = settings.max_velocity;
    let distance = (target - position).norm();
    if distance < settings.arrival_epsilon {
        return WheelSpeeds::new(max, max);
    }

    let (error, reversed) = bearing_error(position, heading, target);
    if (error * distance).abs() <= threshold {
        return if reversed {
            WheelSpeeds::new(-max, -max)
        } else {
            WheelSpeeds::new(max, max)
        };
    }

    let dif = (error / 9.0).abs() * 0.5 + (1.0 / distance) * 0.5;
    match (reversed, error > 0.0) {
        (false, true) => WheelSpeeds::new(max - dif, max),
        (false, false) => WheelSpeeds::new(max, max - dif),
        (true, true) => WheelSpeeds::new(-max, -(max - dif)),
        (true, false) => WheelSpeeds::new(-(max - dif), -max),
    }
}

/// Point orientation: turn in place at `|error|/9` until the bearing error is
/// within `threshold` degrees.
pub fn look_at_point(position: Vector2, heading: Angle, target: Vector2, threshold: f64) -> WheelSpeeds {
    let (error, _) = bearing_error(position, heading, target);
    let vel = (error / 9.0).abs();
    if error.abs() <= threshold {
        WheelSpeeds::STOP
    } else if error > 0.0 {
        WheelSpeeds::new(-vel, vel)
    } else {
        WheelSpeeds::new(vel, -vel)
    }
}

/// Rotate in place while looking for the ball.
pub fn search_motion(settings: &ControllerSettings) -> WheelSpeeds {
    let speed = settings.max_velocity / 4.0;
    WheelSpeeds::new(-speed, speed)
}

/// Heading that faces `target` from `position`, in (-π, π].
pub fn heading_towards(position: Vector2, target: Vector2) -> Angle {
    let bearing = angle_between_points(position.x, position.y, target.x, target.y);
    Angle::from_radians(normalize(bearing + FRAC_PI_2, -PI, PI))
}
