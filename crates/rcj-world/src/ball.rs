use std::f64::consts::PI;

use rcj_comm::NO_BALL;
use rcj_core::{normalize, Angle, BallReading, Vector2};

/// Where a robot believes the ball is this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BallEstimate {
    #[default]
    Unknown,
    At(Vector2),
}

impl BallEstimate {
    pub fn position(&self) -> Option<Vector2> {
        match self {
            BallEstimate::Unknown => None,
            BallEstimate::At(pos) => Some(*pos),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, BallEstimate::At(_))
    }

    /// Read wire coordinates, where `(-100, -100)` means no estimate.
    pub fn from_wire(x: f32, y: f32) -> Self {
        if x == NO_BALL || y == NO_BALL {
            BallEstimate::Unknown
        } else {
            BallEstimate::At(Vector2::new(x as f64, y as f64))
        }
    }

    pub fn to_wire(&self) -> (f32, f32) {
        match self {
            BallEstimate::Unknown => (NO_BALL, NO_BALL),
            BallEstimate::At(pos) => (pos.x as f32, pos.y as f32),
        }
    }
}

/// Locate the ball from one infrared reading.
///
/// The signal strength falls off with the squared distance, so the distance is
/// `sqrt(1 / strength)`. The bearing in the robot frame is rotated by the
/// robot's heading, and the ball lies at `position + d·(sin a, -cos a)`.
/// Readings without a usable strength give [`BallEstimate::Unknown`].
pub fn triangulate_ball(reading: &BallReading, position: Vector2, heading: Angle) -> BallEstimate {
    let strength = reading.strength;
    if !(strength.is_finite() && strength > 0.0) {
        return BallEstimate::Unknown;
    }
    let distance = (1.0 / strength).sqrt();
    let bearing = normalize(reading.direction.y.atan2(reading.direction.x), -PI, PI);
    let a = normalize(heading.radians() + bearing, -PI, PI);
    BallEstimate::At(position + distance * Vector2::new(a.sin(), -a.cos()))
}
