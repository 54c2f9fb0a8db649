//! Field frame, field geometry and rigid-body pose types.
//!
//! The field frame is in meters with the origin at the center spot. The goals sit
//! on the y axis: Blue defends `y = +FIELD_Y_UPPER_LIMIT`, Yellow defends
//! `y = FIELD_Y_LOWER_LIMIT`. The z axis points up.

use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::{RobotName, TeamColor};

pub type Vector2 = nalgebra::Vector2<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;

/// Linear and angular velocity of a body: `[vx, vy, vz, wx, wy, wz]`.
pub type Velocity = [f64; 6];

pub const FIELD_X_LOWER_LIMIT: f64 = -0.62;
pub const FIELD_X_UPPER_LIMIT: f64 = 0.62;
/// Goal lines.
pub const FIELD_Y_LOWER_LIMIT: f64 = -0.75;
pub const FIELD_Y_UPPER_LIMIT: f64 = 0.75;

/// Half the distance between the goal posts.
pub const GOAL_HALF_WIDTH: f64 = 0.15;
/// How far the goal extends behind the goal line.
pub const GOAL_DEPTH: f64 = 0.1;

/// The penalty area spans this far in front of the goal line.
pub const PENALTY_AREA_DEPTH: f64 = 0.15;
pub const PENALTY_AREA_HALF_WIDTH: f64 = 0.35;

/// Height of the ball center when resting on the ground.
pub const BALL_DEPTH: f64 = 0.0373;
pub const BALL_RADIUS: f64 = 0.021;
/// Height of a robot's origin when standing on the ground.
pub const ROBOT_DEPTH: f64 = 0.042;
pub const ROBOT_RADIUS: f64 = 0.04;

/// Positions the referee may move the ball or a robot to, center spot first.
pub const NEUTRAL_SPOTS: [(f64, f64); 5] = [
    (0.0, 0.0),
    (-0.3, -0.3),
    (0.3, -0.3),
    (-0.3, 0.3),
    (0.3, 0.3),
];

/// Axis-angle rotation `[x, y, z, angle]` as stored on simulated bodies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rotation(pub [f64; 4]);

impl Rotation {
    /// A rotation of `yaw` radians around the vertical axis.
    pub fn from_yaw(yaw: f64) -> Self {
        Rotation([0.0, 0.0, 1.0, yaw])
    }

    /// Rotation around the vertical axis, counter-clockwise positive.
    pub fn yaw(&self) -> f64 {
        let [_, _, z, angle] = self.0;
        if z < 0.0 {
            -angle
        } else {
            angle
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::from_yaw(0.0)
    }
}

/// Where the ball is put for a kickoff.
pub fn kickoff_translation() -> Vector3 {
    Vector3::new(0.0, 0.0, BALL_DEPTH)
}

/// The team credited with a goal if the ball is inside one of the goals.
pub fn scoring_team(ball: &Vector2) -> Option<TeamColor> {
    if ball.x.abs() >= GOAL_HALF_WIDTH {
        return None;
    }
    if ball.y > FIELD_Y_UPPER_LIMIT {
        // Blue's goal
        Some(TeamColor::Yellow)
    } else if ball.y < FIELD_Y_LOWER_LIMIT {
        Some(TeamColor::Blue)
    } else {
        None
    }
}

/// Whether `position` lies inside the penalty area defended by `team`.
pub fn in_penalty_area(position: &Vector2, team: TeamColor) -> bool {
    let goal_line = team.own_goal_side() * FIELD_Y_UPPER_LIMIT;
    let depth = (goal_line - position.y).abs();
    position.x.abs() <= PENALTY_AREA_HALF_WIDTH
        && depth <= PENALTY_AREA_DEPTH
        && position.y.signum() == team.own_goal_side()
}

/// Whether `position` lies within the touch lines and goal lines.
pub fn in_field(position: &Vector2) -> bool {
    (FIELD_X_LOWER_LIMIT..=FIELD_X_UPPER_LIMIT).contains(&position.x)
        && (FIELD_Y_LOWER_LIMIT..=FIELD_Y_UPPER_LIMIT).contains(&position.y)
}

/// The starting pose of a robot for a kickoff.
pub fn initial_pose(robot: RobotName) -> (Vector3, Rotation) {
    let side = robot.team.own_goal_side();
    let (x, y) = match robot.id.as_u8() {
        1 => (-0.2, 0.3),
        2 => (0.2, 0.3),
        _ => (0.0, 0.65),
    };
    // Blue faces negative y, Yellow positive y
    let translation = Vector3::new(x * side, y * side, ROBOT_DEPTH);
    (translation, Rotation::from_yaw(-FRAC_PI_2 * side))
}

/// The pose used when robots are parked outside the field.
///
/// Robots line up behind their own goal line, outside the goal mouth, facing the
/// opponent: `x = ±(0.283 + 0.1·index)`, `y = ∓0.814` with the upper sign for Yellow.
pub fn out_of_field_pose(robot: RobotName, z: f64) -> (Vector3, Rotation) {
    let sign = match robot.team {
        TeamColor::Yellow => 1.0,
        TeamColor::Blue => -1.0,
    };
    let index = robot.id.index() as f64;
    let translation = Vector3::new((0.283 + 0.1 * index) * sign, -0.814 * sign, z);
    (translation, Rotation::from_yaw(FRAC_PI_2 * sign))
}
