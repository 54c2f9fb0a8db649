use serde::{Deserialize, Serialize};

use crate::Vector3;

/// One reading of the ball's infrared signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallReading {
    /// Unit vector towards the ball in the robot frame: x forward, y left, z up.
    pub direction: Vector3,
    /// Received signal strength, falling off with the squared distance.
    pub strength: f64,
}

/// Distances measured by the four sonars, in meters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SonarValues {
    pub left: f64,
    pub right: f64,
    pub front: f64,
    pub back: f64,
}
