//! Capability interfaces of the robot hardware.
//!
//! Positions and headings are reported in the team frame, where the own team
//! always attacks towards negative y and heading zero faces the opponent goal.

use rcj_core::{Angle, BallReading, RobotName, SonarValues, Vector2, Vector3};

pub trait PositionSource {
    /// Horizontal position from the GPS.
    fn position(&self) -> Vector2;
}

pub trait HeadingSource {
    /// Raw compass vector.
    fn compass_values(&self) -> Vector3;

    /// Heading in (-π, π], zero facing the opponent goal.
    fn heading(&self) -> Angle {
        let c = self.compass_values();
        Angle::from_compass(c.x, c.y)
    }
}

pub trait RangeSensor {
    fn sonar(&self) -> SonarValues;
}

pub trait BallSensor {
    /// The newest infrared packet from the ball, consuming the receive queue.
    /// `None` when nothing was received since the last call.
    fn ball_reading(&mut self) -> Option<BallReading>;
}

pub trait VelocityActuator {
    /// Set the wheel motor velocities, in rad/s.
    fn set_wheel_velocities(&mut self, left: f64, right: f64);
}

/// Everything a robot controller needs from its body.
pub trait RobotDevices: PositionSource + HeadingSource + RangeSensor + BallSensor + VelocityActuator {
    fn name(&self) -> RobotName;

    /// Simulation time in seconds.
    fn time(&self) -> f64;
}

/// One tick's worth of sensor values.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub name: RobotName,
    pub time: f64,
    pub position: Vector2,
    pub heading: Angle,
    pub sonar: SonarValues,
    pub ball: Option<BallReading>,
}

impl SensorSnapshot {
    pub fn read(devices: &mut impl RobotDevices) -> Self {
        Self {
            name: devices.name(),
            time: devices.time(),
            position: devices.position(),
            heading: devices.heading(),
            sonar: devices.sonar(),
            ball: devices.ball_reading(),
        }
    }
}
