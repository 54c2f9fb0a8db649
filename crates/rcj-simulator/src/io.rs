use rcj_core::{Angle, BallReading, RobotName, SonarValues, Vector2, Vector3};
use rcj_robot::{BallSensor, HeadingSource, PositionSource, RangeSensor, RobotDevices, VelocityActuator};

use crate::Simulation;

/// The devices of one simulated robot, reported in its team frame.
pub struct SimRobotIo<'a> {
    sim: &'a mut Simulation,
    name: RobotName,
}

impl<'a> SimRobotIo<'a> {
    /// `None` if the robot is not in the simulation.
    pub fn attach(sim: &'a mut Simulation, name: RobotName) -> Option<Self> {
        if sim.robots.contains_key(&name) {
            Some(Self { sim, name })
        } else {
            None
        }
    }

    fn field_pose(&self) -> (Vector2, f64) {
        self.sim.robot_pose(self.name).unwrap_or((Vector2::zeros(), 0.0))
    }
}

impl PositionSource for SimRobotIo<'_> {
    fn position(&self) -> Vector2 {
        self.name.team.to_team_frame(self.field_pose().0)
    }
}

impl HeadingSource for SimRobotIo<'_> {
    fn compass_values(&self) -> Vector3 {
        let (_, yaw) = self.field_pose();
        let heading = Angle::from_radians(yaw) + Angle::PI_2;
        let yaw = (self.name.team.heading_to_team_frame(heading) - Angle::PI_2).radians();
        Vector3::new(yaw.sin(), yaw.cos(), 0.0)
    }
}

impl RangeSensor for SimRobotIo<'_> {
    fn sonar(&self) -> SonarValues {
        self.sim.sonar(self.name)
    }
}

impl BallSensor for SimRobotIo<'_> {
    fn ball_reading(&mut self) -> Option<BallReading> {
        self.sim.take_ball_reading(self.name)
    }
}

impl VelocityActuator for SimRobotIo<'_> {
    fn set_wheel_velocities(&mut self, left: f64, right: f64) {
        self.sim.set_wheels(self.name, left, right);
    }
}

impl RobotDevices for SimRobotIo<'_> {
    fn name(&self) -> RobotName {
        self.name
    }

    fn time(&self) -> f64 {
        self.sim.time
    }
}
