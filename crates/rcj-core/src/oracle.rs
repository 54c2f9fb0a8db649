use thiserror::Error;

use crate::{ObjectId, RobotName, Rotation, Vector3, Velocity};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
    #[error("invalid value for {object}: {reason}")]
    InvalidValue { object: ObjectId, reason: String },
}

/// Narrow read/write access to the ground truth of a running simulation.
///
/// The referee only ever talks to the simulated world through this trait.
pub trait SimulationOracle {
    /// Elapsed simulation time in seconds.
    fn time(&self) -> f64;

    /// Every robot present in the world.
    fn robots(&self) -> Vec<RobotName>;

    fn translation(&self, object: ObjectId) -> Result<Vector3, OracleError>;

    fn set_translation(&mut self, object: ObjectId, value: Vector3) -> Result<(), OracleError>;

    fn rotation(&self, object: ObjectId) -> Result<Rotation, OracleError>;

    fn set_rotation(&mut self, object: ObjectId, value: Rotation) -> Result<(), OracleError>;

    fn velocity(&self, object: ObjectId) -> Result<Velocity, OracleError>;

    fn set_velocity(&mut self, object: ObjectId, value: Velocity) -> Result<(), OracleError>;

    /// Drop any accumulated physics state (velocities, contacts) of an object.
    fn reset_physics(&mut self, object: ObjectId) -> Result<(), OracleError>;

    /// Identifier of the controller program assigned to a robot.
    fn controller(&self, robot: RobotName) -> Result<String, OracleError>;

    /// Assign a controller program to a robot. The robot restarts with it.
    fn set_controller(&mut self, robot: RobotName, controller: &str) -> Result<(), OracleError>;

    fn restart_controller(&mut self, robot: RobotName) -> Result<(), OracleError>;

    /// The object currently selected by the operator, if any.
    fn selected(&self) -> Option<ObjectId>;

    /// Whether `object` exists in this world.
    fn contains(&self, object: ObjectId) -> bool {
        match object {
            ObjectId::Ball => true,
            ObjectId::Robot(name) => self.robots().contains(&name),
        }
    }
}
