use std::collections::BTreeMap;

use rcj_core::{ObjectId, OracleError, Rotation, SimulationOracle, Vector3, Velocity};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub translation: [f64; 3],
    pub rotation: Rotation,
    /// Only recorded for the ball. Robots get their physics reset instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Velocity>,
}

/// Poses of the ball and every robot, keyed by object name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotRecord(BTreeMap<ObjectId, ObjectSnapshot>);

impl SnapshotRecord {
    /// Record the current state of the world.
    pub fn save(oracle: &impl SimulationOracle) -> Result<Self, OracleError> {
        let mut objects = BTreeMap::new();
        objects.insert(
            ObjectId::Ball,
            ObjectSnapshot {
                translation: oracle.translation(ObjectId::Ball)?.into(),
                rotation: oracle.rotation(ObjectId::Ball)?,
                velocity: Some(oracle.velocity(ObjectId::Ball)?),
            },
        );
        for robot in oracle.robots() {
            let object = ObjectId::Robot(robot);
            objects.insert(
                object,
                ObjectSnapshot {
                    translation: oracle.translation(object)?.into(),
                    rotation: oracle.rotation(object)?,
                    velocity: None,
                },
            );
        }
        Ok(SnapshotRecord(objects))
    }

    /// Put every recorded object back where it was.
    ///
    /// All objects are checked before anything moves, so a record naming a
    /// missing object leaves the world untouched.
    pub fn restore(&self, oracle: &mut impl SimulationOracle) -> Result<(), OracleError> {
        if let Some(missing) = self.0.keys().find(|object| !oracle.contains(**object)) {
            return Err(OracleError::UnknownObject(*missing));
        }
        for (&object, snapshot) in &self.0 {
            oracle.set_translation(object, Vector3::from(snapshot.translation))?;
            oracle.set_rotation(object, snapshot.rotation)?;
            match snapshot.velocity {
                Some(velocity) => oracle.set_velocity(object, velocity)?,
                None => oracle.reset_physics(object)?,
            }
        }
        Ok(())
    }

    pub fn get(&self, object: ObjectId) -> Option<&ObjectSnapshot> {
        self.0.get(&object)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
