//! A kinematic stand-in for the physics engine.
//!
//! Robots are differential-drive disks, the ball is a point mass that rolls
//! with friction, bounces off the walls and is shoved by robots driving into
//! it. Accuracy is not a goal; the simulation exists so that complete matches
//! can run end to end.

use std::collections::{BTreeMap, BTreeSet};

use rcj_core::{
    initial_pose, kickoff_translation, Angle, BallReading, ObjectId, OracleError, RobotName,
    Rotation, SimulationOracle, SimulationSettings, SonarValues, Vector2, Vector3, Velocity,
    BALL_DEPTH, BALL_RADIUS, FIELD_X_UPPER_LIMIT, FIELD_Y_UPPER_LIMIT, GOAL_DEPTH, ROBOT_DEPTH,
    ROBOT_RADIUS,
};

mod io;

pub use io::SimRobotIo;

/// Inner faces of the side walls.
pub const WALL_X: f64 = FIELD_X_UPPER_LIMIT + OUTER_AREA;
/// Inner faces of the end walls, behind the goals.
pub const WALL_Y: f64 = FIELD_Y_UPPER_LIMIT + OUTER_AREA;

/// Width of the strip between the field lines and the walls. Leaves room
/// behind the goals for parked robots.
const OUTER_AREA: f64 = GOAL_DEPTH + 0.05;

/// Speeds below this are treated as rest, in m/s.
const REST_SPEED: f64 = 1e-3;

#[derive(Debug, Clone)]
struct Body {
    translation: Vector3,
    rotation: Rotation,
    velocity: Velocity,
}

impl Body {
    fn at(translation: Vector3, rotation: Rotation) -> Self {
        Self {
            translation,
            rotation,
            velocity: [0.0; 6],
        }
    }

    fn planar_velocity(&self) -> Vector2 {
        Vector2::new(self.velocity[0], self.velocity[1])
    }
}

#[derive(Debug, Clone)]
struct SimRobot {
    body: Body,
    wheels: (f64, f64),
    controller: String,
    ball_reading: Option<BallReading>,
}

pub struct Simulation {
    settings: SimulationSettings,
    time: f64,
    ball: Body,
    robots: BTreeMap<RobotName, SimRobot>,
    selected: Option<ObjectId>,
    restarts: BTreeSet<RobotName>,
}

impl Simulation {
    /// Create an empty field with the ball on the center spot. Use
    /// [`SimulationBuilder`] to add robots.
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            time: 0.0,
            ball: Body::at(kickoff_translation(), Rotation::default()),
            robots: BTreeMap::new(),
            selected: None,
            restarts: BTreeSet::new(),
        }
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn ball_position(&self) -> Vector2 {
        self.ball.translation.xy()
    }

    /// Field-frame position and yaw of a robot.
    pub fn robot_pose(&self, name: RobotName) -> Option<(Vector2, f64)> {
        self.robots
            .get(&name)
            .map(|r| (r.body.translation.xy(), r.body.rotation.yaw()))
    }

    pub fn wheels(&self, name: RobotName) -> Option<(f64, f64)> {
        self.robots.get(&name).map(|r| r.wheels)
    }

    /// Mark an object as selected by the operator.
    pub fn select(&mut self, object: Option<ObjectId>) {
        self.selected = object;
    }

    /// Robots whose controller was changed or restarted since the last call.
    pub fn take_restarts(&mut self) -> Vec<RobotName> {
        std::mem::take(&mut self.restarts).into_iter().collect()
    }

    fn set_wheels(&mut self, name: RobotName, left: f64, right: f64) {
        if let Some(robot) = self.robots.get_mut(&name) {
            robot.wheels = (left, right);
        }
    }

    fn take_ball_reading(&mut self, name: RobotName) -> Option<BallReading> {
        self.robots.get_mut(&name).and_then(|r| r.ball_reading.take())
    }

    /// Advance the world by `dt` seconds.
    pub fn step(&mut self, dt: f64) {
        self.drive_robots(dt);
        self.separate_robots();
        self.push_ball();
        self.roll_ball(dt);
        self.time += dt;
        self.sense();
    }

    fn drive_robots(&mut self, dt: f64) {
        let r = self.settings.wheel_radius;
        let axle = self.settings.axle_length;
        let limit = |v: f64, wall: f64| v.clamp(-wall + ROBOT_RADIUS, wall - ROBOT_RADIUS);
        for robot in self.robots.values_mut() {
            let (left, right) = robot.wheels;
            let speed = (left + right) / 2.0 * r;
            let omega = (right - left) * r / axle;
            let yaw = robot.body.rotation.yaw();
            let mid = yaw + omega * dt / 2.0;
            let vel = Vector2::new(mid.cos(), mid.sin()) * speed;

            let t = &mut robot.body.translation;
            t.x = limit(t.x + vel.x * dt, WALL_X);
            t.y = limit(t.y + vel.y * dt, WALL_Y);
            t.z = ROBOT_DEPTH;
            robot.body.rotation = Rotation::from_yaw(Angle::from_radians(yaw + omega * dt).radians());
            robot.body.velocity = [vel.x, vel.y, 0.0, 0.0, 0.0, omega];
        }
    }

    fn separate_robots(&mut self) {
        let names: Vec<RobotName> = self.robots.keys().copied().collect();
        let min = 2.0 * ROBOT_RADIUS;
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                let (pa, pb) = match (self.robots.get(a), self.robots.get(b)) {
                    (Some(ra), Some(rb)) => (ra.body.translation.xy(), rb.body.translation.xy()),
                    _ => continue,
                };
                let d = pb - pa;
                let dist = d.norm();
                if dist >= min {
                    continue;
                }
                let normal = if dist > 1e-9 { d / dist } else { Vector2::x() };
                let shift = normal * (min - dist) / 2.0;
                if let Some(ra) = self.robots.get_mut(a) {
                    ra.body.translation.x -= shift.x;
                    ra.body.translation.y -= shift.y;
                }
                if let Some(rb) = self.robots.get_mut(b) {
                    rb.body.translation.x += shift.x;
                    rb.body.translation.y += shift.y;
                }
            }
        }
    }

    fn push_ball(&mut self) {
        let contact = ROBOT_RADIUS + BALL_RADIUS;
        for robot in self.robots.values() {
            let rp = robot.body.translation.xy();
            let d = self.ball.translation.xy() - rp;
            let dist = d.norm();
            if dist >= contact {
                continue;
            }
            let normal = if dist > 1e-9 {
                d / dist
            } else {
                let yaw = robot.body.rotation.yaw();
                Vector2::new(yaw.cos(), yaw.sin())
            };
            let out = rp + normal * contact;
            self.ball.translation.x = out.x;
            self.ball.translation.y = out.y;

            let approach = robot.body.planar_velocity().dot(&normal);
            if approach > 0.0 {
                let ball_vel = self.ball.planar_velocity();
                let along = ball_vel.dot(&normal);
                let target = approach * self.settings.push_factor;
                if along < target {
                    let v = ball_vel + normal * (target - along);
                    self.ball.velocity[0] = v.x;
                    self.ball.velocity[1] = v.y;
                }
            }
        }
    }

    fn roll_ball(&mut self, dt: f64) {
        let restitution = self.settings.ball_restitution;
        let decay = self.settings.ball_friction.powf(dt);
        let ball = &mut self.ball;
        for (axis, wall) in [(0, WALL_X), (1, WALL_Y)] {
            let mut p = ball.translation[axis] + ball.velocity[axis] * dt;
            let bound = wall - BALL_RADIUS;
            if p.abs() > bound {
                p = bound * p.signum();
                ball.velocity[axis] = -ball.velocity[axis] * restitution;
            }
            ball.translation[axis] = p;
            ball.velocity[axis] *= decay;
        }
        ball.translation.z = BALL_DEPTH;
        if ball.planar_velocity().norm() < REST_SPEED {
            ball.velocity = [0.0; 6];
        }
    }

    /// Refresh what every robot's ball receiver picks up.
    fn sense(&mut self) {
        let ball = self.ball.translation.xy();
        let range = self.settings.ir_range;
        for robot in self.robots.values_mut() {
            let rel = ball - robot.body.translation.xy();
            let dist = rel.norm();
            robot.ball_reading = if dist > range {
                None
            } else {
                let local = Angle::from_radians(-robot.body.rotation.yaw()).rotate_vector(&rel);
                let dir = if dist > 1e-9 { local / dist } else { Vector2::x() };
                Some(BallReading {
                    direction: Vector3::new(dir.x, dir.y, 0.0),
                    strength: 1.0 / dist.max(1e-3).powi(2),
                })
            };
        }
    }

    fn sonar(&self, name: RobotName) -> SonarValues {
        let Some(robot) = self.robots.get(&name) else {
            return SonarValues::default();
        };
        let origin = robot.body.translation.xy();
        let yaw = robot.body.rotation.yaw();
        let range = self.settings.sonar_range;
        let measure = |offset: f64| {
            let a = yaw + offset;
            let dir = Vector2::new(a.cos(), a.sin());
            (wall_distance(origin, dir) - ROBOT_RADIUS).clamp(0.0, range)
        };
        SonarValues {
            front: measure(0.0),
            left: measure(std::f64::consts::FRAC_PI_2),
            back: measure(std::f64::consts::PI),
            right: measure(-std::f64::consts::FRAC_PI_2),
        }
    }

    fn body(&self, object: ObjectId) -> Result<&Body, OracleError> {
        match object {
            ObjectId::Ball => Ok(&self.ball),
            ObjectId::Robot(name) => self
                .robots
                .get(&name)
                .map(|r| &r.body)
                .ok_or(OracleError::UnknownObject(object)),
        }
    }

    fn body_mut(&mut self, object: ObjectId) -> Result<&mut Body, OracleError> {
        match object {
            ObjectId::Ball => Ok(&mut self.ball),
            ObjectId::Robot(name) => self
                .robots
                .get_mut(&name)
                .map(|r| &mut r.body)
                .ok_or(OracleError::UnknownObject(object)),
        }
    }

    fn robot_mut(&mut self, name: RobotName) -> Result<&mut SimRobot, OracleError> {
        self.robots
            .get_mut(&name)
            .ok_or(OracleError::UnknownObject(ObjectId::Robot(name)))
    }
}

/// Distance from `origin` along the unit vector `dir` to the walls.
fn wall_distance(origin: Vector2, dir: Vector2) -> f64 {
    let mut t = f64::INFINITY;
    for (p, d, wall) in [(origin.x, dir.x, WALL_X), (origin.y, dir.y, WALL_Y)] {
        if d > 1e-12 {
            t = t.min((wall - p) / d);
        } else if d < -1e-12 {
            t = t.min((-wall - p) / d);
        }
    }
    t.max(0.0)
}

fn check_finite(object: ObjectId, values: &[f64]) -> Result<(), OracleError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(OracleError::InvalidValue {
            object,
            reason: format!("non-finite component in {values:?}"),
        })
    }
}

impl SimulationOracle for Simulation {
    fn time(&self) -> f64 {
        self.time
    }

    fn robots(&self) -> Vec<RobotName> {
        self.robots.keys().copied().collect()
    }

    fn translation(&self, object: ObjectId) -> Result<Vector3, OracleError> {
        Ok(self.body(object)?.translation)
    }

    fn set_translation(&mut self, object: ObjectId, value: Vector3) -> Result<(), OracleError> {
        check_finite(object, value.as_slice())?;
        self.body_mut(object)?.translation = value;
        Ok(())
    }

    fn rotation(&self, object: ObjectId) -> Result<Rotation, OracleError> {
        Ok(self.body(object)?.rotation)
    }

    fn set_rotation(&mut self, object: ObjectId, value: Rotation) -> Result<(), OracleError> {
        check_finite(object, &value.0)?;
        self.body_mut(object)?.rotation = value;
        Ok(())
    }

    fn velocity(&self, object: ObjectId) -> Result<Velocity, OracleError> {
        Ok(self.body(object)?.velocity)
    }

    fn set_velocity(&mut self, object: ObjectId, value: Velocity) -> Result<(), OracleError> {
        check_finite(object, &value)?;
        self.body_mut(object)?.velocity = value;
        Ok(())
    }

    fn reset_physics(&mut self, object: ObjectId) -> Result<(), OracleError> {
        self.body_mut(object)?.velocity = [0.0; 6];
        if let ObjectId::Robot(name) = object {
            self.robot_mut(name)?.wheels = (0.0, 0.0);
        }
        Ok(())
    }

    fn controller(&self, robot: RobotName) -> Result<String, OracleError> {
        self.robots
            .get(&robot)
            .map(|r| r.controller.clone())
            .ok_or(OracleError::UnknownObject(ObjectId::Robot(robot)))
    }

    fn set_controller(&mut self, robot: RobotName, controller: &str) -> Result<(), OracleError> {
        self.robot_mut(robot)?.controller = controller.to_owned();
        log::debug!("{}: controller set to {}", robot, controller);
        self.restarts.insert(robot);
        Ok(())
    }

    fn restart_controller(&mut self, robot: RobotName) -> Result<(), OracleError> {
        self.robot_mut(robot)?;
        self.restarts.insert(robot);
        Ok(())
    }

    fn selected(&self) -> Option<ObjectId> {
        self.selected
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Simulation::new(SimulationSettings::default())
    }
}

pub struct SimulationBuilder {
    sim: Simulation,
}

impl SimulationBuilder {
    pub fn new(settings: SimulationSettings) -> Self {
        SimulationBuilder {
            sim: Simulation::new(settings),
        }
    }

    /// Place a robot at a field position facing `yaw`, running `controller`.
    pub fn add_robot(mut self, name: RobotName, position: Vector2, yaw: f64, controller: &str) -> Self {
        self.sim.robots.insert(
            name,
            SimRobot {
                body: Body::at(
                    Vector3::new(position.x, position.y, ROBOT_DEPTH),
                    Rotation::from_yaw(yaw),
                ),
                wheels: (0.0, 0.0),
                controller: controller.to_owned(),
                ball_reading: None,
            },
        );
        self
    }

    pub fn add_ball(mut self, position: Vector2) -> Self {
        self.sim.ball = Body::at(
            Vector3::new(position.x, position.y, BALL_DEPTH),
            Rotation::default(),
        );
        self
    }

    /// Both full teams at their kickoff positions.
    pub fn with_match_setup(mut self, blue: &str, yellow: &str) -> Self {
        for name in RobotName::all() {
            let (translation, rotation) = initial_pose(name);
            let controller = match name.team {
                rcj_core::TeamColor::Blue => blue,
                rcj_core::TeamColor::Yellow => yellow,
            };
            self = self.add_robot(name, translation.xy(), rotation.yaw(), controller);
        }
        self
    }

    pub fn build(mut self) -> Simulation {
        self.sim.sense();
        self.sim
    }
}

impl Default for SimulationBuilder {
    fn default() -> Self {
        SimulationBuilder::new(SimulationSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;

    use super::*;

    fn name(s: &str) -> RobotName {
        s.parse().unwrap()
    }

    #[test]
    fn straight_drive_follows_yaw() {
        let mut sim = SimulationBuilder::default()
            .add_robot(name("B1"), Vector2::zeros(), -FRAC_PI_2, "striker")
            .add_ball(Vector2::new(0.5, 0.5))
            .build();
        sim.set_wheels(name("B1"), 10.0, 10.0);
        sim.step(0.5);
        let (pos, yaw) = sim.robot_pose(name("B1")).unwrap();
        // 10 rad/s * 0.02 m * 0.5 s
        assert_relative_eq!(pos.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pos.y, -0.1, epsilon = 1e-9);
        assert_relative_eq!(yaw, -FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn right_wheel_faster_turns_counter_clockwise() {
        let mut sim = SimulationBuilder::default()
            .add_robot(name("Y2"), Vector2::zeros(), 0.0, "spinner")
            .build();
        sim.set_wheels(name("Y2"), -1.0, 1.0);
        sim.step(0.1);
        let (pos, yaw) = sim.robot_pose(name("Y2")).unwrap();
        assert!(yaw > 0.0);
        assert_relative_eq!(pos.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn ball_rolls_and_stops_at_walls() {
        let mut sim = SimulationBuilder::default().add_ball(Vector2::zeros()).build();
        sim.set_velocity(ObjectId::Ball, [5.0, 0.0, 0.0, 0.0, 0.0, 0.0]).unwrap();
        for _ in 0..20 {
            sim.step(0.064);
            assert!(sim.ball_position().x <= WALL_X - BALL_RADIUS + 1e-12);
        }
        assert!(sim.velocity(ObjectId::Ball).unwrap()[0].abs() < 5.0);
    }

    #[test]
    fn robot_pushes_ball() {
        let mut sim = SimulationBuilder::default()
            .add_robot(name("B1"), Vector2::new(0.0, 0.1), -FRAC_PI_2, "striker")
            .add_ball(Vector2::new(0.0, 0.1 - ROBOT_RADIUS - BALL_RADIUS - 0.001))
            .build();
        let start = sim.ball_position();
        for _ in 0..5 {
            sim.set_wheels(name("B1"), 10.0, 10.0);
            sim.step(0.064);
        }
        assert!(sim.ball_position().y < start.y - 0.01);
    }

    #[test]
    fn ir_reading_matches_geometry() {
        let sim = SimulationBuilder::default()
            .add_robot(name("B1"), Vector2::new(0.0, 0.5), -FRAC_PI_2, "striker")
            .add_ball(Vector2::new(0.0, 0.0))
            .build();
        let reading = sim.robots[&name("B1")].ball_reading.unwrap();
        // Straight ahead at 0.5 m
        assert_relative_eq!(reading.direction.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(reading.direction.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(reading.strength, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn oracle_accessors() {
        let mut sim = SimulationBuilder::default()
            .with_match_setup("chaser", "striker")
            .build();
        assert_eq!(sim.robots().len(), 6);
        assert_eq!(sim.controller(name("Y3")).unwrap(), "striker");
        sim.set_controller(name("B2"), "watcher").unwrap();
        sim.restart_controller(name("Y1")).unwrap();
        assert_eq!(sim.take_restarts(), vec![name("B2"), name("Y1")]);
        assert!(sim.take_restarts().is_empty());

        let t = Vector3::new(0.1, 0.2, ROBOT_DEPTH);
        sim.set_translation(name("B3").into(), t).unwrap();
        assert_eq!(sim.translation(name("B3").into()).unwrap(), t);
        assert!(sim
            .set_translation(ObjectId::Ball, Vector3::new(f64::NAN, 0.0, 0.0))
            .is_err());
    }

    #[test]
    fn sonar_sees_walls() {
        let sim = SimulationBuilder::default()
            .add_robot(name("B1"), Vector2::new(0.0, 0.0), 0.0, "striker")
            .build();
        let sonar = sim.sonar(name("B1"));
        assert_relative_eq!(sonar.front, (WALL_X - ROBOT_RADIUS).min(1.0), epsilon = 1e-9);
        assert_relative_eq!(sonar.left, (WALL_Y - ROBOT_RADIUS).min(1.0), epsilon = 1e-9);
    }
}
