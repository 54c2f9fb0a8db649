use std::{fmt, str::FromStr, time::Duration};

use rcj_comm::{BallSignal, RemoteBrain, RobotReport, SensorReport};
use rcj_core::{ControllerSettings, Vector2};
use rcj_world::WorldModel;
use serde::{Deserialize, Serialize};

use crate::{
    devices::SensorSnapshot,
    steering::{ball_offset, go_to_ball, go_to_point, local_direction, look_at_point, WheelSpeeds},
    ControllerError,
};

pub struct BehaviorCtx<'a> {
    pub world: &'a WorldModel,
    pub sensors: &'a SensorSnapshot,
    pub settings: &'a ControllerSettings,
    /// The referee flag, only when it arrived this tick.
    pub supervisor_update: Option<bool>,
    /// Sender of the newest teammate message received this tick.
    pub last_peer_id: Option<i32>,
}

impl BehaviorCtx<'_> {
    /// Ball position from the world model.
    pub fn ball(&self) -> Option<Vector2> {
        self.world.ball().position()
    }

    /// Direction to the ball in the robot frame, preferring this tick's own
    /// infrared reading.
    pub fn ball_direction(&self) -> Option<Vector2> {
        match self.sensors.ball {
            Some(reading) if reading.strength > 0.0 => {
                Some(Vector2::new(reading.direction.x, reading.direction.y))
            }
            _ => self
                .ball()
                .map(|ball| local_direction(self.sensors.position, self.sensors.heading, ball)),
        }
    }
}

/// Decides the wheel speeds of one robot each tick.
pub trait Behavior: Send {
    /// Compute the wheel speeds for this tick. `None` means no ball is known
    /// and the controller falls back to its search motion.
    fn update(&mut self, ctx: BehaviorCtx) -> Option<WheelSpeeds>;

    /// Whether the robot holds still while the referee waits for the kickoff.
    fn respects_kickoff(&self) -> bool {
        true
    }
}

/// The built-in controller programs, selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorKind {
    /// Point approach to the ball.
    Striker,
    /// Direct pursuit of the ball.
    Chaser,
    /// Turns to face the ball without moving.
    Watcher,
    /// Spins in place forever.
    Spinner,
    /// Wheel speeds chosen by an external process.
    Remote,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 5] = [
        BehaviorKind::Striker,
        BehaviorKind::Chaser,
        BehaviorKind::Watcher,
        BehaviorKind::Spinner,
        BehaviorKind::Remote,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BehaviorKind::Striker => "striker",
            BehaviorKind::Chaser => "chaser",
            BehaviorKind::Watcher => "watcher",
            BehaviorKind::Spinner => "spinner",
            BehaviorKind::Remote => "remote",
        }
    }

    pub fn build(&self, settings: &ControllerSettings) -> Result<Box<dyn Behavior>, ControllerError> {
        Ok(match self {
            BehaviorKind::Striker => Box::new(Striker),
            BehaviorKind::Chaser => Box::new(Chaser),
            BehaviorKind::Watcher => Box::new(Watcher),
            BehaviorKind::Spinner => Box::new(Spinner),
            BehaviorKind::Remote => Box::new(Remote::connect(settings)?),
        })
    }
}

impl fmt::Display for BehaviorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BehaviorKind {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BehaviorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| ControllerError::UnknownBehavior(s.to_owned()))
    }
}

pub struct Striker;

impl Behavior for Striker {
    fn update(&mut self, ctx: BehaviorCtx) -> Option<WheelSpeeds> {
        let ball = ctx.ball()?;
        Some(go_to_point(
            ctx.sensors.position,
            ctx.sensors.heading,
            ball,
            ctx.settings.approach_threshold,
            ctx.settings,
        ))
    }
}

pub struct Chaser;

impl Behavior for Chaser {
    fn update(&mut self, ctx: BehaviorCtx) -> Option<WheelSpeeds> {
        let direction = ctx.ball_direction()?;
        let offset = ball_offset(direction, ctx.settings.direction_dead_band);
        Some(go_to_ball(offset, ctx.settings))
    }
}

pub struct Watcher;

impl Behavior for Watcher {
    fn update(&mut self, ctx: BehaviorCtx) -> Option<WheelSpeeds> {
        let ball = ctx.ball()?;
        Some(look_at_point(
            ctx.sensors.position,
            ctx.sensors.heading,
            ball,
            ctx.settings.look_threshold,
        ))
    }
}

pub struct Spinner;

impl Behavior for Spinner {
    fn update(&mut self, ctx: BehaviorCtx) -> Option<WheelSpeeds> {
        let v = ctx.settings.spin_velocity;
        Some(WheelSpeeds::new(v, -v))
    }

    fn respects_kickoff(&self) -> bool {
        false
    }
}

/// Forwards the sensors to an external decision process and applies its answer.
///
/// When no answer arrives in time the previous wheel speeds are kept.
pub struct Remote {
    brain: RemoteBrain,
    last: WheelSpeeds,
}

impl Remote {
    pub fn connect(settings: &ControllerSettings) -> Result<Self, ControllerError> {
        let brain = RemoteBrain::connect(
            &settings.remote_addr,
            Duration::from_millis(settings.remote_timeout_ms),
        )?;
        Ok(Self {
            brain,
            last: WheelSpeeds::STOP,
        })
    }

    fn report(ctx: &BehaviorCtx) -> SensorReport {
        let sensors = ctx.sensors;
        SensorReport {
            waiting_for_kickoff: ctx.supervisor_update,
            robot_id: ctx.last_peer_id,
            ball: BallSignal {
                direction: sensors
                    .ball
                    .map(|b| [b.direction.x, b.direction.y, b.direction.z]),
                strength: sensors.ball.map(|b| b.strength),
            },
            robot: RobotReport {
                name: sensors.name,
                position: [sensors.position.x, sensors.position.y],
                rotation: sensors.heading.radians(),
                sonar: sensors.sonar,
            },
            color: sensors.name.team,
            time: sensors.time,
        }
    }
}

impl Behavior for Remote {
    fn update(&mut self, ctx: BehaviorCtx) -> Option<WheelSpeeds> {
        match self.brain.exchange(&Self::report(&ctx)) {
            Ok(Some(cmd)) => self.last = WheelSpeeds::new(cmd.left, cmd.right),
            Ok(None) => {}
            Err(err) => log::warn!("{}: remote brain: {}", ctx.sensors.name, err),
        }
        Some(self.last)
    }

    fn respects_kickoff(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use rcj_core::{Angle, BallReading, RobotId, SonarValues, TeamColor, Vector3};
    use rcj_world::TickInputs;

    use super::*;

    fn snapshot(ball: Option<BallReading>) -> SensorSnapshot {
        SensorSnapshot {
            name: "B1".parse().unwrap(),
            time: 0.0,
            position: Vector2::zeros(),
            heading: Angle::default(),
            sonar: SonarValues::default(),
            ball,
        }
    }

    fn world(sensors: &SensorSnapshot) -> WorldModel {
        let mut world = WorldModel::new(TeamColor::Blue, RobotId::new(1).unwrap());
        world.refresh(&TickInputs {
            position: sensors.position,
            heading: sensors.heading,
            ball_reading: sensors.ball,
            ..Default::default()
        });
        world
    }

    #[test]
    fn kinds_by_name() {
        for kind in BehaviorKind::ALL {
            assert_eq!(kind.name().parse::<BehaviorKind>().unwrap(), kind);
        }
        assert!("goalie".parse::<BehaviorKind>().is_err());
        assert_eq!(
            serde_json::from_str::<BehaviorKind>("\"watcher\"").unwrap(),
            BehaviorKind::Watcher
        );
    }

    #[test]
    fn chaser_turns_towards_ball_on_the_right() {
        let sensors = snapshot(Some(BallReading {
            direction: Vector3::new(0.6, -0.8, 0.0),
            strength: 4.0,
        }));
        let world = world(&sensors);
        let settings = ControllerSettings::default();
        let speeds = Chaser
            .update(BehaviorCtx {
                world: &world,
                sensors: &sensors,
                settings: &settings,
                supervisor_update: None,
                last_peer_id: None,
            })
            .unwrap();
        assert_eq!(speeds, WheelSpeeds::new(4.0, -4.0));
    }

    #[test]
    fn striker_without_ball_searches() {
        let sensors = snapshot(None);
        let world = world(&sensors);
        let settings = ControllerSettings::default();
        let ctx = BehaviorCtx {
            world: &world,
            sensors: &sensors,
            settings: &settings,
            supervisor_update: None,
            last_peer_id: None,
        };
        assert_eq!(Striker.update(ctx), None);
    }

    #[test]
    fn spinner_ignores_everything() {
        let sensors = snapshot(None);
        let world = world(&sensors);
        let settings = ControllerSettings::default();
        let ctx = BehaviorCtx {
            world: &world,
            sensors: &sensors,
            settings: &settings,
            supervisor_update: Some(true),
            last_peer_id: None,
        };
        assert_eq!(Spinner.update(ctx), Some(WheelSpeeds::new(10.0, -10.0)));
        assert!(!Spinner.respects_kickoff());
    }

    #[test]
    fn remote_report_carries_the_sensors() {
        let sensors = snapshot(Some(BallReading {
            direction: Vector3::new(1.0, 0.0, 0.0),
            strength: 0.5,
        }));
        let world = world(&sensors);
        let settings = ControllerSettings::default();
        let ctx = BehaviorCtx {
            world: &world,
            sensors: &sensors,
            settings: &settings,
            supervisor_update: Some(true),
            last_peer_id: Some(2),
        };
        let report = Remote::report(&ctx);
        assert_eq!(report.waiting_for_kickoff, Some(true));
        assert_eq!(report.robot_id, Some(2));
        assert_eq!(report.ball.strength, Some(0.5));
        assert_eq!(report.color, TeamColor::Blue);
    }
}
