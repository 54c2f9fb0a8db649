use std::time::{Duration, Instant};

use rcj_comm::{Channel, Emitter, Radio, Receiver, RemoteError, SupervisorMessage, TeamMessage};
use rcj_core::{ControllerSettings, RobotName};
use rcj_world::{TickInputs, WorldModel};
use thiserror::Error;

use crate::{
    behavior::{Behavior, BehaviorCtx, BehaviorKind},
    devices::{RobotDevices, SensorSnapshot},
    steering::{search_motion, WheelSpeeds},
};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("unknown behavior {0:?}")]
    UnknownBehavior(String),
    #[error("remote brain unavailable: {0}")]
    Remote(#[from] RemoteError),
}

/// A robot's three radio endpoints.
pub struct RadioLink {
    pub supervisor: Receiver,
    pub team_rx: Receiver,
    pub team_tx: Emitter,
}

impl RadioLink {
    pub fn attach(radio: &Radio, robot: RobotName) -> Self {
        let team = Channel::Team(robot.team);
        Self {
            supervisor: radio.receiver(Channel::Supervisor, format!("{robot} supervisor receiver")),
            team_rx: radio.receiver(team, format!("{robot} team receiver")),
            team_tx: radio.emitter(team),
        }
    }
}

/// What happened during one controller tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub speeds: WheelSpeeds,
    pub searching: bool,
    pub holding: bool,
    pub elapsed: Duration,
}

/// The per-robot control loop.
pub struct RobotController {
    name: RobotName,
    world: WorldModel,
    link: RadioLink,
    behavior: Box<dyn Behavior>,
    kind: BehaviorKind,
    settings: ControllerSettings,
    tick_duration: Duration,
}

impl RobotController {
    pub fn new(
        name: RobotName,
        kind: BehaviorKind,
        link: RadioLink,
        settings: ControllerSettings,
        tick_duration: Duration,
    ) -> Result<Self, ControllerError> {
        let behavior = kind.build(&settings)?;
        log::info!("{}: starting {} controller", name, kind);
        Ok(Self {
            name,
            world: WorldModel::new(name.team, name.id),
            link,
            behavior,
            kind,
            settings,
            tick_duration,
        })
    }

    pub fn name(&self) -> RobotName {
        self.name
    }

    pub fn kind(&self) -> BehaviorKind {
        self.kind
    }

    pub fn world(&self) -> &WorldModel {
        &self.world
    }

    /// Run one control cycle: read the radio and sensors, decide, broadcast,
    /// then drive.
    pub fn tick(&mut self, devices: &mut impl RobotDevices) -> TickReport {
        let start = Instant::now();

        let supervisor_update = self
            .link
            .supervisor
            .latest::<SupervisorMessage>()
            .map(|msg| msg.waiting_for_kickoff);
        let peers: Vec<TeamMessage> = self.link.team_rx.drain();
        let last_peer_id = peers
            .iter()
            .rev()
            .map(|m| m.sender_id)
            .find(|&id| id != self.name.id.as_u8() as i32);

        let sensors = SensorSnapshot::read(devices);
        self.world.refresh(&TickInputs {
            waiting_for_kickoff: supervisor_update,
            peers,
            position: sensors.position,
            heading: sensors.heading,
            ball_reading: sensors.ball,
        });

        let holding = self.settings.hold_on_kickoff
            && self.world.waiting_for_kickoff()
            && self.behavior.respects_kickoff();
        let (speeds, searching) = if holding {
            (WheelSpeeds::STOP, false)
        } else {
            let ctx = BehaviorCtx {
                world: &self.world,
                sensors: &sensors,
                settings: &self.settings,
                supervisor_update,
                last_peer_id,
            };
            match self.behavior.update(ctx) {
                Some(speeds) => (speeds, false),
                None => (search_motion(&self.settings), true),
            }
        };

        self.link.team_tx.send(&self.world.own_report().to_message());

        let speeds = speeds.clamp(self.settings.max_velocity);
        devices.set_wheel_velocities(speeds.left, speeds.right);

        let elapsed = start.elapsed();
        if elapsed > self.tick_duration {
            log::warn!("{} - Delay: {} ms", self.name, elapsed.as_millis());
        }
        TickReport {
            speeds,
            searching,
            holding,
            elapsed,
        }
    }

    /// Called once the simulation advanced past this tick.
    pub fn after_step(&mut self, devices: &mut impl RobotDevices) {
        if self.settings.stop_between_ticks {
            devices.set_wheel_velocities(0.0, 0.0);
        }
    }
}
