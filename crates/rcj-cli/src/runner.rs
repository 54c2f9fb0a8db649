use std::{collections::BTreeMap, time::Duration};

use rcj_comm::{Channel, Radio};
use rcj_core::{MatchSettings, RobotName, SimulationOracle};
use rcj_referee::{Supervisor, TickOutcome};
use rcj_robot::{BehaviorKind, RadioLink, RobotController, VelocityActuator};
use rcj_simulator::{SimRobotIo, Simulation, SimulationBuilder};

/// Behavior used for controller names that are not built in.
const FALLBACK_BEHAVIOR: BehaviorKind = BehaviorKind::Chaser;

/// Owns everything a match needs and advances it one tick at a time.
pub struct MatchRunner {
    settings: MatchSettings,
    sim: Simulation,
    radio: Radio,
    supervisor: Supervisor,
    controllers: BTreeMap<RobotName, RobotController>,
}

impl MatchRunner {
    /// Set up the field with `blue` and `yellow` as the team controllers, then
    /// apply whatever state the supervisor has persisted.
    pub fn new(settings: MatchSettings, supervisor: Supervisor, blue: &str, yellow: &str) -> Self {
        let radio = Radio::new(&settings.radio);
        let mut sim = SimulationBuilder::new(settings.simulation.clone())
            .with_match_setup(blue, yellow)
            .build();
        let mut supervisor = supervisor.with_radio(radio.emitter(Channel::Supervisor));
        supervisor.restore_state(&mut sim);
        // Every controller is started below anyway
        sim.take_restarts();

        let mut runner = Self {
            settings,
            sim,
            radio,
            supervisor,
            controllers: BTreeMap::new(),
        };
        for robot in runner.sim.robots() {
            runner.start_controller(robot);
        }
        runner
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn controller(&self, robot: RobotName) -> Option<&RobotController> {
        self.controllers.get(&robot)
    }

    /// One tick: referee and operator command, controller restarts, every
    /// robot's control cycle, then the physics step.
    pub fn tick(&mut self, command: Option<&str>) -> TickOutcome {
        let dt = self.settings.time_step();
        let outcome = self.supervisor.tick(&mut self.sim, command, dt);

        for robot in self.sim.take_restarts() {
            self.start_controller(robot);
        }

        for (&robot, controller) in self.controllers.iter_mut() {
            if let Some(mut io) = SimRobotIo::attach(&mut self.sim, robot) {
                controller.tick(&mut io);
            }
        }
        self.sim.step(dt);
        for (&robot, controller) in self.controllers.iter_mut() {
            if let Some(mut io) = SimRobotIo::attach(&mut self.sim, robot) {
                controller.after_step(&mut io);
            }
        }
        outcome
    }

    pub fn restart_match(&mut self) {
        self.supervisor.restart_match(&mut self.sim);
    }

    fn start_controller(&mut self, robot: RobotName) {
        // The old controller's radio receivers go away with it
        self.controllers.remove(&robot);
        if let Some(mut io) = SimRobotIo::attach(&mut self.sim, robot) {
            io.set_wheel_velocities(0.0, 0.0);
        }

        let name = match self.sim.controller(robot) {
            Ok(name) => name,
            Err(err) => {
                log::error!("{}: no controller assigned: {}", robot, err);
                return;
            }
        };
        let kind = name.parse::<BehaviorKind>().unwrap_or_else(|err| {
            log::warn!("{}: {}, running {} instead", robot, err, FALLBACK_BEHAVIOR);
            FALLBACK_BEHAVIOR
        });
        let tick_duration = Duration::from_millis(self.settings.time_step_ms);
        let link = RadioLink::attach(&self.radio, robot);
        match RobotController::new(robot, kind, link, self.settings.controller.clone(), tick_duration) {
            Ok(controller) => {
                self.controllers.insert(robot, controller);
            }
            Err(err) => log::error!("{}: failed to start {} controller: {}", robot, kind, err),
        }
    }
}
