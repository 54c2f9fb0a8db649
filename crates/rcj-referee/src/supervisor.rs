use std::{collections::BTreeMap, time::Duration};

use rand::{rngs::StdRng, Rng, SeedableRng};
use rcj_comm::{Emitter, SupervisorMessage};
use rcj_core::{
    d2r, out_of_field_pose, ObjectId, OracleError, RobotName, Rotation, SimulationOracle, TeamColor,
    Vector3, BALL_DEPTH, FIELD_X_LOWER_LIMIT, FIELD_X_UPPER_LIMIT, FIELD_Y_LOWER_LIMIT,
    FIELD_Y_UPPER_LIMIT,
};
use thiserror::Error;

use crate::{
    place, Command, CommandError, ConsoleMessage, ConsoleSink, ControllerCatalog,
    ControllerWatcher, MatchUpdate, MoveProperty, PersistedState, RawCommand, Referee,
    ReloadDebouncer, SnapshotRecord, StateStore, TickOutcome,
};

/// Margin kept from the field lines when the ball is dropped at random.
const RANDOM_BALL_MARGIN: f64 = 0.1;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("non-finite value {value} for {object}")]
    InvalidValue { object: ObjectId, value: f64 },
}

/// The referee process: match rules plus the operator console, persistence
/// and controller management around them.
pub struct Supervisor {
    referee: Referee,
    console: Box<dyn ConsoleSink>,
    store: Box<dyn StateStore>,
    catalog: Box<dyn ControllerCatalog>,
    debouncer: ReloadDebouncer,
    watcher: Option<ControllerWatcher>,
    radio: Option<Emitter>,
    saved_snapshot: Option<SnapshotRecord>,
    rng: StdRng,
}

impl Supervisor {
    pub fn new(
        referee: Referee,
        store: impl StateStore + 'static,
        console: impl ConsoleSink + 'static,
        catalog: impl ControllerCatalog + 'static,
    ) -> Self {
        let debounce = Duration::from_millis(referee.settings().reload_debounce_ms);
        Self {
            referee,
            console: Box::new(console),
            store: Box::new(store),
            catalog: Box::new(catalog),
            debouncer: ReloadDebouncer::new(debounce),
            watcher: None,
            radio: None,
            saved_snapshot: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Broadcast the kickoff flag to the robots on this emitter.
    pub fn with_radio(mut self, emitter: Emitter) -> Self {
        self.radio = Some(emitter);
        self
    }

    /// Reload the controllers when the watched files change.
    pub fn with_watcher(mut self, watcher: ControllerWatcher) -> Self {
        self.watcher = Some(watcher);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn referee(&self) -> &Referee {
        &self.referee
    }

    pub fn referee_mut(&mut self) -> &mut Referee {
        &mut self.referee
    }

    pub fn saved_snapshot(&self) -> Option<&SnapshotRecord> {
        self.saved_snapshot.as_ref()
    }

    /// Apply the persisted state. A missing or unreadable state leaves the
    /// defaults in place.
    pub fn restore_state(&mut self, oracle: &mut impl SimulationOracle) {
        let state = self.store.load_or_default();
        self.referee.set_flags(state.flags());
        self.saved_snapshot = state.saved_snapshot;
        for (team, controller) in [
            (TeamColor::Yellow, state.yellow_controller),
            (TeamColor::Blue, state.blue_controller),
        ] {
            if let Some(controller) = controller {
                if let Err(err) = set_team_controller(oracle, team, &controller) {
                    log::warn!("Could not restore the {} controller: {}", team, err);
                }
            }
        }
    }

    /// Ask for a controller reload. Served at most once per debounce interval.
    pub fn request_reload(&mut self) {
        self.debouncer.request();
    }

    /// One referee step: reload check, at most one operator command, the
    /// rules, then the broadcasts.
    pub fn tick(
        &mut self,
        oracle: &mut impl SimulationOracle,
        command: Option<&str>,
        dt: f64,
    ) -> TickOutcome {
        self.check_reload(oracle);
        if let Some(text) = command {
            self.handle_command(oracle, text);
        }

        let outcome = self.referee.tick(oracle, dt);

        if let Some(radio) = &self.radio {
            radio.send(&SupervisorMessage {
                waiting_for_kickoff: self.referee.waiting_for_kickoff(),
            });
        }
        self.send_update(oracle);
        if outcome == TickOutcome::GameOver {
            self.console.send(ConsoleMessage::GameOver {});
        }
        outcome
    }

    /// Start a new match once the previous one ended.
    pub fn restart_match(&mut self, oracle: &mut impl SimulationOracle) {
        if let Err(err) = self.referee.restart_match(oracle) {
            log::error!("Failed to restart the match: {}", err);
        }
    }

    pub fn handle_command(&mut self, oracle: &mut impl SimulationOracle, text: &str) {
        let raw = match RawCommand::parse(text) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("Dropping console message: {}", err);
                return;
            }
        };
        log::info!("{}", raw.echo());

        let result = match raw.command() {
            Ok(Some(command)) => self.execute(oracle, command),
            Ok(None) => {
                log::debug!("Ignoring unknown command {}", raw.msg);
                Ok(())
            }
            Err(err) => Err(err.into()),
        };
        match result {
            Ok(()) => self.persist(oracle),
            Err(err) => log::error!("Command {} failed: {}", raw.msg, err),
        }
    }

    fn execute(&mut self, oracle: &mut impl SimulationOracle, command: Command) -> Result<(), SupervisorError> {
        match command {
            Command::Setup => {
                self.send_controllers_list(oracle);
                self.console.send(ConsoleMessage::UpdateFlags(self.referee.flags()));
            }
            Command::Reset => self.reset_controllers(oracle)?,
            Command::SetController { team, controller } => {
                set_team_controller(oracle, team, &controller)?;
            }
            Command::SetRule { rule, enabled } => self.referee.set_flag(rule, enabled),
            Command::SaveState => self.saved_snapshot = Some(SnapshotRecord::save(oracle)?),
            Command::RestoreState => {
                if let Some(snapshot) = &self.saved_snapshot {
                    snapshot.restore(oracle)?;
                    self.referee.object_moved(ObjectId::Ball);
                    for robot in oracle.robots() {
                        self.referee.object_moved(robot.into());
                    }
                }
            }
            Command::RandomizeBall => {
                let x = self.rng.gen_range(
                    FIELD_X_LOWER_LIMIT + RANDOM_BALL_MARGIN..FIELD_X_UPPER_LIMIT - RANDOM_BALL_MARGIN,
                );
                let y = self.rng.gen_range(
                    FIELD_Y_LOWER_LIMIT + RANDOM_BALL_MARGIN..FIELD_Y_UPPER_LIMIT - RANDOM_BALL_MARGIN,
                );
                place(oracle, ObjectId::Ball, Vector3::new(x, y, BALL_DEPTH), None)?;
                self.referee.object_moved(ObjectId::Ball);
            }
            Command::MoveObject {
                object,
                property,
                value,
            } => self.move_object(oracle, object, property, value)?,
            Command::MoveOut => {
                // Nothing moves unless every robot can be read
                let poses = oracle
                    .robots()
                    .into_iter()
                    .map(|robot| {
                        let z = oracle.translation(robot.into())?.z;
                        Ok((robot, out_of_field_pose(robot, z)))
                    })
                    .collect::<Result<Vec<_>, OracleError>>()?;
                for (robot, (translation, rotation)) in poses {
                    place(oracle, robot.into(), translation, Some(rotation))?;
                    self.referee.object_moved(robot.into());
                }
            }
        }
        Ok(())
    }

    fn move_object(
        &mut self,
        oracle: &mut impl SimulationOracle,
        object: ObjectId,
        property: MoveProperty,
        value: f64,
    ) -> Result<(), SupervisorError> {
        if !oracle.contains(object) {
            log::debug!("move_object: no object {}", object);
            return Ok(());
        }
        if !value.is_finite() {
            return Err(SupervisorError::InvalidValue { object, value });
        }
        let mut translation = oracle.translation(object)?;
        oracle.set_velocity(object, [0.0; 6])?;
        oracle.reset_physics(object)?;
        match property {
            MoveProperty::A if object == ObjectId::Ball => return Ok(()),
            MoveProperty::A => oracle.set_rotation(object, Rotation::from_yaw(d2r(value)))?,
            MoveProperty::X => {
                translation.x = value;
                oracle.set_translation(object, translation)?;
            }
            MoveProperty::Y => {
                translation.y = value;
                oracle.set_translation(object, translation)?;
            }
        }
        self.referee.object_moved(object);
        Ok(())
    }

    fn check_reload(&mut self, oracle: &mut impl SimulationOracle) {
        if let Some(watcher) = &mut self.watcher {
            if watcher.poll() {
                self.debouncer.request();
            }
        }
        if self.debouncer.poll() {
            self.send_controllers_list(oracle);
            if let Err(err) = self.reset_controllers(oracle) {
                log::error!("Controller reload failed: {}", err);
            }
        }
    }

    fn reset_controllers(&mut self, oracle: &mut impl SimulationOracle) -> Result<(), OracleError> {
        for robot in oracle.robots() {
            oracle.restart_controller(robot)?;
        }
        self.console.send(ConsoleMessage::Log {
            message: "RESET".into(),
        });
        Ok(())
    }

    fn send_controllers_list(&mut self, oracle: &impl SimulationOracle) {
        self.console.send(ConsoleMessage::UpdateControllersList {
            controllers: self.catalog.list(),
            yellow: team_controller(oracle, TeamColor::Yellow),
            blue: team_controller(oracle, TeamColor::Blue),
        });
    }

    fn persist(&mut self, oracle: &impl SimulationOracle) {
        let mut state = PersistedState {
            yellow_controller: team_controller(oracle, TeamColor::Yellow),
            blue_controller: team_controller(oracle, TeamColor::Blue),
            saved_snapshot: self.saved_snapshot.clone(),
            ..Default::default()
        };
        state.set_flags(self.referee.flags());
        if let Err(err) = self.store.store(&state) {
            log::error!("Could not save the state: {}", err);
        }
    }

    fn send_update(&mut self, oracle: &impl SimulationOracle) {
        let mut robot_translation = BTreeMap::new();
        let mut robot_rotation = BTreeMap::new();
        for robot in oracle.robots() {
            if let (Ok(t), Ok(r)) = (oracle.translation(robot.into()), oracle.rotation(robot.into())) {
                robot_translation.insert(robot, t.into());
                robot_rotation.insert(robot, r);
            }
        }
        let ball_translation = oracle
            .translation(ObjectId::Ball)
            .map(Into::into)
            .unwrap_or_default();

        self.console.send(ConsoleMessage::Update(MatchUpdate {
            time: oracle.time(),
            selected: oracle.selected(),
            ball_translation,
            robot_translation,
            robot_rotation,
            goal: self.referee.goal_indicator(),
            messages: self.referee.take_events(),
            phase: self.referee.phase(),
            clock: self.referee.clock(),
            score: self.referee.score(),
        }));
    }
}

fn team_robots(oracle: &impl SimulationOracle, team: TeamColor) -> Vec<RobotName> {
    oracle.robots().into_iter().filter(|r| r.team == team).collect()
}

/// The controller of the first robot of a team.
fn team_controller(oracle: &impl SimulationOracle, team: TeamColor) -> Option<String> {
    let robot = team_robots(oracle, team).into_iter().next()?;
    oracle.controller(robot).ok()
}

fn set_team_controller(
    oracle: &mut impl SimulationOracle,
    team: TeamColor,
    controller: &str,
) -> Result<(), OracleError> {
    for robot in team_robots(oracle, team) {
        oracle.set_controller(robot, controller)?;
    }
    Ok(())
}
