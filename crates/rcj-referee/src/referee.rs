use std::collections::BTreeMap;

use rcj_core::{
    format_clock, in_penalty_area, initial_pose, kickoff_translation, scoring_team, ObjectId,
    OracleError, RefereeSettings, RobotName, Rotation, SimulationOracle, TeamColor, Timer, Vector2,
    Vector3, BALL_DEPTH, NEUTRAL_SPOTS, ROBOT_DEPTH,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    WaitingForKickoff,
    Playing,
    GoalScored,
    PenaltyAreaViolation,
    Timeout,
}

/// One of the rule checks that can be switched off at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    Timer,
    Progress,
    Goal,
    RobotsInPenaltyArea,
}

impl Rule {
    pub const ALL: [Rule; 4] = [Rule::Timer, Rule::Progress, Rule::Goal, Rule::RobotsInPenaltyArea];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Timer => "check_timer",
            Rule::Progress => "check_progress",
            Rule::Goal => "check_goal",
            Rule::RobotsInPenaltyArea => "check_robots_in_penalty_area",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleFlags {
    pub check_timer: bool,
    pub check_progress: bool,
    pub check_goal: bool,
    pub check_robots_in_penalty_area: bool,
}

impl RuleFlags {
    pub fn get(&self, rule: Rule) -> bool {
        match rule {
            Rule::Timer => self.check_timer,
            Rule::Progress => self.check_progress,
            Rule::Goal => self.check_goal,
            Rule::RobotsInPenaltyArea => self.check_robots_in_penalty_area,
        }
    }

    pub fn set(&mut self, rule: Rule, enabled: bool) {
        let flag = match rule {
            Rule::Timer => &mut self.check_timer,
            Rule::Progress => &mut self.check_progress,
            Rule::Goal => &mut self.check_goal,
            Rule::RobotsInPenaltyArea => &mut self.check_robots_in_penalty_area,
        };
        *flag = enabled;
    }
}

impl Default for RuleFlags {
    fn default() -> Self {
        Self {
            check_timer: true,
            check_progress: true,
            check_goal: true,
            check_robots_in_penalty_area: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub blue: u32,
    pub yellow: u32,
}

impl Score {
    pub fn of(&self, team: TeamColor) -> u32 {
        match team {
            TeamColor::Blue => self.blue,
            TeamColor::Yellow => self.yellow,
        }
    }

    fn add(&mut self, team: TeamColor) {
        match team {
            TeamColor::Blue => self.blue += 1,
            TeamColor::Yellow => self.yellow += 1,
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Blue {} - {} Yellow", self.blue, self.yellow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    /// The clock ran out during this tick.
    GameOver,
    /// The match already ended; nothing happens until it is restarted.
    Finished,
}

/// Detects a ball that stays in the same small region for too long.
#[derive(Debug, Clone)]
struct ProgressTracker {
    anchor: Option<Vector2>,
    timer: Timer,
}

impl ProgressTracker {
    fn new(duration: f64) -> Self {
        Self {
            anchor: None,
            timer: Timer::new(duration),
        }
    }

    fn reset(&mut self) {
        self.anchor = None;
        self.timer.reset();
    }

    /// Returns true when the ball stayed within `radius` of the anchor for the
    /// whole period.
    fn update(&mut self, ball: Vector2, radius: f64, dt: f64) -> bool {
        match self.anchor {
            Some(anchor) if (ball - anchor).norm() <= radius => {
                if self.timer.tick(dt) {
                    self.anchor = None;
                    return true;
                }
                false
            }
            _ => {
                self.anchor = Some(ball);
                self.timer.reset();
                false
            }
        }
    }
}

/// Teleport an object, dropping its momentum first.
pub fn place(
    oracle: &mut impl SimulationOracle,
    object: ObjectId,
    translation: Vector3,
    rotation: Option<Rotation>,
) -> Result<(), OracleError> {
    oracle.set_velocity(object, [0.0; 6])?;
    oracle.reset_physics(object)?;
    oracle.set_translation(object, translation)?;
    if let Some(rotation) = rotation {
        oracle.set_rotation(object, rotation)?;
    }
    Ok(())
}

/// Put the ball on the center spot and every robot on its kickoff position.
pub fn reset_positions(oracle: &mut impl SimulationOracle) -> Result<(), OracleError> {
    place(oracle, ObjectId::Ball, kickoff_translation(), Some(Rotation::default()))?;
    for robot in oracle.robots() {
        let (translation, rotation) = initial_pose(robot);
        place(oracle, robot.into(), translation, Some(rotation))?;
    }
    Ok(())
}

/// The match rules, evaluated once per simulation tick against the ground
/// truth exposed by a [`SimulationOracle`].
pub struct Referee {
    settings: RefereeSettings,
    phase: MatchPhase,
    flags: RuleFlags,
    /// Remaining match time in seconds.
    clock: f64,
    min_clock: f64,
    score: Score,
    phase_time: f64,
    kickoff_ball: Vector2,
    progress: ProgressTracker,
    lingering: BTreeMap<RobotName, f64>,
    finished: bool,
    events: Vec<String>,
}

impl Referee {
    /// `time_step` is the tick length in seconds. The clock never drops below
    /// one tick while the timer rule is disabled.
    pub fn new(settings: RefereeSettings, time_step: f64) -> Self {
        Self {
            phase: MatchPhase::WaitingForKickoff,
            flags: RuleFlags::default(),
            clock: settings.match_duration,
            min_clock: time_step,
            score: Score::default(),
            phase_time: 0.0,
            kickoff_ball: kickoff_translation().xy(),
            progress: ProgressTracker::new(settings.progress_time),
            lingering: BTreeMap::new(),
            finished: false,
            events: Vec::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &RefereeSettings {
        &self.settings
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn flags(&self) -> RuleFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: RuleFlags) {
        self.flags = flags;
    }

    pub fn set_flag(&mut self, rule: Rule, enabled: bool) {
        self.flags.set(rule, enabled);
        if !enabled {
            match rule {
                Rule::Progress => self.progress.reset(),
                Rule::RobotsInPenaltyArea => self.lingering.clear(),
                _ => {}
            }
        }
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn score(&self) -> Score {
        self.score
    }

    /// The flag broadcast to the robots every tick.
    pub fn waiting_for_kickoff(&self) -> bool {
        self.phase == MatchPhase::WaitingForKickoff
    }

    /// True while a goal is shown and the reset is pending.
    pub fn goal_indicator(&self) -> bool {
        self.phase == MatchPhase::GoalScored
    }

    /// Queue a message for the event log, stamped with the match clock.
    pub fn add_event(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        log::info!("{}", message);
        self.events.push(format!("{} - {}", format_clock(self.clock), message));
    }

    pub fn take_events(&mut self) -> Vec<String> {
        std::mem::take(&mut self.events)
    }

    /// Forget the rule bookkeeping of an object moved by hand.
    pub fn object_moved(&mut self, object: ObjectId) {
        match object {
            ObjectId::Ball => self.progress.reset(),
            ObjectId::Robot(name) => {
                self.lingering.remove(&name);
            }
        }
    }

    /// Advance the rules by `dt` seconds.
    pub fn tick(&mut self, oracle: &mut impl SimulationOracle, dt: f64) -> TickOutcome {
        if self.finished {
            return TickOutcome::Finished;
        }
        self.phase_time += dt;
        let result = match self.phase {
            MatchPhase::WaitingForKickoff => self.check_kickoff(oracle),
            MatchPhase::Playing => self.check_rules(oracle, dt),
            MatchPhase::GoalScored if self.phase_time >= self.settings.goal_reset_delay => {
                self.reset_for_kickoff(oracle)
            }
            MatchPhase::PenaltyAreaViolation if self.phase_time >= self.settings.violation_hold => {
                self.await_kickoff(oracle)
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            log::error!("Referee tick failed: {}", err);
        }
        self.advance_clock(dt)
    }

    /// Start a new match: positions, clock and score are reset.
    pub fn restart_match(&mut self, oracle: &mut impl SimulationOracle) -> Result<(), OracleError> {
        self.reset_for_kickoff(oracle)?;
        self.clock = self.settings.match_duration;
        self.score = Score::default();
        self.finished = false;
        self.add_event("New match");
        Ok(())
    }

    fn set_phase(&mut self, phase: MatchPhase) {
        if phase != self.phase {
            log::info!("Match phase {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
        self.phase_time = 0.0;
    }

    fn reset_for_kickoff(&mut self, oracle: &mut impl SimulationOracle) -> Result<(), OracleError> {
        reset_positions(oracle)?;
        self.await_kickoff(oracle)
    }

    fn await_kickoff(&mut self, oracle: &impl SimulationOracle) -> Result<(), OracleError> {
        self.kickoff_ball = oracle.translation(ObjectId::Ball)?.xy();
        self.set_phase(MatchPhase::WaitingForKickoff);
        Ok(())
    }

    fn check_kickoff(&mut self, oracle: &impl SimulationOracle) -> Result<(), OracleError> {
        let ball = oracle.translation(ObjectId::Ball)?.xy();
        let moved = (ball - self.kickoff_ball).norm() > self.settings.kickoff_move_threshold;
        if moved || self.phase_time >= self.settings.kickoff_hold {
            self.progress.reset();
            self.lingering.clear();
            self.set_phase(MatchPhase::Playing);
        }
        Ok(())
    }

    fn check_rules(&mut self, oracle: &mut impl SimulationOracle, dt: f64) -> Result<(), OracleError> {
        let ball = oracle.translation(ObjectId::Ball)?.xy();

        if self.flags.check_goal {
            if let Some(team) = scoring_team(&ball) {
                self.score.add(team);
                self.add_event(format!("GOAL {}! {}", team.to_string().to_uppercase(), self.score));
                self.set_phase(MatchPhase::GoalScored);
                return Ok(());
            }
        }

        if self.flags.check_progress && self.progress.update(ball, self.settings.progress_radius, dt) {
            let spot = self.nearest_free_spot(oracle, ball, ObjectId::Ball)?;
            place(oracle, ObjectId::Ball, Vector3::new(spot.x, spot.y, BALL_DEPTH), None)?;
            self.add_event("Lack of progress, ball moved to a neutral spot");
        }

        if self.flags.check_robots_in_penalty_area {
            for robot in oracle.robots() {
                let position = oracle.translation(robot.into())?.xy();
                let time = self.lingering.entry(robot).or_insert(0.0);
                *time = if in_penalty_area(&position, robot.team) {
                    *time + dt
                } else {
                    0.0
                };
                if *time < self.settings.penalty_area_time {
                    continue;
                }
                self.lingering.remove(&robot);
                let spot = self.nearest_free_spot(oracle, position, robot.into())?;
                place(oracle, robot.into(), Vector3::new(spot.x, spot.y, ROBOT_DEPTH), None)?;
                self.add_event(format!("{robot} stayed in its penalty area, moved to a neutral spot"));
                self.set_phase(MatchPhase::PenaltyAreaViolation);
                return Ok(());
            }
        }
        Ok(())
    }

    fn advance_clock(&mut self, dt: f64) -> TickOutcome {
        if !self.flags.check_timer {
            self.clock = self.clock.max(self.min_clock);
            return TickOutcome::Running;
        }
        if self.phase == MatchPhase::Playing {
            self.clock -= dt;
            if self.clock <= 0.0 {
                self.add_event(format!("End of match. {}", self.score));
                self.set_phase(MatchPhase::Timeout);
                self.finished = true;
                return TickOutcome::GameOver;
            }
        }
        TickOutcome::Running
    }

    /// The neutral spot closest to `from` with nothing else within the
    /// clearance radius. Falls back to the closest spot when all are taken.
    fn nearest_free_spot(
        &self,
        oracle: &impl SimulationOracle,
        from: Vector2,
        moving: ObjectId,
    ) -> Result<Vector2, OracleError> {
        let mut occupied = Vec::new();
        let objects = std::iter::once(ObjectId::Ball).chain(oracle.robots().into_iter().map(ObjectId::from));
        for object in objects.filter(|o| *o != moving) {
            occupied.push(oracle.translation(object)?.xy());
        }

        let mut spots: Vec<Vector2> = NEUTRAL_SPOTS.iter().map(|&(x, y)| Vector2::new(x, y)).collect();
        spots.sort_by(|a, b| (a - from).norm().total_cmp(&(b - from).norm()));
        let clearance = self.settings.neutral_spot_clearance;
        let free = spots
            .iter()
            .copied()
            .find(|spot| occupied.iter().all(|o| (o - spot).norm() > clearance));
        Ok(free.unwrap_or(spots[0]))
    }
}
