use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Settings for the per-robot steering controllers.
///
/// Wheel velocities are in rad/s of the wheel motors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[typeshare]
pub struct ControllerSettings {
    /// Maximum wheel velocity. Commands are clamped to `±max_velocity`.
    pub max_velocity: f64,
    /// Wheel velocity used when driving straight at the ball.
    pub nominal_velocity: f64,
    /// Gain of the turn-in-place pursuit controller.
    pub pursuit_gain: f64,
    /// Lateral component of the ball direction below which the ball counts as
    /// straight ahead.
    pub direction_dead_band: f64,
    /// Joint `|angle·distance|` threshold of the point approach, in degree meters.
    pub approach_threshold: f64,
    /// Dead band of the point orientation controller, in degrees.
    pub look_threshold: f64,
    /// Distance below which a target point counts as reached, in meters.
    pub arrival_epsilon: f64,
    /// Constant wheel velocity of the spinning controller.
    pub spin_velocity: f64,
    /// Stop the wheels after each tick instead of coasting.
    pub stop_between_ticks: bool,
    /// Hold still while the referee waits for the kickoff.
    pub hold_on_kickoff: bool,
    /// Address of the external decision process for remote controllers.
    pub remote_addr: String,
    /// How long a remote controller waits for a command each tick, in ms.
    pub remote_timeout_ms: u64,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            max_velocity: 10.0,
            nominal_velocity: 5.0,
            pursuit_gain: 4.0,
            direction_dead_band: 0.13,
            approach_threshold: 2.0,
            look_threshold: 5.0,
            arrival_epsilon: 1e-3,
            spin_velocity: 10.0,
            stop_between_ticks: true,
            hold_on_kickoff: true,
            remote_addr: "127.0.0.1:12345".to_owned(),
            remote_timeout_ms: 100,
        }
    }
}

/// Settings for the referee state machine. Durations are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[typeshare]
pub struct RefereeSettings {
    pub match_duration: f64,
    /// Delay between a goal and the reset of ball and robots.
    pub goal_reset_delay: f64,
    /// Time the ball may stay within `progress_radius` before it is relocated.
    pub progress_time: f64,
    pub progress_radius: f64,
    /// Time a robot may stay in its own penalty area.
    pub penalty_area_time: f64,
    /// Pause after a penalty area violation before the next kickoff.
    pub violation_hold: f64,
    /// Longest wait for the kickoff before play starts anyway.
    pub kickoff_hold: f64,
    /// Distance the ball must travel from its kickoff position to start play.
    pub kickoff_move_threshold: f64,
    /// Free radius required around a neutral spot before something is placed on it.
    pub neutral_spot_clearance: f64,
    /// Minimum time between two controller reloads, in ms.
    pub reload_debounce_ms: u64,
}

impl Default for RefereeSettings {
    fn default() -> Self {
        Self {
            match_duration: 600.0,
            goal_reset_delay: 3.0,
            progress_time: 10.0,
            progress_radius: 0.1,
            penalty_area_time: 15.0,
            violation_hold: 1.0,
            kickoff_hold: 3.0,
            kickoff_move_threshold: 0.05,
            neutral_spot_clearance: 0.1,
            reload_debounce_ms: 1000,
        }
    }
}

/// Settings for the kinematic simulation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[typeshare]
pub struct SimulationSettings {
    pub wheel_radius: f64,
    /// Distance between the two wheels.
    pub axle_length: f64,
    /// Fraction of its speed the ball keeps after one second of rolling.
    pub ball_friction: f64,
    /// Fraction of the normal speed kept when the ball bounces off a wall.
    pub ball_restitution: f64,
    /// Speed transferred to the ball by a robot pushing it, as a factor of the
    /// robot's own speed.
    pub push_factor: f64,
    /// Beyond this distance the ball's infrared signal is not received.
    pub ir_range: f64,
    pub sonar_range: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            wheel_radius: 0.02,
            axle_length: 0.08,
            ball_friction: 0.4,
            ball_restitution: 0.6,
            push_factor: 1.5,
            ir_range: 2.0,
            sonar_range: 1.0,
        }
    }
}

/// Settings for the simulated radio links.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[typeshare]
pub struct RadioSettings {
    /// Probability in `[0, 1]` that a packet is lost on its way to one receiver.
    pub drop_probability: f64,
    /// Seed of the loss generator. Random when unset.
    pub seed: Option<u64>,
}

/// Every tunable of a match, stored as one JSON document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[typeshare]
pub struct MatchSettings {
    /// Duration of one simulation tick in ms.
    pub time_step_ms: u64,
    pub referee: RefereeSettings,
    pub controller: ControllerSettings,
    pub simulation: SimulationSettings,
    pub radio: RadioSettings,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            time_step_ms: 64,
            referee: RefereeSettings::default(),
            controller: ControllerSettings::default(),
            simulation: SimulationSettings::default(),
            radio: RadioSettings::default(),
        }
    }
}

impl MatchSettings {
    /// Tick duration in seconds.
    pub fn time_step(&self) -> f64 {
        self.time_step_ms as f64 / 1000.0
    }

    /// Load the settings from a file, or store the default settings if the file
    /// does not exist. Invalid or unreadable files yield the defaults.
    pub fn load_or_insert(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(err) => {
                    log::error!("Failed to parse settings {}: {}", path.display(), err);
                    Self::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let settings = Self::default();
                match serde_json::to_string_pretty(&settings) {
                    Ok(json) => {
                        if let Err(err) = fs::write(path, json) {
                            log::error!("Failed to write settings {}: {}", path.display(), err);
                        }
                    }
                    Err(err) => log::error!("Failed to serialize settings: {}", err),
                }
                settings
            }
            Err(err) => {
                log::error!("Failed to read settings {}: {}", path.display(), err);
                Self::default()
            }
        }
    }
}
