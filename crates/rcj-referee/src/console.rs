use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use rcj_core::{ObjectId, RobotName, Rotation};
use serde::Serialize;

use crate::{MatchPhase, RuleFlags, Score};

/// Per-tick state shown on the operator console.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchUpdate {
    /// Simulation time in seconds.
    pub time: f64,
    pub selected: Option<ObjectId>,
    pub ball_translation: [f64; 3],
    pub robot_translation: BTreeMap<RobotName, [f64; 3]>,
    pub robot_rotation: BTreeMap<RobotName, Rotation>,
    /// True while a goal is being celebrated.
    pub goal: bool,
    /// Event log lines queued since the last update.
    pub messages: Vec<String>,
    pub phase: MatchPhase,
    /// Remaining match time in seconds.
    pub clock: f64,
    pub score: Score,
}

/// Outbound console messages, serialized as `{"msg": ..., "args": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "msg", content = "args", rename_all = "snake_case")]
pub enum ConsoleMessage {
    Update(MatchUpdate),
    UpdateControllersList {
        controllers: Vec<String>,
        #[serde(rename = "Y")]
        yellow: Option<String>,
        #[serde(rename = "B")]
        blue: Option<String>,
    },
    UpdateFlags(RuleFlags),
    Alert {
        message: String,
    },
    Log {
        message: String,
    },
    GameOver {},
}

impl ConsoleMessage {
    pub fn msg(&self) -> &'static str {
        match self {
            ConsoleMessage::Update(_) => "update",
            ConsoleMessage::UpdateControllersList { .. } => "update_controllers_list",
            ConsoleMessage::UpdateFlags(_) => "update_flags",
            ConsoleMessage::Alert { .. } => "alert",
            ConsoleMessage::Log { .. } => "log",
            ConsoleMessage::GameOver {} => "game_over",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Where console messages go.
pub trait ConsoleSink: Send {
    fn send(&mut self, message: ConsoleMessage);
}

impl<T: ConsoleSink + ?Sized> ConsoleSink for Box<T> {
    fn send(&mut self, message: ConsoleMessage) {
        (**self).send(message);
    }
}

/// Writes the human-readable messages to the log and drops the rest.
#[derive(Debug, Default)]
pub struct LogConsole;

impl ConsoleSink for LogConsole {
    fn send(&mut self, message: ConsoleMessage) {
        match message {
            ConsoleMessage::Update(update) => {
                for line in update.messages {
                    log::info!("{}", line);
                }
            }
            ConsoleMessage::Alert { message } => log::warn!("{}", message),
            ConsoleMessage::Log { message } => log::info!("{}", message),
            ConsoleMessage::GameOver {} => log::info!("Game over"),
            other => log::debug!("console: {}", other.msg()),
        }
    }
}

/// Collects messages in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    messages: Arc<Mutex<Vec<ConsoleMessage>>>,
}

impl MemoryConsole {
    pub fn take(&self) -> Vec<ConsoleMessage> {
        self.messages
            .lock()
            .map(|mut messages| std::mem::take(&mut *messages))
            .unwrap_or_default()
    }
}

impl ConsoleSink for MemoryConsole {
    fn send(&mut self, message: ConsoleMessage) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message);
        }
    }
}
