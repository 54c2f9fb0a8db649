//! Operator commands, as sent by the console.

use rcj_core::{ObjectId, TeamColor};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::Rule;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("malformed command: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad arguments for {msg}: {source}")]
    Args {
        msg: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A command as it arrives on the wire: `{msg, args, response_id}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCommand {
    pub msg: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default)]
    pub response_id: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveProperty {
    X,
    Y,
    /// Heading in degrees. Ignored for the ball.
    A,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Setup,
    Reset,
    SetController { team: TeamColor, controller: String },
    SetRule { rule: Rule, enabled: bool },
    SaveState,
    RestoreState,
    RandomizeBall,
    MoveObject {
        object: ObjectId,
        property: MoveProperty,
        value: f64,
    },
    MoveOut,
}

#[derive(Deserialize)]
struct SetControllerArgs {
    team: TeamColor,
    controller: String,
}

#[derive(Deserialize)]
struct EnabledArgs {
    enabled: bool,
}

#[derive(Deserialize)]
struct MoveObjectArgs {
    object: String,
    property: MoveProperty,
    value: f64,
}

impl RawCommand {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        Ok(serde_json::from_str(text)?)
    }

    fn args<T: for<'de> Deserialize<'de>>(&self) -> Result<T, CommandError> {
        serde_json::from_value(Value::Object(self.args.clone())).map_err(|source| CommandError::Args {
            msg: self.msg.clone(),
            source,
        })
    }

    /// Resolve into a typed command. Unknown commands, and moves of objects
    /// that do not exist, give `Ok(None)`.
    pub fn command(&self) -> Result<Option<Command>, CommandError> {
        let rule = match self.msg.as_str() {
            "set_check_timer" => Some(Rule::Timer),
            "set_check_progress" => Some(Rule::Progress),
            "set_check_goal" => Some(Rule::Goal),
            "set_check_robots_in_penalty_area" => Some(Rule::RobotsInPenaltyArea),
            _ => None,
        };
        if let Some(rule) = rule {
            let EnabledArgs { enabled } = self.args()?;
            return Ok(Some(Command::SetRule { rule, enabled }));
        }

        let command = match self.msg.as_str() {
            "setup" => Command::Setup,
            "reset" => Command::Reset,
            "set_controller" => {
                let SetControllerArgs { team, controller } = self.args()?;
                Command::SetController { team, controller }
            }
            "save_state" => Command::SaveState,
            "restore_state" => Command::RestoreState,
            "randomize_ball" => Command::RandomizeBall,
            "move_object" => {
                let MoveObjectArgs {
                    object,
                    property,
                    value,
                } = self.args()?;
                let Ok(object) = object.parse::<ObjectId>() else {
                    log::debug!("move_object: no object {}", object);
                    return Ok(None);
                };
                Command::MoveObject {
                    object,
                    property,
                    value,
                }
            }
            "move_out" => Command::MoveOut,
            _ => return Ok(None),
        };
        Ok(Some(command))
    }

    /// The line logged for every received command.
    pub fn echo(&self) -> String {
        let args = self
            .args
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{k}: {s}"),
                other => format!("{k}: {other}"),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let mut line = format!(">>> supervisor.{}({})", self.msg, args);
        match &self.response_id {
            None | Some(Value::Null) => {}
            Some(Value::String(id)) => line.push_str(&format!(" -> {id}")),
            Some(id) => line.push_str(&format!(" -> {id}")),
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        let raw = RawCommand::parse(r#"{"msg": "set_controller", "args": {"team": "Y", "controller": "chaser"}, "response_id": 7}"#)
            .unwrap();
        assert_eq!(
            raw.command().unwrap(),
            Some(Command::SetController {
                team: TeamColor::Yellow,
                controller: "chaser".into()
            })
        );
        assert_eq!(
            raw.echo(),
            ">>> supervisor.set_controller(controller: chaser, team: Y) -> 7"
        );

        let raw = RawCommand::parse(r#"{"msg": "set_check_goal", "args": {"enabled": false}}"#).unwrap();
        assert_eq!(
            raw.command().unwrap(),
            Some(Command::SetRule {
                rule: Rule::Goal,
                enabled: false
            })
        );
        assert_eq!(raw.echo(), ">>> supervisor.set_check_goal(enabled: false)");

        let raw = RawCommand::parse(
            r#"{"msg": "move_object", "args": {"object": "BALL", "property": "x", "value": 0.2}, "response_id": null}"#,
        )
        .unwrap();
        assert_eq!(
            raw.command().unwrap(),
            Some(Command::MoveObject {
                object: ObjectId::Ball,
                property: MoveProperty::X,
                value: 0.2
            })
        );
    }

    #[test]
    fn unknown_commands_are_not_errors() {
        let raw = RawCommand::parse(r#"{"msg": "dance", "args": {}}"#).unwrap();
        assert_eq!(raw.command().unwrap(), None);
    }

    #[test]
    fn moving_unknown_objects_is_ignored() {
        let raw = RawCommand::parse(r#"{"msg": "move_object", "args": {"object": "R9", "property": "x", "value": 1}}"#)
            .unwrap();
        assert_eq!(raw.command().unwrap(), None);
        let raw = RawCommand::parse(r#"{"msg": "move_object", "args": {"object": "B4", "property": "y", "value": 0}}"#)
            .unwrap();
        assert_eq!(raw.command().unwrap(), None);
    }

    #[test]
    fn bad_arguments() {
        let raw = RawCommand::parse(r#"{"msg": "set_check_timer", "args": {"enabled": "yes"}}"#).unwrap();
        assert!(matches!(raw.command(), Err(CommandError::Args { .. })));
        let raw = RawCommand::parse(r#"{"msg": "move_object", "args": {"object": "B1", "property": "z", "value": 1}}"#)
            .unwrap();
        assert!(raw.command().is_err());
        assert!(RawCommand::parse("not json").is_err());
        assert!(RawCommand::parse(r#"{"args": {}}"#).is_err());
    }
}
