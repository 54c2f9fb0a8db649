use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::TeamColor;

/// Number of robots per team.
pub const ROBOTS_PER_TEAM: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("robot id {0} out of range 1..={ROBOTS_PER_TEAM}")]
    OutOfRange(i64),
    #[error("invalid robot name {0:?}")]
    InvalidName(String),
}

/// A player number within a team, always in `1..=3`.
#[derive(Clone, Copy, Debug, Serialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RobotId(u8);

impl RobotId {
    pub fn new(id: i64) -> Result<Self, IdError> {
        if (1..=ROBOTS_PER_TEAM as i64).contains(&id) {
            Ok(Self(id as u8))
        } else {
            Err(IdError::OutOfRange(id))
        }
    }

    /// All ids of one team in ascending order.
    pub fn all() -> impl Iterator<Item = RobotId> {
        (1..=ROBOTS_PER_TEAM as u8).map(RobotId)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    /// Zero-based slot used by fixed-size per-team arrays.
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl<'de> Deserialize<'de> for RobotId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        RobotId::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for RobotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A robot identified by team and number, written `B1`..`B3` / `Y1`..`Y3`.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RobotName {
    pub team: TeamColor,
    pub id: RobotId,
}

impl RobotName {
    pub fn new(team: TeamColor, id: RobotId) -> Self {
        Self { team, id }
    }

    /// All six robots, blue first.
    pub fn all() -> impl Iterator<Item = RobotName> {
        TeamColor::ALL
            .into_iter()
            .flat_map(|team| RobotId::all().map(move |id| RobotName::new(team, id)))
    }

    pub fn team_members(team: TeamColor) -> impl Iterator<Item = RobotName> {
        RobotId::all().map(move |id| RobotName::new(team, id))
    }
}

impl std::str::FromStr for RobotName {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(code), Some(digit), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(IdError::InvalidName(s.to_string()));
        };
        let team = TeamColor::from_code(code).ok_or_else(|| IdError::InvalidName(s.to_string()))?;
        let number = digit
            .to_digit(10)
            .ok_or_else(|| IdError::InvalidName(s.to_string()))?;
        Ok(RobotName::new(team, RobotId::new(number as i64)?))
    }
}

impl std::fmt::Display for RobotName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.team.code(), self.id)
    }
}

impl Serialize for RobotName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RobotName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Any object the referee can inspect or move: the ball or one of the robots.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObjectId {
    Ball,
    Robot(RobotName),
}

impl ObjectId {
    pub const BALL_NAME: &'static str = "BALL";

    pub fn robot(&self) -> Option<RobotName> {
        match self {
            ObjectId::Ball => None,
            ObjectId::Robot(name) => Some(*name),
        }
    }
}

impl From<RobotName> for ObjectId {
    fn from(name: RobotName) -> Self {
        ObjectId::Robot(name)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::BALL_NAME {
            Ok(ObjectId::Ball)
        } else {
            s.parse().map(ObjectId::Robot)
        }
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectId::Ball => f.write_str(Self::BALL_NAME),
            ObjectId::Robot(name) => write!(f, "{name}"),
        }
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
