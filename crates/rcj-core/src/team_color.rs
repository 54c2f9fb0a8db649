use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{Angle, Vector2};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[typeshare]
pub enum TeamColor {
    #[serde(rename = "B")]
    Blue,
    #[serde(rename = "Y")]
    Yellow,
}

impl TeamColor {
    pub const ALL: [TeamColor; 2] = [TeamColor::Blue, TeamColor::Yellow];

    pub fn opponent(&self) -> TeamColor {
        match self {
            TeamColor::Blue => TeamColor::Yellow,
            TeamColor::Yellow => TeamColor::Blue,
        }
    }

    /// The single-letter code used in robot names and on the console protocol.
    pub fn code(&self) -> char {
        match self {
            TeamColor::Blue => 'B',
            TeamColor::Yellow => 'Y',
        }
    }

    pub fn from_code(code: char) -> Option<TeamColor> {
        match code {
            'B' => Some(TeamColor::Blue),
            'Y' => Some(TeamColor::Yellow),
            _ => None,
        }
    }

    /// Sign of the y coordinate of this team's own goal.
    ///
    /// Blue defends the positive end and attacks towards negative y, Yellow the
    /// other way around.
    pub fn own_goal_side(&self) -> f64 {
        match self {
            TeamColor::Blue => 1.0,
            TeamColor::Yellow => -1.0,
        }
    }

    /// Convert a field position into this team's frame.
    ///
    /// Every team sees the field as if it were attacking towards negative y, so the
    /// yellow frame is the field frame rotated by half a turn.
    pub fn to_team_frame(&self, v: Vector2) -> Vector2 {
        match self {
            TeamColor::Blue => v,
            TeamColor::Yellow => -v,
        }
    }

    /// Convert a position in this team's frame back into the field frame.
    pub fn to_field_frame(&self, v: Vector2) -> Vector2 {
        // The rotation by half a turn is its own inverse
        self.to_team_frame(v)
    }

    /// Convert a field-frame heading into this team's frame.
    pub fn heading_to_team_frame(&self, heading: Angle) -> Angle {
        match self {
            TeamColor::Blue => heading,
            TeamColor::Yellow => heading + Angle::PI,
        }
    }
}

impl std::fmt::Display for TeamColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamColor::Blue => write!(f, "Blue"),
            TeamColor::Yellow => write!(f, "Yellow"),
        }
    }
}
