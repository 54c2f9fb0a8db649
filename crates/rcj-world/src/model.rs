use rcj_comm::TeamMessage;
use rcj_core::{Angle, BallReading, IdError, RobotId, TeamColor, Vector2, ROBOTS_PER_TEAM};

use crate::{triangulate_ball, BallEstimate};

/// Last known pose of one robot of the team, in the team frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobotState {
    pub id: RobotId,
    pub position: Vector2,
    pub heading: Angle,
}

impl RobotState {
    fn at_origin(id: RobotId) -> Self {
        Self {
            id,
            position: Vector2::zeros(),
            heading: Angle::default(),
        }
    }
}

/// A teammate's broadcast, validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerReport {
    pub sender: RobotId,
    pub position: Vector2,
    pub heading: Angle,
    pub ball: BallEstimate,
}

impl TryFrom<&TeamMessage> for PeerReport {
    type Error = IdError;

    fn try_from(msg: &TeamMessage) -> Result<Self, Self::Error> {
        Ok(PeerReport {
            sender: RobotId::new(msg.sender_id as i64)?,
            position: Vector2::new(msg.x as f64, msg.y as f64),
            heading: Angle::from_radians(msg.heading as f64),
            ball: BallEstimate::from_wire(msg.ball_x, msg.ball_y),
        })
    }
}

impl PeerReport {
    pub fn to_message(&self) -> TeamMessage {
        let (ball_x, ball_y) = self.ball.to_wire();
        TeamMessage {
            sender_id: self.sender.as_u8() as i32,
            x: self.position.x as f32,
            y: self.position.y as f32,
            heading: self.heading.radians() as f32,
            ball_x,
            ball_y,
        }
    }
}

/// Everything a robot learned during one tick, in the order it is applied.
#[derive(Debug, Clone, Default)]
pub struct TickInputs {
    /// The newest referee flag, if one arrived.
    pub waiting_for_kickoff: Option<bool>,
    /// Teammate broadcasts in arrival order.
    pub peers: Vec<TeamMessage>,
    pub position: Vector2,
    pub heading: Angle,
    pub ball_reading: Option<BallReading>,
}

/// One robot's view of its team and the ball.
#[derive(Debug, Clone)]
pub struct WorldModel {
    team: TeamColor,
    own_id: RobotId,
    robots: [RobotState; ROBOTS_PER_TEAM],
    ball: BallEstimate,
    /// A teammate reported a ball during the current refresh.
    peer_ball_fresh: bool,
    waiting_for_kickoff: bool,
}

impl WorldModel {
    pub fn new(team: TeamColor, own_id: RobotId) -> Self {
        let mut robots = [RobotState::at_origin(own_id); ROBOTS_PER_TEAM];
        for id in RobotId::all() {
            robots[id.index()] = RobotState::at_origin(id);
        }
        Self {
            team,
            own_id,
            robots,
            ball: BallEstimate::Unknown,
            peer_ball_fresh: false,
            waiting_for_kickoff: false,
        }
    }

    pub fn team(&self) -> TeamColor {
        self.team
    }

    pub fn own_id(&self) -> RobotId {
        self.own_id
    }

    pub fn own(&self) -> &RobotState {
        &self.robots[self.own_id.index()]
    }

    pub fn robot(&self, id: RobotId) -> &RobotState {
        &self.robots[id.index()]
    }

    pub fn robots(&self) -> &[RobotState; ROBOTS_PER_TEAM] {
        &self.robots
    }

    pub fn teammates(&self) -> impl Iterator<Item = &RobotState> {
        self.robots.iter().filter(move |r| r.id != self.own_id)
    }

    pub fn ball(&self) -> BallEstimate {
        self.ball
    }

    pub fn waiting_for_kickoff(&self) -> bool {
        self.waiting_for_kickoff
    }

    pub fn set_waiting_for_kickoff(&mut self, waiting: bool) {
        self.waiting_for_kickoff = waiting;
    }

    /// Own sensing always wins over whatever a teammate said about us.
    pub fn update_from_self(&mut self, position: Vector2, heading: Angle) {
        let own = &mut self.robots[self.own_id.index()];
        own.position = position;
        own.heading = heading;
    }

    /// Apply a teammate broadcast. Our own echo is ignored, and a report
    /// without a ball leaves the ball estimate untouched.
    ///
    /// Returns whether the report was applied.
    pub fn update_from_peer(&mut self, report: &PeerReport) -> bool {
        if report.sender == self.own_id {
            return false;
        }
        let slot = &mut self.robots[report.sender.index()];
        slot.position = report.position;
        slot.heading = report.heading;
        if let BallEstimate::At(_) = report.ball {
            self.ball = report.ball;
            self.peer_ball_fresh = true;
        }
        true
    }

    /// Rebuild the model for a new tick.
    ///
    /// Order: referee flag, teammate reports (last per sender wins), own pose,
    /// then the local ball reading. A local reading replaces the ball estimate.
    /// Without one, a ball reported by a teammate during this refresh is kept,
    /// otherwise the estimate is cleared.
    pub fn refresh(&mut self, inputs: &TickInputs) {
        if let Some(waiting) = inputs.waiting_for_kickoff {
            self.waiting_for_kickoff = waiting;
        }

        self.peer_ball_fresh = false;
        for msg in &inputs.peers {
            match PeerReport::try_from(msg) {
                Ok(report) => {
                    self.update_from_peer(&report);
                }
                Err(err) => log::warn!(
                    "{}{}: ignoring team message: {}",
                    self.team.code(),
                    self.own_id,
                    err
                ),
            }
        }

        self.update_from_self(inputs.position, inputs.heading);

        let local = inputs
            .ball_reading
            .map(|reading| triangulate_ball(&reading, inputs.position, inputs.heading))
            .unwrap_or_default();
        if local.is_known() {
            self.ball = local;
        } else if !self.peer_ball_fresh {
            self.ball = BallEstimate::Unknown;
        }
    }

    /// The broadcast describing this robot for its teammates.
    pub fn own_report(&self) -> PeerReport {
        let own = self.own();
        PeerReport {
            sender: self.own_id,
            position: own.position,
            heading: own.heading,
            ball: self.ball,
        }
    }

    /// Forget everything, as at the start of a match.
    pub fn reset(&mut self) {
        *self = Self::new(self.team, self.own_id);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rcj_comm::NO_BALL;
    use rcj_core::Vector3;

    use super::*;

    fn id(n: i64) -> RobotId {
        RobotId::new(n).unwrap()
    }

    fn msg(sender_id: i32, x: f32, ball: (f32, f32)) -> TeamMessage {
        TeamMessage {
            sender_id,
            x,
            y: 0.5,
            heading: 0.25,
            ball_x: ball.0,
            ball_y: ball.1,
        }
    }

    #[test]
    fn slots_are_indexed_by_id() {
        let model = WorldModel::new(TeamColor::Blue, id(2));
        for robot_id in RobotId::all() {
            assert_eq!(model.robot(robot_id).id, robot_id);
        }
        assert_eq!(model.teammates().count(), 2);
    }

    #[test]
    fn sentinel_peer_ball_never_clobbers() {
        let mut model = WorldModel::new(TeamColor::Blue, id(1));
        let good = PeerReport::try_from(&msg(2, 0.0, (0.3, 0.3))).unwrap();
        model.update_from_peer(&good);
        let blind = PeerReport::try_from(&msg(3, 0.1, (NO_BALL, NO_BALL))).unwrap();
        assert!(model.update_from_peer(&blind));
        assert_eq!(model.ball().position(), Some(Vector2::new(0.3, 0.3).map(|v| v as f32 as f64)));
        assert_relative_eq!(model.robot(id(3)).position.x, 0.1, epsilon = 1e-6);
    }

    #[test]
    fn last_message_per_sender_wins() {
        let mut model = WorldModel::new(TeamColor::Yellow, id(1));
        let older = TeamMessage {
            sender_id: 2,
            x: 0.25,
            y: -0.5,
            heading: 1.5,
            ball_x: 0.5,
            ball_y: 0.25,
        };
        let newest = TeamMessage {
            sender_id: 2,
            x: -0.75,
            y: 0.125,
            heading: -0.5,
            ball_x: NO_BALL,
            ball_y: NO_BALL,
        };
        let inputs = TickInputs {
            peers: vec![msg(2, 0.1, (NO_BALL, NO_BALL)), older, newest],
            ..Default::default()
        };
        model.refresh(&inputs);
        assert_eq!(
            *model.robot(id(2)),
            RobotState {
                id: id(2),
                position: Vector2::new(-0.75, 0.125),
                heading: Angle::from_radians(-0.5),
            }
        );
        // A newer report without a ball does not erase an earlier sighting
        assert_eq!(model.ball(), BallEstimate::At(Vector2::new(0.5, 0.25)));
        assert_eq!(model.robot(id(3)).position, Vector2::zeros());
    }

    #[test]
    fn own_echo_is_ignored() {
        let mut model = WorldModel::new(TeamColor::Blue, id(1));
        let inputs = TickInputs {
            peers: vec![msg(1, 0.4, (NO_BALL, NO_BALL))],
            position: Vector2::new(-0.2, 0.1),
            ..Default::default()
        };
        model.refresh(&inputs);
        assert_eq!(model.own().position, Vector2::new(-0.2, 0.1));
    }

    #[test]
    fn invalid_sender_is_dropped() {
        let mut model = WorldModel::new(TeamColor::Blue, id(1));
        let before = *model.robots();
        model.refresh(&TickInputs {
            peers: vec![msg(7, 0.4, (NO_BALL, NO_BALL))],
            ..Default::default()
        });
        assert_eq!(model.robots()[1..], before[1..]);
    }

    #[test]
    fn local_reading_beats_peer_ball() {
        let mut model = WorldModel::new(TeamColor::Blue, id(1));
        model.refresh(&TickInputs {
            peers: vec![msg(2, 0.0, (0.3, 0.3))],
            ball_reading: Some(BallReading {
                direction: Vector3::new(1.0, 0.0, 0.0),
                strength: 1.0,
            }),
            ..Default::default()
        });
        let ball = model.ball().position().unwrap();
        assert_relative_eq!(ball.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn ball_estimate_does_not_outlive_its_tick() {
        let mut model = WorldModel::new(TeamColor::Blue, id(1));
        model.refresh(&TickInputs {
            peers: vec![msg(3, 0.0, (0.3, -0.3))],
            ..Default::default()
        });
        assert!(model.ball().is_known());

        model.refresh(&TickInputs::default());
        assert_eq!(model.ball(), BallEstimate::Unknown);
    }

    #[test]
    fn kickoff_flag_absence_means_no_change() {
        let mut model = WorldModel::new(TeamColor::Blue, id(1));
        model.refresh(&TickInputs {
            waiting_for_kickoff: Some(true),
            ..Default::default()
        });
        model.refresh(&TickInputs::default());
        assert!(model.waiting_for_kickoff());
        model.refresh(&TickInputs {
            waiting_for_kickoff: Some(false),
            ..Default::default()
        });
        assert!(!model.waiting_for_kickoff());
    }

    #[test]
    fn own_report_round_trips_through_the_wire_format() {
        let mut model = WorldModel::new(TeamColor::Yellow, id(3));
        model.update_from_self(Vector2::new(0.5, -0.25), Angle::from_radians(1.0));
        let msg = model.own_report().to_message();
        assert_eq!(msg.sender_id, 3);
        assert_eq!((msg.ball_x, msg.ball_y), (NO_BALL, NO_BALL));
        let back = PeerReport::try_from(&msg).unwrap();
        assert_eq!(back.position, Vector2::new(0.5, -0.25));
    }
}
