use std::time::Duration;

use rcj_comm::{Channel, Radio, SupervisorMessage, TeamMessage, NO_BALL};
use rcj_core::{BallReading, ControllerSettings, RobotName, SonarValues, Vector2, Vector3};
use rcj_robot::{
    BallSensor, BehaviorKind, HeadingSource, PositionSource, RadioLink, RangeSensor,
    RobotController, RobotDevices, VelocityActuator, WheelSpeeds,
};

struct FakeBody {
    name: RobotName,
    position: Vector2,
    compass: Vector3,
    ball: Option<BallReading>,
    wheels: (f64, f64),
}

impl FakeBody {
    fn new(name: &str) -> Self {
        Self {
            name: name.parse().unwrap(),
            position: Vector2::new(0.0, 0.3),
            // heading zero
            compass: Vector3::new(-1.0, 0.0, 0.0),
            ball: None,
            wheels: (0.0, 0.0),
        }
    }
}

impl PositionSource for FakeBody {
    fn position(&self) -> Vector2 {
        self.position
    }
}

impl HeadingSource for FakeBody {
    fn compass_values(&self) -> Vector3 {
        self.compass
    }
}

impl RangeSensor for FakeBody {
    fn sonar(&self) -> SonarValues {
        SonarValues::default()
    }
}

impl BallSensor for FakeBody {
    fn ball_reading(&mut self) -> Option<BallReading> {
        self.ball.take()
    }
}

impl VelocityActuator for FakeBody {
    fn set_wheel_velocities(&mut self, left: f64, right: f64) {
        self.wheels = (left, right);
    }
}

impl RobotDevices for FakeBody {
    fn name(&self) -> RobotName {
        self.name
    }

    fn time(&self) -> f64 {
        0.0
    }
}

fn controller(radio: &Radio, body: &FakeBody, kind: BehaviorKind) -> RobotController {
    RobotController::new(
        body.name,
        kind,
        RadioLink::attach(radio, body.name),
        ControllerSettings::default(),
        Duration::from_millis(64),
    )
    .unwrap()
}

#[test_log::test]
fn searches_without_ball_and_broadcasts_sentinel() {
    let radio = Radio::lossless();
    let listener = radio.receiver(Channel::Team(rcj_core::TeamColor::Blue), "B listener");
    let mut body = FakeBody::new("B2");
    let mut ctrl = controller(&radio, &body, BehaviorKind::Striker);

    let report = ctrl.tick(&mut body);
    assert!(report.searching);
    assert_eq!(body.wheels, (-2.5, 2.5));

    let sent: Vec<TeamMessage> = listener.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].sender_id, 2);
    assert_eq!((sent[0].ball_x, sent[0].ball_y), (NO_BALL, NO_BALL));
}

#[test_log::test]
fn chaser_drives_at_a_ball_ahead() {
    let radio = Radio::lossless();
    let mut body = FakeBody::new("Y1");
    body.ball = Some(BallReading {
        direction: Vector3::new(1.0, 0.0, 0.0),
        strength: 4.0,
    });
    let mut ctrl = controller(&radio, &body, BehaviorKind::Chaser);
    let report = ctrl.tick(&mut body);
    assert!(!report.searching);
    assert_eq!(body.wheels, (5.0, 5.0));
    let ball = ctrl.world().ball().position().unwrap();
    assert!((ball - Vector2::new(0.0, -0.2)).norm() < 1e-9);
}

#[test_log::test]
fn holds_while_waiting_for_kickoff() {
    let radio = Radio::lossless();
    let referee = radio.emitter(Channel::Supervisor);
    let mut body = FakeBody::new("B1");
    let mut ctrl = controller(&radio, &body, BehaviorKind::Chaser);

    referee.send(&SupervisorMessage {
        waiting_for_kickoff: true,
    });
    let report = ctrl.tick(&mut body);
    assert!(report.holding);
    assert_eq!(report.speeds, WheelSpeeds::STOP);

    // No new packet: still waiting
    assert!(ctrl.tick(&mut body).holding);

    referee.send(&SupervisorMessage {
        waiting_for_kickoff: false,
    });
    assert!(!ctrl.tick(&mut body).holding);
}

#[test_log::test]
fn teammate_ball_replaces_search() {
    let radio = Radio::lossless();
    let mut b1 = FakeBody::new("B1");
    let mut b3 = FakeBody::new("B3");
    b3.position = Vector2::new(0.3, 0.0);
    b3.ball = Some(BallReading {
        direction: Vector3::new(1.0, 0.0, 0.0),
        strength: 1.0 / 0.04,
    });
    let mut c1 = controller(&radio, &b1, BehaviorKind::Watcher);
    let mut c3 = controller(&radio, &b3, BehaviorKind::Chaser);

    c3.tick(&mut b3);
    let report = c1.tick(&mut b1);
    assert!(!report.searching);
    let ball = c1.world().ball().position().unwrap();
    assert!((ball - Vector2::new(0.3, -0.2)).norm() < 1e-6);
    let teammate = c1.world().robot(b3.name.id);
    assert!((teammate.position - Vector2::new(0.3, 0.0)).norm() < 1e-6);
}

#[test_log::test]
fn stop_between_ticks() {
    let radio = Radio::lossless();
    let mut body = FakeBody::new("Y3");
    let mut ctrl = controller(&radio, &body, BehaviorKind::Spinner);
    ctrl.tick(&mut body);
    assert_eq!(body.wheels, (10.0, -10.0));
    ctrl.after_step(&mut body);
    assert_eq!(body.wheels, (0.0, 0.0));
}
