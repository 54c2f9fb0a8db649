use rcj_core::{MatchSettings, ObjectId, RobotName, SimulationOracle};
use rcj_referee::{
    ConsoleMessage, MatchPhase, MemoryConsole, MemoryStore, Referee, StaticCatalog, Supervisor,
    TickOutcome,
};
use rcj_robot::BehaviorKind;
use rcj_cli::MatchRunner;

fn settings() -> MatchSettings {
    let mut settings = MatchSettings::default();
    settings.radio.seed = Some(1);
    settings.referee.match_duration = 2.0;
    settings.referee.kickoff_hold = 0.5;
    settings
}

fn runner(settings: MatchSettings, console: MemoryConsole) -> MatchRunner {
    let supervisor = Supervisor::new(
        Referee::new(settings.referee.clone(), settings.time_step()),
        MemoryStore::default(),
        console,
        StaticCatalog(vec!["chaser".into(), "striker".into()]),
    )
    .with_seed(1);
    MatchRunner::new(settings, supervisor, "striker", "chaser")
}

fn name(s: &str) -> RobotName {
    s.parse().unwrap()
}

#[test_log::test]
fn every_robot_gets_a_controller() {
    let runner = runner(settings(), MemoryConsole::default());
    for robot in RobotName::all() {
        let expected = match robot.team {
            rcj_core::TeamColor::Blue => BehaviorKind::Striker,
            rcj_core::TeamColor::Yellow => BehaviorKind::Chaser,
        };
        assert_eq!(runner.controller(robot).map(|c| c.kind()), Some(expected));
    }
}

#[test_log::test]
fn robots_leave_their_start_positions() {
    let mut runner = runner(settings(), MemoryConsole::default());
    let start: Vec<_> = RobotName::all()
        .map(|r| runner.simulation().robot_pose(r).unwrap().0)
        .collect();
    for _ in 0..40 {
        runner.tick(None);
    }
    let moved = RobotName::all()
        .zip(start)
        .filter(|(r, p)| (runner.simulation().robot_pose(*r).unwrap().0 - p).norm() > 0.01)
        .count();
    assert!(moved > 0);
}

#[test_log::test]
fn match_runs_to_the_end_and_restarts() {
    let console = MemoryConsole::default();
    let mut runner = runner(settings(), console.clone());
    let mut game_over = false;
    for _ in 0..10_000 {
        match runner.tick(None) {
            TickOutcome::GameOver => {
                game_over = true;
                break;
            }
            TickOutcome::Finished => panic!("finished without a game over"),
            TickOutcome::Running => {}
        }
    }
    assert!(game_over);
    assert_eq!(runner.supervisor().referee().phase(), MatchPhase::Timeout);
    assert!(console.take().contains(&ConsoleMessage::GameOver {}));
    assert_eq!(runner.tick(None), TickOutcome::Finished);

    runner.restart_match();
    assert_eq!(runner.tick(None), TickOutcome::Running);
    assert_eq!(
        runner.supervisor().referee().phase(),
        MatchPhase::WaitingForKickoff
    );
}

#[test_log::test]
fn operator_switches_controllers() {
    let mut runner = runner(settings(), MemoryConsole::default());
    runner.tick(Some(
        r#"{"msg": "set_controller", "args": {"team": "Y", "controller": "watcher"}}"#,
    ));
    for robot in RobotName::team_members(rcj_core::TeamColor::Yellow) {
        assert_eq!(runner.controller(robot).unwrap().kind(), BehaviorKind::Watcher);
    }
    assert_eq!(runner.controller(name("B1")).unwrap().kind(), BehaviorKind::Striker);

    // Names that are not built in still get a robot that plays
    runner.tick(Some(
        r#"{"msg": "set_controller", "args": {"team": "B", "controller": "my_bot"}}"#,
    ));
    assert_eq!(runner.simulation().controller(name("B2")).unwrap(), "my_bot");
    assert_eq!(runner.controller(name("B2")).unwrap().kind(), BehaviorKind::Chaser);
}

#[test_log::test]
fn commands_move_objects() {
    let mut runner = runner(settings(), MemoryConsole::default());
    runner.tick(Some(
        r#"{"msg": "move_object", "args": {"object": "BALL", "property": "y", "value": 0.4}}"#,
    ));
    let ball = runner.simulation().translation(ObjectId::Ball).unwrap();
    approx::assert_relative_eq!(ball.y, 0.4, epsilon = 0.05);
}
