use rand::{rngs::StdRng, Rng, SeedableRng};
use rcj_comm::{Channel, Radio, TeamMessage, NO_BALL};
use rcj_core::{Angle, RadioSettings, RobotId, TeamColor, Vector2};
use rcj_world::{TickInputs, WorldModel};

fn id(n: i64) -> RobotId {
    RobotId::new(n).unwrap()
}

#[test]
fn survives_arbitrary_loss() {
    let radio = Radio::new(&RadioSettings {
        drop_probability: 0.4,
        seed: Some(11),
    });
    let channel = Channel::Team(TeamColor::Blue);
    let emitter = radio.emitter(channel);
    let receiver = radio.receiver(channel, "B1");
    let mut model = WorldModel::new(TeamColor::Blue, id(1));
    let mut rng = StdRng::seed_from_u64(3);

    for _ in 0..100 {
        let burst = rng.gen_range(0..4);
        for _ in 0..burst {
            emitter.send(&TeamMessage {
                sender_id: rng.gen_range(2..=3),
                x: rng.gen_range(-0.6..0.6),
                y: rng.gen_range(-0.7..0.7),
                heading: 0.0,
                ball_x: NO_BALL,
                ball_y: NO_BALL,
            });
        }
        let peers: Vec<TeamMessage> = receiver.drain();
        let expected = peers.iter().rev().find(|m| m.sender_id == 2).copied();
        let before = model.robot(id(2)).position;

        model.refresh(&TickInputs {
            peers,
            position: Vector2::new(0.0, 0.3),
            heading: Angle::default(),
            ..Default::default()
        });

        let after = model.robot(id(2)).position;
        match expected {
            Some(m) => assert_eq!(after, Vector2::new(m.x as f64, m.y as f64)),
            None => assert_eq!(after, before),
        }
        assert_eq!(model.own().position, Vector2::new(0.0, 0.3));
        assert!(!model.ball().is_known());
    }
}

#[test]
fn teammate_ball_is_shared() {
    let radio = Radio::lossless();
    let channel = Channel::Team(TeamColor::Yellow);
    let y2_emitter = radio.emitter(channel);
    let y1_receiver = radio.receiver(channel, "Y1");

    let mut y2 = WorldModel::new(TeamColor::Yellow, id(2));
    y2.refresh(&TickInputs {
        position: Vector2::new(0.2, 0.2),
        ball_reading: Some(rcj_core::BallReading {
            direction: rcj_core::Vector3::new(1.0, 0.0, 0.0),
            strength: 4.0,
        }),
        ..Default::default()
    });
    y2_emitter.send(&y2.own_report().to_message());

    let mut y1 = WorldModel::new(TeamColor::Yellow, id(1));
    y1.refresh(&TickInputs {
        peers: y1_receiver.drain(),
        ..Default::default()
    });
    let ball = y1.ball().position().expect("ball shared by Y2");
    assert!((ball - Vector2::new(0.2, -0.3)).norm() < 1e-6);
}
