use runner::{
    CrashCause, GeneratorConfig, Heading, InputFrame, Mode, ObstacleWave, RunCoordinator, RunEvent,
    RunnerConfig, SegmentCatalog, SegmentClass, TurnDirection,
};

const DT: f32 = 1.0 / 60.0;

fn config(seed: u64) -> RunnerConfig {
    RunnerConfig {
        seed: Some(seed),
        generator: GeneratorConfig {
            collectible_chance: 0.0,
            obstacle_spawn_chance: 0.0,
            obstacle_wave: None,
            ..GeneratorConfig::default()
        },
        ..RunnerConfig::default()
    }
}

fn start(config: RunnerConfig) -> RunCoordinator {
    RunCoordinator::new(config, SegmentCatalog::default()).expect("run starts")
}

fn game_overs(events: &[RunEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, RunEvent::GameOver { .. }))
        .count()
}

/// Direction accepted by the turn tile closing the current run.
fn closing_turn(run: &RunCoordinator) -> (TurnDirection, shared::Vec3) {
    let turn = run.track().newest_segment().expect("closing turn");
    let direction = match turn.class() {
        SegmentClass::TurnLeft => TurnDirection::Left,
        SegmentClass::TurnRight | SegmentClass::LateralShift => TurnDirection::Right,
        SegmentClass::Straight => panic!("run must close with a turn"),
    };
    (direction, turn.position)
}

/// Run straight until the avatar stands on the closing turn tile.
fn run_to_closing_turn(run: &mut RunCoordinator, events: &mut Vec<RunEvent>) {
    let (_, at) = closing_turn(run);
    for _ in 0..(60 * 60) {
        let p = run.avatar().state().position;
        if shared::planar_distance_sq(&p, &at) < 1.0 {
            return;
        }
        events.extend(run.tick(DT, &InputFrame::default()));
        assert!(!run.is_game_over(), "crashed before reaching the turn: {events:?}");
    }
    panic!("never reached the closing turn");
}

#[test]
fn idle_run_ends_past_the_closing_turn() {
    let mut run = start(config(1));
    let (_, turn_at) = closing_turn(&run);

    let mut events = Vec::new();
    for _ in 0..(60 * 30) {
        events.extend(run.tick(DT, &InputFrame::default()));
        if run.is_game_over() {
            break;
        }
    }

    assert_eq!(game_overs(&events), 1);
    assert!(events.contains(&RunEvent::GameOver {
        final_score: 0,
        cause: CrashCause::Fell
    }));
    // It ran the whole straight and over the turn tile before dropping off.
    let z = run.avatar().state().position.z;
    assert!(z > turn_at.z + 2.0, "fell at z = {z}");
}

#[test]
fn missed_turn_is_game_over_once_and_leaves_the_ledger_alone() {
    let mut run = start(config(2));
    let ledger = |run: &RunCoordinator| -> Vec<_> {
        run.track().segments().map(|s| (s.id, s.position)).collect()
    };
    let before = ledger(&run);

    let mut events = run.tick(DT, &InputFrame::turn(TurnDirection::Right));
    assert_eq!(run.avatar().mode(), Mode::Crashed);
    assert_eq!(ledger(&run), before);

    for _ in 0..120 {
        events.extend(run.tick(DT, &InputFrame::turn(TurnDirection::Left)));
        events.extend(run.tick(DT, &InputFrame::jump()));
    }
    assert_eq!(game_overs(&events), 1);
    assert!(events.contains(&RunEvent::GameOver {
        final_score: 0,
        cause: CrashCause::MissedTurn
    }));
    assert_eq!(ledger(&run), before);
}

#[test]
fn committed_turns_keep_the_run_alive() {
    let mut run = start(config(3));
    let mut events = Vec::new();
    let mut heading = Heading::PosZ;

    for _ in 0..3 {
        run_to_closing_turn(&mut run, &mut events);
        let (direction, pivot) = closing_turn(&run);
        heading = heading.rotated(direction);

        let tick = run.tick(DT, &InputFrame::turn(direction));
        let turns: Vec<_> = tick
            .iter()
            .filter(|e| matches!(e, RunEvent::TurnCommitted { .. }))
            .collect();
        assert_eq!(turns, vec![&RunEvent::TurnCommitted { heading }]);

        let state = run.avatar().state();
        assert_eq!(state.heading, heading);
        // Snapped onto the pivot, then one tick of travel along the new heading.
        let off_pivot = shared::planar_distance_sq(&state.position, &pivot).sqrt();
        assert!(off_pivot < 0.2, "{off_pivot}");
        assert_eq!(run.track().cursor().direction, heading);
        events.extend(tick);
    }
    assert_eq!(game_overs(&events), 0);
}

#[test]
fn wrong_turn_direction_on_a_turn_tile_crashes() {
    let mut run = start(config(3));
    let mut events = Vec::new();
    run_to_closing_turn(&mut run, &mut events);

    let (direction, _) = closing_turn(&run);
    let wrong = match direction {
        TurnDirection::Left => TurnDirection::Right,
        TurnDirection::Right => TurnDirection::Left,
    };
    let tick = run.tick(DT, &InputFrame::turn(wrong));
    assert!(tick.contains(&RunEvent::GameOver {
        final_score: 0,
        cause: CrashCause::MissedTurn
    }));
}

#[test]
fn obstacle_wave_attempts_once_per_period_regardless_of_avatar() {
    let wave = ObstacleWave {
        delay_secs: 10.0,
        period_secs: 2.0,
    };
    let mut cfg = config(4);
    cfg.generator.obstacle_wave = Some(wave);

    let mut alive = start(cfg.clone());
    let mut crashed = start(cfg);
    crashed.tick(0.5, &InputFrame::turn(TurnDirection::Right));
    assert!(crashed.is_game_over());

    let mut t: f32 = 0.5;
    while t < 20.0 {
        alive.tick(0.5, &InputFrame::default());
        crashed.tick(0.5, &InputFrame::default());
        t += 0.5;

        let expected = if t < 10.0 {
            0
        } else {
            1 + ((t - 10.0) / 2.0).floor() as u64
        };
        assert_eq!(alive.generator().stats().wave_attempts, expected, "t = {t}");
        assert_eq!(crashed.generator().stats().wave_attempts, expected, "t = {t}");
    }
    assert_eq!(alive.generator().stats().wave_attempts, 6);
}

#[test]
fn forward_speed_never_drops_and_respects_the_cap() {
    let mut cfg = config(5);
    cfg.locomotion.speed_ramp_rate = 5.0;
    cfg.locomotion.max_speed = 12.0;
    let mut run = start(cfg);

    let mut last = run.avatar().state().forward_speed;
    for _ in 0..(60 * 8) {
        run.tick(DT, &InputFrame::default());
        let speed = run.avatar().state().forward_speed;
        assert!(speed >= last);
        assert!(speed <= 12.0);
        last = speed;
        if run.is_game_over() {
            break;
        }
    }
    assert!(run.distance() > 0.0);
}

#[test]
fn coins_on_the_path_can_be_collected() {
    let mut cfg = config(6);
    cfg.generator.collectible_chance = 1.0;
    let mut run = start(cfg);

    let mut score_events = Vec::new();
    for _ in 0..(60 * 9) {
        if run.is_game_over() {
            break;
        }
        for id in run.collectibles_touching_avatar() {
            assert!(run.collect(id).is_some());
        }
        score_events.extend(
            run.tick(DT, &InputFrame::default())
                .into_iter()
                .filter(|e| matches!(e, RunEvent::ScoreChanged { .. })),
        );
    }

    assert!(run.score() > 0);
    assert_eq!(
        score_events.last(),
        Some(&RunEvent::ScoreChanged { score: run.score() })
    );
}
