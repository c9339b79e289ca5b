//! Whole-match flows driven through `tick`

use glam::Vec2;
use portal_puck::sim::{FaceOff, GameState, PortalState, RoomId, SimEvent, TickInput, tick};
use portal_puck::{AiDifficulty, GameConfig, MatchSetup};

fn idle_humans() -> GameState {
    let setup = MatchSetup {
        humans: 3,
        difficulty: AiDifficulty::Medium,
    };
    let mut state = GameState::new(77, GameConfig::default(), setup).unwrap();
    state.face_off = FaceOff::Inactive;
    // Park everybody in a corner so nobody touches the puck
    for set in &mut state.characters {
        for c in set.iter_mut() {
            c.pos = state.topology.room(c.room).center + Vec2::new(-400.0, 400.0);
        }
    }
    state.drain_events();
    state
}

#[test]
fn puck_travels_through_portal_into_zone() {
    let mut state = idle_humans();
    state.puck.pos = Vec2::new(455.0, 0.0);
    state.puck.vel = Vec2::new(8.0, 0.0);

    let mut events = Vec::new();
    let mut landed_at = None;
    for t in 0..60 {
        tick(&mut state, &TickInput::default());
        events.extend(state.drain_events());
        if state.puck.room == RoomId::Player2Zone && landed_at.is_none() {
            landed_at = Some(t);
        }
    }

    assert!(events.contains(&SimEvent::PortalEntered {
        from: RoomId::Center,
        to: RoomId::Player2Zone
    }));
    assert!(events.contains(&SimEvent::RoomChanged {
        from: RoomId::Center,
        to: RoomId::Player2Zone
    }));
    // Two ticks to reach the mouth, then the full transit
    assert_eq!(landed_at, Some(25));
    assert_eq!(state.puck.room, RoomId::Player2Zone);
    // Landed pushed clear of the zone's tunnel mouth
    assert!(state.puck.pos.x > 1070.0);
    assert!(state.puck.pos.y.abs() < 1.0);
    for set in &state.characters {
        for c in set {
            assert_eq!(c.active, c.room == RoomId::Player2Zone);
        }
    }
}

#[test]
fn cooldown_blocks_immediate_return() {
    let mut state = idle_humans();
    state.puck.pos = Vec2::new(455.0, 0.0);
    state.puck.vel = Vec2::new(8.0, 0.0);
    while state.puck.room != RoomId::Player2Zone {
        tick(&mut state, &TickInput::default());
    }
    assert!(matches!(state.portal, PortalState::Cooldown { .. }));

    // Shove it straight back into the mouth it came from
    state.puck.pos = Vec2::new(1010.0, 0.0);
    state.puck.vel = Vec2::new(-3.0, 0.0);
    tick(&mut state, &TickInput::default());
    assert!(!state.portal.is_transitioning());
    assert!(matches!(state.portal, PortalState::Cooldown { .. }));
}

#[test]
fn goal_then_delayed_center_face_off() {
    let mut state = idle_humans();
    let zone = state.topology.room(RoomId::Player1Zone).center;
    state.puck.pos = zone + Vec2::new(0.0, -480.0);
    state.puck.vel = Vec2::new(0.0, -5.0);
    state.set_puck_room(RoomId::Player1Zone);

    tick(&mut state, &TickInput::default());
    assert_eq!(state.scores, [0, 1, 1]);
    assert!(state.pending_faceoff.is_some());

    for _ in 0..59 {
        tick(&mut state, &TickInput::default());
        assert!(!state.face_off.is_active());
    }
    tick(&mut state, &TickInput::default());
    assert!(state.face_off.is_active());
    assert_eq!(state.puck.room, RoomId::Center);
    assert_eq!(state.puck.pos, Vec2::ZERO);
    assert_eq!(state.scores, [0, 1, 1]);
}

#[test]
fn ai_match_keeps_invariants() {
    let mut state =
        GameState::new(2024, GameConfig::default(), MatchSetup::all_ai(AiDifficulty::Hard)).unwrap();
    let mut last_scores = state.scores;
    for _ in 0..6000 {
        tick(&mut state, &TickInput::default());

        assert!(state.puck.speed() <= state.config.max_puck_speed + 1e-3);
        let total: u32 = state.scores.iter().sum();
        assert_eq!(total % 2, 0);
        for (now, before) in state.scores.iter().zip(&last_scores) {
            assert!(now >= before);
        }
        last_scores = state.scores;

        if !state.portal.is_transitioning() {
            let room = state.topology.room(state.puck.room);
            assert!(room.contains_point(state.puck.pos) || state.topology.in_any_tunnel(state.puck.pos));
        }
        for set in &state.characters {
            for c in set {
                assert_eq!(c.active, c.room == state.puck.room);
            }
        }
        assert!(state.powerups.len() <= state.config.powerups.max_spawned);
        state.drain_events();
    }
}

#[test]
fn same_seed_same_match() {
    let run = || {
        let mut state =
            GameState::new(31337, GameConfig::default(), MatchSetup::all_ai(AiDifficulty::Medium))
                .unwrap();
        for _ in 0..2000 {
            tick(&mut state, &TickInput::default());
        }
        serde_json::to_string(&state).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn json_overrides_flow_into_play() {
    let config = GameConfig::from_json(r#"{ "powerups": { "spawn_chance": 1.0, "max_spawned": 1 } }"#)
        .unwrap();
    assert_eq!(config.room_size, 1000.0);
    let mut state = GameState::new(8, config, MatchSetup::all_ai(AiDifficulty::Easy)).unwrap();
    let mut spawned = 0;
    for _ in 0..300 {
        tick(&mut state, &TickInput::default());
        assert!(state.powerups.len() <= 1);
        spawned += state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SimEvent::PowerUpSpawned { .. }))
            .count();
    }
    assert!(spawned >= 1);
}

#[test]
fn broken_config_is_rejected_up_front() {
    let config = GameConfig::from_json(r#"{ "room_size": -5.0 }"#);
    let result = config.and_then(|c| GameState::new(1, c, MatchSetup::default()).map(|_| ()));
    assert!(result.is_err());
}
