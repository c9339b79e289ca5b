//! Fixed timestep simulation tick
//!
//! One call advances the match by exactly one 60 Hz tick. Order matters for
//! determinism and is kept stable: timers, transitions, power-ups, player
//! input and AI, puck physics, camera, then goals.

use super::movement::{MoveIntent, drive_human};
use super::state::{GameState, PlayerRole, SimEvent};
use super::topology::PlayerId;
use super::{ai, faceoff, goals, kick, physics, portal, powerup};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Pause toggle
    pub pause: bool,
    /// Restart the match
    pub restart: bool,
    /// Held movement keys per player (ignored for AI players)
    pub moves: [MoveIntent; PLAYER_COUNT],
    /// Kick pressed this tick per player (ignored for AI players)
    pub kicks: [bool; PLAYER_COUNT],
}

impl TickInput {
    /// Same held keys with the one-shot presses consumed
    pub fn held(&self) -> Self {
        Self {
            moves: self.moves,
            ..Default::default()
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.restart {
        state.restart();
        return;
    }

    if input.pause {
        state.paused = !state.paused;
        state.emit(SimEvent::Paused(state.paused));
        log::info!("{}", if state.paused { "Paused" } else { "Resumed" });
    }
    if state.paused {
        return;
    }

    state.time_ticks += 1;
    let puck_before = state.puck.pos;

    // Timers
    faceoff::update_face_off(state);
    let effects_before = state.effects;
    kick::update_cooldowns(state);
    powerup::decay_effects(state);
    state.update_bounce_effects();
    portal::advance_transition(state);
    goals::update_pending_faceoff(state);

    // Power-ups
    powerup::spawn_powerup(state);
    powerup::update_powerups(state);
    if state.effects != effects_before {
        state.emit(SimEvent::PowerUpTimersChanged);
    }

    // Players
    for player in PlayerId::ALL {
        if state.role(player) == PlayerRole::Human && input.kicks[player.index()] {
            kick::try_kick(state, player);
        }
    }
    if !state.face_off.is_active() {
        for player in PlayerId::ALL {
            match state.role(player) {
                PlayerRole::Human => drive_human(state, player, input.moves[player.index()]),
                PlayerRole::Ai => ai::update_ai(state, player),
            }
        }
    }

    // Puck
    if !state.portal.is_transitioning() && !state.face_off.is_active() {
        physics::update_puck(state);
        faceoff::check_puck_stuck(state);
    }

    state.update_camera();
    if state.puck.pos != puck_before {
        state.emit(SimEvent::PuckMoved {
            pos: state.puck.pos,
        });
    }

    goals::check_goals(state);
}

/// Turns variable frame times into whole simulation ticks
#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f32,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run as many ticks as `dt` seconds cover, returning how many ran
    ///
    /// Frames longer than 100 ms are clamped and at most `MAX_SUBSTEPS` ticks
    /// run per call. Presses apply to the first tick only.
    pub fn advance(&mut self, state: &mut GameState, input: &TickInput, dt: f32) -> u32 {
        let dt = dt.clamp(0.0, 0.1);
        self.accumulator += dt;

        let held = input.held();
        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(state, if substeps == 0 { input } else { &held });
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AiDifficulty, GameConfig, MatchSetup};
    use crate::sim::state::FaceOff;
    use crate::sim::topology::RoomId;
    use glam::Vec2;

    fn new_state(setup: MatchSetup) -> GameState {
        GameState::new(12345, GameConfig::default(), setup).unwrap()
    }

    #[test]
    fn test_face_off_holds_the_puck() {
        let mut state = new_state(MatchSetup::default());
        let input = TickInput {
            kicks: [true; PLAYER_COUNT],
            ..Default::default()
        };
        for _ in 0..179 {
            tick(&mut state, &input);
            assert_eq!(state.puck.pos, Vec2::ZERO);
        }
        tick(&mut state, &TickInput::default());
        assert_eq!(state.face_off, FaceOff::Inactive);
        assert_eq!(state.time_ticks, 180);
    }

    #[test]
    fn test_tick_pause() {
        let mut state = new_state(MatchSetup::default());
        tick(&mut state, &TickInput::default());
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause);
        assert!(state.paused);
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.time_ticks, 1);

        tick(&mut state, &pause);
        assert!(!state.paused);
        assert_eq!(state.time_ticks, 2);
        let events = state.drain_events();
        assert!(events.contains(&SimEvent::Paused(true)));
        assert!(events.contains(&SimEvent::Paused(false)));
    }

    #[test]
    fn test_human_kick_and_move() {
        let mut state = new_state(MatchSetup::default());
        state.face_off = FaceOff::Inactive;
        state.active_character_mut(PlayerId::P1).pos = Vec2::new(-40.0, 0.0);
        let input = TickInput {
            kicks: [true, false, false],
            ..Default::default()
        };
        tick(&mut state, &input);
        assert!(state.puck.vel.x > 0.0);
        assert!(state.puck.pos.x > 0.0);
        assert!(state.drain_events().iter().any(|e| matches!(
            e,
            SimEvent::Kicked {
                player: PlayerId::P1,
                ..
            }
        )));

        let before = state.active_character(PlayerId::P1).pos;
        let input = TickInput {
            moves: [MoveIntent::new(0, 1), MoveIntent::NONE, MoveIntent::NONE],
            ..Default::default()
        };
        tick(&mut state, &input);
        assert!(state.active_character(PlayerId::P1).pos.y > before.y);
    }

    #[test]
    fn test_restart_resets_match() {
        let mut state = new_state(MatchSetup::default());
        state.scores = [2, 0, 1];
        state.time_ticks = 900;
        tick(
            &mut state,
            &TickInput {
                restart: true,
                ..Default::default()
            },
        );
        assert_eq!(state.scores, [0, 0, 0]);
        assert_eq!(state.time_ticks, 0);
        assert!(state.face_off.is_active());
    }

    #[test]
    fn test_determinism() {
        let setup = MatchSetup::all_ai(AiDifficulty::Hard);
        let mut state1 = new_state(setup);
        let mut state2 = new_state(setup);

        for _ in 0..1200 {
            tick(&mut state1, &TickInput::default());
            tick(&mut state2, &TickInput::default());
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.puck.pos, state2.puck.pos);
        assert_eq!(state1.puck.room, state2.puck.room);
        assert_eq!(state1.scores, state2.scores);
        assert_eq!(state1.drain_events(), state2.drain_events());
    }

    #[test]
    fn test_stepper_caps_substeps() {
        let mut state = new_state(MatchSetup::default());
        let mut stepper = FixedStepper::new();
        assert_eq!(stepper.advance(&mut state, &TickInput::default(), SIM_DT * 0.5), 0);
        assert_eq!(stepper.advance(&mut state, &TickInput::default(), SIM_DT * 0.6), 1);
        // A two second stall counts as 100 ms
        let ran = stepper.advance(&mut state, &TickInput::default(), 2.0);
        assert_eq!(ran, 6);
        assert!(ran <= MAX_SUBSTEPS);
        assert_eq!(state.time_ticks, 7);
    }

    #[test]
    fn test_stepper_applies_presses_once() {
        let mut state = new_state(MatchSetup::default());
        let mut stepper = FixedStepper::new();
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        stepper.advance(&mut state, &pause, SIM_DT * 3.5);
        // Toggled once, not three times
        assert!(state.paused);
    }

    #[test]
    fn test_goal_restarts_from_center() {
        let mut state = new_state(MatchSetup::default());
        state.face_off = FaceOff::Inactive;
        let zone = state.topology.room(RoomId::Player3Zone).center;
        state.puck.pos = zone + Vec2::new(-488.0, 0.0);
        state.puck.vel = Vec2::new(-2.0, 0.0);
        state.set_puck_room(RoomId::Player3Zone);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.scores, [1, 1, 0]);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default());
        }
        assert!(state.face_off.is_active());
        assert_eq!(state.puck.room, RoomId::Center);
        assert_eq!(state.scores, [1, 1, 0]);
    }
}
