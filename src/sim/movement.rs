//! Shared character motion model
//!
//! Humans and AI both steer by blending momentum toward a desired velocity
//! with the same acceleration, so neither can outrun the other.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::constrain_character;
use super::state::GameState;
use super::topology::PlayerId;

/// Directional intent from a player's keys, each axis in {-1, 0, 1}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoveIntent {
    pub x: i8,
    pub y: i8,
}

impl MoveIntent {
    pub const NONE: MoveIntent = MoveIntent { x: 0, y: 0 };

    pub fn new(x: i8, y: i8) -> Self {
        Self {
            x: x.signum(),
            y: y.signum(),
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Unit direction (diagonals normalised), zero when idle
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32).normalize_or_zero()
    }
}

/// Blend momentum toward `desired` by `acceleration`
#[inline]
pub fn accelerate(momentum: Vec2, desired: Vec2, acceleration: f32) -> Vec2 {
    momentum + (desired - momentum) * acceleration
}

/// Top speed of `player` with current boosts and slowdowns
pub fn player_speed(state: &GameState, player: PlayerId) -> f32 {
    state.config.player_speed * state.effects[player.index()].speed_factor(&state.config.powerups)
}

/// Move the active character by its momentum and keep it inside its room
pub fn integrate(state: &mut GameState, player: PlayerId) {
    let factor = state.config.visual_velocity_factor;
    let radius = state.config.character_radius;
    let room = state.puck.room.index();
    let c = &mut state.characters[player.index()][room];
    c.pos += c.momentum;
    c.vel = c.momentum * factor;
    constrain_character(c, &state.topology, radius);
}

/// Human control: accelerate along the intent, coast to a stop without one
pub fn drive_human(state: &mut GameState, player: PlayerId, intent: MoveIntent) {
    let speed = player_speed(state, player);
    let accel = state.config.player_acceleration;
    let friction = state.config.player_friction;
    let c = state.active_character_mut(player);
    c.momentum = if intent.is_idle() {
        c.momentum * friction
    } else {
        accelerate(c.momentum, intent.direction() * speed, accel)
    };
    integrate(state, player);
}
