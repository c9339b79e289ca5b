//! Portal Puck - a three-player, five-room portal puck arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, portals, face-offs, power-ups, AI)
//! - `config`: Data-driven game balance, loaded once at startup
//! - `error`: Configuration errors surfaced before the first tick
//!
//! Rendering, keyboard wiring and DOM/HUD display live outside this crate.
//! They read `sim::GameState`, feed `sim::TickInput`, and drain `sim::SimEvent`s.

pub mod config;
pub mod error;
pub mod sim;

pub use config::{AiDifficulty, AiTuning, GameConfig, MatchSetup};
pub use error::ConfigError;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation rate (one tick per animation frame at 60 Hz)
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Number of players (always three, human or AI)
    pub const PLAYER_COUNT: usize = 3;
    /// Number of rooms in the standard layout
    pub const ROOM_COUNT: usize = 5;

    /// Distances below this are treated as "no direction"
    pub const DIRECTION_EPSILON: f32 = 0.01;
    /// Resting height of a character above the floor (visual lift only)
    pub const CHARACTER_Z: f32 = 8.0;
}

/// Convert a millisecond duration to whole simulation ticks (rounded, at least 1)
#[inline]
pub fn ticks_from_millis(ms: u32) -> u32 {
    ((ms as f32 * consts::SIM_HZ as f32 / 1000.0).round() as u32).max(1)
}

/// Unit vector from `from` toward `to`, or None when the points coincide
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Option<Vec2> {
    let delta = to - from;
    let len = delta.length();
    if len < consts::DIRECTION_EPSILON {
        None
    } else {
        Some(delta / len)
    }
}

/// Kick alignment: dot of (character→puck) and (puck→target) unit vectors, floored at 0
pub fn kick_alignment(character: Vec2, puck: Vec2, target: Vec2) -> f32 {
    match (direction(character, puck), direction(puck, target)) {
        (Some(a), Some(b)) => a.dot(b).max(0.0),
        _ => 0.0,
    }
}
