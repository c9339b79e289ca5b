//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (one tick per 60 Hz frame)
//! - Seeded RNG only
//! - Stable iteration order (players P1..P3, rooms in `RoomId` order)
//! - No rendering or platform dependencies

pub mod ai;
pub mod faceoff;
pub mod goals;
pub mod kick;
pub mod movement;
pub mod physics;
pub mod portal;
pub mod powerup;
pub mod state;
pub mod tick;
pub mod topology;

pub use kick::try_kick;
pub use movement::MoveIntent;
pub use state::{
    AiState, BounceEffect, Character, FaceOff, GameState, PlayerEffects, PlayerRole, PortalState,
    PowerUp, PowerUpKind, Puck, PuckStuck, SimEvent, Strategy, Transit,
};
pub use tick::{FixedStepper, TickInput, tick};
pub use topology::{Goal, PlayerId, Room, RoomId, RoomKind, Topology, Tunnel, Wall};
