//! Face-offs
//!
//! A face-off freezes the puck at a spot, lines the three players up around it
//! and holds them there until the countdown runs out. Started at kick-off,
//! one second after a goal, and whenever the puck sits idle too long.

use glam::Vec2;

use super::physics::constrain_character;
use super::state::{FaceOff, GameState, PortalState, SimEvent};
use super::topology::{PlayerId, RoomId};

/// Freeze play at `position` (default: the room center) in `room`
pub fn start_face_off(state: &mut GameState, room: RoomId, position: Option<Vec2>) {
    let position = position.unwrap_or(state.topology.room(room).center);
    state.face_off = FaceOff::Active {
        countdown: state.config.faceoff_ticks,
        room,
        position,
    };
    state.pending_faceoff = None;
    // A face-off always wins over a puck in flight
    state.portal = PortalState::Idle;

    let from = state.puck.room;
    state.puck.pos = position;
    state.puck.vel = Vec2::ZERO;
    state.puck.room = room;
    state.puck.last_room = room;
    state.puck_stuck.last_pos = position;
    state.puck_stuck.timer = 0;

    state.refresh_active_characters();
    if from != room {
        state.emit(SimEvent::RoomChanged { from, to: room });
    }
    position_players(state);
    state.emit(SimEvent::FaceOffStarted { room });
    log::info!("Face-off in {room}");
}

/// Place each player's character in `room` on a triangle around the face-off spot
pub fn position_players(state: &mut GameState) {
    let FaceOff::Active { room, position, .. } = state.face_off else {
        return;
    };
    let radius = state.config.faceoff_radius;
    let body = state.config.character_radius;
    for player in PlayerId::ALL {
        let angle = (player.index() as f32 * 120.0 - 90.0).to_radians();
        let c = &mut state.characters[player.index()][room.index()];
        c.pos = position + Vec2::from_angle(angle) * radius;
        c.halt();
        constrain_character(c, &state.topology, body);
    }
}

/// Count the face-off down; players are re-placed every few ticks
pub fn update_face_off(state: &mut GameState) {
    let FaceOff::Active { countdown, room, .. } = &mut state.face_off else {
        return;
    };
    *countdown = countdown.saturating_sub(1);
    let (remaining, room) = (*countdown, *room);

    if remaining > 0 {
        state.puck.vel = Vec2::ZERO;
        if remaining % state.config.faceoff_reassert_period == 0 {
            position_players(state);
        }
    } else {
        state.face_off = FaceOff::Inactive;
        state.refresh_active_characters();
        state.emit(SimEvent::FaceOffEnded { room });
        log::info!("Face-off in {room} over, play on");
    }
}

/// Feed the stuck detector; an idle puck gets a face-off where it lies
pub fn check_puck_stuck(state: &mut GameState) -> bool {
    if !state.puck_stuck.observe(state.puck.pos) {
        return false;
    }
    let room = state.puck.room;
    log::info!("Puck stuck in {room}");
    state.emit(SimEvent::PuckStuck { room });
    start_face_off(state, room, None);
    true
}
