//! Room membership and the portal transition state machine
//!
//! `Idle` → `Transitioning` when the puck enters a tunnel box, → `Cooldown`
//! once the transit has run its ticks, → `Idle` when the cooldown drains.

use super::state::{GameState, PortalState, SimEvent, Transit};
use super::topology::RoomId;

/// Re-derive the puck's room after it moved; may start a transition
///
/// Runs as part of the physics step, so the cooldown counts physics ticks.
pub fn update_puck_room(state: &mut GameState) {
    if state.portal.is_transitioning() {
        return;
    }

    if let PortalState::Cooldown { remaining } = &mut state.portal {
        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            state.portal = PortalState::Idle;
        }
    }

    state.puck.last_room = state.puck.room;
    let pos = state.puck.pos;

    if state.portal.cooldown() == 0 {
        let from = state.puck.room;
        let entered = state.topology.room(from).tunnel_at(pos).map(|(to, _)| to);
        if let Some(to) = entered {
            start_transition(state, from, to);
            return;
        }
    }

    if let Some(id) = state.topology.room_at(pos) {
        state.set_puck_room(id);
        return;
    }

    // Between rooms and not in a tunnel: pull the puck back into the room it left
    if !state.topology.in_any_tunnel(pos) {
        let (min, max) = state
            .topology
            .room(state.puck.last_room)
            .inner_bounds(state.config.puck_radius);
        state.puck.pos = pos.clamp(min, max);
    }
}

/// Put the puck in flight from `from` to `to`; false if `to` has no way back
pub fn start_transition(state: &mut GameState, from: RoomId, to: RoomId) -> bool {
    let Some(exit) = state.topology.reciprocal(from, to) else {
        log::warn!("No tunnel from {to} back to {from}; portal ignored");
        return false;
    };
    let target = state.topology.room(to);
    let to_pos = target.tunnel_center(exit) + exit.wall().inward() * state.config.portal_push_distance;

    state.portal = PortalState::Transitioning(Transit {
        from,
        to,
        from_pos: state.puck.pos,
        to_pos,
        elapsed: 0,
        duration: state.config.portal_transition_ticks,
    });
    state.puck.vel *= 0.5;
    state.emit(SimEvent::PortalEntered { from, to });
    log::debug!("Puck entered portal {from} -> {to}");
    true
}

/// Advance an in-flight transition by one tick, landing the puck when it is due
pub fn advance_transition(state: &mut GameState) {
    let PortalState::Transitioning(transit) = &mut state.portal else {
        return;
    };
    transit.elapsed += 1;
    if transit.elapsed < transit.duration {
        return;
    }
    let Transit { to, to_pos, .. } = *transit;

    state.portal = match state.config.portal_cooldown {
        0 => PortalState::Idle,
        remaining => PortalState::Cooldown { remaining },
    };
    state.puck.pos = to_pos;
    state.puck.trail.clear();
    state.puck.last_room = to;
    state.set_puck_room(to);
    log::info!("Puck arrived in {to}");
}
