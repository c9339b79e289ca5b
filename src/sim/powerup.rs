//! Power-up spawning, expiry, collection and effects

use glam::Vec2;
use rand::Rng;

use super::state::{GameState, PowerUp, PowerUpKind, SimEvent};
use super::topology::PlayerId;

/// Maybe drop a new power-up somewhere in the puck's room
pub fn spawn_powerup(state: &mut GameState) {
    let cfg = &state.config.powerups;
    let roll: f32 = state.rng.random();
    if roll >= cfg.spawn_chance || state.powerups.len() >= cfg.max_spawned {
        return;
    }

    let kind = PowerUpKind::ALL[state.rng.random_range(0..PowerUpKind::ALL.len())];
    let room_id = state.puck.room;
    let room = state.topology.room(room_id);
    let span = Vec2::new(room.width, room.height) - Vec2::splat(cfg.spawn_margin);
    let jitter = Vec2::new(
        state.rng.random::<f32>() - 0.5,
        state.rng.random::<f32>() - 0.5,
    );
    let pos = room.center + jitter * span;
    let lifetime = cfg.lifetime;

    let id = state.next_entity_id();
    state.powerups.push(PowerUp {
        id,
        kind,
        pos,
        room: room_id,
        lifetime,
        rotation: 0.0,
        pulse_phase: 0.0,
    });
    state.emit(SimEvent::PowerUpSpawned { kind, room: room_id });
    log::debug!("Spawned {} power-up #{id} in {room_id}", kind.as_str());
}

/// Age spawned power-ups and hand out any an active character touches
pub fn update_powerups(state: &mut GameState) {
    for p in &mut state.powerups {
        p.rotation += 0.02;
        p.pulse_phase += 0.1;
        p.lifetime = p.lifetime.saturating_sub(1);
    }
    state.powerups.retain(|p| p.lifetime > 0);

    let reach = state.config.character_radius + state.config.powerups.size;
    let room = state.puck.room;
    for player in PlayerId::ALL {
        let pos = state.active_character(player).pos;
        let mut collected = Vec::new();
        state.powerups.retain(|p| {
            let hit = p.room == room && p.pos.distance(pos) < reach;
            if hit {
                collected.push(p.kind);
            }
            !hit
        });
        for kind in collected {
            apply_powerup(state, player, kind);
        }
    }
}

/// Give `player` the effect of `kind`
///
/// Slowdown lands on every other player instead of the collector. Timers are
/// always reset to the full duration, never extended.
pub fn apply_powerup(state: &mut GameState, player: PlayerId, kind: PowerUpKind) {
    let duration = kind.duration(&state.config.powerups);
    match kind {
        PowerUpKind::Magnet | PowerUpKind::Speed | PowerUpKind::Shield => {
            state.effects[player.index()].set(kind, duration);
        }
        PowerUpKind::Slowdown => {
            for other in player.others() {
                state.effects[other.index()].slowdown = duration;
            }
        }
    }
    state.emit(SimEvent::PowerUpCollected { player, kind });
    log::info!("{player} collected {}", kind.as_str());
}

/// Tick every player's effect timers down by one
pub fn decay_effects(state: &mut GameState) {
    for fx in &mut state.effects {
        fx.decay();
    }
}
