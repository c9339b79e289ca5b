//! Kicking, shared by human key presses and the AI

use super::state::{GameState, SimEvent};
use super::topology::PlayerId;

/// Kick the puck away from `player`'s active character
///
/// No-op (false) during a face-off or portal flight, on cooldown, out of
/// range, or when the puck is too close to have a direction. Moving into the
/// puck kicks harder.
pub fn try_kick(state: &mut GameState, player: PlayerId) -> bool {
    if state.face_off.is_active()
        || state.portal.is_transitioning()
        || state.kick_cooldowns[player.index()] > 0
    {
        return false;
    }
    let cfg = &state.config;
    let c = state.active_character(player);
    let delta = state.puck.pos - c.pos;
    let dist = delta.length();
    if dist > cfg.kick_range || dist < cfg.kick_min_distance {
        return false;
    }

    let dir = delta / dist;
    let run_up = c.momentum.length() / cfg.player_speed * 0.5;
    let toward = c.momentum.dot(dir).max(0.0) * 0.5;
    let strength = 1.0 + run_up + toward;
    let force = dir * cfg.kick_force * strength;
    let lift = force.length() * cfg.kick_lift;
    let (cooldown, glow) = (cfg.kick_cooldown, cfg.kick_glow);

    state.puck.vel += force;
    state.puck.vz += lift;
    state.kick_cooldowns[player.index()] = cooldown;
    let c = state.active_character_mut(player);
    c.kick_glow = glow;
    c.kick_strength = strength;

    state.emit(SimEvent::Kicked { player, strength });
    log::debug!("{player} kicked (strength {strength:.2})");
    true
}

/// Count kick cooldowns and kick flashes down
pub fn update_cooldowns(state: &mut GameState) {
    for cd in &mut state.kick_cooldowns {
        *cd = cd.saturating_sub(1);
    }
    for set in &mut state.characters {
        for c in set.iter_mut() {
            c.kick_glow = c.kick_glow.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, MatchSetup};
    use crate::sim::state::FaceOff;
    use glam::Vec2;

    fn ready() -> GameState {
        let mut state = GameState::new(4, GameConfig::default(), MatchSetup::default()).unwrap();
        state.face_off = FaceOff::Inactive;
        state.active_character_mut(PlayerId::P1).pos = Vec2::new(-40.0, 0.0);
        state
    }

    #[test]
    fn test_kick_in_range_sends_puck_away() {
        let mut state = ready();
        assert!(try_kick(&mut state, PlayerId::P1));
        assert!(state.kick_cooldowns[0] > 0);
        assert!(state.puck.vel.x > 0.0);
        assert!(state.puck.vel.y.abs() < 1e-6);
        assert!((state.puck.vel.x - 8.5).abs() < 1e-4);
        assert!((state.puck.vz - 8.5 * 0.15).abs() < 1e-4);
        assert_eq!(state.active_character(PlayerId::P1).kick_glow, 10);
    }

    #[test]
    fn test_kick_refused_on_cooldown() {
        let mut state = ready();
        assert!(try_kick(&mut state, PlayerId::P1));
        let vel = state.puck.vel;
        assert!(!try_kick(&mut state, PlayerId::P1));
        assert_eq!(state.puck.vel, vel);
        for _ in 0..15 {
            update_cooldowns(&mut state);
        }
        assert!(try_kick(&mut state, PlayerId::P1));
    }

    #[test]
    fn test_kick_refused_when_out_of_reach_or_touching() {
        let mut state = ready();
        state.active_character_mut(PlayerId::P1).pos = Vec2::new(-51.0, 0.0);
        assert!(!try_kick(&mut state, PlayerId::P1));
        state.active_character_mut(PlayerId::P1).pos = Vec2::new(-4.0, 0.0);
        assert!(!try_kick(&mut state, PlayerId::P1));
        assert_eq!(state.puck.vel, Vec2::ZERO);
    }

    #[test]
    fn test_kick_refused_during_face_off() {
        let mut state = GameState::new(4, GameConfig::default(), MatchSetup::default()).unwrap();
        state.active_character_mut(PlayerId::P1).pos = Vec2::new(-40.0, 0.0);
        assert!(!try_kick(&mut state, PlayerId::P1));
    }

    #[test]
    fn test_running_kick_is_stronger() {
        let mut state = ready();
        state.active_character_mut(PlayerId::P1).momentum = Vec2::new(5.5, 0.0);
        assert!(try_kick(&mut state, PlayerId::P1));
        // 1 + 0.5 (full speed) + 5.5 * 0.5 (straight at the puck)
        let expected = 8.5 * (1.0 + 0.5 + 2.75);
        assert!((state.puck.vel.x - expected).abs() < 1e-3);
    }
}
