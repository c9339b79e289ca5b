//! Puck integration and room boundaries
//!
//! The puck moves in sub-steps no longer than its radius so it can never skip
//! through a wall, and rebounds at most once per tick. Characters are clamped
//! into their room without any reflection.

use glam::Vec2;

use super::portal;
use super::state::{Character, GameState, Puck};
use super::topology::{Room, Topology, Wall};
use crate::config::GameConfig;
use crate::consts::DIRECTION_EPSILON;

/// Rescale `vel` to at most `max`, keeping its direction
#[inline]
pub fn clamp_speed(vel: Vec2, max: f32) -> Vec2 {
    let speed = vel.length();
    if speed > max { vel * (max / speed) } else { vel }
}

/// Center of the rounded corner whose quadrant holds `p`, if `p` lies beyond its arc
///
/// `min`/`max` are the bounds for the body's center, so the arc radius is the
/// room's corner radius regardless of body size.
pub fn corner_overshoot(p: Vec2, min: Vec2, max: Vec2, radius: f32) -> Option<Vec2> {
    let cx = if p.x < min.x + radius {
        min.x + radius
    } else if p.x > max.x - radius {
        max.x - radius
    } else {
        return None;
    };
    let cy = if p.y < min.y + radius {
        min.y + radius
    } else if p.y > max.y - radius {
        max.y - radius
    } else {
        return None;
    };
    let center = Vec2::new(cx, cy);
    (p.distance(center) > radius).then_some(center)
}

/// Clamp a body of `radius` into `room`: rectangle first, then the rounded corners
pub fn constrain_to_room(pos: Vec2, room: &Room, radius: f32) -> Vec2 {
    let (min, max) = room.inner_bounds(radius);
    let p = pos.clamp(min, max);
    match corner_overshoot(p, min, max, room.corner_radius) {
        Some(corner) => corner + (p - corner).normalize_or_zero() * room.corner_radius,
        None => p,
    }
}

pub fn constrain_character(character: &mut Character, topology: &Topology, radius: f32) {
    character.pos = constrain_to_room(character.pos, topology.room(character.room), radius);
}

/// One physics tick for the puck
///
/// Friction, gravity and the speed cap, then the swept move, room membership
/// (which may start a portal transition), character contacts and containment.
pub fn update_puck(state: &mut GameState) {
    let cfg = &state.config;
    let puck = &mut state.puck;

    puck.vel *= cfg.friction;
    puck.vz -= cfg.puck_gravity;
    puck.z += puck.vz;
    if puck.z <= 0.0 {
        puck.z = 0.0;
        puck.vz *= -cfg.ground_bounce;
        if puck.vz.abs() < cfg.min_bounce_speed {
            puck.vz = 0.0;
        }
    }
    puck.vel = clamp_speed(puck.vel, cfg.max_puck_speed);
    puck.record_trail(cfg.trail_length);

    if let Some(hit) = sweep(cfg, &state.topology, puck) {
        state.spawn_bounce_effect(hit);
    }

    portal::update_puck_room(state);
    resolve_character_contacts(state);
    contain_puck(state);

    // Contact and magnet impulses are applied after the cap
    state.puck.vel = clamp_speed(state.puck.vel, state.config.max_puck_speed);
}

/// Move the puck along its velocity in radius-sized steps; returns the hit point
fn sweep(cfg: &GameConfig, topology: &Topology, puck: &mut Puck) -> Option<Vec2> {
    let steps = (puck.vel.length() / cfg.puck_radius).ceil() as u32;
    if steps == 0 {
        return None;
    }
    let step = puck.vel / steps as f32;
    let room = topology.room(puck.room);
    let (min, max) = room.inner_bounds(cfg.puck_radius);

    for _ in 0..steps {
        let prev = puck.pos;
        puck.pos += step;
        nudge_off_walls(&mut puck.pos, min, max, cfg, topology);

        if topology.in_any_tunnel(puck.pos) {
            continue;
        }

        let mut hit = false;
        if puck.pos.x < min.x || puck.pos.x > max.x {
            puck.pos.x = prev.x;
            puck.vel.x *= -cfg.wall_bounce;
            hit = true;
        }
        if puck.pos.y < min.y || puck.pos.y > max.y {
            puck.pos.y = prev.y;
            puck.vel.y *= -cfg.wall_bounce;
            hit = true;
        }
        if !hit {
            if let Some(corner) = corner_overshoot(puck.pos, min, max, room.corner_radius) {
                let normal = (puck.pos - corner).normalize_or_zero();
                puck.pos = corner + normal * room.corner_radius;
                puck.vel = (puck.vel - 2.0 * puck.vel.dot(normal) * normal) * cfg.wall_bounce;
                hit = true;
            }
        }

        if hit {
            return Some(puck.pos);
        }
    }
    None
}

/// Push the puck a hair off any wall it is touching (tunnels excepted)
fn nudge_off_walls(pos: &mut Vec2, min: Vec2, max: Vec2, cfg: &GameConfig, topology: &Topology) {
    let eps = cfg.nudge_epsilon;
    let d = cfg.nudge_distance;
    if (pos.x - min.x).abs() < eps && !topology.in_any_tunnel(*pos) {
        pos.x += d;
    }
    if (pos.x - max.x).abs() < eps && !topology.in_any_tunnel(*pos) {
        pos.x -= d;
    }
    if (pos.y - min.y).abs() < eps && !topology.in_any_tunnel(*pos) {
        pos.y += d;
    }
    if (pos.y - max.y).abs() < eps && !topology.in_any_tunnel(*pos) {
        pos.y -= d;
    }
}

/// Magnet pull and soft contact against every character
fn resolve_character_contacts(state: &mut GameState) {
    let cfg = &state.config;
    let pu = &cfg.powerups;
    let contact = cfg.puck_radius + cfg.character_radius;
    let puck = &mut state.puck;

    for (set, effects) in state.characters.iter().zip(&state.effects) {
        let magnet = effects.magnet > 0;
        for c in set {
            let delta = puck.pos - c.pos;
            let dist = delta.length();
            if dist < DIRECTION_EPSILON {
                continue;
            }
            let normal = delta / dist;

            if c.active && magnet && dist < pu.magnet_radius {
                puck.vel -= normal * pu.magnet_pull;
                puck.vel += c.vel * pu.magnet_follow;
                puck.vel *= pu.magnet_damping;
            }

            if dist < contact {
                let softening = if magnet { pu.magnet_contact_softening } else { 1.0 };
                puck.vel += normal * cfg.contact_force * softening;
                puck.pos += normal * (contact - dist);
            }
        }
    }
}

/// Final wall pass: put the puck back on any wall it crossed where no tunnel opens
fn contain_puck(state: &mut GameState) {
    let r = state.config.puck_radius;
    let bounce = state.config.containment_bounce;
    let id = state.topology.room_at(state.puck.pos).unwrap_or(state.puck.room);
    let room = state.topology.room(id);
    let half = room.half_extents();
    let (left, top) = (room.center.x - half.x, room.center.y - half.y);
    let (right, bottom) = (room.center.x + half.x, room.center.y + half.y);
    let puck = &mut state.puck;

    if puck.pos.x - r <= left && !room.tunnel_spans(Wall::Left, puck.pos.y) {
        puck.vel.x = puck.vel.x.abs() * bounce;
        puck.pos.x = left + r;
    }
    if puck.pos.x + r >= right && !room.tunnel_spans(Wall::Right, puck.pos.y) {
        puck.vel.x = -puck.vel.x.abs() * bounce;
        puck.pos.x = right - r;
    }
    if puck.pos.y - r <= top && !room.tunnel_spans(Wall::Top, puck.pos.x) {
        puck.vel.y = puck.vel.y.abs() * bounce;
        puck.pos.y = top + r;
    }
    if puck.pos.y + r >= bottom && !room.tunnel_spans(Wall::Bottom, puck.pos.x) {
        puck.vel.y = -puck.vel.y.abs() * bounce;
        puck.pos.y = bottom - r;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchSetup;
    use crate::sim::state::FaceOff;
    use crate::sim::topology::{PlayerId, RoomId};

    /// Live play in the center room with every character parked far from the puck
    fn open_play() -> GameState {
        let mut state = GameState::new(3, GameConfig::default(), MatchSetup::default()).unwrap();
        state.face_off = FaceOff::Inactive;
        for set in &mut state.characters {
            for c in set.iter_mut() {
                c.pos = state.topology.room(c.room).center + Vec2::new(-400.0, 400.0);
            }
        }
        state.drain_events();
        state
    }

    #[test]
    fn test_friction_under_cap() {
        let mut state = open_play();
        state.puck.vel = Vec2::new(10.0, 0.0);
        update_puck(&mut state);
        let speed = state.puck.speed();
        assert!(speed <= 10.0);
        assert!((speed - 9.8).abs() < 1e-4);
        assert!((state.puck.pos.x - 9.8).abs() < 1e-4);
    }

    #[test]
    fn test_speed_clamped_to_max() {
        let mut state = open_play();
        state.puck.vel = Vec2::new(30.0, 40.0);
        update_puck(&mut state);
        assert!(state.puck.speed() <= state.config.max_puck_speed + 1e-4);
        // Direction survives the clamp
        assert!((state.puck.vel.normalize() - Vec2::new(0.6, 0.8)).length() < 1e-3);
    }

    #[test]
    fn test_wall_hit_reflects_and_flashes() {
        let mut state = open_play();
        state.puck.pos = Vec2::new(485.0, 200.0);
        state.puck.vel = Vec2::new(10.0, 0.0);
        update_puck(&mut state);
        assert_eq!(state.puck.pos.x, 485.0);
        assert!((state.puck.vel.x + 9.8 * 0.77).abs() < 1e-4);
        assert_eq!(state.bounce_effects.len(), 1);
    }

    #[test]
    fn test_corner_reflects_off_arc() {
        let mut state = open_play();
        // Heading diagonally into the bottom-right corner
        state.puck.pos = Vec2::new(470.0, 470.0);
        state.puck.vel = Vec2::new(7.0, 7.0);
        update_puck(&mut state);
        assert!(state.puck.vel.x < 0.0 && state.puck.vel.y < 0.0);
        let (_, max) = state.topology.room(RoomId::Center).inner_bounds(10.0);
        let corner = Vec2::new(max.x - 50.0, max.y - 50.0);
        assert!(state.puck.pos.distance(corner) <= 50.0 + 1e-3);
    }

    #[test]
    fn test_ground_bounce_damps_and_settles() {
        let mut state = open_play();
        state.puck.z = 0.0;
        state.puck.vz = -10.0;
        update_puck(&mut state);
        assert_eq!(state.puck.z, 0.0);
        assert!((state.puck.vz - 3.15).abs() < 1e-4);
        state.puck.vz = -2.0;
        update_puck(&mut state);
        assert_eq!(state.puck.vz, 0.0);
    }

    #[test]
    fn test_contact_pushes_puck_out() {
        let mut state = open_play();
        let room = RoomId::Center.index();
        state.characters[PlayerId::P1.index()][room].pos = Vec2::new(-20.0, 0.0);
        update_puck(&mut state);
        let c = state.characters[PlayerId::P1.index()][room].pos;
        assert!((state.puck.pos.distance(c) - 35.0).abs() < 1e-3);
        assert!(state.puck.vel.x > 0.0);
    }

    #[test]
    fn test_magnet_pulls_toward_character() {
        let mut state = open_play();
        let room = RoomId::Center.index();
        state.characters[PlayerId::P2.index()][room].pos = Vec2::new(100.0, 0.0);
        state.effects[PlayerId::P2.index()].magnet = 100;
        update_puck(&mut state);
        assert!(state.puck.vel.x > 0.0);
        // Without the magnet nothing reaches the puck
        let mut calm = open_play();
        calm.characters[PlayerId::P2.index()][room].pos = Vec2::new(100.0, 0.0);
        update_puck(&mut calm);
        assert_eq!(calm.puck.vel, Vec2::ZERO);
    }

    #[test]
    fn test_containment_skips_tunnel_mouth() {
        let cfg = GameConfig::default();
        let topo = Topology::standard(&cfg).unwrap();
        let room = topo.room(RoomId::Center);
        assert!(room.tunnel_spans(Wall::Top, 0.0));
        assert!(!room.tunnel_spans(Wall::Top, 200.0));
    }

    #[test]
    fn test_character_stops_at_wall() {
        let cfg = GameConfig::default();
        let topo = Topology::standard(&cfg).unwrap();
        let room = topo.room(RoomId::Center);
        let p = constrain_to_room(Vec2::new(900.0, 0.0), room, 25.0);
        assert_eq!(p, Vec2::new(475.0, 0.0));
        let q = constrain_to_room(Vec2::new(-900.0, -900.0), room, 25.0);
        let corner = Vec2::new(-425.0, -425.0);
        assert!((q.distance(corner) - 50.0).abs() < 1e-3);
    }
}
