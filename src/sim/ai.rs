//! AI players
//!
//! Two rates: the strategy is re-picked every `reaction_ticks`, while movement
//! toward the cached target and the kick decision run every tick. Difficulty
//! changes how well targets are chosen and how often, never the top speed.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::kick::try_kick;
use super::movement::{accelerate, integrate, player_speed};
use super::physics::clamp_speed;
use super::state::{GameState, PowerUp, Strategy};
use super::topology::{PlayerId, RoomId};
use crate::config::AiTuning;
use crate::{direction, kick_alignment};

/// Range within which the puck counts as "close" for shooting and clearing
const CLOSE_RANGE: f32 = 150.0;
/// Range within which a fast approach on goal is an emergency
const DANGER_RANGE: f32 = 200.0;

/// Run one tick of AI control for `player`
pub fn update_ai(state: &mut GameState, player: PlayerId) {
    let tuning = *state.config.ai.tuning(state.setup.difficulty);
    let ai = state.ai[player.index()];

    if state.time_ticks.saturating_sub(ai.last_decision) >= tuning.reaction_ticks as u64 {
        decide(state, player, &tuning);
        state.ai[player.index()].last_decision = state.time_ticks;
    }

    if let Some(target) = state.ai[player.index()].target {
        move_toward_target(state, player, target);
    }

    let c = state.active_character(player);
    let in_reach = c.pos.distance(state.puck.pos) <= state.config.kick_range;
    if in_reach && state.kick_cooldowns[player.index()] == 0 {
        let delay = tuning.strategy > 0.8 && should_delay_kick(state, player, &tuning);
        if !delay && should_kick(state, player, &tuning) {
            try_kick(state, player);
        }
    }
}

/// Pick a strategy and compute its target
pub fn decide(state: &mut GameState, player: PlayerId, tuning: &AiTuning) {
    let pos = state.active_character(player).pos;
    let puck_dist = pos.distance(state.puck.pos);
    let room = state.puck.room;
    let threat = threat_level(state, player);
    let powerup = powerup_worth_taking(state, player, tuning);

    let mut powerup_target = None;
    let strategy = match powerup {
        Some(id) if threat < 0.7 => {
            powerup_target = Some(id);
            Strategy::GetPowerUp
        }
        _ if state.rng.random::<f32>() < tuning.strategy => {
            if threat > 0.8 {
                Strategy::UrgentDefend
            } else if room == RoomId::Center {
                if puck_dist < CLOSE_RANGE {
                    Strategy::PushToPortal
                } else {
                    Strategy::Intercept
                }
            } else if room.zone_owner() == Some(player) {
                if alone_in_zone(state, player) {
                    Strategy::EscapeToPortal
                } else if puck_dist < DANGER_RANGE && threat > 0.5 {
                    Strategy::UrgentDefend
                } else if puck_dist < CLOSE_RANGE {
                    Strategy::ClearPuck
                } else {
                    Strategy::Goalkeeper
                }
            } else if puck_dist < CLOSE_RANGE {
                if best_enemy_goal(state, player).is_some() {
                    Strategy::ShootOnGoal
                } else {
                    Strategy::Attack
                }
            } else {
                Strategy::Intercept
            }
        }
        _ => Strategy::Follow,
    };

    // Aim scatter is drawn up front so target computation stays pure
    let jitter = if matches!(strategy, Strategy::ShootOnGoal | Strategy::Attack) {
        Vec2::new(
            state.rng.random::<f32>() - 0.5,
            state.rng.random::<f32>() - 0.5,
        )
    } else {
        Vec2::ZERO
    };

    let ai = &mut state.ai[player.index()];
    if ai.strategy != strategy {
        log::debug!("{player}: {} -> {}", ai.strategy.as_str(), strategy.as_str());
    }
    ai.strategy = strategy;
    ai.powerup_target = powerup_target;

    let target = compute_target(state, player, strategy, tuning, jitter);
    state.ai[player.index()].target = Some(target);
}

/// Aim point shifted by up to 60 units per axis at accuracy 0
fn scatter(aim: Vec2, jitter: Vec2, tuning: &AiTuning) -> Vec2 {
    aim + jitter * (1.0 - tuning.accuracy) * 120.0
}

/// Where `strategy` wants the active character to stand
pub fn compute_target(
    state: &GameState,
    player: PlayerId,
    strategy: Strategy,
    tuning: &AiTuning,
    jitter: Vec2,
) -> Vec2 {
    let me = state.active_character(player).pos;
    let puck = state.puck.pos;

    match strategy {
        Strategy::Follow => puck,
        Strategy::Intercept => predict_puck(state, tuning.prediction_frames),
        Strategy::Attack => match best_enemy_goal(state, player) {
            Some(goal) => scatter(goal, jitter, tuning),
            None => puck,
        },
        Strategy::PushToPortal => push_portal(state, player)
            .and_then(|portal| behind(puck, portal, 50.0))
            .unwrap_or(me),
        Strategy::GetPowerUp => state.ai[player.index()]
            .powerup_target
            .and_then(|id| state.powerups.iter().find(|p| p.id == id))
            .map(|p| p.pos)
            .unwrap_or(puck),
        Strategy::UrgentDefend => my_goal(state, player)
            .map(|goal| goal + (puck - goal) * 0.3)
            .unwrap_or(me),
        Strategy::ClearPuck => my_goal(state, player)
            .and_then(|goal| behind(puck, goal, 40.0))
            .unwrap_or(me),
        Strategy::ShootOnGoal => best_enemy_goal(state, player)
            .and_then(|goal| behind(puck, scatter(goal, jitter, tuning), 35.0))
            .unwrap_or(me),
        Strategy::Goalkeeper => my_goal(state, player)
            .map(|goal| goalkeeper_position(puck, goal))
            .unwrap_or(me),
        Strategy::EscapeToPortal => {
            let room = state.topology.room(state.puck.room);
            room.connections
                .values()
                .next()
                .and_then(|t| behind(puck, room.tunnel_center(t), 40.0))
                .unwrap_or(me)
        }
    }
}

/// Steer toward `target` with the human motion model
pub fn move_toward_target(state: &mut GameState, player: PlayerId, target: Vec2) {
    let cfg = &state.config;
    let (arrival, friction, accel) = (
        cfg.ai.arrival_radius,
        cfg.player_friction,
        cfg.player_acceleration,
    );
    let (stuck_threshold, stuck_reset, escape_force) =
        (cfg.ai.stuck_threshold, cfg.ai.stuck_reset, cfg.ai.anti_stuck_force);

    let pos = state.active_character(player).pos;
    let Some(dir) = direction(pos, target).filter(|_| pos.distance(target) >= arrival) else {
        let c = state.active_character_mut(player);
        c.momentum *= friction;
        return;
    };

    let ai = &mut state.ai[player.index()];
    if pos.distance(ai.last_pos) < 1.0 {
        ai.stuck_counter += 1;
    } else {
        ai.stuck_counter = ai.stuck_counter.saturating_sub(1);
    }

    let speed = player_speed(state, player);
    let mut desired = dir * speed;
    let ai = &mut state.ai[player.index()];
    if ai.stuck_counter > stuck_threshold {
        let angle = state.rng.random::<f32>() * TAU;
        // Shaken loose, but never faster than a human could go
        desired = clamp_speed(desired + Vec2::from_angle(angle) * escape_force, speed);
        if ai.stuck_counter > stuck_reset {
            ai.stuck_counter = 0;
        }
    }
    ai.last_pos = pos;

    let c = state.active_character_mut(player);
    c.momentum = accelerate(c.momentum, desired, accel);
    integrate(state, player);
}

/// Whether a smart AI should hold its kick for a better angle
pub fn should_delay_kick(state: &GameState, player: PlayerId, tuning: &AiTuning) -> bool {
    let me = state.active_character(player).pos;
    let puck = state.puck.pos;
    let alignment = match state.ai[player.index()].strategy {
        Strategy::ShootOnGoal | Strategy::Attack => best_enemy_goal(state, player)
            .map(|goal| kick_alignment(me, puck, goal))
            .unwrap_or(0.0),
        Strategy::PushToPortal => {
            let room = state.topology.room(state.puck.room);
            room.connections
                .values()
                .map(|t| kick_alignment(me, puck, room.tunnel_center(t)))
                .fold(0.0, f32::max)
        }
        // Only aimed strategies wait for a line
        _ => return false,
    };
    let threshold = if tuning.strategy > 0.7 { 0.7 } else { 0.5 };
    alignment < threshold
}

/// Per-tick kick decision (consumes one RNG draw for the aggressiveness gate)
pub fn should_kick(state: &mut GameState, player: PlayerId, tuning: &AiTuning) -> bool {
    let aggressiveness = state.config.ai.min_kick_aggressiveness.max(tuning.strategy);
    if state.rng.random::<f32>() > aggressiveness {
        return false;
    }

    let me = state.active_character(player).pos;
    let puck = state.puck.pos;
    let room = state.puck.room;

    match state.ai[player.index()].strategy {
        Strategy::ShootOnGoal | Strategy::Attack => {
            if let Some(goal) = best_enemy_goal(state, player) {
                return kick_alignment(me, puck, goal) > 0.4;
            }
        }
        Strategy::ClearPuck | Strategy::UrgentDefend | Strategy::EscapeToPortal => return true,
        Strategy::Goalkeeper => {
            if state.puck.speed() < 3.0 {
                return true;
            }
        }
        Strategy::PushToPortal if room == RoomId::Center => {
            return best_scoring_portal(state, player, tuning).is_some();
        }
        _ => {}
    }

    if room != RoomId::Center {
        if let Some(goal) = best_enemy_goal(state, player) {
            let threshold = if state.effects[player.index()].speed > 0 { 0.3 } else { 0.4 };
            if kick_alignment(me, puck, goal) > threshold && puck.distance(goal) > 80.0 {
                return true;
            }
        }
    } else {
        let center = state.topology.room(RoomId::Center);
        let toward_enemy = center.connections.iter().any(|(&to, t)| {
            is_enemy_zone(to, player) && kick_alignment(me, puck, center.tunnel_center(t)) > 0.5
        });
        if toward_enemy {
            return true;
        }
    }

    if room.zone_owner() == Some(player) {
        if let Some(goal) = my_goal(state, player) {
            if threat_level(state, player) > 0.3 || puck.distance(goal) < DANGER_RANGE {
                return true;
            }
        }
    }
    false
}

/// Center-room tunnel worth kicking at, scored by alignment, enemy zone and distance
pub fn best_scoring_portal(state: &GameState, player: PlayerId, tuning: &AiTuning) -> Option<Vec2> {
    let me = state.active_character(player).pos;
    let puck = state.puck.pos;
    let center = state.topology.room(RoomId::Center);
    let own = RoomId::defensive_zone_of(player);
    let reach = state.config.room_size;

    let mut best: Option<(f32, Vec2)> = None;
    for (&to, tunnel) in &center.connections {
        if to == own {
            continue;
        }
        let portal = center.tunnel_center(tunnel);
        let alignment = kick_alignment(me, puck, portal);
        let mut score = alignment;
        if is_enemy_zone(to, player) {
            score *= 1.5;
        }
        if tuning.strategy > 0.8 {
            score *= (reach - portal.distance(me)) / reach;
        }
        if alignment > 0.5 && best.is_none_or(|(s, _)| score > s) {
            best = Some((score, portal));
        }
    }
    best.map(|(_, portal)| portal)
}

/// Tunnel the push-to-portal play aims for: nearest enemy zone, else frantic, else any
pub fn push_portal(state: &GameState, player: PlayerId) -> Option<Vec2> {
    let me = state.active_character(player).pos;
    let center = state.topology.room(RoomId::Center);
    let own = RoomId::defensive_zone_of(player);
    let candidates: Vec<(RoomId, Vec2)> = center
        .connections
        .iter()
        .filter(|(to, _)| **to != own)
        .map(|(&to, t)| (to, center.tunnel_center(t)))
        .collect();

    let nearest_enemy = candidates
        .iter()
        .filter(|(to, _)| is_enemy_zone(*to, player))
        .min_by(|a, b| a.1.distance(me).total_cmp(&b.1.distance(me)));
    nearest_enemy
        .or_else(|| candidates.iter().find(|(to, _)| *to == RoomId::FranticZone))
        .or_else(|| candidates.first())
        .map(|&(_, pos)| pos)
}

#[inline]
fn is_enemy_zone(room: RoomId, player: PlayerId) -> bool {
    room.zone_owner().is_some_and(|owner| owner != player)
}

/// Spot `offset` units behind `puck` on the line toward `target`
#[inline]
fn behind(puck: Vec2, target: Vec2, offset: f32) -> Option<Vec2> {
    direction(puck, target).map(|d| puck - d * offset)
}

/// Between goal and puck, 80 to 120 units off the line
pub fn goalkeeper_position(puck: Vec2, goal: Vec2) -> Vec2 {
    match direction(goal, puck) {
        Some(d) => goal + d * (puck.distance(goal) * 0.3).clamp(80.0, 120.0),
        None => goal,
    }
}

/// `player`'s goal in the puck's room
pub fn my_goal(state: &GameState, player: PlayerId) -> Option<Vec2> {
    let room = state.topology.room(state.puck.room);
    room.goal_owned_by(player).map(|g| room.goal_center(g))
}

/// Closest opponent goal in the puck's room
pub fn best_enemy_goal(state: &GameState, player: PlayerId) -> Option<Vec2> {
    let me = state.active_character(player).pos;
    let room = state.topology.room(state.puck.room);
    room.goals
        .iter()
        .filter(|g| g.owner != player)
        .map(|g| room.goal_center(g))
        .min_by(|a, b| a.distance(me).total_cmp(&b.distance(me)))
}

/// Roll the puck forward `frames` ticks under friction with rough wall bounces
pub fn predict_puck(state: &GameState, frames: u32) -> Vec2 {
    let cfg = &state.config;
    let (min, max) = state.topology.room(state.puck.room).inner_bounds(cfg.puck_radius);
    let mut pos = state.puck.pos;
    let mut vel = state.puck.vel;
    for _ in 0..frames {
        vel *= cfg.friction;
        pos += vel;
        if pos.x < min.x || pos.x > max.x {
            vel.x *= -cfg.wall_bounce;
        }
        if pos.y < min.y || pos.y > max.y {
            vel.y *= -cfg.wall_bounce;
        }
    }
    pos
}

fn moving_toward(state: &GameState, goal: Vec2) -> bool {
    predict_puck(state, 10).distance(goal) < state.puck.pos.distance(goal)
}

/// How dangerous the puck is to `player`'s goal, in [0, 1]
pub fn threat_level(state: &GameState, player: PlayerId) -> f32 {
    let Some(goal) = my_goal(state, player) else {
        return 0.0;
    };
    if !moving_toward(state, goal) {
        return 0.0;
    }
    let mut threat: f32 = 0.5;
    if state.puck.pos.distance(goal) < DANGER_RANGE {
        threat += 0.3;
    }
    if state.puck.speed() > 5.0 {
        threat += 0.2;
    }
    threat.min(1.0)
}

/// In own zone with no opponent near the puck
pub fn alone_in_zone(state: &GameState, player: PlayerId) -> bool {
    if state.puck.room.zone_owner() != Some(player) {
        return false;
    }
    let clearance = state.config.ai.escape_clearance;
    player
        .others()
        .all(|other| state.active_character(other).pos.distance(state.puck.pos) > clearance)
}

/// Nearest power-up in the puck's room, with its distance from `pos`
pub fn nearest_powerup(state: &GameState, pos: Vec2) -> Option<(&PowerUp, f32)> {
    state
        .powerups
        .iter()
        .filter(|p| p.room == state.puck.room)
        .map(|p| (p, p.pos.distance(pos)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Id of a power-up a smart AI should detour for
pub fn powerup_worth_taking(state: &GameState, player: PlayerId, tuning: &AiTuning) -> Option<u32> {
    let me = state.active_character(player).pos;
    let (powerup, dist) = nearest_powerup(state, me)?;
    if tuning.strategy < 0.6 {
        return None;
    }
    let puck_dist = me.distance(state.puck.pos);
    if dist >= puck_dist * 0.7 || state.effects[player.index()].active_count() >= 2 {
        return None;
    }
    let safe = my_goal(state, player).is_none_or(|goal| !moving_toward(state, goal));
    (safe || puck_dist > DANGER_RANGE).then_some(powerup.id)
}


#[cfg(test)]
mod proptests {
    use super::{move_toward_target, player_speed};
    use crate::config::{AiDifficulty, GameConfig, MatchSetup};
    use crate::sim::movement::{MoveIntent, drive_human};
    use crate::sim::state::{FaceOff, GameState};
    use crate::sim::topology::PlayerId;
    use glam::Vec2;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn ai_never_outruns_human_speed(
            tx in -2000.0f32..2000.0,
            ty in -2000.0f32..2000.0,
            stuck in 0u32..80,
            speed_boost in any::<bool>(),
            slowed in any::<bool>(),
            ticks in 1usize..60,
        ) {
            let mut state = GameState::new(17, GameConfig::default(), MatchSetup::all_ai(AiDifficulty::Hard)).unwrap();
            state.face_off = FaceOff::Inactive;
            for p in PlayerId::ALL {
                state.effects[p.index()].speed = if speed_boost { 1000 } else { 0 };
                state.effects[p.index()].slowdown = if slowed { 1000 } else { 0 };
            }
            state.ai[1].stuck_counter = stuck;
            let cap = player_speed(&state, PlayerId::P2);
            let target = Vec2::new(tx, ty);
            for _ in 0..ticks {
                let before = state.active_character(PlayerId::P2).pos;
                move_toward_target(&mut state, PlayerId::P2, target);
                let after = state.active_character(PlayerId::P2).pos;
                prop_assert!(after.distance(before) <= cap + 1e-3);
                prop_assert!(state.active_character(PlayerId::P2).momentum.length() <= cap + 1e-3);

                // Same effects, human holding a diagonal
                let before = state.active_character(PlayerId::P1).pos;
                drive_human(&mut state, PlayerId::P1, MoveIntent::new(1, 1));
                let human = state.active_character(PlayerId::P1).pos.distance(before);
                prop_assert!(human <= cap + 1e-3);
            }
        }
    }
}
