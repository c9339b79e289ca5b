//! Goal detection, shields and scoring
//!
//! Conceding a goal gives a point to each of the other two players. Play then
//! waits for the configured delay and restarts with a face-off in the hub.

use glam::Vec2;

use super::faceoff::start_face_off;
use super::state::{GameState, SimEvent};
use super::topology::{Goal, RoomId, Wall};

/// Puck at `pos` is inside the capture zone of `goal` (world-space `center`)
pub fn in_goal(goal: &Goal, center: Vec2, pos: Vec2, size: f32, depth: f32) -> bool {
    let half = size / 2.0;
    match goal.facing {
        Wall::Top => pos.y <= center.y + depth && (pos.x - center.x).abs() <= half,
        Wall::Bottom => pos.y >= center.y - depth && (pos.x - center.x).abs() <= half,
        Wall::Left => pos.x <= center.x + depth && (pos.y - center.y).abs() <= half,
        Wall::Right => pos.x >= center.x - depth && (pos.y - center.y).abs() <= half,
    }
}

/// `pos` moved one unit past the capture line of `goal`, back into the room
fn outside_goal(goal: &Goal, center: Vec2, pos: Vec2, depth: f32) -> Vec2 {
    let edge = depth + 1.0;
    match goal.facing {
        Wall::Top => Vec2::new(pos.x, center.y + edge),
        Wall::Bottom => Vec2::new(pos.x, center.y - edge),
        Wall::Left => Vec2::new(center.x + edge, pos.y),
        Wall::Right => Vec2::new(center.x - edge, pos.y),
    }
}

/// Score or block at most one goal in the puck's room
///
/// Skipped while a goal is already pending, during a face-off and while the
/// puck is between rooms, so a single shot never scores twice.
pub fn check_goals(state: &mut GameState) -> bool {
    if state.pending_faceoff.is_some()
        || state.face_off.is_active()
        || state.portal.is_transitioning()
    {
        return false;
    }

    let cfg = &state.config;
    let room = state.topology.room(state.puck.room);
    let Some((goal, center)) = room
        .goals
        .iter()
        .map(|g| (*g, room.goal_center(g)))
        .find(|(g, c)| in_goal(g, *c, state.puck.pos, cfg.goal_size, cfg.goal_depth))
    else {
        return false;
    };
    let owner = goal.owner;

    if state.effects[owner.index()].shield > 0 {
        // Both axes flip; the puck is set just outside the capture line so the
        // next tick cannot catch it again
        state.puck.vel = -state.puck.vel;
        state.puck.pos = outside_goal(&goal, center, state.puck.pos, cfg.goal_depth);
        state.spawn_bounce_effect(center);
        state.emit(SimEvent::GoalBlocked { owner });
        log::info!("{owner}'s shield blocked a goal");
        return false;
    }

    for other in owner.others() {
        state.scores[other.index()] += 1;
    }
    let room_id = state.puck.room;
    state.pending_faceoff = Some(state.config.goal_faceoff_delay);
    state.emit(SimEvent::GoalScored {
        conceded_by: owner,
        room: room_id,
    });
    state.emit(SimEvent::ScoreChanged {
        scores: state.scores,
    });
    log::info!("Goal against {owner} in {room_id}, scores {:?}", state.scores);
    true
}

/// Count down to the post-goal face-off in the hub
pub fn update_pending_faceoff(state: &mut GameState) {
    let Some(remaining) = state.pending_faceoff else {
        return;
    };
    let remaining = remaining.saturating_sub(1);
    if remaining == 0 {
        start_face_off(state, RoomId::Center, None);
    } else {
        state.pending_faceoff = Some(remaining);
    }
}
