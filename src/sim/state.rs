//! Game state and core simulation types
//!
//! Everything the tick mutates lives in `GameState`. Renderers and HUDs read it
//! and drain `SimEvent`s; they never write.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::faceoff;
use super::topology::{PlayerId, RoomId, Topology};
use crate::config::{GameConfig, MatchSetup, PowerUpConfig};
use crate::consts::*;
use crate::error::ConfigError;

/// One player's body in one room
///
/// Each player owns a character in every room; only the one in the puck's
/// room is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub player: PlayerId,
    pub room: RoomId,
    pub pos: Vec2,
    /// Visual lift above the floor
    pub z: f32,
    /// Per-tick displacement
    pub momentum: Vec2,
    /// Visual velocity (a damped copy of momentum)
    pub vel: Vec2,
    pub active: bool,
    /// Ticks left on the kick flash
    pub kick_glow: u32,
    /// Strength of the last kick, for the flash intensity
    pub kick_strength: f32,
}

impl Character {
    pub fn new(player: PlayerId, room: RoomId, pos: Vec2) -> Self {
        Self {
            player,
            room,
            pos,
            z: CHARACTER_Z,
            momentum: Vec2::ZERO,
            vel: Vec2::ZERO,
            active: false,
            kick_glow: 0,
            kick_strength: 0.0,
        }
    }

    /// Stop dead (face-off placement)
    pub fn halt(&mut self) {
        self.momentum = Vec2::ZERO;
        self.vel = Vec2::ZERO;
    }
}

/// Spawn offset from the room center for a player's character
pub fn spawn_offset(player: PlayerId, room: RoomId) -> Vec2 {
    match player {
        PlayerId::P1 => match room {
            RoomId::Center => Vec2::new(-100.0, -100.0),
            RoomId::Player1Zone => Vec2::new(0.0, -100.0),
            RoomId::Player2Zone => Vec2::new(100.0, -100.0),
            RoomId::Player3Zone => Vec2::new(-100.0, -100.0),
            RoomId::FranticZone => Vec2::new(-100.0, 100.0),
        },
        PlayerId::P2 => Vec2::ZERO,
        PlayerId::P3 => match room {
            RoomId::Center | RoomId::Player1Zone | RoomId::Player3Zone => Vec2::new(100.0, 100.0),
            RoomId::Player2Zone => Vec2::new(-100.0, 100.0),
            RoomId::FranticZone => Vec2::new(100.0, -100.0),
        },
    }
}

/// The single puck
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puck {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Height above the floor
    pub z: f32,
    pub vz: f32,
    pub room: RoomId,
    /// Room before the last physics step (fallback when outside every room)
    pub last_room: RoomId,
    /// Recent positions, oldest first
    pub trail: VecDeque<Vec2>,
}

impl Puck {
    pub fn new(pos: Vec2, room: RoomId, trail_length: usize) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            z: 0.0,
            vz: 0.0,
            room,
            last_room: room,
            trail: VecDeque::with_capacity(trail_length + 1),
        }
    }

    /// Append the current position, dropping the oldest beyond `capacity`
    pub fn record_trail(&mut self, capacity: usize) {
        self.trail.push_back(self.pos);
        while self.trail.len() > capacity {
            self.trail.pop_front();
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A puck in flight between two rooms
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transit {
    pub from: RoomId,
    pub to: RoomId,
    pub from_pos: Vec2,
    pub to_pos: Vec2,
    /// Ticks since entry
    pub elapsed: u32,
    pub duration: u32,
}

impl Transit {
    /// Interpolation progress in [0, 1] for renderers
    pub fn progress(&self) -> f32 {
        (self.elapsed as f32 / self.duration.max(1) as f32).min(1.0)
    }
}

/// Portal state machine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PortalState {
    /// Puck belongs to exactly one room, portals open
    #[default]
    Idle,
    /// Physics suspended while the puck crosses
    Transitioning(Transit),
    /// Just arrived; portal entry suppressed for `remaining` physics ticks
    Cooldown { remaining: u32 },
}

impl PortalState {
    #[inline]
    pub fn is_transitioning(&self) -> bool {
        matches!(self, PortalState::Transitioning(_))
    }

    pub fn cooldown(&self) -> u32 {
        match self {
            PortalState::Cooldown { remaining } => *remaining,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum FaceOff {
    #[default]
    Inactive,
    Active {
        countdown: u32,
        room: RoomId,
        position: Vec2,
    },
}

impl FaceOff {
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, FaceOff::Active { .. })
    }
}

/// Idle-puck detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PuckStuck {
    pub last_pos: Vec2,
    pub timer: u32,
    /// Displacement below this counts as not moving
    pub threshold: f32,
    /// Consecutive idle ticks that count as stuck
    pub limit: u32,
}

impl PuckStuck {
    pub fn new(pos: Vec2, threshold: f32, limit: u32) -> Self {
        Self {
            last_pos: pos,
            timer: 0,
            threshold,
            limit,
        }
    }

    /// Feed this tick's puck position; true once per `limit` idle ticks
    pub fn observe(&mut self, pos: Vec2) -> bool {
        if pos.distance(self.last_pos) < self.threshold {
            self.timer += 1;
            if self.timer >= self.limit {
                self.timer = 0;
                return true;
            }
        } else {
            self.timer = 0;
            self.last_pos = pos;
        }
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    Magnet,
    Speed,
    Slowdown,
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Magnet,
        PowerUpKind::Speed,
        PowerUpKind::Slowdown,
        PowerUpKind::Shield,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Magnet => "magnet",
            PowerUpKind::Speed => "speed",
            PowerUpKind::Slowdown => "slowdown",
            PowerUpKind::Shield => "shield",
        }
    }

    /// Configured effect length in ticks
    pub fn duration(&self, config: &PowerUpConfig) -> u32 {
        match self {
            PowerUpKind::Magnet => config.magnet_duration,
            PowerUpKind::Speed => config.speed_duration,
            PowerUpKind::Slowdown => config.slowdown_duration,
            PowerUpKind::Shield => config.shield_duration,
        }
    }
}

/// A spawned, uncollected power-up box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub room: RoomId,
    /// Ticks until it expires
    pub lifetime: u32,
    /// Decorative spin (radians)
    pub rotation: f32,
    /// Decorative pulse phase (radians)
    pub pulse_phase: f32,
}

/// Remaining ticks of each timed effect on one player (0 = inactive)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEffects {
    pub magnet: u32,
    pub speed: u32,
    pub shield: u32,
    /// Received from an opponent's pickup
    pub slowdown: u32,
}

impl PlayerEffects {
    pub fn get(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::Magnet => self.magnet,
            PowerUpKind::Speed => self.speed,
            PowerUpKind::Slowdown => self.slowdown,
            PowerUpKind::Shield => self.shield,
        }
    }

    /// Overwrite (never add to) an effect timer
    pub fn set(&mut self, kind: PowerUpKind, ticks: u32) {
        match kind {
            PowerUpKind::Magnet => self.magnet = ticks,
            PowerUpKind::Speed => self.speed = ticks,
            PowerUpKind::Slowdown => self.slowdown = ticks,
            PowerUpKind::Shield => self.shield = ticks,
        }
    }

    /// Count every active timer down by one, saturating at zero
    pub fn decay(&mut self) {
        self.magnet = self.magnet.saturating_sub(1);
        self.speed = self.speed.saturating_sub(1);
        self.shield = self.shield.saturating_sub(1);
        self.slowdown = self.slowdown.saturating_sub(1);
    }

    pub fn active_count(&self) -> usize {
        [self.magnet, self.speed, self.shield, self.slowdown]
            .iter()
            .filter(|&&t| t > 0)
            .count()
    }

    pub fn any_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Movement speed multiplier from speed boost and slowdown
    pub fn speed_factor(&self, config: &PowerUpConfig) -> f32 {
        let boost = if self.speed > 0 { config.speed_multiplier } else { 1.0 };
        let slow = if self.slowdown > 0 { config.slowdown_multiplier } else { 1.0 };
        boost * slow
    }
}

/// What an AI player is currently trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Strategy {
    /// Chase the puck's current position
    #[default]
    Follow,
    /// Head for the predicted puck position
    Intercept,
    /// Line up behind the puck toward an opponent's zone tunnel
    PushToPortal,
    GetPowerUp,
    /// Stand between puck and own goal
    UrgentDefend,
    /// Line up to kick the puck away from own goal
    ClearPuck,
    ShootOnGoal,
    Attack,
    Goalkeeper,
    /// Push the puck out of own zone through its tunnel
    EscapeToPortal,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Follow => "follow",
            Strategy::Intercept => "intercept",
            Strategy::PushToPortal => "push_to_portal",
            Strategy::GetPowerUp => "get_powerup",
            Strategy::UrgentDefend => "urgent_defend",
            Strategy::ClearPuck => "clear_puck",
            Strategy::ShootOnGoal => "shoot_on_goal",
            Strategy::Attack => "attack",
            Strategy::Goalkeeper => "goalkeeper",
            Strategy::EscapeToPortal => "escape_to_portal",
        }
    }
}

/// Per-player AI memory
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AiState {
    /// Tick of the last strategy evaluation
    pub last_decision: u64,
    pub target: Option<Vec2>,
    pub strategy: Strategy,
    pub stuck_counter: u32,
    pub last_pos: Vec2,
    /// Id of the power-up being chased
    pub powerup_target: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerRole {
    Human,
    Ai,
}

/// Short-lived flash where the puck hit something
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BounceEffect {
    pub pos: Vec2,
    pub life: u32,
    pub max_life: u32,
    pub size: f32,
}

/// Notifications for display collaborators, drained once per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    /// The set of active characters changed (puck now in `room`)
    ActiveCharactersChanged { room: RoomId },
    RoomChanged { from: RoomId, to: RoomId },
    ScoreChanged { scores: [u32; PLAYER_COUNT] },
    PuckMoved { pos: Vec2 },
    PowerUpTimersChanged,
    GoalScored { conceded_by: PlayerId, room: RoomId },
    GoalBlocked { owner: PlayerId },
    PortalEntered { from: RoomId, to: RoomId },
    FaceOffStarted { room: RoomId },
    FaceOffEnded { room: RoomId },
    PowerUpSpawned { kind: PowerUpKind, room: RoomId },
    PowerUpCollected { player: PlayerId, kind: PowerUpKind },
    Kicked { player: PlayerId, strength: f32 },
    PuckStuck { room: RoomId },
    Paused(bool),
}

/// Complete simulation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub config: GameConfig,
    pub topology: Topology,
    pub setup: MatchSetup,
    pub rng: Pcg32,
    pub seed: u64,
    pub time_ticks: u64,
    pub paused: bool,

    pub puck: Puck,
    /// `characters[player][room]`
    pub characters: [[Character; ROOM_COUNT]; PLAYER_COUNT],
    pub scores: [u32; PLAYER_COUNT],
    pub roles: [PlayerRole; PLAYER_COUNT],
    pub kick_cooldowns: [u32; PLAYER_COUNT],
    pub effects: [PlayerEffects; PLAYER_COUNT],
    pub ai: [AiState; PLAYER_COUNT],

    pub portal: PortalState,
    pub face_off: FaceOff,
    /// Ticks until the post-goal face-off starts
    pub pending_faceoff: Option<u32>,
    pub puck_stuck: PuckStuck,

    pub powerups: Vec<PowerUp>,
    pub bounce_effects: Vec<BounceEffect>,
    /// Smoothed point the camera centers on
    pub camera: Vec2,

    #[serde(skip)]
    pub events: Vec<SimEvent>,
    next_id: u32,
}

impl GameState {
    /// Validate the configuration and set up a match starting with a center face-off
    pub fn new(seed: u64, config: GameConfig, setup: MatchSetup) -> Result<Self, ConfigError> {
        config.validate()?;
        setup.validate()?;
        let topology = Topology::standard(&config)?;
        let mut state = Self::fresh(config, topology, setup, Pcg32::seed_from_u64(seed), seed);
        faceoff::start_face_off(&mut state, RoomId::Center, None);
        log::info!(
            "New match: seed {seed}, {} human(s), {} AI",
            setup.humans,
            setup.difficulty.as_str()
        );
        Ok(state)
    }

    fn fresh(
        config: GameConfig,
        topology: Topology,
        setup: MatchSetup,
        rng: Pcg32,
        seed: u64,
    ) -> Self {
        let characters = PlayerId::ALL.map(|player| {
            RoomId::ALL.map(|room| {
                let center = topology.room(room).center;
                Character::new(player, room, center + spawn_offset(player, room))
            })
        });
        let roles = PlayerId::ALL.map(|p| {
            if p.number() <= setup.humans {
                PlayerRole::Human
            } else {
                PlayerRole::Ai
            }
        });
        let puck = Puck::new(Vec2::ZERO, RoomId::Center, config.trail_length);
        let puck_stuck = PuckStuck::new(
            Vec2::ZERO,
            config.puck_stuck_threshold,
            config.puck_stuck_ticks,
        );

        Self {
            topology,
            setup,
            rng,
            seed,
            time_ticks: 0,
            paused: false,
            puck,
            characters,
            scores: [0; PLAYER_COUNT],
            roles,
            kick_cooldowns: [0; PLAYER_COUNT],
            effects: [PlayerEffects::default(); PLAYER_COUNT],
            ai: [AiState::default(); PLAYER_COUNT],
            portal: PortalState::Idle,
            face_off: FaceOff::Inactive,
            pending_faceoff: None,
            puck_stuck,
            powerups: Vec::new(),
            bounce_effects: Vec::new(),
            camera: Vec2::ZERO,
            events: Vec::new(),
            next_id: 1,
            config,
        }
    }

    /// Start over with the same configuration and players; the RNG stream continues
    pub fn restart(&mut self) {
        let rng = self.rng.clone();
        let mut events = std::mem::take(&mut self.events);
        *self = Self::fresh(
            self.config.clone(),
            self.topology.clone(),
            self.setup,
            rng,
            self.seed,
        );
        events.push(SimEvent::ScoreChanged { scores: self.scores });
        self.events = events;
        faceoff::start_face_off(self, RoomId::Center, None);
        log::info!("Match restarted");
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn active_character(&self, player: PlayerId) -> &Character {
        &self.characters[player.index()][self.puck.room.index()]
    }

    #[inline]
    pub fn active_character_mut(&mut self, player: PlayerId) -> &mut Character {
        let room = self.puck.room.index();
        &mut self.characters[player.index()][room]
    }

    pub fn role(&self, player: PlayerId) -> PlayerRole {
        self.roles[player.index()]
    }

    /// Mark the characters in the puck's room active and all others inactive
    pub fn refresh_active_characters(&mut self) {
        let room = self.puck.room;
        for set in &mut self.characters {
            for c in set.iter_mut() {
                c.active = c.room == room;
            }
        }
        self.emit(SimEvent::ActiveCharactersChanged { room });
    }

    /// Move the puck into a new room and notify if it changed
    pub fn set_puck_room(&mut self, room: RoomId) {
        let from = self.puck.room;
        self.puck.room = room;
        if from != room {
            self.refresh_active_characters();
            self.emit(SimEvent::RoomChanged { from, to: room });
        }
    }

    pub fn spawn_bounce_effect(&mut self, pos: Vec2) {
        self.bounce_effects.push(BounceEffect {
            pos,
            life: self.config.bounce_effect_life,
            max_life: self.config.bounce_effect_life,
            size: self.config.bounce_effect_size,
        });
    }

    pub fn update_bounce_effects(&mut self) {
        for effect in &mut self.bounce_effects {
            effect.life = effect.life.saturating_sub(1);
        }
        self.bounce_effects.retain(|e| e.life > 0);
    }

    /// Ease the camera toward the puck
    pub fn update_camera(&mut self) {
        self.camera += (self.puck.pos - self.camera) * self.config.camera_smoothing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiDifficulty;

    fn new_state() -> GameState {
        GameState::new(7, GameConfig::default(), MatchSetup::default()).unwrap()
    }

    #[test]
    fn test_new_match_starts_in_center_faceoff() {
        let state = new_state();
        assert_eq!(state.puck.room, RoomId::Center);
        assert!(state.face_off.is_active());
        assert_eq!(state.roles, [PlayerRole::Human, PlayerRole::Ai, PlayerRole::Ai]);
        for p in PlayerId::ALL {
            assert!(state.active_character(p).active);
            assert_eq!(state.active_character(p).room, RoomId::Center);
        }
        let inactive = &state.characters[0][RoomId::FranticZone.index()];
        assert!(!inactive.active);
    }

    #[test]
    fn test_spawn_offsets_are_room_relative() {
        let state = new_state();
        let c = &state.characters[PlayerId::P3.index()][RoomId::Player2Zone.index()];
        assert_eq!(c.pos, Vec2::new(1400.0, 100.0));
        assert_eq!(c.z, CHARACTER_Z);
    }

    #[test]
    fn test_rejects_invalid_setup() {
        let setup = MatchSetup {
            humans: 5,
            difficulty: AiDifficulty::Easy,
        };
        assert!(GameState::new(1, GameConfig::default(), setup).is_err());
    }

    #[test]
    fn test_restart_clears_scores() {
        let mut state = new_state();
        state.scores = [3, 1, 2];
        state.time_ticks = 500;
        state.restart();
        assert_eq!(state.scores, [0, 0, 0]);
        assert_eq!(state.time_ticks, 0);
        assert!(state.face_off.is_active());
        assert!(state
            .drain_events()
            .contains(&SimEvent::ScoreChanged { scores: [0, 0, 0] }));
    }

    #[test]
    fn test_stuck_detector_fires_once_at_limit() {
        let mut stuck = PuckStuck::new(Vec2::ZERO, 5.0, 180);
        for tick in 1..180 {
            assert!(!stuck.observe(Vec2::new(0.01 * tick as f32, 0.0)));
        }
        assert!(stuck.observe(Vec2::new(1.0, 0.0)));
        assert_eq!(stuck.timer, 0);
        assert!(!stuck.observe(Vec2::new(1.0, 0.0)));
        assert_eq!(stuck.timer, 1);
    }

    #[test]
    fn test_stuck_detector_resets_on_motion() {
        let mut stuck = PuckStuck::new(Vec2::ZERO, 5.0, 180);
        for _ in 0..100 {
            stuck.observe(Vec2::ZERO);
        }
        assert!(!stuck.observe(Vec2::new(6.0, 0.0)));
        assert_eq!(stuck.timer, 0);
        assert_eq!(stuck.last_pos, Vec2::new(6.0, 0.0));
    }

    #[test]
    fn test_effects_overwrite_and_decay() {
        let mut fx = PlayerEffects::default();
        fx.set(PowerUpKind::Speed, 300);
        fx.decay();
        fx.set(PowerUpKind::Speed, 300);
        assert_eq!(fx.speed, 300);
        fx.speed = 1;
        fx.decay();
        fx.decay();
        assert_eq!(fx.speed, 0);
        assert!(!fx.any_active());
    }

    #[test]
    fn test_speed_factor_combines() {
        let cfg = PowerUpConfig::default();
        let fx = PlayerEffects {
            speed: 10,
            slowdown: 10,
            ..Default::default()
        };
        assert!((fx.speed_factor(&cfg) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_bounce_effects_expire() {
        let mut state = new_state();
        state.spawn_bounce_effect(Vec2::ONE);
        for _ in 0..14 {
            state.update_bounce_effects();
        }
        assert_eq!(state.bounce_effects.len(), 1);
        state.update_bounce_effects();
        assert!(state.bounce_effects.is_empty());
    }
}
