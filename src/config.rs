//! Game balance and match setup
//!
//! One static `GameConfig` is loaded at startup and never changes mid-game.
//! Every value is per tick (60 Hz) in world units unless noted.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::ticks_from_millis;

/// Env var naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "PORTAL_PUCK_CONFIG";
/// Fallback config location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/portal_puck.json";

/// AI difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl AiDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiDifficulty::Easy => "easy",
            AiDifficulty::Medium => "medium",
            AiDifficulty::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" | "dum" => Some(AiDifficulty::Easy),
            "medium" | "med" | "meh" => Some(AiDifficulty::Medium),
            "hard" | "genial" => Some(AiDifficulty::Hard),
            _ => None,
        }
    }
}

/// Per-difficulty AI tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiTuning {
    /// Ticks between strategy re-evaluations
    pub reaction_ticks: u32,
    /// How many ticks ahead `intercept` simulates the puck
    pub prediction_frames: u32,
    /// Aim quality in [0, 1]; shot and attack aims scatter by (1 - accuracy) * 120
    pub accuracy: f32,
    /// Probability in [0, 1] of running the decision tree instead of following
    pub strategy: f32,
}

impl AiTuning {
    pub const EASY: Self = Self {
        reaction_ticks: 30,
        prediction_frames: 5,
        accuracy: 0.6,
        strategy: 0.3,
    };
    pub const MEDIUM: Self = Self {
        reaction_ticks: 15,
        prediction_frames: 15,
        accuracy: 0.8,
        strategy: 0.7,
    };
    pub const HARD: Self = Self {
        reaction_ticks: 5,
        prediction_frames: 30,
        accuracy: 0.95,
        strategy: 0.95,
    };
}

/// Partial `AiTuning` from a config file, laid over one difficulty's defaults
#[derive(Debug, Deserialize)]
struct TuningOverride {
    reaction_ticks: Option<u32>,
    prediction_frames: Option<u32>,
    accuracy: Option<f32>,
    strategy: Option<f32>,
}

impl TuningOverride {
    fn over(self, base: AiTuning) -> AiTuning {
        AiTuning {
            reaction_ticks: self.reaction_ticks.unwrap_or(base.reaction_ticks),
            prediction_frames: self.prediction_frames.unwrap_or(base.prediction_frames),
            accuracy: self.accuracy.unwrap_or(base.accuracy),
            strategy: self.strategy.unwrap_or(base.strategy),
        }
    }
}

fn easy_tuning<'de, D: Deserializer<'de>>(d: D) -> Result<AiTuning, D::Error> {
    TuningOverride::deserialize(d).map(|o| o.over(AiTuning::EASY))
}

fn medium_tuning<'de, D: Deserializer<'de>>(d: D) -> Result<AiTuning, D::Error> {
    TuningOverride::deserialize(d).map(|o| o.over(AiTuning::MEDIUM))
}

fn hard_tuning<'de, D: Deserializer<'de>>(d: D) -> Result<AiTuning, D::Error> {
    TuningOverride::deserialize(d).map(|o| o.over(AiTuning::HARD))
}

/// AI tuning for every difficulty plus the shared controller constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    #[serde(deserialize_with = "easy_tuning")]
    pub easy: AiTuning,
    #[serde(deserialize_with = "medium_tuning")]
    pub medium: AiTuning,
    #[serde(deserialize_with = "hard_tuning")]
    pub hard: AiTuning,
    /// Ticks of sub-unit displacement before the escape impulse kicks in
    pub stuck_threshold: u32,
    /// Stuck counter value at which it resets after an escape attempt
    pub stuck_reset: u32,
    /// Magnitude of the random escape impulse
    pub anti_stuck_force: f32,
    /// Distance at which the AI considers itself arrived at its target
    pub arrival_radius: f32,
    /// Lower bound on the per-tick kick probability, regardless of difficulty
    pub min_kick_aggressiveness: f32,
    /// Opponents farther than this from the puck leave a defender "alone" in its zone
    pub escape_clearance: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            easy: AiTuning::EASY,
            medium: AiTuning::MEDIUM,
            hard: AiTuning::HARD,
            stuck_threshold: 30,
            stuck_reset: 60,
            anti_stuck_force: 2.0,
            arrival_radius: 10.0,
            min_kick_aggressiveness: 0.7,
            escape_clearance: 250.0,
        }
    }
}

impl AiConfig {
    pub fn tuning(&self, difficulty: AiDifficulty) -> &AiTuning {
        match difficulty {
            AiDifficulty::Easy => &self.easy,
            AiDifficulty::Medium => &self.medium,
            AiDifficulty::Hard => &self.hard,
        }
    }
}

/// Power-up spawning and effect tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUpConfig {
    /// Spawn probability per tick
    pub spawn_chance: f32,
    /// Maximum simultaneously spawned power-ups
    pub max_spawned: usize,
    /// Pickup radius of a power-up box
    pub size: f32,
    /// Ticks before an uncollected power-up disappears
    pub lifetime: u32,
    /// Spawn positions keep this far (total, both sides) from the walls
    pub spawn_margin: f32,
    pub magnet_duration: u32,
    pub speed_duration: u32,
    pub slowdown_duration: u32,
    pub shield_duration: u32,
    /// Movement multiplier while a speed boost is active
    pub speed_multiplier: f32,
    /// Movement multiplier while slowed
    pub slowdown_multiplier: f32,
    /// Magnet reach from the character
    pub magnet_radius: f32,
    /// Attraction applied per tick toward the character
    pub magnet_pull: f32,
    /// Fraction of the character's velocity blended into the puck
    pub magnet_follow: f32,
    /// Extra puck velocity damping while magnetised
    pub magnet_damping: f32,
    /// Contact impulse multiplier while magnetised
    pub magnet_contact_softening: f32,
}

impl Default for PowerUpConfig {
    fn default() -> Self {
        Self {
            spawn_chance: 0.0008,
            max_spawned: 3,
            size: 20.0,
            lifetime: 600,
            spawn_margin: 100.0,
            magnet_duration: 300,
            speed_duration: 300,
            slowdown_duration: 300,
            shield_duration: 300,
            speed_multiplier: 1.5,
            slowdown_multiplier: 0.5,
            magnet_radius: 120.0,
            magnet_pull: 0.35,
            magnet_follow: 0.3,
            magnet_damping: 0.85,
            magnet_contact_softening: 0.05,
        }
    }
}

/// Static game configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === Rooms ===
    /// Width and height of every room
    pub room_size: f32,
    /// Room center spacing as a multiple of `room_size`
    pub room_spacing: f32,
    pub corner_radius: f32,
    /// Width and height of every tunnel mouth
    pub tunnel_width: f32,
    /// Width of a goal mouth
    pub goal_size: f32,
    /// How far in front of the goal line the capture region reaches
    pub goal_depth: f32,

    // === Bodies ===
    pub puck_radius: f32,
    pub character_radius: f32,

    // === Puck physics ===
    pub max_puck_speed: f32,
    /// Planar velocity multiplier per tick (< 1)
    pub friction: f32,
    /// Velocity multiplier on wall and corner rebounds
    pub wall_bounce: f32,
    /// Velocity multiplier of the post-step containment pass
    pub containment_bounce: f32,
    /// Wall proximity that triggers a nudge
    pub nudge_epsilon: f32,
    /// Distance the nudge pushes the puck off the wall
    pub nudge_distance: f32,
    pub puck_gravity: f32,
    /// Vertical velocity multiplier on ground contact
    pub ground_bounce: f32,
    /// Vertical speeds below this snap to zero after a ground bounce
    pub min_bounce_speed: f32,
    /// Soft repulsion between a character and the puck on contact
    pub contact_force: f32,
    pub trail_length: usize,
    /// Lifetime of a bounce flash in ticks
    pub bounce_effect_life: u32,
    pub bounce_effect_size: f32,

    // === Characters ===
    pub player_speed: f32,
    /// Momentum blend toward the desired velocity per tick (humans and AI alike)
    pub player_acceleration: f32,
    /// Momentum multiplier per tick with no input
    pub player_friction: f32,
    /// Visual velocity as a fraction of momentum
    pub visual_velocity_factor: f32,

    // === Kicking ===
    pub kick_range: f32,
    pub kick_force: f32,
    /// Puck closer than this has no defined kick direction
    pub kick_min_distance: f32,
    /// Fraction of the planar kick force turned into vertical velocity
    pub kick_lift: f32,
    pub kick_cooldown: u32,
    pub kick_glow: u32,

    // === Portals ===
    pub portal_transition_ticks: u32,
    pub portal_cooldown: u32,
    pub portal_push_distance: f32,

    // === Face-off ===
    pub faceoff_ticks: u32,
    pub faceoff_radius: f32,
    /// Players are re-placed every this many ticks during a face-off
    pub faceoff_reassert_period: u32,
    /// Delay between a goal and the face-off that follows it
    pub goal_faceoff_delay: u32,

    // === Stuck puck ===
    pub puck_stuck_threshold: f32,
    pub puck_stuck_ticks: u32,

    // === Camera ===
    pub camera_smoothing: f32,

    pub powerups: PowerUpConfig,
    pub ai: AiConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            room_size: 1000.0,
            room_spacing: 1.5,
            corner_radius: 50.0,
            tunnel_width: 60.0,
            goal_size: 100.0,
            goal_depth: 15.0,

            puck_radius: 10.0,
            character_radius: 25.0,

            max_puck_speed: 10.0,
            friction: 0.98,
            wall_bounce: 0.77,
            containment_bounce: 0.7,
            nudge_epsilon: 2.0,
            nudge_distance: 1.0,
            puck_gravity: 0.5,
            ground_bounce: 0.3,
            min_bounce_speed: 1.0,
            contact_force: 0.3,
            trail_length: 8,
            bounce_effect_life: 15,
            bounce_effect_size: 20.0,

            player_speed: 5.5,
            player_acceleration: 0.3,
            player_friction: 0.85,
            visual_velocity_factor: 0.8,

            kick_range: 50.0,
            kick_force: 8.5,
            kick_min_distance: 5.0,
            kick_lift: 0.15,
            kick_cooldown: 15,
            kick_glow: 10,

            portal_transition_ticks: ticks_from_millis(400),
            portal_cooldown: 60,
            portal_push_distance: 80.0,

            faceoff_ticks: 180,
            faceoff_radius: 150.0,
            faceoff_reassert_period: 20,
            goal_faceoff_delay: ticks_from_millis(1000),

            puck_stuck_threshold: 5.0,
            puck_stuck_ticks: 180,

            camera_smoothing: 0.08,

            powerups: PowerUpConfig::default(),
            ai: AiConfig::default(),
        }
    }
}

impl GameConfig {
    /// Load config from environment or JSON file, falling back to defaults.
    ///
    /// Unreadable or invalid files are logged and skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            match Self::from_path(&path) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring {CONFIG_ENV_VAR}={path}: {e}"),
            }
        }
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            match Self::from_path(DEFAULT_CONFIG_PATH) {
                Ok(config) => return config,
                Err(e) => log::warn!("Ignoring {DEFAULT_CONFIG_PATH}: {e}"),
            }
        }
        log::info!("Using default game config");
        Self::default()
    }

    /// Read and validate a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_json(&json)
    }

    /// Parse and validate a JSON config document (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, v: f32) -> Result<(), ConfigError> {
            if v > 0.0 && v.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be positive, got {v}"),
                })
            }
        }
        fn unit(field: &'static str, v: f32) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be within [0, 1], got {v}"),
                })
            }
        }

        positive("room_size", self.room_size)?;
        positive("puck_radius", self.puck_radius)?;
        positive("character_radius", self.character_radius)?;
        positive("tunnel_width", self.tunnel_width)?;
        positive("max_puck_speed", self.max_puck_speed)?;
        positive("player_speed", self.player_speed)?;
        positive("kick_range", self.kick_range)?;
        if self.room_spacing < 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "room_spacing",
                reason: format!("rooms would overlap at spacing {}", self.room_spacing),
            });
        }
        if !(self.friction > 0.0 && self.friction <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "friction",
                reason: format!("must be within (0, 1], got {}", self.friction),
            });
        }
        unit("wall_bounce", self.wall_bounce)?;
        unit("player_acceleration", self.player_acceleration)?;
        unit("player_friction", self.player_friction)?;
        unit("powerups.spawn_chance", self.powerups.spawn_chance)?;
        unit("ai.min_kick_aggressiveness", self.ai.min_kick_aggressiveness)?;
        if self.trail_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "trail_length",
                reason: "must hold at least one point".to_string(),
            });
        }
        for (field, ticks) in [
            ("portal_transition_ticks", self.portal_transition_ticks),
            ("faceoff_reassert_period", self.faceoff_reassert_period),
            ("puck_stuck_ticks", self.puck_stuck_ticks),
        ] {
            if ticks == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "tick durations must be non-zero".to_string(),
                });
            }
        }
        for (name, tuning) in [
            ("ai.easy", &self.ai.easy),
            ("ai.medium", &self.ai.medium),
            ("ai.hard", &self.ai.hard),
        ] {
            if tuning.reaction_ticks == 0 {
                return Err(ConfigError::InvalidValue {
                    field: name,
                    reason: "reaction_ticks must be at least 1".to_string(),
                });
            }
            unit(name, tuning.accuracy)?;
            unit(name, tuning.strategy)?;
        }
        Ok(())
    }
}

/// Who controls each player seat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSetup {
    /// Players 1..=humans are human, the rest AI
    pub humans: u8,
    pub difficulty: AiDifficulty,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            humans: 1,
            difficulty: AiDifficulty::Medium,
        }
    }
}

impl MatchSetup {
    /// All three seats AI-controlled
    pub fn all_ai(difficulty: AiDifficulty) -> Self {
        Self {
            humans: 0,
            difficulty,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.humans as usize > crate::consts::PLAYER_COUNT {
            return Err(ConfigError::InvalidValue {
                field: "humans",
                reason: format!("at most 3 human players, got {}", self.humans),
            });
        }
        Ok(())
    }
}
