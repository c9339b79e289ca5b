//! Configuration errors
//!
//! The simulation itself has no failure surface; everything that can go wrong
//! is caught while loading and validating the static configuration.

use crate::sim::RoomId;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A connection from `from` to `to` has no matching connection back from `to`
    MissingReciprocal { from: RoomId, to: RoomId },
    /// A room lists a connection to itself
    SelfConnection(RoomId),
    /// A room's width, height, corner radius or tunnel size makes no sense
    InvalidGeometry { room: RoomId, reason: String },
    /// A tuning value is out of range
    InvalidValue { field: &'static str, reason: String },
    /// The config file could not be read
    Io(String),
    /// The config file is not valid JSON for `GameConfig`
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingReciprocal { from, to } => write!(
                f,
                "room {to} has no connection back to {from} (required to resolve portal exits)"
            ),
            Self::SelfConnection(room) => write!(f, "room {room} connects to itself"),
            Self::InvalidGeometry { room, reason } => {
                write!(f, "invalid geometry in room {room}: {reason}")
            }
            Self::InvalidValue { field, reason } => write!(f, "invalid {field}: {reason}"),
            Self::Io(e) => write!(f, "config read error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}
