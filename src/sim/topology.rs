//! Static room layout
//!
//! Five rounded-rectangle rooms joined by tunnels. Built once from the config
//! and validated before the first tick; never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::ConfigError;

/// One of the five rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomId {
    Center,
    Player1Zone,
    Player2Zone,
    Player3Zone,
    FranticZone,
}

impl RoomId {
    pub const ALL: [RoomId; 5] = [
        RoomId::Center,
        RoomId::Player1Zone,
        RoomId::Player2Zone,
        RoomId::Player3Zone,
        RoomId::FranticZone,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            RoomId::Center => "center",
            RoomId::Player1Zone => "player1_zone",
            RoomId::Player2Zone => "player2_zone",
            RoomId::Player3Zone => "player3_zone",
            RoomId::FranticZone => "frantic_zone",
        }
    }

    /// The player whose goal this defensive zone guards
    pub fn zone_owner(self) -> Option<PlayerId> {
        match self {
            RoomId::Player1Zone => Some(PlayerId::P1),
            RoomId::Player2Zone => Some(PlayerId::P2),
            RoomId::Player3Zone => Some(PlayerId::P3),
            RoomId::Center | RoomId::FranticZone => None,
        }
    }

    pub fn defensive_zone_of(player: PlayerId) -> RoomId {
        match player {
            PlayerId::P1 => RoomId::Player1Zone,
            PlayerId::P2 => RoomId::Player2Zone,
            PlayerId::P3 => RoomId::Player3Zone,
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the three players
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    P1,
    P2,
    P3,
}

impl PlayerId {
    pub const ALL: [PlayerId; 3] = [PlayerId::P1, PlayerId::P2, PlayerId::P3];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// 1-based player number
    #[inline]
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn others(self) -> impl Iterator<Item = PlayerId> {
        PlayerId::ALL.into_iter().filter(move |&p| p != self)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.number())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    /// Hub with a tunnel to every other room
    Center,
    /// One player's goal and a single tunnel back to the hub
    Defensive,
    /// Every player's goal in one room
    Frantic,
}

/// A room wall (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wall {
    Top,
    Right,
    Bottom,
    Left,
}

impl Wall {
    /// Wall a room-local offset sits on, by dominant axis
    pub fn of_offset(offset: Vec2) -> Wall {
        if offset.x.abs() > offset.y.abs() {
            if offset.x > 0.0 { Wall::Right } else { Wall::Left }
        } else if offset.y > 0.0 {
            Wall::Bottom
        } else {
            Wall::Top
        }
    }

    /// Unit vector pointing from this wall into the room
    pub fn inward(self) -> Vec2 {
        match self {
            Wall::Top => Vec2::Y,
            Wall::Right => Vec2::NEG_X,
            Wall::Bottom => Vec2::NEG_Y,
            Wall::Left => Vec2::X,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    /// Goal line center, relative to the room center
    pub offset: Vec2,
    /// Wall the goal mouth opens in
    pub facing: Wall,
    /// Player who concedes when the puck enters
    pub owner: PlayerId,
}

/// Opening in a room wall leading to one neighbouring room
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tunnel {
    /// Tunnel center, relative to the room center
    pub offset: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Tunnel {
    pub fn wall(&self) -> Wall {
        Wall::of_offset(self.offset)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub kind: RoomKind,
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub goals: Vec<Goal>,
    /// Neighbour → tunnel, iterated in room order
    pub connections: BTreeMap<RoomId, Tunnel>,
}

impl Room {
    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Bounds a body of `radius` may occupy: (min, max) corners
    pub fn inner_bounds(&self, radius: f32) -> (Vec2, Vec2) {
        let half = self.half_extents() - Vec2::splat(radius);
        (self.center - half, self.center + half)
    }

    /// Point lies within the room rectangle (edges inclusive)
    pub fn contains_point(&self, p: Vec2) -> bool {
        let d = (p - self.center).abs();
        let half = self.half_extents();
        d.x <= half.x && d.y <= half.y
    }

    /// World-space center of a tunnel mouth
    #[inline]
    pub fn tunnel_center(&self, tunnel: &Tunnel) -> Vec2 {
        self.center + tunnel.offset
    }

    /// World-space goal line center
    #[inline]
    pub fn goal_center(&self, goal: &Goal) -> Vec2 {
        self.center + goal.offset
    }

    /// The connection whose tunnel box contains `p`
    pub fn tunnel_at(&self, p: Vec2) -> Option<(RoomId, &Tunnel)> {
        self.connections
            .iter()
            .find(|(_, t)| in_tunnel_box(self.tunnel_center(t), t, p))
            .map(|(&id, t)| (id, t))
    }

    /// A tunnel on `wall` spans the given coordinate along that wall
    pub fn tunnel_spans(&self, wall: Wall, coord: f32) -> bool {
        self.connections.values().any(|t| {
            if t.wall() != wall {
                return false;
            }
            let c = self.tunnel_center(t);
            match wall {
                Wall::Left | Wall::Right => (coord - c.y).abs() <= t.height / 2.0,
                Wall::Top | Wall::Bottom => (coord - c.x).abs() <= t.width / 2.0,
            }
        })
    }

    pub fn goal_owned_by(&self, player: PlayerId) -> Option<&Goal> {
        self.goals.iter().find(|g| g.owner == player)
    }
}

#[inline]
fn in_tunnel_box(center: Vec2, tunnel: &Tunnel, p: Vec2) -> bool {
    (p.x - center.x).abs() <= tunnel.width / 2.0 && (p.y - center.y).abs() <= tunnel.height / 2.0
}

/// All five rooms, indexed by `RoomId::index`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    rooms: [Room; 5],
}

impl Topology {
    /// Standard layout: hub in the middle, zones above/right/left, frantic below
    pub fn standard(config: &GameConfig) -> Result<Self, ConfigError> {
        let size = config.room_size;
        let half = size / 2.0;
        let spacing = size * config.room_spacing;
        let tw = config.tunnel_width;
        // Goals sit just inside the defensive zone walls
        let inset = 2.0;

        let tunnel = |x: f32, y: f32| Tunnel {
            offset: Vec2::new(x, y),
            width: tw,
            height: tw,
        };
        let room = |id, kind, center: Vec2, goals, connections: Vec<(RoomId, Tunnel)>| Room {
            id,
            kind,
            center,
            width: size,
            height: size,
            corner_radius: config.corner_radius,
            goals,
            connections: connections.into_iter().collect(),
        };
        let goal = |x: f32, y: f32, facing, owner| Goal {
            offset: Vec2::new(x, y),
            facing,
            owner,
        };

        let rooms = [
            room(
                RoomId::Center,
                RoomKind::Center,
                Vec2::ZERO,
                Vec::new(),
                vec![
                    (RoomId::Player1Zone, tunnel(0.0, -half)),
                    (RoomId::Player2Zone, tunnel(half, 0.0)),
                    (RoomId::Player3Zone, tunnel(-half, 0.0)),
                    (RoomId::FranticZone, tunnel(0.0, half)),
                ],
            ),
            room(
                RoomId::Player1Zone,
                RoomKind::Defensive,
                Vec2::new(0.0, -spacing),
                vec![goal(0.0, -half + inset, Wall::Top, PlayerId::P1)],
                vec![(RoomId::Center, tunnel(0.0, half))],
            ),
            room(
                RoomId::Player2Zone,
                RoomKind::Defensive,
                Vec2::new(spacing, 0.0),
                vec![goal(half - inset, 0.0, Wall::Right, PlayerId::P2)],
                vec![(RoomId::Center, tunnel(-half, 0.0))],
            ),
            room(
                RoomId::Player3Zone,
                RoomKind::Defensive,
                Vec2::new(-spacing, 0.0),
                vec![goal(-half + inset, 0.0, Wall::Left, PlayerId::P3)],
                vec![(RoomId::Center, tunnel(half, 0.0))],
            ),
            room(
                RoomId::FranticZone,
                RoomKind::Frantic,
                Vec2::new(0.0, spacing),
                vec![
                    goal(-half, 0.0, Wall::Left, PlayerId::P1),
                    goal(half, 0.0, Wall::Right, PlayerId::P2),
                    goal(0.0, half - inset, Wall::Bottom, PlayerId::P3),
                ],
                vec![(RoomId::Center, tunnel(0.0, -half))],
            ),
        ];
        Self::from_rooms(rooms)
    }

    /// Build from explicit rooms; `rooms[i].id` must equal `RoomId::ALL[i]`
    pub fn from_rooms(rooms: [Room; 5]) -> Result<Self, ConfigError> {
        let topology = Self { rooms };
        topology.validate()?;
        Ok(topology)
    }

    /// Check geometry and that every connection has a reverse connection
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (expected, room) in RoomId::ALL.iter().zip(&self.rooms) {
            if room.id != *expected {
                return Err(ConfigError::InvalidGeometry {
                    room: room.id,
                    reason: format!("stored in the slot of {expected}"),
                });
            }
            if !(room.width > 0.0 && room.height > 0.0) {
                return Err(ConfigError::InvalidGeometry {
                    room: room.id,
                    reason: format!("non-positive size {}x{}", room.width, room.height),
                });
            }
            if room.corner_radius < 0.0 || room.corner_radius * 2.0 > room.width.min(room.height)
            {
                return Err(ConfigError::InvalidGeometry {
                    room: room.id,
                    reason: format!("corner radius {} does not fit", room.corner_radius),
                });
            }
            for (&target, tunnel) in &room.connections {
                if target == room.id {
                    return Err(ConfigError::SelfConnection(room.id));
                }
                if !(tunnel.width > 0.0 && tunnel.height > 0.0) {
                    return Err(ConfigError::InvalidGeometry {
                        room: room.id,
                        reason: format!("tunnel to {target} has non-positive size"),
                    });
                }
                if !self.room(target).connections.contains_key(&room.id) {
                    return Err(ConfigError::MissingReciprocal {
                        from: room.id,
                        to: target,
                    });
                }
            }
        }
        Ok(())
    }

    #[inline]
    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id.index()]
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter()
    }

    /// First room (in room order) containing `p`
    pub fn room_at(&self, p: Vec2) -> Option<RoomId> {
        self.rooms.iter().find(|r| r.contains_point(p)).map(|r| r.id)
    }

    /// `p` lies inside any tunnel box of any room
    pub fn in_any_tunnel(&self, p: Vec2) -> bool {
        self.rooms.iter().any(|r| r.tunnel_at(p).is_some())
    }

    /// The tunnel in `to` leading back to `from`
    pub fn reciprocal(&self, from: RoomId, to: RoomId) -> Option<&Tunnel> {
        self.room(to).connections.get(&from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Topology {
        Topology::standard(&GameConfig::default()).unwrap()
    }

    #[test]
    fn test_standard_layout_validates() {
        let topo = standard();
        assert_eq!(topo.room(RoomId::Center).connections.len(), 4);
        for id in [RoomId::Player1Zone, RoomId::Player2Zone, RoomId::Player3Zone] {
            let room = topo.room(id);
            assert_eq!(room.connections.len(), 1);
            assert_eq!(room.goals.len(), 1);
            assert_eq!(room.goals[0].owner, id.zone_owner().unwrap());
        }
        assert_eq!(topo.room(RoomId::FranticZone).goals.len(), 3);
    }

    #[test]
    fn test_missing_reciprocal_is_rejected() {
        let topo = standard();
        let mut rooms = topo.rooms.clone();
        rooms[RoomId::Player2Zone.index()].connections.clear();
        let err = Topology::from_rooms(rooms).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingReciprocal {
                from: RoomId::Center,
                to: RoomId::Player2Zone
            }
        );
    }

    #[test]
    fn test_self_connection_is_rejected() {
        let mut rooms = standard().rooms.clone();
        let t = Tunnel {
            offset: Vec2::new(0.0, 500.0),
            width: 60.0,
            height: 60.0,
        };
        rooms[RoomId::FranticZone.index()]
            .connections
            .insert(RoomId::FranticZone, t);
        assert_eq!(
            Topology::from_rooms(rooms).unwrap_err(),
            ConfigError::SelfConnection(RoomId::FranticZone)
        );
    }

    #[test]
    fn test_oversized_corner_is_rejected() {
        let mut rooms = standard().rooms.clone();
        rooms[0].corner_radius = 600.0;
        assert!(matches!(
            Topology::from_rooms(rooms),
            Err(ConfigError::InvalidGeometry { room: RoomId::Center, .. })
        ));
    }

    #[test]
    fn test_tunnel_lookup() {
        let topo = standard();
        let center = topo.room(RoomId::Center);
        let (to, tunnel) = center.tunnel_at(Vec2::new(10.0, -480.0)).unwrap();
        assert_eq!(to, RoomId::Player1Zone);
        assert_eq!(tunnel.wall(), Wall::Top);
        assert!(center.tunnel_at(Vec2::new(100.0, -480.0)).is_none());
        assert!(topo.in_any_tunnel(Vec2::new(1000.0, 0.0)));
        assert!(center.tunnel_spans(Wall::Right, 20.0));
        assert!(!center.tunnel_spans(Wall::Right, 40.0));
        // The top tunnel does not open the bottom wall
        assert!(!topo.room(RoomId::Player1Zone).tunnel_spans(Wall::Top, 0.0));
    }

    #[test]
    fn test_room_at_gap_is_none() {
        let topo = standard();
        assert_eq!(topo.room_at(Vec2::ZERO), Some(RoomId::Center));
        assert_eq!(topo.room_at(Vec2::new(0.0, -1500.0)), Some(RoomId::Player1Zone));
        assert_eq!(topo.room_at(Vec2::new(0.0, 750.0)), None);
    }

    #[test]
    fn test_wall_of_offset() {
        assert_eq!(Wall::of_offset(Vec2::new(0.0, -500.0)), Wall::Top);
        assert_eq!(Wall::of_offset(Vec2::new(-500.0, 0.0)), Wall::Left);
        assert_eq!(Wall::Top.inward(), Vec2::Y);
    }
}
