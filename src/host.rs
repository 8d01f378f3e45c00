use crate::grid::Grid;
use bitflags::*;
use ::serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn opposite(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Team::Red => 0,
            Team::Blue => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Castle,
    Church,
    Pilgrim,
    Crusader,
    Prophet,
    Preacher,
}

impl UnitType {
    pub const ALL: [UnitType; 6] = [
        UnitType::Castle,
        UnitType::Church,
        UnitType::Pilgrim,
        UnitType::Crusader,
        UnitType::Prophet,
        UnitType::Preacher,
    ];

    pub fn index(self) -> u8 {
        match self {
            UnitType::Castle => 0,
            UnitType::Church => 1,
            UnitType::Pilgrim => 2,
            UnitType::Crusader => 3,
            UnitType::Prophet => 4,
            UnitType::Preacher => 5,
        }
    }

    pub fn from_index(index: u8) -> Option<UnitType> {
        UnitType::ALL.get(index as usize).copied()
    }

    /// Castles and churches never move once placed.
    pub fn is_structure(self) -> bool {
        matches!(self, UnitType::Castle | UnitType::Church)
    }

    pub fn is_military(self) -> bool {
        matches!(self, UnitType::Crusader | UnitType::Prophet | UnitType::Preacher)
    }

    pub fn can_attack(self) -> bool {
        matches!(self, UnitType::Castle) || self.is_military()
    }
}

impl Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

bitflags! {
    /// Military archetypes addressed by a charge order.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct UnitMask: u8 {
        const CRUSADER = 1 << 2;
        const PROPHET = 1 << 1;
        const PREACHER = 1;

        const MILITARY = Self::CRUSADER.bits() | Self::PROPHET.bits() | Self::PREACHER.bits();
    }
}

impl UnitMask {
    pub fn for_unit(unit: UnitType) -> UnitMask {
        match unit {
            UnitType::Crusader => UnitMask::CRUSADER,
            UnitType::Prophet => UnitMask::PROPHET,
            UnitType::Preacher => UnitMask::PREACHER,
            _ => UnitMask::empty(),
        }
    }

    pub fn includes(self, unit: UnitType) -> bool {
        let mask = UnitMask::for_unit(unit);

        !mask.is_empty() && self.contains(mask)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Position {
        Position { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }

    pub fn delta_to(self, other: Position) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    pub fn distance_sq(self, other: Position) -> u32 {
        let (dx, dy) = self.delta_to(other);

        (dx * dx + dy * dy) as u32
    }

    pub fn chebyshev(self, other: Position) -> u32 {
        let (dx, dy) = self.delta_to(other);

        dx.unsigned_abs().max(dy.unsigned_abs())
    }

    pub fn manhattan(self, other: Position) -> u32 {
        let (dx, dy) = self.delta_to(other);

        dx.unsigned_abs() + dy.unsigned_abs()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Eight compass directions, indexed clockwise from north.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn index(self) -> u8 {
        Direction::ALL.iter().position(|d| *d == self).unwrap_or(0) as u8
    }

    pub fn from_index(index: u8) -> Option<Direction> {
        Direction::ALL.get(index as usize).copied()
    }

    /// Grid delta, with y growing southwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::NorthEast => (1, -1),
            Direction::East => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::South => (0, 1),
            Direction::SouthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::NorthWest => (-1, -1),
        }
    }

    /// Closest compass direction for an arbitrary delta.
    pub fn approximate(dx: i32, dy: i32) -> Option<Direction> {
        if dx == 0 && dy == 0 {
            return None;
        }

        let angle = (dy as f64).atan2(dx as f64);
        // East is 0 radians; rotate so that North maps to octant 0.
        let octant = ((angle + std::f64::consts::FRAC_PI_2) / std::f64::consts::FRAC_PI_4).round() as i32;

        Direction::from_index(octant.rem_euclid(8) as u8)
    }
}

/// Static per-type capabilities as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStats {
    pub max_health: u32,
    pub vision_radius_sq: u32,
    pub move_radius_sq: u32,
    pub fuel_per_move: u32,
    pub attack_damage: u32,
    pub attack_radius_sq: Option<(u32, u32)>,
    pub attack_fuel_cost: u32,
    pub construction_karbonite: u32,
    pub construction_fuel: u32,
    pub karbonite_capacity: u32,
    pub fuel_capacity: u32,
}

impl UnitStats {
    pub fn in_attack_range(&self, distance_sq: u32) -> bool {
        self.attack_radius_sq
            .map(|(min, max)| distance_sq >= min && distance_sq <= max)
            .unwrap_or(false)
    }

    pub fn move_fuel(&self, distance_sq: u32) -> u32 {
        self.fuel_per_move * distance_sq
    }
}

/// A robot as reported by the host this turn. Robots only heard over the
/// radio carry no position and possibly no unit type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotInfo {
    pub id: u32,
    pub team: Option<Team>,
    pub unit: Option<UnitType>,
    pub position: Option<Position>,
    pub health: Option<u32>,
    pub signal: Option<u16>,
    pub signal_radius_sq: Option<u32>,
    pub castle_talk: Option<u8>,
}

impl RobotInfo {
    /// Direct vision: position, team and type are all reported.
    pub fn is_visible(&self) -> bool {
        self.position.is_some() && self.team.is_some() && self.unit.is_some()
    }

    pub fn is_radioing(&self) -> bool {
        self.signal.is_some() && self.signal_radius_sq.is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfState {
    pub id: u32,
    pub team: Team,
    pub unit: UnitType,
    pub position: Position,
    pub health: u32,
    pub karbonite: u32,
    pub fuel: u32,
    pub turn: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResources {
    pub karbonite: u32,
    pub fuel: u32,
}

impl TeamResources {
    pub fn can_afford(&self, stats: &UnitStats) -> bool {
        self.karbonite >= stats.construction_karbonite && self.fuel >= stats.construction_fuel
    }
}

/// The single action a unit hands back to the host each turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move { dx: i32, dy: i32 },
    Attack { dx: i32, dy: i32 },
    Mine,
    Give { dx: i32, dy: i32, karbonite: u32, fuel: u32 },
    Build { unit: UnitType, dx: i32, dy: i32 },
    ProposeTrade { karbonite: i32, fuel: i32 },
}

/// Capabilities consumed from the hosting simulation.
pub trait Host {
    fn me(&self) -> SelfState;

    fn team_resources(&self) -> TeamResources;

    fn time_remaining_ms(&self) -> u32;

    fn passable_map(&self) -> &Grid<bool>;

    fn karbonite_map(&self) -> &Grid<bool>;

    fn fuel_map(&self) -> &Grid<bool>;

    fn visible_robots(&self) -> &[RobotInfo];

    /// -1 for tiles outside vision, 0 for empty tiles, otherwise the occupant id.
    fn visible_robot_map(&self) -> &Grid<i32>;

    fn stats(&self, unit: UnitType) -> UnitStats;

    /// Short-range radio (channel 1).
    fn signal(&mut self, value: u16, radius_sq: u32);

    /// Long-range status channel (channel 2).
    fn castle_talk(&mut self, value: u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_approximation_matches_compass() {
        assert_eq!(Direction::approximate(0, -5), Some(Direction::North));
        assert_eq!(Direction::approximate(3, 3), Some(Direction::SouthEast));
        assert_eq!(Direction::approximate(-4, 0), Some(Direction::West));
        assert_eq!(Direction::approximate(-2, -2), Some(Direction::NorthWest));
        assert_eq!(Direction::approximate(0, 0), None);
    }

    #[test]
    fn unit_mask_only_includes_military() {
        let mask = UnitMask::PROPHET | UnitMask::PREACHER;

        assert!(mask.includes(UnitType::Prophet));
        assert!(!mask.includes(UnitType::Crusader));
        assert!(!UnitMask::MILITARY.includes(UnitType::Pilgrim));
    }
}
