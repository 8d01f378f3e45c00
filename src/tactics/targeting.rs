use crate::grid::Grid;
use crate::host::{Position, Team, UnitStats, UnitType};
use std::cmp::Reverse;

/// A hostile robot that can be attacked this turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub id: u32,
    pub position: Position,
    pub unit: UnitType,
    /// Best known remaining health.
    pub health: u32,
}

/// Any robot on the board, for splash scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Occupant {
    pub position: Position,
    pub team: Team,
    pub unit: UnitType,
}

/// Higher is more urgent to kill.
fn type_priority(attacker: UnitType, target: UnitType) -> u8 {
    use UnitType::*;

    let order: [UnitType; 6] = match attacker {
        Crusader => [Prophet, Preacher, Crusader, Pilgrim, Castle, Church],
        Prophet => [Preacher, Crusader, Prophet, Pilgrim, Castle, Church],
        _ => [Preacher, Crusader, Prophet, Pilgrim, Church, Castle],
    };

    let rank = order.iter().position(|u| *u == target).unwrap_or(order.len());

    (order.len() - rank) as u8
}

/// Best single target within the attack window: kills first, then the most
/// dangerous type, then the weakest, then the closest.
pub fn select_attack_target<'a>(attacker: UnitType, stats: &UnitStats, from: Position, targets: &'a [Target]) -> Option<&'a Target> {
    targets
        .iter()
        .filter(|t| stats.in_attack_range(from.distance_sq(t.position)))
        .min_by_key(|t| {
            let kills = t.health <= stats.attack_damage;

            (
                !kills,
                Reverse(type_priority(attacker, t.unit)),
                t.health,
                from.distance_sq(t.position),
                t.id,
            )
        })
}

fn splash_weight(unit: UnitType) -> i32 {
    if unit.is_structure() {
        1
    } else {
        2
    }
}

/// Best tile for a 3x3 splash attack and its score. Only tiles where enemies
/// outweigh friendlies are considered.
pub fn select_splash_target(stats: &UnitStats, from: Position, own_team: Team, occupants: &[Occupant], bounds: &Grid<bool>) -> Option<(Position, i32)> {
    let (_, max_sq) = stats.attack_radius_sq?;
    let reach = (max_sq as f64).sqrt() as i32;

    (-reach..=reach)
        .flat_map(|dy| (-reach..=reach).map(move |dx| from.offset(dx, dy)))
        .filter(|tile| bounds.in_bounds(*tile) && stats.in_attack_range(from.distance_sq(*tile)))
        .map(|tile| {
            let score: i32 = occupants
                .iter()
                .filter(|o| o.position.chebyshev(tile) <= 1)
                .map(|o| {
                    if o.team == own_team {
                        -splash_weight(o.unit)
                    } else {
                        splash_weight(o.unit)
                    }
                })
                .sum();

            (tile, score)
        })
        .filter(|(_, score)| *score > 0)
        .min_by_key(|(tile, score)| (Reverse(*score), from.distance_sq(*tile), tile.y, tile.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::standard_stats;

    fn target(id: u32, x: i32, y: i32, unit: UnitType, health: u32) -> Target {
        Target {
            id,
            position: Position::new(x, y),
            unit,
            health,
        }
    }

    #[test]
    fn prefers_kills_then_priority_then_health() {
        let stats = standard_stats(UnitType::Prophet);
        let from = Position::new(0, 0);
        let targets = [
            target(1, 4, 0, UnitType::Pilgrim, 10),
            target(2, 0, 5, UnitType::Preacher, 60),
            target(3, 0, 6, UnitType::Crusader, 30),
            target(4, 1, 1, UnitType::Preacher, 5),
        ];

        // Pilgrim dies in one shot; the adjacent preacher is inside the blind spot.
        assert_eq!(select_attack_target(UnitType::Prophet, &stats, from, &targets).map(|t| t.id), Some(1));

        let survivors = &targets[1..];
        assert_eq!(select_attack_target(UnitType::Prophet, &stats, from, survivors).map(|t| t.id), Some(2));
    }

    #[test]
    fn nothing_in_range_is_none() {
        let stats = standard_stats(UnitType::Crusader);
        let targets = [target(1, 9, 9, UnitType::Castle, 200)];

        assert_eq!(select_attack_target(UnitType::Crusader, &stats, Position::new(0, 0), &targets), None);
    }

    #[test]
    fn splash_avoids_friendlies() {
        let stats = standard_stats(UnitType::Preacher);
        let bounds = Grid::new(12, 12, true);
        let from = Position::new(5, 5);
        let occupants = [
            Occupant {
                position: Position::new(5, 8),
                team: Team::Blue,
                unit: UnitType::Crusader,
            },
            Occupant {
                position: Position::new(6, 8),
                team: Team::Blue,
                unit: UnitType::Prophet,
            },
            Occupant {
                position: Position::new(4, 8),
                team: Team::Red,
                unit: UnitType::Pilgrim,
            },
        ];

        let (tile, score) = select_splash_target(&stats, from, Team::Red, &occupants, &bounds).unwrap();

        assert_eq!(score, 4);
        assert!(tile.chebyshev(Position::new(4, 8)) > 1);
        assert!(tile.chebyshev(Position::new(5, 8)) <= 1 && tile.chebyshev(Position::new(6, 8)) <= 1);

        let friendly_only = &occupants[2..];
        assert_eq!(select_splash_target(&stats, from, Team::Red, friendly_only, &bounds), None);
    }
}
