use crate::grid::Grid;
use crate::host::{Position, UnitStats, UnitType};
use crate::pathing::Mover;
use serde::{Deserialize, Serialize};
use shrinkwraprs::*;

/// A hostile unit that may deal damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Attacker {
    pub position: Position,
    pub unit: UnitType,
}

/// Expected incoming damage per tile.
#[derive(Shrinkwrap, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DamageField(pub Grid<u32>);

impl DamageField {
    pub fn empty(width: u32, height: u32) -> DamageField {
        DamageField(Grid::new(width, height, 0))
    }

    /// Sums the damage each attacker can deal to each tile. With `lookahead`
    /// the attacker may first move anywhere within its movement radius, which
    /// gives the threat for next turn rather than this one.
    pub fn build<S>(width: u32, height: u32, attackers: &[Attacker], stats: S, lookahead: bool) -> DamageField
    where
        S: Fn(UnitType) -> UnitStats,
    {
        let mut field = DamageField::empty(width, height);

        for attacker in attackers.iter() {
            let unit_stats = stats(attacker.unit);
            let threatened = threatened_tiles(attacker, &unit_stats, lookahead, width, height);

            for (pos, hit) in threatened.iter() {
                if *hit {
                    if let Some(value) = field.0.get_mut(pos) {
                        *value += unit_stats.attack_damage;
                    }
                }
            }
        }

        field
    }

    pub fn at(&self, pos: Position) -> u32 {
        self.get_or_default(pos)
    }
}

fn threatened_tiles(attacker: &Attacker, stats: &UnitStats, lookahead: bool, width: u32, height: u32) -> Grid<bool> {
    let mut threatened = Grid::new(width, height, false);

    let (min_sq, max_sq) = match stats.attack_radius_sq {
        Some(window) if stats.attack_damage > 0 => window,
        _ => return threatened,
    };

    let mut origins = vec![attacker.position];

    if lookahead {
        let mover = Mover::from_stats(stats);
        origins.extend(mover.steps().iter().map(|(dx, dy)| attacker.position.offset(*dx, *dy)));
    }

    // Splash reaches one tile past whatever is targeted.
    let splash = matches!(attacker.unit, UnitType::Preacher) as i32;
    let reach = (max_sq as f64).sqrt() as i32 + splash;

    for origin in origins {
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let pos = origin.offset(dx, dy);

                if !threatened.in_bounds(pos) {
                    continue;
                }

                let hit = if splash > 0 {
                    (-1..=1).any(|sy| {
                        (-1..=1).any(|sx| {
                            let distance_sq = origin.distance_sq(pos.offset(sx, sy));
                            distance_sq >= min_sq && distance_sq <= max_sq
                        })
                    })
                } else {
                    let distance_sq = origin.distance_sq(pos);
                    distance_sq >= min_sq && distance_sq <= max_sq
                };

                if hit {
                    threatened.set(pos, true);
                }
            }
        }
    }

    threatened
}
