use super::damage::DamageField;
use crate::host::Position;
use crate::pathing::{Mover, PathingMap};

/// Legal move with the least incoming damage, cheaper moves first on ties.
/// Returns a move only if it is strictly safer than standing still.
pub fn select_dodge(position: Position, mover: &Mover, map: &PathingMap, damage: &DamageField, fuel: u32) -> Option<(i32, i32)> {
    let staying = damage.at(position);

    if staying == 0 {
        return None;
    }

    mover
        .steps()
        .iter()
        .map(|(dx, dy)| (*dx, *dy, position.offset(*dx, *dy)))
        .filter(|(_, _, tile)| map.is_open(*tile, false))
        .map(|(dx, dy, tile)| (dx, dy, damage.at(tile), mover.fuel_per_move * (dx * dx + dy * dy) as u32))
        .filter(|(_, _, _, cost)| *cost <= fuel)
        .filter(|(_, _, incoming, _)| *incoming < staying)
        .min_by_key(|(dx, dy, incoming, cost)| (*incoming, *cost, *dy, *dx))
        .map(|(dx, dy, _, _)| (dx, dy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::standard_stats;
    use crate::grid::Grid;
    use crate::host::UnitType;
    use crate::tactics::damage::Attacker;

    #[test]
    fn steps_out_of_range_cheaply() {
        let passable = Grid::new(12, 12, true);
        let map = PathingMap::new(&passable);
        let attackers = [Attacker {
            position: Position::new(2, 6),
            unit: UnitType::Crusader,
        }];
        let damage = DamageField::build(12, 12, &attackers, standard_stats, false);
        let mover = Mover::from_stats(&standard_stats(UnitType::Pilgrim));

        // On the edge of the window: one step north, east or south leaves it.
        let step = select_dodge(Position::new(6, 6), &mover, &map, &damage, 10);

        assert_eq!(step, Some((0, -1)));
        assert_eq!(select_dodge(Position::new(10, 6), &mover, &map, &damage, 10), None);
        assert_eq!(select_dodge(Position::new(6, 6), &mover, &map, &damage, 0), None);
    }
}
