use crate::grid::Grid;
use crate::host::Position;
use crate::pathing::PathingMap;

/// Lattice tiles are spread so that defenders standing on them never block
/// each other in and never sit on a resource.
pub fn is_lattice_tile(pos: Position, spacing: i32, passable: &Grid<bool>, resources: &Grid<bool>) -> bool {
    let spacing = spacing.max(1);

    (pos.x + pos.y).rem_euclid(spacing) == 0 && passable.is_set(pos) && !resources.is_set(pos)
}

/// Closest lattice tile to `anchor` within `max_radius_sq` that is free or
/// already held by the unit at `from`. Ties go to the tile nearer `from`.
pub fn nearest_free_lattice_tile(
    from: Position,
    anchor: Position,
    max_radius_sq: u32,
    spacing: i32,
    map: &PathingMap,
    resources: &Grid<bool>,
) -> Option<Position> {
    let reach = (max_radius_sq as f64).sqrt() as i32;
    let passable = map.passable();

    (-reach..=reach)
        .flat_map(|dy| (-reach..=reach).map(move |dx| anchor.offset(dx, dy)))
        .filter(|pos| pos.distance_sq(anchor) <= max_radius_sq)
        .filter(|pos| *pos != anchor)
        .filter(|pos| is_lattice_tile(*pos, spacing, passable, resources))
        .filter(|pos| *pos == from || map.is_open(*pos, false))
        .min_by_key(|pos| (pos.distance_sq(anchor), pos.distance_sq(from), pos.y, pos.x))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_skips_resources_and_walls() {
        let passable = Grid::from_fn(6, 6, |p| p != Position::new(2, 2));
        let resources = Grid::from_fn(6, 6, |p| p == Position::new(1, 1));

        assert!(is_lattice_tile(Position::new(0, 2), 2, &passable, &resources));
        assert!(!is_lattice_tile(Position::new(0, 1), 2, &passable, &resources));
        assert!(!is_lattice_tile(Position::new(2, 2), 2, &passable, &resources));
        assert!(!is_lattice_tile(Position::new(1, 1), 2, &passable, &resources));
    }

    #[test]
    fn occupied_lattice_tiles_are_skipped_unless_held() {
        let passable = Grid::new(9, 9, true);
        let resources = Grid::new(9, 9, false);
        let mut occupancy = Grid::new(9, 9, 0);
        let anchor = Position::new(4, 4);

        // (3, 3), (5, 3), (3, 5), (5, 5) are the nearest lattice tiles.
        for pos in [Position::new(3, 3), Position::new(5, 3), Position::new(3, 5)] {
            occupancy.set(pos, 9);
        }

        let map = PathingMap::new(&passable).with_occupancy(&occupancy);
        let from = Position::new(8, 8);

        assert_eq!(
            nearest_free_lattice_tile(from, anchor, 16, 2, &map, &resources),
            Some(Position::new(5, 5))
        );

        occupancy.set(Position::new(5, 5), 9);
        occupancy.set(Position::new(3, 3), 7);

        let map = PathingMap::new(&passable).with_occupancy(&occupancy);
        assert_eq!(
            nearest_free_lattice_tile(Position::new(3, 3), anchor, 16, 2, &map, &resources),
            Some(Position::new(3, 3))
        );
    }
}
