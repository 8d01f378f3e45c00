use crate::grid::Grid;
use crate::host::{Position, UnitStats};
use crate::pathing::PathingMap;
use crate::strategy::nearest_free_lattice_tile;

/// Route goals are capped so the A* heuristic stays cheap.
const MAX_GOALS: usize = 24;

/// Where an idle defender should stand: the free lattice tile closest to its
/// anchor structure.
pub fn select_idle_position(
    from: Position,
    anchor: Position,
    map: &PathingMap,
    resources: &Grid<bool>,
    spacing: i32,
    max_radius_sq: u32,
) -> Option<Position> {
    nearest_free_lattice_tile(from, anchor, max_radius_sq, spacing, map, resources)
}

/// Open tiles from which `target` is inside the attack window, nearest to
/// `from` first.
pub fn attack_positions(from: Position, target: Position, stats: &UnitStats, map: &PathingMap) -> Vec<Position> {
    match stats.attack_radius_sq {
        Some(window) => ring_positions(from, target, window, map),
        None => Vec::new(),
    }
}

/// Open tiles whose squared distance to `target` lies within `window`,
/// nearest to `from` first.
pub fn ring_positions(from: Position, target: Position, window: (u32, u32), map: &PathingMap) -> Vec<Position> {
    let (min_sq, max_sq) = window;
    let reach = (max_sq as f64).sqrt() as i32;

    let mut tiles: Vec<Position> = (-reach..=reach)
        .flat_map(|dy| (-reach..=reach).map(move |dx| target.offset(dx, dy)))
        .filter(|tile| {
            let distance_sq = tile.distance_sq(target);
            distance_sq >= min_sq && distance_sq <= max_sq
        })
        .filter(|tile| *tile == from || map.is_open(*tile, false))
        .collect();

    tiles.sort_by_key(|tile| (tile.distance_sq(from), tile.y, tile.x));
    tiles.truncate(MAX_GOALS);
    tiles
}

/// Open tiles adjacent to any of `structures`, for handing over resources.
pub fn adjacent_tiles(from: Position, structures: &[Position], map: &PathingMap) -> Vec<Position> {
    let mut tiles: Vec<Position> = structures
        .iter()
        .flat_map(|s| (-1..=1).flat_map(move |dy| (-1..=1).map(move |dx| s.offset(dx, dy))))
        .filter(|tile| !structures.contains(tile))
        .filter(|tile| *tile == from || map.is_open(*tile, false))
        .collect();

    tiles.sort_by_key(|tile| (tile.distance_sq(from), tile.y, tile.x));
    tiles.dedup();
    tiles.truncate(MAX_GOALS);
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::standard_stats;
    use crate::host::UnitType;

    #[test]
    fn prophets_stand_off_at_range() {
        let passable = Grid::new(30, 30, true);
        let map = PathingMap::new(&passable);
        let stats = standard_stats(UnitType::Prophet);
        let target = Position::new(15, 15);

        let tiles = attack_positions(Position::new(0, 15), target, &stats, &map);

        assert!(!tiles.is_empty());
        assert!(tiles.len() <= MAX_GOALS);
        assert_eq!(tiles[0], Position::new(7, 15));
        assert!(tiles.iter().all(|t| stats.in_attack_range(t.distance_sq(target))));
    }

    #[test]
    fn ring_excludes_the_inner_window() {
        let passable = Grid::new(30, 30, true);
        let map = PathingMap::new(&passable);
        let target = Position::new(15, 15);

        let tiles = ring_positions(Position::new(15, 0), target, (65, 100), &map);

        assert_eq!(tiles[0], Position::new(15, 5));
        assert!(tiles.iter().all(|t| (65..=100).contains(&t.distance_sq(target))));
    }

    #[test]
    fn adjacent_tiles_skip_structures_and_duplicates() {
        let passable = Grid::new(8, 8, true);
        let map = PathingMap::new(&passable);
        let structures = [Position::new(3, 3), Position::new(4, 3)];

        let tiles = adjacent_tiles(Position::new(0, 0), &structures, &map);

        assert_eq!(tiles.len(), 10);
        assert_eq!(tiles[0], Position::new(2, 2));
        assert!(!tiles.contains(&Position::new(3, 3)));
    }
}
