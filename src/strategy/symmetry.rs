use crate::grid::Grid;
use crate::host::Position;
use log::*;
use serde::{Deserialize, Serialize};

/// Maps are mirrored either across the horizontal axis (y flips) or across
/// the vertical axis (x flips).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Symmetry {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSymmetry {
    pub kind: Symmetry,
    pub width: u32,
    pub height: u32,
}

impl MapSymmetry {
    /// Picks the reflection that disagrees with the terrain and resource maps
    /// the least. Perfectly symmetric maps resolve to `Horizontal`.
    pub fn detect(passable: &Grid<bool>, karbonite: &Grid<bool>, fuel: &Grid<bool>) -> MapSymmetry {
        let width = passable.width();
        let height = passable.height();

        let mismatches = |kind: Symmetry| -> usize {
            let symmetry = MapSymmetry { kind, width, height };

            passable
                .positions()
                .filter(|pos| {
                    let mirrored = symmetry.mirror(*pos);

                    [passable, karbonite, fuel].iter().any(|grid| grid.get(*pos) != grid.get(mirrored))
                })
                .count()
        };

        let horizontal = mismatches(Symmetry::Horizontal);
        let vertical = mismatches(Symmetry::Vertical);

        let kind = if horizontal <= vertical {
            Symmetry::Horizontal
        } else {
            Symmetry::Vertical
        };

        debug!("Map symmetry {:?} ({} vs {} mismatches)", kind, horizontal, vertical);

        MapSymmetry { kind, width, height }
    }

    pub fn mirror(&self, pos: Position) -> Position {
        match self.kind {
            Symmetry::Horizontal => Position::new(pos.x, self.height as i32 - 1 - pos.y),
            Symmetry::Vertical => Position::new(self.width as i32 - 1 - pos.x, pos.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mirrored_columns() {
        // Wall on both x = 1 and x = 4 of a 6 wide map: x flips onto itself.
        let passable = Grid::from_fn(6, 6, |p| !(p.x == 1 && p.y < 3) && !(p.x == 4 && p.y < 3));
        let resources = Grid::from_fn(6, 6, |p| p == Position::new(0, 5) || p == Position::new(5, 5));
        let none = Grid::new(6, 6, false);

        let symmetry = MapSymmetry::detect(&passable, &resources, &none);

        assert_eq!(symmetry.kind, Symmetry::Vertical);
        assert_eq!(symmetry.mirror(Position::new(0, 2)), Position::new(5, 2));
    }

    #[test]
    fn detects_mirrored_rows() {
        let passable = Grid::from_fn(5, 4, |p| !(p.x < 2 && (p.y == 0 || p.y == 3)));
        let none = Grid::new(5, 4, false);

        let symmetry = MapSymmetry::detect(&passable, &none, &none);

        assert_eq!(symmetry.kind, Symmetry::Horizontal);
        assert_eq!(symmetry.mirror(Position::new(1, 0)), Position::new(1, 3));
    }
}
