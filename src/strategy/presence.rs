use crate::grid::Grid;
use crate::host::{Position, Team, UnitType};
use serde::{Deserialize, Serialize};

/// Cells per side of the coarse grid.
pub const FIELD_SIZE: u32 = 8;

/// Coarse accumulators of who is where. Every cell decays geometrically each
/// turn, so the field describes recent rather than total presence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresenceField {
    map_width: u32,
    map_height: u32,
    decay: f64,
    civilian: [Grid<f64>; 2],
    combat: [Grid<f64>; 2],
    danger: Grid<f64>,
}

impl PresenceField {
    pub fn new(map_width: u32, map_height: u32, decay: f64) -> PresenceField {
        let empty = Grid::new(FIELD_SIZE, FIELD_SIZE, 0.0);

        PresenceField {
            map_width: map_width.max(1),
            map_height: map_height.max(1),
            decay,
            civilian: [empty.clone(), empty.clone()],
            combat: [empty.clone(), empty.clone()],
            danger: empty,
        }
    }

    /// Coarse cell for a map position. Anything off the map lands in the
    /// nearest edge cell.
    pub fn cell_of(&self, pos: Position) -> Position {
        let scale = |value: i32, extent: u32| -> i32 {
            let cell = (value as i64 * FIELD_SIZE as i64).div_euclid(extent as i64);

            cell.clamp(0, FIELD_SIZE as i64 - 1) as i32
        };

        Position::new(scale(pos.x, self.map_width), scale(pos.y, self.map_height))
    }

    pub fn record_unit(&mut self, team: Team, unit: UnitType, pos: Position) {
        let cell = self.cell_of(pos);
        let field = if unit.can_attack() {
            &mut self.combat[team.index()]
        } else {
            &mut self.civilian[team.index()]
        };

        if let Some(value) = field.get_mut(cell) {
            *value += 1.0;
        }
    }

    pub fn record_danger(&mut self, pos: Position, amount: f64) {
        let cell = self.cell_of(pos);

        if let Some(value) = self.danger.get_mut(cell) {
            *value += amount;
        }
    }

    pub fn decay(&mut self) {
        let decay = self.decay;
        let fields = self.civilian.iter_mut().chain(self.combat.iter_mut()).chain(std::iter::once(&mut self.danger));

        for field in fields {
            *field = field.map(|value| value * decay);
        }
    }

    pub fn civilian(&self, team: Team, cell: Position) -> f64 {
        self.civilian[team.index()].get_or_default(cell)
    }

    pub fn combat(&self, team: Team, cell: Position) -> f64 {
        self.combat[team.index()].get_or_default(cell)
    }

    pub fn danger(&self, cell: Position) -> f64 {
        self.danger.get_or_default(cell)
    }

    /// Danger in the cell containing `pos`.
    pub fn danger_at(&self, pos: Position) -> f64 {
        self.danger(self.cell_of(pos))
    }

    /// How attractive a cell is for expansion by `team`.
    pub fn expansion_score(&self, team: Team, cell: Position) -> f64 {
        self.civilian(team, cell) - self.danger(cell) - self.combat(team.opposite(), cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_clamp_to_edges() {
        let field = PresenceField::new(64, 32, 0.9);

        assert_eq!(field.cell_of(Position::new(0, 0)), Position::new(0, 0));
        assert_eq!(field.cell_of(Position::new(63, 31)), Position::new(7, 7));
        assert_eq!(field.cell_of(Position::new(8, 4)), Position::new(1, 1));
        assert_eq!(field.cell_of(Position::new(-5, 100)), Position::new(0, 7));
    }

    #[test]
    fn decay_is_geometric() {
        let mut field = PresenceField::new(16, 16, 0.5);
        let pos = Position::new(3, 3);

        field.record_danger(pos, 8.0);
        field.record_unit(Team::Red, UnitType::Pilgrim, pos);
        field.decay();
        field.decay();

        assert_eq!(field.danger_at(pos), 2.0);
        assert_eq!(field.civilian(Team::Red, field.cell_of(pos)), 0.25);
    }

    #[test]
    fn expansion_prefers_safe_cells() {
        let mut field = PresenceField::new(16, 16, 0.9);
        let safe = Position::new(1, 1);
        let contested = Position::new(14, 14);

        field.record_unit(Team::Red, UnitType::Pilgrim, safe);
        field.record_unit(Team::Red, UnitType::Pilgrim, contested);
        field.record_unit(Team::Blue, UnitType::Prophet, contested);
        field.record_danger(contested, 1.0);

        let safe_cell = field.cell_of(safe);
        let contested_cell = field.cell_of(contested);

        assert_eq!(field.expansion_score(Team::Red, safe_cell), 1.0);
        assert_eq!(field.expansion_score(Team::Red, contested_cell), -1.0);
    }
}
