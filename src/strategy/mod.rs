//! Long-lived strategic state, owned by castles only.

pub mod lattice;
pub mod presence;
pub mod symmetry;

pub use lattice::*;
pub use presence::*;
pub use symmetry::*;

use crate::grid::Grid;
use crate::host::{Position, Team, UnitType};
use crate::knowledge::WorldKnowledge;
use crate::protocol::{Inbox, RadioMessage};
use log::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

const HOSTILE_UNIT_DANGER: f64 = 1.0;
const SCOUT_SIGHTING_DANGER: f64 = 2.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StrategyState {
    pub presence: PresenceField,
    pub symmetry: MapSymmetry,
    friendly_castles: BTreeMap<u32, Position>,
    enemy_castles: Vec<Position>,
    /// Resource tiles each castle claimed during negotiation.
    bids: BTreeMap<u32, u8>,
    leader: Option<u32>,
}

impl StrategyState {
    pub fn new(symmetry: MapSymmetry, decay: f64) -> StrategyState {
        StrategyState {
            presence: PresenceField::new(symmetry.width, symmetry.height, decay),
            symmetry,
            friendly_castles: BTreeMap::new(),
            enemy_castles: Vec::new(),
            bids: BTreeMap::new(),
            leader: None,
        }
    }

    /// Registers a friendly castle and the enemy castle mirrored from it.
    pub fn record_friendly_castle(&mut self, id: u32, pos: Position) {
        if self.friendly_castles.insert(id, pos).is_none() {
            debug!("Friendly castle {} at {}", id, pos);

            self.add_enemy_castle(self.symmetry.mirror(pos));
        }
    }

    pub fn forget_friendly_castle(&mut self, id: u32) {
        self.friendly_castles.remove(&id);
        self.bids.remove(&id);

        if self.leader == Some(id) {
            self.resolve_leadership();
        }
    }

    fn add_enemy_castle(&mut self, pos: Position) {
        if !self.enemy_castles.contains(&pos) {
            self.enemy_castles.push(pos);
        }
    }

    pub fn record_bid(&mut self, id: u32, bid: u8) {
        self.bids.insert(id, bid);
    }

    /// This castle's share of `max_pilgrims`, proportional to its bid and
    /// never more than the bid itself.
    pub fn pilgrim_quota(&self, id: u32, max_pilgrims: u32) -> u32 {
        let own = self.bids.get(&id).copied().unwrap_or(0) as u32;
        let total: u32 = self.bids.values().map(|b| *b as u32).sum();

        if total == 0 {
            return 0;
        }

        let share = (max_pilgrims * own + total - 1) / total;

        share.min(own)
    }

    /// Lowest known castle id leads.
    pub fn resolve_leadership(&mut self) -> Option<u32> {
        self.leader = self.friendly_castles.keys().next().copied();
        self.leader
    }

    pub fn leader(&self) -> Option<u32> {
        self.leader
    }

    pub fn is_leader(&self, id: u32) -> bool {
        self.leader == Some(id)
    }

    pub fn friendly_castles(&self) -> &BTreeMap<u32, Position> {
        &self.friendly_castles
    }

    pub fn enemy_castles(&self) -> &[Position] {
        &self.enemy_castles
    }

    pub fn nearest_enemy_castle(&self, from: Position) -> Option<Position> {
        self.enemy_castles.iter().copied().min_by_key(|pos| pos.distance_sq(from))
    }

    /// Best church site for `team` among `candidates` (site, resource tiles
    /// served). Uncontested cells win, then richer sites, then nearer ones.
    pub fn select_expansion_site(&self, team: Team, from: Position, candidates: &[(Position, usize)]) -> Option<Position> {
        let score = |site: Position| self.presence.expansion_score(team, self.presence.cell_of(site));

        candidates
            .iter()
            .min_by(|(a, a_nearby), (b, b_nearby)| {
                score(*b)
                    .partial_cmp(&score(*a))
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| b_nearby.cmp(a_nearby))
                    .then_with(|| (a.distance_sq(from), a.y, a.x).cmp(&(b.distance_sq(from), b.y, b.x)))
            })
            .map(|(site, _)| *site)
    }

    /// Per-turn update from this unit's beliefs and what it heard.
    pub fn update(&mut self, own_team: Team, knowledge: &WorldKnowledge, inbox: &Inbox, occupancy: &Grid<i32>) {
        self.presence.decay();

        for entity in knowledge.iter() {
            let pos = match entity.position {
                Some(pos) => pos,
                None => continue,
            };

            self.presence.record_unit(entity.team, entity.unit, pos);

            if entity.team != own_team && entity.unit.is_military() {
                self.presence.record_danger(pos, HOSTILE_UNIT_DANGER);
            }
        }

        for (_, message) in inbox.iter() {
            if let RadioMessage::ScoutReport { hostile: true, position } = message {
                self.presence.record_danger(*position, SCOUT_SIGHTING_DANGER);
            }
        }

        for (_, pos) in knowledge.structures_of(own_team.opposite(), UnitType::Castle) {
            self.add_enemy_castle(pos);
        }

        // An estimate is dropped once its tile is in vision without an enemy castle on it.
        let confirmed: Vec<Position> = knowledge
            .structures_of(own_team.opposite(), UnitType::Castle)
            .map(|(_, pos)| pos)
            .collect();

        self.enemy_castles.retain(|pos| {
            let seen_empty = occupancy.get(*pos).map(|id| *id >= 0).unwrap_or(false) && !confirmed.contains(pos);

            if seen_empty {
                info!("No enemy castle at {}", pos);
            }

            !seen_empty
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::RobotInfo;

    fn symmetry() -> MapSymmetry {
        MapSymmetry {
            kind: Symmetry::Vertical,
            width: 16,
            height: 16,
        }
    }

    #[test]
    fn castles_mirror_into_enemy_estimates_and_lowest_id_leads() {
        let mut state = StrategyState::new(symmetry(), 0.9);

        state.record_friendly_castle(12, Position::new(2, 5));
        state.record_friendly_castle(4, Position::new(3, 10));
        state.record_friendly_castle(12, Position::new(2, 5));

        assert_eq!(state.resolve_leadership(), Some(4));
        assert_eq!(state.enemy_castles(), &[Position::new(13, 5), Position::new(12, 10)]);
        assert_eq!(state.nearest_enemy_castle(Position::new(15, 4)), Some(Position::new(13, 5)));

        state.forget_friendly_castle(4);
        assert!(state.is_leader(12));
    }

    #[test]
    fn pilgrims_are_shared_by_bid() {
        let mut state = StrategyState::new(symmetry(), 0.9);

        assert_eq!(state.pilgrim_quota(1, 12), 0);

        state.record_bid(1, 10);
        state.record_bid(2, 20);

        assert_eq!(state.pilgrim_quota(1, 12), 4);
        assert_eq!(state.pilgrim_quota(2, 12), 8);

        state.record_bid(3, 0);
        assert_eq!(state.pilgrim_quota(3, 12), 0);

        state.forget_friendly_castle(2);
        assert_eq!(state.pilgrim_quota(1, 12), 10);
    }

    #[test]
    fn expansion_avoids_contested_cells() {
        let mut state = StrategyState::new(symmetry(), 0.9);
        let near = Position::new(10, 2);
        let far = Position::new(2, 14);

        // The nearer site serves more tiles but enemies hold its cell.
        state.presence.record_unit(Team::Blue, UnitType::Prophet, near);
        state.presence.record_danger(near, 1.0);

        let candidates = [(near, 3), (far, 2)];

        assert_eq!(state.select_expansion_site(Team::Red, Position::new(8, 2), &candidates), Some(far));

        let quiet = StrategyState::new(symmetry(), 0.9);

        assert_eq!(quiet.select_expansion_site(Team::Red, Position::new(8, 2), &candidates), Some(near));
        assert_eq!(quiet.select_expansion_site(Team::Red, Position::new(8, 2), &[]), None);
    }

    #[test]
    fn visible_empty_estimate_is_dropped_and_danger_recorded() {
        let mut state = StrategyState::new(symmetry(), 0.9);
        let mut knowledge = WorldKnowledge::new();
        let mut occupancy = Grid::new(16, 16, -1);

        state.record_friendly_castle(1, Position::new(2, 2));
        occupancy.set(Position::new(13, 2), 0);

        let raider = RobotInfo {
            id: 30,
            team: Some(Team::Blue),
            unit: Some(UnitType::Crusader),
            position: Some(Position::new(4, 4)),
            ..Default::default()
        };

        knowledge.reconcile_perception_sweep(
            1,
            Position::new(2, 2),
            &[raider],
            &occupancy,
            RobotInfo::is_visible,
            RobotInfo::is_radioing,
            None,
        );

        state.update(Team::Red, &knowledge, &Inbox::default(), &occupancy);

        assert!(state.enemy_castles().is_empty());
        assert_eq!(state.presence.danger_at(Position::new(4, 4)), 1.0);
    }
}
