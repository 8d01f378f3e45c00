use super::*;
use crate::protocol::OrderKind;
use std::collections::BTreeSet;

/// Staffs the resource tiles around a church and calls up prophets when
/// enemies come close.
pub struct ChurchController {
    mining_tiles: Vec<Position>,
    assigned: BTreeSet<Position>,
}

impl ChurchController {
    pub fn new(ctx: &UnitContext) -> ChurchController {
        let radius_sq = ctx.features.economy.resource_search_radius_sq;
        let home = ctx.home;

        let mut mining_tiles: Vec<Position> = ctx
            .resources
            .iter()
            .filter(|(pos, set)| **set && pos.distance_sq(home) <= radius_sq)
            .map(|(pos, _)| pos)
            .collect();

        mining_tiles.sort_by_key(|pos| (pos.distance_sq(home), pos.y, pos.x));

        ChurchController {
            mining_tiles,
            assigned: BTreeSet::new(),
        }
    }

    /// Nearest tile that was never handed out and has no friendly pilgrim on it.
    fn unclaimed_tile(&self, ctx: &UnitContext) -> Option<Position> {
        let claimed: BTreeSet<Position> = ctx
            .knowledge
            .units_of(ctx.team)
            .filter(|e| e.unit == UnitType::Pilgrim)
            .filter_map(|e| e.position)
            .collect();

        self.mining_tiles
            .iter()
            .copied()
            .find(|tile| !claimed.contains(tile) && !self.assigned.contains(tile))
    }

    pub fn tick<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<(), TurnError> {
        let turn = tick.me.turn;

        let nearest_threat = ctx
            .knowledge
            .hostiles_near(ctx.team, ctx.home, ctx.features.military.threat_radius_sq)
            .filter(|e| e.unit.is_military() && e.last_position_turn == Some(turn))
            .filter_map(|e| e.position)
            .min_by_key(|pos| pos.distance_sq(ctx.home));

        if let Some(threat) = nearest_threat {
            debug!("Church {} threatened from {}", ctx.id, threat);

            try_build(tick, ctx, UnitType::Prophet, Some(threat), None)?;
        } else if let Some(tile) = self.unclaimed_tile(ctx) {
            let order = RadioMessage::Order {
                kind: OrderKind::Mine,
                position: tile,
            };

            if try_build(tick, ctx, UnitType::Pilgrim, Some(tile), Some(order))? {
                self.assigned.insert(tile);
            }
        }

        ctx.heartbeat(0)?;

        Ok(())
    }
}
