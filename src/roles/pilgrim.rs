use super::*;
use crate::constants::MINE_FUEL_COST;
use crate::protocol::OrderKind;
use crate::tactics::{adjacent_tiles, ring_positions, select_church_site};
use serde::{Deserialize, Serialize};

/// Scouts watch from just outside a castle's attack range.
const LOOKOUT_WINDOW: (u32, u32) = (65, 100);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PilgrimState {
    Mine,
    Dropoff,
    Construct { site: Position },
    Scout { target: Position },
}

impl PilgrimState {
    pub fn index(self) -> u8 {
        match self {
            PilgrimState::Mine => 0,
            PilgrimState::Dropoff => 1,
            PilgrimState::Construct { .. } => 2,
            PilgrimState::Scout { .. } => 3,
        }
    }

    fn tick<H: Host + ?Sized>(
        &mut self,
        pilgrim: &mut PilgrimContext,
        tick: &mut TickContext<H>,
        ctx: &mut UnitContext,
    ) -> Result<Option<PilgrimState>, TurnError> {
        match *self {
            PilgrimState::Mine => pilgrim.mine(tick, ctx),
            PilgrimState::Dropoff => pilgrim.dropoff(tick, ctx),
            PilgrimState::Construct { site } => pilgrim.construct(site, tick, ctx),
            PilgrimState::Scout { target } => pilgrim.scout(target, tick, ctx),
        }
    }
}

pub struct PilgrimContext {
    mine_target: Option<Position>,
}

impl PilgrimContext {
    fn can_afford_church<H: Host + ?Sized>(tick: &TickContext<H>) -> bool {
        tick.host.team_resources().can_afford(&tick.host.stats(UnitType::Church))
    }

    /// The ordered tile while it stays free, else the nearest free resource
    /// tile in range.
    fn mining_target<H: Host + ?Sized>(&mut self, tick: &TickContext<H>, ctx: &UnitContext) -> Option<Position> {
        let map = pathing_map(tick.host);
        let me = tick.me.position;

        if let Some(target) = self.mine_target {
            if target == me || map.is_open(target, false) {
                return Some(target);
            }

            debug!("Pilgrim {} lost mining tile {}", ctx.id, target);
        }

        let radius_sq = ctx.features.economy.resource_search_radius_sq;

        self.mine_target = ctx
            .resources
            .iter()
            .filter(|(pos, set)| **set && pos.distance_sq(me) <= radius_sq)
            .map(|(pos, _)| pos)
            .filter(|pos| *pos == me || map.is_open(*pos, false))
            .min_by_key(|pos| (pos.distance_sq(me), pos.y, pos.x));

        self.mine_target
    }

    fn mine<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<PilgrimState>, TurnError> {
        let stats = tick.host.stats(UnitType::Pilgrim);
        let me = tick.me;

        if me.karbonite >= stats.karbonite_capacity || me.fuel >= stats.fuel_capacity {
            return Ok(Some(PilgrimState::Dropoff));
        }

        let economy = &ctx.features.economy;
        let map = pathing_map(tick.host);
        let dropoffs = ctx.dropoffs();

        let target = match self.mining_target(tick, ctx) {
            Some(target) => target,
            None => {
                // Nothing left nearby: found a church at an unserved cluster.
                if !Self::can_afford_church(tick) {
                    return Ok(None);
                }

                let site = select_church_site(
                    me.position,
                    &ctx.resources,
                    &map,
                    &dropoffs,
                    economy.church_site_radius_sq,
                    economy.church_distance_sq,
                );

                return Ok(site.map(|site| PilgrimState::Construct { site }));
            }
        };

        if target == me.position {
            let far_from_dropoff = dropoffs
                .iter()
                .all(|d| d.distance_sq(target) > economy.church_distance_sq);

            if far_from_dropoff && Self::can_afford_church(tick) {
                if let Some(site) = select_build_site(target, &map, &ctx.resources, None) {
                    info!("Pilgrim {} founding a church at {}", ctx.id, site);

                    return Ok(Some(PilgrimState::Construct { site }));
                }
            }

            if tick.host.team_resources().fuel >= MINE_FUEL_COST {
                tick.act(Action::Mine);
            }

            return Ok(None);
        }

        try_move_to(tick, ctx, &[target]);

        Ok(None)
    }

    fn dropoff<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<PilgrimState>, TurnError> {
        let me = tick.me;

        if me.karbonite == 0 && me.fuel == 0 {
            return Ok(Some(PilgrimState::Mine));
        }

        let dropoffs = ctx.dropoffs();

        if dropoffs.is_empty() {
            if Self::can_afford_church(tick) {
                let map = pathing_map(tick.host);

                if let Some(site) = select_build_site(me.position, &map, &ctx.resources, None) {
                    return Ok(Some(PilgrimState::Construct { site }));
                }
            }

            return Ok(None);
        }

        if let Some(dropoff) = dropoffs.iter().find(|d| d.chebyshev(me.position) == 1) {
            let (dx, dy) = me.position.delta_to(*dropoff);

            tick.act(Action::Give {
                dx,
                dy,
                karbonite: me.karbonite,
                fuel: me.fuel,
            });

            return Ok(None);
        }

        let goals = adjacent_tiles(me.position, &dropoffs, &pathing_map(tick.host));

        try_move_to(tick, ctx, &goals);

        Ok(None)
    }

    fn construct<H: Host + ?Sized>(&mut self, site: Position, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<PilgrimState>, TurnError> {
        let built = ctx
            .knowledge
            .structures()
            .values()
            .any(|pos| *pos == site);

        if built || !Self::can_afford_church(tick) {
            return Ok(Some(PilgrimState::Mine));
        }

        let me = tick.me.position;
        let map = pathing_map(tick.host);

        if me.distance_sq(site) <= ADJACENT_RADIUS_SQ && me != site {
            if !map.is_open(site, false) {
                return Ok(Some(PilgrimState::Mine));
            }

            let (dx, dy) = me.delta_to(site);

            tick.act(Action::Build {
                unit: UnitType::Church,
                dx,
                dy,
            });

            return Ok(None);
        }

        let goals = adjacent_tiles(me, &[site], &map);

        try_move_to(tick, ctx, &goals);

        Ok(None)
    }

    fn scout<H: Host + ?Sized>(&mut self, target: Position, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<PilgrimState>, TurnError> {
        let me = tick.me;
        let vision_sq = tick.host.stats(UnitType::Pilgrim).vision_radius_sq;

        let sighted = ctx
            .knowledge
            .hostiles_near(ctx.team, me.position, vision_sq)
            .filter(|e| e.last_position_turn == Some(me.turn))
            .min_by_key(|e| (e.position.map(|p| p.distance_sq(me.position)), e.id))
            .map(|e| e.id);

        if let Some(id) = sighted {
            if ctx
                .knowledge
                .should_report(id, me.turn, ctx.features.economy.scout_report_interval)
            {
                let report = RadioMessage::ScoutReport {
                    hostile: true,
                    position: me.position,
                };

                ctx.outboxes
                    .send_radio(report.priority(), &[report], ctx.features.military.signal_radius_sq)?;
            }
        }

        let goals = ring_positions(me.position, target, LOOKOUT_WINDOW, &pathing_map(tick.host));

        if !goals.contains(&me.position) {
            try_move_to(tick, ctx, &goals);
        }

        Ok(None)
    }
}

pub struct PilgrimController {
    state: PilgrimState,
    context: PilgrimContext,
}

impl PilgrimController {
    pub fn new(_ctx: &UnitContext) -> PilgrimController {
        PilgrimController {
            state: PilgrimState::Mine,
            context: PilgrimContext { mine_target: None },
        }
    }

    pub fn state(&self) -> PilgrimState {
        self.state
    }

    /// Orders radioed by the structure that built this pilgrim.
    fn read_orders<H: Host + ?Sized>(&mut self, tick: &TickContext<H>, ctx: &UnitContext) {
        let parent = match ctx.home_id {
            Some(parent) => parent,
            None => return,
        };

        for message in tick.inbox.from_sender(parent) {
            match *message {
                RadioMessage::Order {
                    kind: OrderKind::Mine,
                    position,
                } => self.context.mine_target = Some(position),
                RadioMessage::Order {
                    kind: OrderKind::Construct,
                    position,
                } => self.state = PilgrimState::Construct { site: position },
                RadioMessage::TargetOnConstruct { position, .. } => self.state = PilgrimState::Scout { target: position },
                _ => {}
            }
        }

        debug!("Pilgrim {} starts in {:?}", ctx.id, self.state);
    }

    pub fn tick<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<(), TurnError> {
        if tick.is_first_turn(ctx) {
            self.read_orders(tick, ctx);
        }

        try_dodge(tick, ctx);

        let context = &mut self.context;

        run_state_machine(&mut self.state, "Pilgrim", |state| state.tick(context, tick, ctx))?;

        ctx.heartbeat(self.state.index())?;

        Ok(())
    }
}
