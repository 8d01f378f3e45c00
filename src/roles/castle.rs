use super::*;
use crate::host::{Direction, UnitMask};
use crate::knowledge::EntityRecord;
use crate::protocol::*;
use crate::strategy::StrategyState;
use crate::tactics::church_site_candidates;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Largest value a bid can carry on the status channel.
const MAX_BID: usize = 63;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastleState {
    NegotiateLeadership,
    Rush,
    HoldEconomy,
    AwaitRush,
}

impl CastleState {
    pub fn index(self) -> u8 {
        match self {
            CastleState::NegotiateLeadership => 0,
            CastleState::Rush => 1,
            CastleState::HoldEconomy => 2,
            CastleState::AwaitRush => 3,
        }
    }

    fn tick<H: Host + ?Sized>(
        &mut self,
        castle: &mut CastleContext,
        tick: &mut TickContext<H>,
        ctx: &mut UnitContext,
    ) -> Result<Option<CastleState>, TurnError> {
        match self {
            CastleState::NegotiateLeadership => castle.negotiate(tick, ctx),
            CastleState::Rush => castle.rush(tick, ctx),
            CastleState::HoldEconomy => castle.hold_economy(tick, ctx),
            CastleState::AwaitRush => castle.await_rush(tick, ctx),
        }
    }
}

pub struct CastleContext {
    strategy: StrategyState,
    assembler: StatusAssembler,
    announced: bool,
    bid: u8,
    /// Resource tiles this castle hands out, nearest first.
    mining_tiles: Vec<Position>,
    assigned: BTreeSet<Position>,
    /// Church sites a founder has been sent to.
    founded: Vec<Position>,
    pilgrims_built: u32,
    miners_built: u32,
    military_built: u32,
    rush_built: u32,
    /// Enemy currently named in a target list broadcast.
    alarm: Option<u32>,
    charged: bool,
}

impl CastleContext {
    fn new(ctx: &UnitContext) -> CastleContext {
        let radius_sq = ctx.features.economy.resource_search_radius_sq;
        let home = ctx.home;

        let mut mining_tiles: Vec<Position> = ctx
            .resources
            .iter()
            .filter(|(pos, set)| **set && pos.distance_sq(home) <= radius_sq)
            .map(|(pos, _)| pos)
            .collect();

        mining_tiles.sort_by_key(|pos| (pos.distance_sq(home), pos.y, pos.x));

        let bid = mining_tiles.len().min(MAX_BID) as u8;

        let mut strategy = StrategyState::new(ctx.symmetry, ctx.features.strategy.presence_decay);
        strategy.record_friendly_castle(ctx.id, home);
        strategy.record_bid(ctx.id, bid);

        CastleContext {
            strategy,
            assembler: StatusAssembler::new(),
            announced: false,
            bid,
            mining_tiles,
            assigned: BTreeSet::new(),
            founded: Vec::new(),
            pilgrims_built: 0,
            miners_built: 0,
            military_built: 0,
            rush_built: 0,
            alarm: None,
            charged: false,
        }
    }

    /// Reads the status channel and folds this turn's beliefs into strategy.
    fn observe<H: Host + ?Sized>(&mut self, tick: &TickContext<H>, ctx: &UnitContext, sweep: &SweepSummary) {
        let robots = tick.host.visible_robots();

        for robot in robots.iter().filter(|r| r.id != ctx.id) {
            let message = match robot.castle_talk {
                Some(value) => StatusMessage::decode(value),
                None => continue,
            };

            match message {
                StatusMessage::Bid(bid) => self.strategy.record_bid(robot.id, bid),
                other => {
                    if let Some(pos) = self.assembler.accept(robot.id, other) {
                        info!("Castle {} announced at {}", robot.id, pos);

                        self.strategy.record_friendly_castle(robot.id, pos);
                    }
                }
            }
        }

        let present: HashSet<u32> = robots.iter().map(|r| r.id).collect();
        self.assembler.retain_senders(|id| present.contains(&id));

        let seen: Vec<(u32, Position)> = ctx.knowledge.structures_of(ctx.team, UnitType::Castle).collect();

        for (id, pos) in seen {
            self.strategy.record_friendly_castle(id, pos);
        }

        for id in sweep.terminated.iter() {
            if self.strategy.friendly_castles().contains_key(id) {
                info!("Friendly castle {} destroyed", id);

                self.strategy.forget_friendly_castle(*id);
            }
        }

        self.strategy
            .update(ctx.team, &ctx.knowledge, &tick.inbox, tick.host.visible_robot_map());
    }

    fn visible_hostiles<'a>(&self, turn: u32, ctx: &'a UnitContext) -> Vec<&'a EntityRecord> {
        ctx.knowledge
            .hostiles_near(ctx.team, ctx.home, ctx.features.military.threat_radius_sq)
            .filter(|e| e.last_position_turn == Some(turn))
            .collect()
    }

    fn threatened<H: Host + ?Sized>(&self, tick: &TickContext<H>, ctx: &UnitContext) -> bool {
        let danger = self.strategy.presence.danger_at(ctx.home);

        danger > ctx.features.strategy.danger_threshold
            || self
                .visible_hostiles(tick.me.turn, ctx)
                .iter()
                .any(|e| e.unit.is_military())
    }

    /// Names the nearest attacker to the defenders, asks them to push out
    /// civilians, or stands them down once the area is clear.
    fn signal_defense<H: Host + ?Sized>(&mut self, tick: &TickContext<H>, ctx: &mut UnitContext) {
        let home = ctx.home;
        let hostiles = self.visible_hostiles(tick.me.turn, ctx);

        let nearest_military = hostiles
            .iter()
            .filter(|e| e.unit.is_military())
            .min_by_key(|e| (e.position.map(|p| p.distance_sq(home)), e.id))
            .map(|e| e.id);

        let nearest_civilian = hostiles
            .iter()
            .filter_map(|e| e.position)
            .min_by_key(|pos| (pos.distance_sq(home), pos.y, pos.x));

        let (message, alarm) = match (nearest_military, nearest_civilian) {
            (Some(id), _) => (RadioMessage::TargetList { clear: false, target: id }, Some(id)),
            (None, Some(position)) => (RadioMessage::Repulse { position }, self.alarm),
            (None, None) if self.alarm.is_some() => (RadioMessage::TargetList { clear: true, target: 0 }, None),
            _ => return,
        };

        match ctx
            .outboxes
            .send_radio(message.priority(), &[message], ctx.features.military.signal_radius_sq)
        {
            Ok(true) => self.alarm = alarm,
            Ok(false) => {}
            Err(err) => warn!("Unable to signal {:?}: {}", message, err),
        }
    }

    /// Late in the game the leader sends every military unit at the enemy.
    fn signal_charge<H: Host + ?Sized>(&mut self, tick: &TickContext<H>, ctx: &mut UnitContext) -> Result<(), TurnError> {
        if self.charged || tick.me.turn < ctx.features.military.charge_turn || !self.strategy.is_leader(ctx.id) {
            return Ok(());
        }

        let direction = self
            .strategy
            .nearest_enemy_castle(ctx.home)
            .and_then(|target| {
                let (dx, dy) = ctx.home.delta_to(target);
                Direction::approximate(dx, dy)
            });

        if let Some(direction) = direction {
            let passable = tick.host.passable_map();
            let radius_sq = passable.width() * passable.width() + passable.height() * passable.height();
            let message = RadioMessage::Charge {
                units: UnitMask::MILITARY,
                direction,
            };

            self.charged = ctx.outboxes.send_radio(message.priority(), &[message], radius_sq)?;

            if self.charged {
                info!("Castle {} orders a charge {:?}", ctx.id, direction);
            }
        }

        Ok(())
    }

    fn next_mining_tile(&mut self) -> Option<Position> {
        if self.mining_tiles.iter().all(|t| self.assigned.contains(t)) {
            self.assigned.clear();
        }

        self.mining_tiles.iter().copied().find(|t| !self.assigned.contains(t))
    }

    /// Builds a miner, or every few pilgrims a scout, while under `limit`.
    fn build_pilgrim<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext, limit: u32) -> Result<bool, TurnError> {
        if self.miners_built >= limit {
            return Ok(false);
        }

        let scout_every = ctx.features.economy.scout_every;
        let scouting = scout_every > 0 && (self.pilgrims_built + 1) % scout_every == 0;

        let scout_target = if scouting {
            self.strategy.nearest_enemy_castle(ctx.home)
        } else {
            None
        };

        if let Some(target) = scout_target {
            let order = RadioMessage::TargetOnConstruct {
                mirror: false,
                position: target,
            };

            if try_build(tick, ctx, UnitType::Pilgrim, Some(target), Some(order))? {
                self.pilgrims_built += 1;
                return Ok(true);
            }

            return Ok(false);
        }

        let tile = match self.next_mining_tile() {
            Some(tile) => tile,
            None => return Ok(false),
        };

        let order = RadioMessage::Order {
            kind: OrderKind::Mine,
            position: tile,
        };

        if try_build(tick, ctx, UnitType::Pilgrim, Some(tile), Some(order))? {
            self.pilgrims_built += 1;
            self.miners_built += 1;
            self.assigned.insert(tile);

            return Ok(true);
        }

        Ok(false)
    }

    /// Sends a pilgrim to found a church at the best unserved cluster.
    fn build_founder<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<bool, TurnError> {
        let economy = &ctx.features.economy;

        if self.founded.len() as u32 >= economy.max_churches {
            return Ok(false);
        }

        if !tick.host.team_resources().can_afford(&tick.host.stats(UnitType::Church)) {
            return Ok(false);
        }

        let mut served = ctx.dropoffs();
        served.extend(self.founded.iter().copied());

        let candidates = church_site_candidates(
            &ctx.resources,
            &pathing_map(tick.host),
            &served,
            economy.church_site_radius_sq,
            economy.church_distance_sq,
        );

        let site = match self.strategy.select_expansion_site(ctx.team, ctx.home, &candidates) {
            Some(site) => site,
            None => return Ok(false),
        };

        let order = RadioMessage::Order {
            kind: OrderKind::Construct,
            position: site,
        };

        if try_build(tick, ctx, UnitType::Pilgrim, Some(site), Some(order))? {
            info!("Castle {} sends a founder to {}", ctx.id, site);

            self.pilgrims_built += 1;
            self.founded.push(site);

            return Ok(true);
        }

        Ok(false)
    }

    fn negotiate<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<CastleState>, TurnError> {
        if !self.announced {
            let [x, y] = StatusMessage::position(ctx.home)?;

            self.announced = ctx
                .outboxes
                .send_status(MESSAGE_PRIORITY_MEDIUM, &[x, y, StatusMessage::Bid(self.bid)])?;
        }

        let age = tick.me.turn.saturating_sub(ctx.spawn_turn);

        if age >= ctx.features.strategy.leadership_turns {
            let leader = self.strategy.resolve_leadership();

            info!(
                "Castle {} sees {} castles, leader {:?}",
                ctx.id,
                self.strategy.friendly_castles().len(),
                leader
            );

            let rush_target = self
                .strategy
                .nearest_enemy_castle(ctx.home)
                .and_then(|pos| ctx.travel.turns_to(pos))
                .filter(|turns| *turns <= ctx.features.strategy.rush_distance_turns);

            if let Some(turns) = rush_target {
                info!("Enemy castle {} turns away, rushing", turns);

                return Ok(Some(CastleState::Rush));
            }

            return Ok(Some(CastleState::HoldEconomy));
        }

        self.build_pilgrim(tick, ctx, 1)?;

        Ok(None)
    }

    fn rush<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<CastleState>, TurnError> {
        let target = match self.strategy.nearest_enemy_castle(ctx.home) {
            Some(target) if self.rush_built < ctx.features.strategy.rush_units => target,
            _ => return Ok(Some(CastleState::HoldEconomy)),
        };

        let order = RadioMessage::TargetOnConstruct {
            mirror: true,
            position: target,
        };

        if try_build(tick, ctx, UnitType::Prophet, Some(target), Some(order))? {
            self.rush_built += 1;
            self.military_built += 1;
        }

        Ok(None)
    }

    fn hold_economy<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<CastleState>, TurnError> {
        if self.threatened(tick, ctx) {
            info!("Castle {} threatened, arming", ctx.id);

            return Ok(Some(CastleState::AwaitRush));
        }

        let quota = self.strategy.pilgrim_quota(ctx.id, ctx.features.economy.max_pilgrims);

        if self.build_pilgrim(tick, ctx, quota)? || self.build_founder(tick, ctx)? {
            return Ok(None);
        }

        if self.military_built < ctx.features.military.defenders_per_castle
            && try_build(tick, ctx, UnitType::Prophet, None, None)?
        {
            self.military_built += 1;
        }

        Ok(None)
    }

    fn await_rush<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<CastleState>, TurnError> {
        let danger = self.strategy.presence.danger_at(ctx.home);

        if !self.threatened(tick, ctx) && danger < ctx.features.strategy.danger_threshold / 2.0 {
            info!("Castle {} no longer threatened", ctx.id);

            return Ok(Some(CastleState::HoldEconomy));
        }

        let nearest = self
            .visible_hostiles(tick.me.turn, ctx)
            .iter()
            .filter_map(|e| e.position)
            .min_by_key(|pos| pos.distance_sq(ctx.home));

        if try_build(tick, ctx, UnitType::Prophet, nearest, None)? {
            self.military_built += 1;
        }

        Ok(None)
    }
}

pub struct CastleController {
    state: CastleState,
    context: CastleContext,
}

impl CastleController {
    pub fn new(ctx: &UnitContext) -> CastleController {
        CastleController {
            state: CastleState::NegotiateLeadership,
            context: CastleContext::new(ctx),
        }
    }

    pub fn state(&self) -> CastleState {
        self.state
    }

    pub fn strategy(&self) -> &StrategyState {
        &self.context.strategy
    }

    pub fn tick<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext, sweep: &SweepSummary) -> Result<(), TurnError> {
        self.context.observe(tick, ctx, sweep);

        try_attack(tick, ctx);

        // Orders go out before building so that a build never relies on a
        // message that is then displaced.
        self.context.signal_defense(tick, ctx);
        self.context.signal_charge(tick, ctx)?;

        let context = &mut self.context;

        run_state_machine(&mut self.state, "Castle", |state| state.tick(context, tick, ctx))?;

        if self.state != CastleState::NegotiateLeadership {
            ctx.heartbeat(self.state.index())?;
        }

        Ok(())
    }
}
