//! Per-role decision procedures. Each role is an enum state machine whose
//! states act through a shared `TickContext` and hand back the next state.

pub mod castle;
pub mod church;
pub mod military;
pub mod pilgrim;

pub use castle::*;
pub use church::*;
pub use military::*;
pub use pilgrim::*;

use crate::constants::ADJACENT_RADIUS_SQ;
use crate::context::{pathing_map, UnitContext};
use crate::error::TurnError;
use crate::host::{Action, Host, Position, SelfState, UnitType};
use crate::knowledge::SweepSummary;
use crate::protocol::{Inbox, RadioMessage};
use crate::tactics::{select_attack_target, select_build_site, select_dodge, select_splash_target};
use log::*;

const MAX_STATE_TRANSITIONS: u32 = 20;

/// Ticks `state` until it stops transitioning, bounded per turn.
pub fn run_state_machine<S, F>(state: &mut S, label: &str, mut tick_fn: F) -> Result<(), TurnError>
where
    F: FnMut(&mut S) -> Result<Option<S>, TurnError>,
{
    let mut transitions = 0u32;

    while let Some(new_state) = tick_fn(state)? {
        *state = new_state;
        transitions += 1;

        if transitions >= MAX_STATE_TRANSITIONS {
            error!(
                "State machine '{}' exceeded {} transitions in a single tick, breaking to prevent infinite loop",
                label, MAX_STATE_TRANSITIONS
            );
            break;
        }
    }

    Ok(())
}

/// What a state tick sees of the current turn. At most one action is taken.
pub struct TickContext<'a, H: Host + ?Sized> {
    pub host: &'a H,
    pub me: SelfState,
    pub inbox: Inbox,
    action: Option<Action>,
}

impl<'a, H: Host + ?Sized> TickContext<'a, H> {
    pub fn new(host: &'a H, ctx: &UnitContext) -> TickContext<'a, H> {
        let me = host.me();
        let inbox = ctx.inbox(me.turn).cloned().unwrap_or_default();

        TickContext {
            host,
            me,
            inbox,
            action: None,
        }
    }

    /// Takes `action` unless one was already taken this turn.
    pub fn act(&mut self, action: Action) -> bool {
        if self.action.is_some() {
            return false;
        }

        debug!("{:?} {} acts: {:?}", self.me.unit, self.me.id, action);

        self.action = Some(action);

        true
    }

    pub fn has_acted(&self) -> bool {
        self.action.is_some()
    }

    pub fn into_action(self) -> Option<Action> {
        self.action
    }

    pub fn is_first_turn(&self, ctx: &UnitContext) -> bool {
        self.me.turn == ctx.spawn_turn
    }
}

pub enum RoleController {
    Castle(CastleController),
    Church(ChurchController),
    Pilgrim(PilgrimController),
    Military(MilitaryController),
}

impl RoleController {
    pub fn for_unit(ctx: &UnitContext) -> RoleController {
        match ctx.unit {
            UnitType::Castle => RoleController::Castle(CastleController::new(ctx)),
            UnitType::Church => RoleController::Church(ChurchController::new(ctx)),
            UnitType::Pilgrim => RoleController::Pilgrim(PilgrimController::new(ctx)),
            UnitType::Crusader | UnitType::Prophet | UnitType::Preacher => RoleController::Military(MilitaryController::new(ctx)),
        }
    }

    pub fn tick<H: Host + ?Sized>(&mut self, host: &H, ctx: &mut UnitContext, sweep: &SweepSummary) -> Result<Option<Action>, TurnError> {
        let mut tick = TickContext::new(host, ctx);

        match self {
            RoleController::Castle(castle) => castle.tick(&mut tick, ctx, sweep)?,
            RoleController::Church(church) => church.tick(&mut tick, ctx)?,
            RoleController::Pilgrim(pilgrim) => pilgrim.tick(&mut tick, ctx)?,
            RoleController::Military(military) => military.tick(&mut tick, ctx)?,
        }

        Ok(tick.into_action())
    }

    pub fn status_description(&self) -> String {
        match self {
            RoleController::Castle(castle) => format!("Castle - {:?}", castle.state()),
            RoleController::Church(_) => "Church".to_string(),
            RoleController::Pilgrim(pilgrim) => format!("Pilgrim - {:?}", pilgrim.state()),
            RoleController::Military(military) => format!("Military - {:?}", military.state()),
        }
    }
}

/// Attacks the best enemy in range, if the team can pay for it.
pub fn try_attack<H: Host + ?Sized>(tick: &mut TickContext<H>, ctx: &mut UnitContext) -> bool {
    if tick.has_acted() || !ctx.unit.can_attack() {
        return false;
    }

    let stats = tick.host.stats(ctx.unit);

    if tick.host.team_resources().fuel < stats.attack_fuel_cost {
        return false;
    }

    let from = tick.me.position;

    let target = if ctx.unit == UnitType::Preacher {
        let occupants = ctx.occupants(tick.host);

        select_splash_target(&stats, from, ctx.team, &occupants, tick.host.passable_map()).map(|(pos, _)| pos)
    } else {
        let targets = ctx.attack_targets(tick.host);

        select_attack_target(ctx.unit, &stats, from, &targets).map(|t| t.position)
    };

    match target {
        Some(pos) => {
            let (dx, dy) = from.delta_to(pos);

            ctx.record_attack(tick.host, dx, dy);

            tick.act(Action::Attack { dx, dy })
        }
        None => false,
    }
}

/// Steps out of next turn's threat when that is strictly safer.
pub fn try_dodge<H: Host + ?Sized>(tick: &mut TickContext<H>, ctx: &mut UnitContext) -> bool {
    if tick.has_acted() {
        return false;
    }

    let mover = ctx.navigator.mover().clone();
    let fuel = tick.host.team_resources().fuel;
    let map = pathing_map(tick.host);

    match select_dodge(tick.me.position, &mover, &map, ctx.damage(tick.host), fuel) {
        Some((dx, dy)) => {
            info!("{:?} {} dodging from {}", ctx.unit, ctx.id, tick.me.position);

            tick.act(Action::Move { dx, dy })
        }
        None => false,
    }
}

pub fn try_move_to<H: Host + ?Sized>(tick: &mut TickContext<H>, ctx: &mut UnitContext, goals: &[Position]) -> bool {
    if tick.has_acted() || goals.is_empty() {
        return false;
    }

    match ctx.navigate_to(tick.host, goals) {
        Some((dx, dy)) => tick.act(Action::Move { dx, dy }),
        None => false,
    }
}

/// Builds `unit` on an adjacent tile. When `order` is given it is radioed to
/// the new unit, and the build only goes ahead if that message won the radio.
pub fn try_build<H: Host + ?Sized>(
    tick: &mut TickContext<H>,
    ctx: &mut UnitContext,
    unit: UnitType,
    prefer: Option<Position>,
    order: Option<RadioMessage>,
) -> Result<bool, TurnError> {
    if tick.has_acted() {
        return Ok(false);
    }

    let stats = tick.host.stats(unit);

    if !tick.host.team_resources().can_afford(&stats) {
        return Ok(false);
    }

    let map = pathing_map(tick.host);

    let site = match select_build_site(tick.me.position, &map, &ctx.resources, prefer) {
        Some(site) => site,
        None => return Ok(false),
    };

    if let Some(order) = order {
        if !ctx.outboxes.send_radio(order.priority(), &[order], ADJACENT_RADIUS_SQ)? {
            debug!("Postponing {:?} build: order {:?} lost the radio", unit, order);
            return Ok(false);
        }
    }

    let (dx, dy) = tick.me.position.delta_to(site);

    Ok(tick.act(Action::Build { unit, dx, dy }))
}
