use super::*;
use crate::host::Direction;
use crate::pathing::NavigationMode;
use crate::protocol::*;
use crate::tactics::{adjacent_tiles, attack_positions, select_idle_position};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MilitaryState {
    /// Stand on the defensive lattice around the anchor.
    Hold,
    /// Advance on a location: a mirrored enemy castle or a reported intruder.
    TargetMirror { target: Position },
    /// Hunt a specific enemy named by a castle.
    TargetList { target: u32 },
    Home,
    Charge { direction: Direction },
}

impl MilitaryState {
    pub fn index(self) -> u8 {
        match self {
            MilitaryState::Hold => 0,
            MilitaryState::TargetMirror { .. } => 1,
            MilitaryState::TargetList { .. } => 2,
            MilitaryState::Home => 3,
            MilitaryState::Charge { .. } => 4,
        }
    }

    /// Orders below this priority do not interrupt the state.
    fn priority(self) -> u32 {
        match self {
            MilitaryState::Hold => MESSAGE_PRIORITY_LOW,
            MilitaryState::Home => MESSAGE_PRIORITY_MEDIUM,
            MilitaryState::TargetMirror { .. } => MESSAGE_PRIORITY_MEDIUM + 5,
            MilitaryState::TargetList { .. } => MESSAGE_PRIORITY_HIGH + 5,
            MilitaryState::Charge { .. } => MESSAGE_PRIORITY_CRITICAL,
        }
    }

    fn tick<H: Host + ?Sized>(
        &mut self,
        military: &mut MilitaryContext,
        tick: &mut TickContext<H>,
        ctx: &mut UnitContext,
    ) -> Result<Option<MilitaryState>, TurnError> {
        match *self {
            MilitaryState::Hold => military.hold(tick, ctx),
            MilitaryState::TargetMirror { target } => military.target_location(target, tick, ctx),
            MilitaryState::TargetList { target } => military.target_entity(target, tick, ctx),
            MilitaryState::Home => military.home(tick, ctx),
            MilitaryState::Charge { direction } => military.charge(direction, tick, ctx),
        }
    }
}

pub struct MilitaryContext {
    anchor: Position,
}

impl MilitaryContext {
    fn hold<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<MilitaryState>, TurnError> {
        let strategy = &ctx.features.strategy;
        let me = tick.me.position;

        let post = select_idle_position(
            me,
            self.anchor,
            &pathing_map(tick.host),
            &ctx.resources,
            strategy.lattice_spacing,
            strategy.lattice_max_radius_sq,
        );

        if let Some(post) = post.filter(|post| *post != me) {
            try_move_to(tick, ctx, &[post]);
        }

        Ok(None)
    }

    fn target_location<H: Host + ?Sized>(
        &mut self,
        target: Position,
        tick: &mut TickContext<H>,
        ctx: &mut UnitContext,
    ) -> Result<Option<MilitaryState>, TurnError> {
        // Visible and free of enemies: nothing left to fight there.
        let cleared = match tick.host.visible_robot_map().get(target).copied() {
            Some(0) => true,
            Some(id) if id > 0 => ctx.knowledge.get(id as u32).map(|e| e.team == ctx.team).unwrap_or(false),
            _ => false,
        };

        if cleared {
            info!("{:?} {} found {} clear", ctx.unit, ctx.id, target);

            return Ok(Some(MilitaryState::Home));
        }

        let stats = tick.host.stats(ctx.unit);
        let goals = attack_positions(tick.me.position, target, &stats, &pathing_map(tick.host));

        if !goals.contains(&tick.me.position) {
            try_move_to(tick, ctx, &goals);
        }

        Ok(None)
    }

    fn target_entity<H: Host + ?Sized>(&mut self, target: u32, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<MilitaryState>, TurnError> {
        let position = match ctx.knowledge.get(target).and_then(|e| e.position) {
            Some(position) => position,
            None => return Ok(Some(MilitaryState::Home)),
        };

        let stats = tick.host.stats(ctx.unit);
        let goals = attack_positions(tick.me.position, position, &stats, &pathing_map(tick.host));

        if !goals.contains(&tick.me.position) {
            try_move_to(tick, ctx, &goals);
        }

        Ok(None)
    }

    fn home<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<MilitaryState>, TurnError> {
        let me = tick.me.position;

        if me.distance_sq(self.anchor) <= ctx.features.military.home_radius_sq {
            return Ok(Some(MilitaryState::Hold));
        }

        if !tick.has_acted() {
            let goals = adjacent_tiles(me, &[self.anchor], &pathing_map(tick.host));

            if let Some((dx, dy)) = ctx.navigate_with_mode(tick.host, &goals, NavigationMode::Fastest) {
                tick.act(Action::Move { dx, dy });
            }
        }

        Ok(None)
    }

    fn charge<H: Host + ?Sized>(&mut self, direction: Direction, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<Option<MilitaryState>, TurnError> {
        let me = tick.me.position;
        let target = ctx.symmetry.mirror(ctx.home);
        let stats = tick.host.stats(ctx.unit);
        let map = pathing_map(tick.host);

        let goals = attack_positions(me, target, &stats, &map);

        if goals.contains(&me) || try_move_to(tick, ctx, &goals) || tick.has_acted() {
            return Ok(None);
        }

        // No route: push one tile along the ordered heading.
        let (dx, dy) = direction.delta();
        let fuel = tick.host.team_resources().fuel;

        if map.is_open(me.offset(dx, dy), false) && fuel >= stats.move_fuel((dx * dx + dy * dy) as u32) {
            tick.act(Action::Move { dx, dy });
        }

        Ok(None)
    }
}

pub struct MilitaryController {
    state: MilitaryState,
    context: MilitaryContext,
}

impl MilitaryController {
    pub fn new(ctx: &UnitContext) -> MilitaryController {
        MilitaryController {
            state: MilitaryState::Hold,
            context: MilitaryContext { anchor: ctx.home },
        }
    }

    pub fn state(&self) -> MilitaryState {
        self.state
    }

    pub fn anchor(&self) -> Position {
        self.context.anchor
    }

    /// The state and anchor an order asks for, if it concerns this unit.
    fn interpret(&self, message: &RadioMessage, first_turn: bool, ctx: &UnitContext) -> Option<(MilitaryState, Position)> {
        let anchor = self.context.anchor;

        match *message {
            RadioMessage::Charge { units, direction } if units.includes(ctx.unit) => Some((MilitaryState::Charge { direction }, anchor)),
            RadioMessage::TargetList { clear: false, target } => Some((MilitaryState::TargetList { target }, anchor)),
            RadioMessage::TargetList { clear: true, .. } => match self.state {
                MilitaryState::TargetList { .. } => Some((MilitaryState::Home, anchor)),
                _ => None,
            },
            RadioMessage::Repulse { position } => Some((MilitaryState::TargetMirror { target: position }, anchor)),
            RadioMessage::Hold { position } => Some((MilitaryState::Hold, position)),
            RadioMessage::TargetOnConstruct { mirror: true, position } if first_turn => {
                Some((MilitaryState::TargetMirror { target: position }, anchor))
            }
            RadioMessage::TargetOnConstruct { mirror: false, position } if first_turn => Some((MilitaryState::Hold, position)),
            RadioMessage::ScoutReport { hostile: true, position }
                if position.distance_sq(anchor) <= ctx.features.military.threat_radius_sq =>
            {
                Some((MilitaryState::TargetMirror { target: position }, anchor))
            }
            _ => None,
        }
    }

    /// Applies the highest priority order heard this turn that outranks the
    /// current state.
    fn react<H: Host + ?Sized>(&mut self, tick: &TickContext<H>, ctx: &UnitContext) {
        let first_turn = tick.is_first_turn(ctx);

        let order = tick
            .inbox
            .iter()
            .filter(|(_, message)| message.priority() >= self.state.priority())
            .find_map(|(sender, message)| self.interpret(message, first_turn, ctx).map(|order| (*sender, order)));

        if let Some((sender, (state, anchor))) = order {
            if state != self.state || anchor != self.context.anchor {
                info!("{:?} {} ordered by {}: {:?} -> {:?}", ctx.unit, ctx.id, sender, self.state, state);

                self.state = state;
                self.context.anchor = anchor;
            }
        }
    }

    pub fn tick<H: Host + ?Sized>(&mut self, tick: &mut TickContext<H>, ctx: &mut UnitContext) -> Result<(), TurnError> {
        self.react(tick, ctx);

        try_attack(tick, ctx);
        try_dodge(tick, ctx);

        let context = &mut self.context;

        run_state_machine(&mut self.state, "Military", |state| state.tick(context, tick, ctx))?;

        ctx.heartbeat(self.state.index())?;

        Ok(())
    }
}
