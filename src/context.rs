//! State a unit carries from turn to turn, and the per-turn views derived
//! from it.

use crate::cache::TurnCached;
use crate::constants::ADJACENT_RADIUS_SQ;
use crate::error::TurnError;
use crate::features::Features;
use crate::grid::Grid;
use crate::host::{Host, Position, RobotInfo, Team, UnitType};
use crate::knowledge::{SweepSummary, WorldKnowledge};
use crate::pathing::*;
use crate::protocol::{Inbox, Outboxes, StatusMessage, MESSAGE_PRIORITY_LOW};
use crate::strategy::MapSymmetry;
use crate::tactics::{Attacker, DamageField, Occupant, Target};
use log::*;

pub struct UnitContext {
    pub id: u32,
    pub team: Team,
    pub unit: UnitType,
    pub features: Features,
    pub knowledge: WorldKnowledge,
    pub navigator: Navigator,
    pub outboxes: Outboxes,
    pub budget: SearchBudget,
    /// Travel turns from the spawn tile, ignoring robots.
    pub travel: TravelEstimates,
    pub symmetry: MapSymmetry,
    /// Karbonite or fuel on the tile.
    pub resources: Grid<bool>,
    /// The structure this unit was built by, or its own tile for structures.
    pub home: Position,
    pub home_id: Option<u32>,
    pub spawn_turn: u32,
    inbox: TurnCached<Inbox>,
    damage: TurnCached<DamageField>,
}

impl UnitContext {
    pub fn new<H: Host + ?Sized>(host: &H, features: Features) -> UnitContext {
        let me = host.me();
        let passable = host.passable_map();
        let karbonite = host.karbonite_map();
        let fuel = host.fuel_map();

        let mover = Mover::from_stats(&host.stats(me.unit));

        // Structures never move; estimate distances as a crusader would cover them.
        let travel = if mover.can_move() {
            TravelEstimates::compute(me.position, &mover, passable)
        } else {
            TravelEstimates::compute(me.position, &Mover::from_stats(&host.stats(UnitType::Crusader)), passable)
        };

        let (home, home_id) = if me.unit.is_structure() {
            (me.position, Some(me.id))
        } else {
            host.visible_robots()
                .iter()
                .filter(|r| r.team == Some(me.team) && r.unit.map(|u| u.is_structure()).unwrap_or(false))
                .filter_map(|r| r.position.map(|pos| (pos, r.id)))
                .filter(|(pos, _)| pos.distance_sq(me.position) <= ADJACENT_RADIUS_SQ)
                .min_by_key(|(pos, id)| (pos.distance_sq(me.position), *id))
                .map(|(pos, id)| (pos, Some(id)))
                .unwrap_or((me.position, None))
        };

        info!("{:?} {} spawned at {} (home {})", me.unit, me.id, me.position, home);

        UnitContext {
            id: me.id,
            team: me.team,
            unit: me.unit,
            budget: SearchBudget::from_features(&features.pathing),
            features,
            knowledge: WorldKnowledge::new(),
            navigator: Navigator::new(mover),
            outboxes: Outboxes::new(),
            travel,
            symmetry: MapSymmetry::detect(passable, karbonite, fuel),
            resources: Grid::from_fn(passable.width(), passable.height(), |pos| {
                karbonite.is_set(pos) || fuel.is_set(pos)
            }),
            home,
            home_id,
            spawn_turn: me.turn,
            inbox: TurnCached::new(),
            damage: TurnCached::new(),
        }
    }

    /// Folds this turn's robot list into knowledge and refreshes the turn
    /// caches. Only castles hear everyone and may infer deaths by absence.
    pub fn perceive<H: Host + ?Sized>(&mut self, host: &H) -> SweepSummary {
        let me = host.me();
        let rollcall = if me.unit == UnitType::Castle { Some(me.team) } else { None };

        let summary = self.knowledge.reconcile_perception_sweep(
            me.turn,
            me.position,
            host.visible_robots(),
            host.visible_robot_map(),
            RobotInfo::is_visible,
            RobotInfo::is_radioing,
            rollcall,
        );

        self.inbox.insert(me.turn, Inbox::from_robots(host.visible_robots(), me.id, me.team));

        summary
    }

    /// Messages heard this turn, if the sweep has run.
    pub fn inbox(&self, turn: u32) -> Option<&Inbox> {
        self.inbox.get(turn)
    }

    /// Next-turn threat map, built from knowledge on first use each turn.
    pub fn damage<H: Host + ?Sized>(&mut self, host: &H) -> &DamageField {
        let turn = host.me().turn;
        let (knowledge, team) = (&self.knowledge, self.team);

        self.damage
            .get_or_insert_with(turn, || build_damage_field(knowledge, team, host, turn))
    }

    /// Drops everything that assumed the previous turn went through.
    pub fn reset_turn_state(&mut self) {
        self.navigator.reset();
        self.outboxes.clear();
        self.inbox.expire();
        self.damage.expire();
    }

    pub fn route_options<H: Host + ?Sized>(&self, host: &H) -> Option<RouteOptions> {
        self.budget.options(host.time_remaining_ms())
    }

    /// Steps towards the nearest of `goals` using the configured mode and
    /// the team's fuel.
    pub fn navigate_to<H: Host + ?Sized>(&mut self, host: &H, goals: &[Position]) -> Option<(i32, i32)> {
        let mode = self.features.pathing.default_mode;
        self.navigate_with_mode(host, goals, mode)
    }

    pub fn navigate_with_mode<H: Host + ?Sized>(&mut self, host: &H, goals: &[Position], mode: NavigationMode) -> Option<(i32, i32)> {
        let me = host.me();
        let options = self.route_options(host);
        let fuel = host.team_resources().fuel;
        let map = pathing_map(host);

        self.navigator.navigate(me.position, goals, mode, &map, fuel, options)
    }

    /// Visible enemies with their best known remaining health.
    pub fn attack_targets<H: Host + ?Sized>(&self, host: &H) -> Vec<Target> {
        host.visible_robots()
            .iter()
            .filter(|r| r.team == Some(self.team.opposite()))
            .filter_map(|r| {
                let (position, unit) = (r.position?, r.unit?);
                let stats = host.stats(unit);
                let health = r
                    .health
                    .or_else(|| self.knowledge.remaining_health(r.id, &stats))
                    .unwrap_or(stats.max_health);

                Some(Target {
                    id: r.id,
                    position,
                    unit,
                    health,
                })
            })
            .collect()
    }

    pub fn occupants<H: Host + ?Sized>(&self, host: &H) -> Vec<Occupant> {
        host.visible_robots()
            .iter()
            .filter_map(|r| {
                Some(Occupant {
                    position: r.position?,
                    team: r.team?,
                    unit: r.unit?,
                })
            })
            .collect()
    }

    /// Books the damage of an attack this unit is about to make.
    pub fn record_attack<H: Host + ?Sized>(&mut self, host: &H, dx: i32, dy: i32) {
        let me = host.me();
        let target = me.position.offset(dx, dy);
        let damage = host.stats(me.unit).attack_damage;

        match host.visible_robot_map().get(target) {
            Some(id) if *id > 0 => {
                if let Err(err) = self.knowledge.apply_damage(*id as u32, damage) {
                    debug!("Attack on untracked robot: {}", err);
                }
            }
            _ => {}
        }
    }

    /// Friendly castles and churches that accept resources.
    pub fn dropoffs(&self) -> Vec<Position> {
        let mut dropoffs: Vec<Position> = self
            .knowledge
            .structures_of(self.team, UnitType::Castle)
            .chain(self.knowledge.structures_of(self.team, UnitType::Church))
            .map(|(_, pos)| pos)
            .collect();

        if self.home_id.is_some() && !dropoffs.contains(&self.home) {
            dropoffs.push(self.home);
        }

        dropoffs.sort_by_key(|pos| (pos.y, pos.x));
        dropoffs
    }

    /// Reports this unit and its state to the castles.
    pub fn heartbeat(&mut self, state: u8) -> Result<bool, TurnError> {
        let message = StatusMessage::Heartbeat { unit: self.unit, state };

        Ok(self.outboxes.send_status(MESSAGE_PRIORITY_LOW, &[message])?)
    }
}

fn build_damage_field<H: Host + ?Sized>(knowledge: &WorldKnowledge, team: Team, host: &H, turn: u32) -> DamageField {
    let passable = host.passable_map();

    // Mobile attackers seen more than a turn ago are too uncertain to dodge.
    let attackers: Vec<Attacker> = knowledge
        .units_of(team.opposite())
        .filter(|e| e.unit.can_attack())
        .filter(|e| e.is_structure() || e.last_position_turn.map(|t| t + 1 >= turn).unwrap_or(false))
        .filter_map(|e| e.position.map(|position| Attacker { position, unit: e.unit }))
        .collect();

    DamageField::build(passable.width(), passable.height(), &attackers, |unit| host.stats(unit), true)
}

/// Terrain plus this turn's occupancy.
pub fn pathing_map<H: Host + ?Sized>(host: &H) -> PathingMap<'_> {
    PathingMap::new(host.passable_map()).with_occupancy(host.visible_robot_map())
}
