//! Per-unit belief store fusing direct vision and radio reports.
//!
//! Direct vision is authoritative. Radio reports are provisional: they can
//! create entities and move units, but never override an established identity.
//! Structures are pinned to the first position ever recorded for them.

use crate::error::KnowledgeError;
use crate::grid::Grid;
use crate::host::{Position, RobotInfo, Team, UnitStats, UnitType};
use crate::protocol::{RadioMessage, StatusMessage};
use log::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u32,
    pub team: Team,
    pub unit: UnitType,
    pub position: Option<Position>,
    pub last_position_turn: Option<u32>,
    /// Whether the current position came from direct vision.
    pub position_trusted: bool,
    pub damage_observed: Option<u32>,
    pub last_reported_turn: Option<u32>,
}

impl EntityRecord {
    fn new(id: u32, team: Team, unit: UnitType) -> EntityRecord {
        EntityRecord {
            id,
            team,
            unit,
            position: None,
            last_position_turn: None,
            position_trusted: false,
            damage_observed: None,
            last_reported_turn: None,
        }
    }

    pub fn is_structure(&self) -> bool {
        self.unit.is_structure()
    }
}

pub type EntityObserver = Box<dyn FnMut(&EntityRecord)>;

/// Outcome of one perception sweep.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub sighted: Vec<u32>,
    pub terminated: Vec<u32>,
}

#[derive(Default)]
pub struct WorldKnowledge {
    entities: BTreeMap<u32, EntityRecord>,
    structures: HashMap<u32, Position>,
    spawn_observer: Option<EntityObserver>,
    termination_observer: Option<EntityObserver>,
    last_sweep_turn: Option<u32>,
}

impl WorldKnowledge {
    pub fn new() -> WorldKnowledge {
        WorldKnowledge::default()
    }

    /// Registers the first-sighting callback, replacing any previous one.
    pub fn set_spawn_observer(&mut self, observer: EntityObserver) {
        self.spawn_observer = Some(observer);
    }

    /// Registers the termination callback, replacing any previous one.
    pub fn set_termination_observer(&mut self, observer: EntityObserver) {
        self.termination_observer = Some(observer);
    }

    pub fn get(&self, id: u32) -> Option<&EntityRecord> {
        self.entities.get(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Positioned structures by id.
    pub fn structures(&self) -> &HashMap<u32, Position> {
        &self.structures
    }

    pub fn last_sweep_turn(&self) -> Option<u32> {
        self.last_sweep_turn
    }

    pub fn units_of(&self, team: Team) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values().filter(move |e| e.team == team)
    }

    pub fn structures_of(&self, team: Team, unit: UnitType) -> impl Iterator<Item = (u32, Position)> + '_ {
        self.structures
            .iter()
            .filter(move |(id, _)| {
                self.entities
                    .get(id)
                    .map(|e| e.team == team && e.unit == unit)
                    .unwrap_or(false)
            })
            .map(|(id, pos)| (*id, *pos))
    }

    /// Positioned entities of `team` within `radius_sq` of `pos`.
    pub fn positioned_near(&self, team: Team, pos: Position, radius_sq: u32) -> impl Iterator<Item = &EntityRecord> {
        self.entities.values().filter(move |e| {
            e.team == team && e.position.map(|p| p.distance_sq(pos) <= radius_sq).unwrap_or(false)
        })
    }

    /// Positioned enemies of `team` within `radius_sq` of `pos`.
    pub fn hostiles_near(&self, team: Team, pos: Position, radius_sq: u32) -> impl Iterator<Item = &EntityRecord> {
        self.positioned_near(team.opposite(), pos, radius_sq)
    }

    /// Health left after the damage this unit has seen dealt.
    pub fn remaining_health(&self, id: u32, stats: &UnitStats) -> Option<u32> {
        self.entities
            .get(&id)
            .map(|e| stats.max_health.saturating_sub(e.damage_observed.unwrap_or(0)))
    }

    /// Establishes identity on first sighting. A conflicting team or type is
    /// rejected unless the observation is direct vision.
    pub fn observe_identity(&mut self, id: u32, team: Team, unit: UnitType, trusted: bool) -> Result<(), KnowledgeError> {
        match self.entities.get_mut(&id) {
            None => {
                let record = EntityRecord::new(id, team, unit);

                debug!("First sighting of {:?} {} ({:?})", unit, id, team);

                if let Some(observer) = self.spawn_observer.as_mut() {
                    observer(&record);
                }

                self.entities.insert(id, record);

                Ok(())
            }
            Some(record) if record.team == team && record.unit == unit => Ok(()),
            Some(record) => {
                let conflict = KnowledgeError::IdentityConflict {
                    id,
                    known_team: Some(record.team),
                    known_unit: Some(record.unit),
                    team,
                    unit,
                };

                if !trusted {
                    warn!("Rejected identity update: {}", conflict);

                    return Err(conflict);
                }

                warn!("Direct vision overrides identity: {}", conflict);

                let was_structure = record.is_structure();

                record.team = team;
                record.unit = unit;

                if was_structure && !unit.is_structure() {
                    self.structures.remove(&id);
                } else if !was_structure && unit.is_structure() {
                    if let Some(position) = record.position {
                        self.structures.insert(id, position);
                    }
                }

                Ok(())
            }
        }
    }

    /// Records a position report. Unknown ids are ignored (`Ok(false)`); reports
    /// that are not newer than the stored one are rejected, as is any move of a
    /// structure away from its first recorded tile.
    pub fn observe_position(&mut self, id: u32, position: Position, turn: u32, trusted: bool) -> Result<bool, KnowledgeError> {
        let record = match self.entities.get_mut(&id) {
            Some(record) => record,
            None => return Ok(false),
        };

        if let Some(last) = record.last_position_turn {
            if turn <= last {
                debug!("Discarding stale position for {} (turn {} <= {})", id, turn, last);

                return Err(KnowledgeError::StaleObservation { id, turn, last });
            }
        }

        if record.is_structure() {
            if let Some(known) = record.position {
                if known != position {
                    // The stale record is kept; there is no way to recover the true tile.
                    let error = KnowledgeError::StructureMoved {
                        id,
                        x: position.x,
                        y: position.y,
                        known_x: known.x,
                        known_y: known.y,
                    };

                    warn!("{}", error);

                    return Err(error);
                }
            }

            self.structures.insert(id, position);
        }

        record.position = Some(position);
        record.last_position_turn = Some(turn);
        record.position_trusted = trusted;

        Ok(true)
    }

    pub fn apply_damage(&mut self, id: u32, amount: u32) -> Result<u32, KnowledgeError> {
        let record = self.entities.get_mut(&id).ok_or(KnowledgeError::UnknownEntity(id))?;
        let total = record.damage_observed.unwrap_or(0).saturating_add(amount);

        record.damage_observed = Some(total);

        Ok(total)
    }

    pub fn mark_terminated(&mut self, id: u32) -> Result<EntityRecord, KnowledgeError> {
        let record = self.entities.remove(&id).ok_or(KnowledgeError::UnknownEntity(id))?;

        self.structures.remove(&id);

        info!("Presumed destroyed: {:?} {} ({:?})", record.unit, id, record.team);

        if let Some(observer) = self.termination_observer.as_mut() {
            observer(&record);
        }

        Ok(record)
    }

    /// Stamps and approves a scout report for `id` unless it was reported
    /// within the last `interval` turns.
    pub fn should_report(&mut self, id: u32, turn: u32, interval: u32) -> bool {
        match self.entities.get_mut(&id) {
            Some(record) => {
                let due = record
                    .last_reported_turn
                    .map(|last| turn >= last.saturating_add(interval))
                    .unwrap_or(true);

                if due {
                    record.last_reported_turn = Some(turn);
                }

                due
            }
            None => false,
        }
    }

    /// Fuses this turn's perception into the store.
    ///
    /// Visible robots are applied as trusted observations and radio-only
    /// robots as provisional ones. Known structures whose tile is inside vision
    /// but holds some other occupant are presumed destroyed. With `rollcall`
    /// set, every known unit of that team missing from `robots` is presumed
    /// destroyed as well.
    #[allow(clippy::too_many_arguments)]
    pub fn reconcile_perception_sweep<V, R>(
        &mut self,
        turn: u32,
        listener: Position,
        robots: &[RobotInfo],
        occupancy: &Grid<i32>,
        is_visible: V,
        is_radio: R,
        rollcall: Option<Team>,
    ) -> SweepSummary
    where
        V: Fn(&RobotInfo) -> bool,
        R: Fn(&RobotInfo) -> bool,
    {
        let mut summary = SweepSummary::default();
        let reported: HashSet<u32> = robots.iter().map(|r| r.id).collect();

        for robot in robots.iter() {
            let known = self.contains(robot.id);

            if is_visible(robot) {
                if let (Some(team), Some(unit), Some(position)) = (robot.team, robot.unit, robot.position) {
                    if self.observe_identity(robot.id, team, unit, true).is_ok() {
                        let _ = self.observe_position(robot.id, position, turn, true);
                    }
                }
            } else {
                if let (Some(team), Some(unit)) = (reported_team(robot, rollcall), reported_unit(robot)) {
                    let _ = self.observe_identity(robot.id, team, unit, false);
                }

                if is_radio(robot) {
                    if let Some(position) = triangulate_sender(robot, listener) {
                        let _ = self.observe_position(robot.id, position, turn, false);
                    }
                }
            }

            if !known && self.contains(robot.id) {
                summary.sighted.push(robot.id);
            }
        }

        let lost_structures: Vec<u32> = self
            .structures
            .iter()
            .filter(|(id, pos)| match occupancy.get(**pos) {
                Some(occupant) => *occupant >= 0 && *occupant as u32 != **id,
                None => false,
            })
            .map(|(id, _)| *id)
            .collect();

        for id in lost_structures {
            if self.mark_terminated(id).is_ok() {
                summary.terminated.push(id);
            }
        }

        if let Some(team) = rollcall {
            let missing: Vec<u32> = self
                .units_of(team)
                .filter(|e| !reported.contains(&e.id))
                .map(|e| e.id)
                .collect();

            for id in missing {
                if self.mark_terminated(id).is_ok() {
                    summary.terminated.push(id);
                }
            }
        }

        self.last_sweep_turn = Some(turn);

        summary
    }
}

/// Status channel traffic only reaches the sender's own team, so a rollcall
/// observer can attribute it even without vision.
fn reported_team(robot: &RobotInfo, rollcall: Option<Team>) -> Option<Team> {
    robot.team.or(if robot.castle_talk.is_some() { rollcall } else { None })
}

/// Unit type from direct report, or from a heartbeat on the status channel.
fn reported_unit(robot: &RobotInfo) -> Option<UnitType> {
    robot.unit.or_else(|| match robot.castle_talk.map(StatusMessage::decode) {
        Some(StatusMessage::Heartbeat { unit, .. }) => Some(unit),
        _ => None,
    })
}

/// Provisional position for a robot heard but not seen. Only self-locating
/// messages place the sender, and only if the claim is consistent with the
/// declared broadcast radius around the listener.
pub fn triangulate_sender(robot: &RobotInfo, listener: Position) -> Option<Position> {
    let signal = robot.signal?;
    let radius_sq = robot.signal_radius_sq?;
    let claimed = RadioMessage::decode(signal).sender_position()?;

    if claimed.distance_sq(listener) <= radius_sq {
        Some(claimed)
    } else {
        debug!(
            "Ignoring position claim {} from {}: outside radius {} of {}",
            claimed, robot.id, radius_sq, listener
        );
        None
    }
}
