use crate::context::UnitContext;
use crate::error::TurnError;
use crate::features::Features;
use crate::host::{Action, Host};
use crate::roles::RoleController;
use log::*;
use std::panic::{self, AssertUnwindSafe};

/// Everything one unit keeps between turns.
pub struct Controller {
    context: UnitContext,
    role: RoleController,
    last_turn: Option<u32>,
}

impl Controller {
    pub fn new<H: Host + ?Sized>(host: &H, features: Features) -> Controller {
        let context = UnitContext::new(host, features);
        let role = RoleController::for_unit(&context);

        Controller {
            context,
            role,
            last_turn: None,
        }
    }

    pub fn context(&self) -> &UnitContext {
        &self.context
    }

    pub fn role(&self) -> &RoleController {
        &self.role
    }

    /// Runs one turn and returns the action for the host to execute. Queued
    /// messages are handed to the host before returning.
    pub fn tick<H: Host + ?Sized>(&mut self, host: &mut H) -> Option<Action> {
        let me = host.me();

        let gap = self.last_turn.map(|last| last + 1 != me.turn).unwrap_or(false);
        let previous = self.last_turn.replace(me.turn);

        if gap {
            warn!(
                "{:?} {} resumed on turn {} after {:?}, discarding cached state",
                me.unit, me.id, me.turn, previous
            );

            self.context.reset_turn_state();
            self.context.perceive(&*host);

            return None;
        }

        let sweep = self.context.perceive(&*host);

        let context = &mut self.context;
        let role = &mut self.role;
        let view: &H = &*host;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| role.tick(view, context, &sweep)));

        let action = match outcome {
            Ok(Ok(action)) => action,
            Ok(Err(err)) => {
                error!("{:?} {} failed turn {}: {}", me.unit, me.id, me.turn, err);

                self.context.outboxes.clear();
                None
            }
            Err(_) => {
                error!("{:?} {} panicked on turn {}, resetting", me.unit, me.id, me.turn);

                self.context.reset_turn_state();
                None
            }
        };

        let action = action.filter(|action| match check_affordable(&*host, action) {
            Ok(()) => true,
            Err(err) => {
                warn!("Dropping {:?}: {}", action, err);
                false
            }
        });

        debug!("{:?} {} [{}] -> {:?}", me.unit, me.id, self.role.status_description(), action);

        self.context.outboxes.drain(host);

        action
    }
}

/// Builds are the only actions with an up-front cost the host would refuse.
fn check_affordable<H: Host + ?Sized>(host: &H, action: &Action) -> Result<(), TurnError> {
    if let Action::Build { unit, .. } = action {
        let stats = host.stats(*unit);

        if !host.team_resources().can_afford(&stats) {
            return Err(TurnError::InsufficientResources {
                unit: *unit,
                karbonite: stats.construction_karbonite,
                fuel: stats.construction_fuel,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::standard_stats;
    use crate::grid::Grid;
    use crate::host::*;

    struct PoorHost {
        passable: Grid<bool>,
        empty: Grid<bool>,
        occupancy: Grid<i32>,
    }

    impl Host for PoorHost {
        fn me(&self) -> SelfState {
            SelfState {
                id: 1,
                team: Team::Red,
                unit: UnitType::Castle,
                position: Position::new(1, 1),
                health: 200,
                karbonite: 0,
                fuel: 0,
                turn: 1,
            }
        }

        fn team_resources(&self) -> TeamResources {
            TeamResources { karbonite: 5, fuel: 100 }
        }

        fn time_remaining_ms(&self) -> u32 {
            100
        }

        fn passable_map(&self) -> &Grid<bool> {
            &self.passable
        }

        fn karbonite_map(&self) -> &Grid<bool> {
            &self.empty
        }

        fn fuel_map(&self) -> &Grid<bool> {
            &self.empty
        }

        fn visible_robots(&self) -> &[RobotInfo] {
            &[]
        }

        fn visible_robot_map(&self) -> &Grid<i32> {
            &self.occupancy
        }

        fn stats(&self, unit: UnitType) -> UnitStats {
            standard_stats(unit)
        }

        fn signal(&mut self, _value: u16, _radius_sq: u32) {}

        fn castle_talk(&mut self, _value: u8) {}
    }

    #[test]
    fn unaffordable_build_is_reported() {
        let host = PoorHost {
            passable: Grid::new(4, 4, true),
            empty: Grid::new(4, 4, false),
            occupancy: Grid::new(4, 4, 0),
        };

        let build = Action::Build {
            unit: UnitType::Pilgrim,
            dx: 1,
            dy: 0,
        };

        assert!(matches!(
            check_affordable(&host, &build),
            Err(TurnError::InsufficientResources {
                unit: UnitType::Pilgrim,
                ..
            })
        ));
        assert_eq!(check_affordable(&host, &Action::Mine), Ok(()));
    }
}
