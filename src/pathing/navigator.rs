use super::pathfinder::*;
use crate::host::Position;
use log::*;

#[derive(Clone, Debug)]
struct CachedRoute {
    goals: Vec<Position>,
    mode: NavigationMode,
    route: Route,
    /// Index into `route.path` of the tile the mover should be standing on.
    cursor: usize,
}

impl CachedRoute {
    fn head(&self) -> Option<Position> {
        self.route.path.get(self.cursor).copied()
    }

    fn next(&self) -> Option<Position> {
        self.route.path.get(self.cursor + 1).copied()
    }

    fn is_fresh(&self, position: Position, goals: &[Position], mode: NavigationMode, map: &PathingMap) -> bool {
        if self.mode != mode || !same_goals(&self.goals, goals) {
            return false;
        }

        if self.head() != Some(position) {
            return false;
        }

        match self.next() {
            Some(next) => map.is_open(next, false),
            None => false,
        }
    }
}

fn sorted_goals(goals: &[Position]) -> Vec<Position> {
    let mut goals = goals.to_vec();
    goals.sort();
    goals.dedup();
    goals
}

fn same_goals(cached: &[Position], goals: &[Position]) -> bool {
    cached == sorted_goals(goals).as_slice()
}

/// Route cache for one unit. Each call either follows the cached route one
/// step or recomputes it when it no longer applies.
#[derive(Clone, Debug)]
pub struct Navigator {
    mover: Mover,
    cached: Option<CachedRoute>,
    recomputes: u32,
}

impl Navigator {
    pub fn new(mover: Mover) -> Navigator {
        Navigator {
            mover,
            cached: None,
            recomputes: 0,
        }
    }

    pub fn mover(&self) -> &Mover {
        &self.mover
    }

    pub fn reset(&mut self) {
        self.cached = None;
    }

    pub fn recompute_count(&self) -> u32 {
        self.recomputes
    }

    pub fn cached_route(&self) -> Option<&Route> {
        self.cached.as_ref().map(|c| &c.route)
    }

    /// The tile the cached route steps onto next.
    pub fn next_waypoint(&self) -> Option<Position> {
        self.cached.as_ref().and_then(|c| c.next())
    }

    /// Next step delta towards the nearest of `goals`, or `None` when already
    /// there, when no route exists, when there is no time to search, or when
    /// `fuel` cannot pay for the step. The cursor only advances when a step
    /// is returned.
    pub fn navigate(
        &mut self,
        position: Position,
        goals: &[Position],
        mode: NavigationMode,
        map: &PathingMap,
        fuel: u32,
        options: Option<RouteOptions>,
    ) -> Option<(i32, i32)> {
        if goals.contains(&position) {
            self.cached = None;
            return None;
        }

        let fresh = self
            .cached
            .as_ref()
            .map(|c| c.is_fresh(position, goals, mode, map))
            .unwrap_or(false);

        if !fresh {
            self.cached = None;

            let options = match options {
                Some(options) => options,
                None => {
                    debug!("Skipping route search from {}: out of time", position);
                    return None;
                }
            };

            self.recomputes += 1;

            match find_route(position, goals, mode, &self.mover, map, &options) {
                Ok(route) => {
                    self.cached = Some(CachedRoute {
                        goals: sorted_goals(goals),
                        mode,
                        route,
                        cursor: 0,
                    });
                }
                Err(reason) => {
                    debug!("No route from {} to {:?}: {:?}", position, goals, reason);
                    return None;
                }
            }
        }

        let cached = self.cached.as_mut()?;
        let next = cached.next()?;
        let fuel_needed = self.mover.fuel_per_move * position.distance_sq(next);

        if fuel_needed > fuel {
            debug!("Holding at {}: step needs {} fuel, have {}", position, fuel_needed, fuel);
            return None;
        }

        cached.cursor += 1;

        Some(position.delta_to(next))
    }
}
