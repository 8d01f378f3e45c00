use crate::features::PathingFeatures;
use crate::grid::Grid;
use crate::host::{Position, UnitStats};
use crate::priorityqueue::PriorityQueue;
use lerp::*;
use log::*;
use serde::{Deserialize, Serialize};
use shrinkwraprs::*;
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationMode {
    /// Fewest fuel spent.
    Economic,
    Balanced,
    /// Fewest turns spent.
    Fastest,
}

impl NavigationMode {
    pub fn time_bias(self) -> f64 {
        match self {
            NavigationMode::Economic => 0.0,
            NavigationMode::Balanced => 0.5,
            NavigationMode::Fastest => 1.0,
        }
    }

    /// Weight of a single step covering `distance_sq`.
    pub fn edge_cost(self, mover: &Mover, distance_sq: u32) -> f64 {
        let fuel_cost = (mover.fuel_per_move * distance_sq) as f64;

        fuel_cost.lerp_bounded(1.0, self.time_bias())
    }
}

/// Movement capabilities of the unit being routed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mover {
    pub move_radius_sq: u32,
    pub fuel_per_move: u32,
    steps: Vec<(i32, i32)>,
}

impl Mover {
    pub fn new(move_radius_sq: u32, fuel_per_move: u32) -> Mover {
        let reach = (move_radius_sq as f64).sqrt() as i32;
        let mut steps = Vec::new();

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let distance_sq = (dx * dx + dy * dy) as u32;

                if distance_sq > 0 && distance_sq <= move_radius_sq {
                    steps.push((dx, dy));
                }
            }
        }

        Mover {
            move_radius_sq,
            fuel_per_move,
            steps,
        }
    }

    pub fn from_stats(stats: &UnitStats) -> Mover {
        Mover::new(stats.move_radius_sq, stats.fuel_per_move)
    }

    /// Every legal single-turn displacement.
    pub fn steps(&self) -> &[(i32, i32)] {
        &self.steps
    }

    pub fn can_move(&self) -> bool {
        !self.steps.is_empty()
    }

    fn max_manhattan_reach(&self) -> u32 {
        self.steps
            .iter()
            .map(|(dx, dy)| dx.unsigned_abs() + dy.unsigned_abs())
            .max()
            .unwrap_or(1)
    }

    fn min_edge_cost(&self, mode: NavigationMode) -> f64 {
        self.steps
            .iter()
            .map(|(dx, dy)| mode.edge_cost(self, (dx * dx + dy * dy) as u32))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Terrain plus, optionally, the current occupancy.
#[derive(Clone, Copy)]
pub struct PathingMap<'a> {
    passable: &'a Grid<bool>,
    occupancy: Option<&'a Grid<i32>>,
}

impl<'a> PathingMap<'a> {
    pub fn new(passable: &'a Grid<bool>) -> PathingMap<'a> {
        PathingMap { passable, occupancy: None }
    }

    pub fn with_occupancy(self, occupancy: &'a Grid<i32>) -> PathingMap<'a> {
        PathingMap {
            occupancy: Some(occupancy),
            ..self
        }
    }

    pub fn passable(&self) -> &'a Grid<bool> {
        self.passable
    }

    /// Passable terrain not known to be occupied by a robot.
    pub fn is_open(&self, pos: Position, ignore_units: bool) -> bool {
        if !self.passable.is_set(pos) {
            return false;
        }

        if ignore_units {
            return true;
        }

        self.occupancy.and_then(|o| o.get(pos)).map(|id| *id <= 0).unwrap_or(true)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteOptions {
    pub max_expansions: usize,
    pub ignore_units: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        RouteOptions {
            max_expansions: 4096,
            ignore_units: false,
        }
    }
}

/// Converts the remaining turn time into a bound on search work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchBudget {
    pub min_time_ms: u32,
    pub expansions_per_ms: u32,
    pub max_expansions: u32,
}

impl SearchBudget {
    pub fn from_features(features: &PathingFeatures) -> SearchBudget {
        SearchBudget {
            min_time_ms: features.min_time_ms,
            expansions_per_ms: features.expansions_per_ms,
            max_expansions: features.max_expansions,
        }
    }

    /// `None` when there is not enough time left to search at all.
    pub fn options(&self, time_remaining_ms: u32) -> Option<RouteOptions> {
        if time_remaining_ms < self.min_time_ms {
            return None;
        }

        let spare = time_remaining_ms - self.min_time_ms;
        let expansions = spare.saturating_mul(self.expansions_per_ms).clamp(1, self.max_expansions.max(1));

        Some(RouteOptions {
            max_expansions: expansions as usize,
            ignore_units: false,
        })
    }
}

/// Why no route was produced. A valid negative answer, not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoRoute {
    NoPassableGoal,
    Unreachable,
    BudgetExhausted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Start first, reached goal last.
    pub path: Vec<Position>,
    pub cost: f64,
}

impl Route {
    pub fn start(&self) -> Option<Position> {
        self.path.first().copied()
    }

    pub fn goal(&self) -> Option<Position> {
        self.path.last().copied()
    }

    pub fn steps(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    f: f64,
    g: f64,
    index: usize,
}

fn compare_nodes(a: &OpenNode, b: &OpenNode) -> Ordering {
    a.f.total_cmp(&b.f).then_with(|| b.g.total_cmp(&a.g))
}

fn index_of(grid: &Grid<bool>, pos: Position) -> usize {
    pos.y as usize * grid.width() as usize + pos.x as usize
}

fn position_of(grid: &Grid<bool>, index: usize) -> Position {
    let width = grid.width() as usize;

    Position::new((index % width) as i32, (index / width) as i32)
}

fn reconstruct(came_from: &[Option<usize>], grid: &Grid<bool>, mut current: usize) -> Vec<Position> {
    let mut path = vec![position_of(grid, current)];

    while let Some(previous) = came_from[current] {
        current = previous;
        path.push(position_of(grid, current));
    }

    path.reverse();
    path
}

/// A* from `start` to whichever of `goals` is cheapest to reach.
pub fn find_route(
    start: Position,
    goals: &[Position],
    mode: NavigationMode,
    mover: &Mover,
    map: &PathingMap,
    options: &RouteOptions,
) -> Result<Route, NoRoute> {
    let grid = map.passable();

    if !grid.in_bounds(start) {
        return Err(NoRoute::Unreachable);
    }

    let goals: Vec<Position> = goals
        .iter()
        .copied()
        .filter(|g| *g == start || map.is_open(*g, options.ignore_units))
        .collect();

    if goals.is_empty() {
        return Err(NoRoute::NoPassableGoal);
    }

    if goals.contains(&start) {
        return Ok(Route {
            path: vec![start],
            cost: 0.0,
        });
    }

    if !mover.can_move() {
        return Err(NoRoute::Unreachable);
    }

    let reach = mover.max_manhattan_reach() as f64;
    let min_edge = mover.min_edge_cost(mode);
    let heuristic = |pos: Position| -> f64 {
        let nearest = goals.iter().map(|g| g.manhattan(pos)).min().unwrap_or(0) as f64;

        nearest / reach * min_edge
    };

    let cells = (grid.width() * grid.height()) as usize;
    let mut g_score = vec![f64::INFINITY; cells];
    let mut came_from: Vec<Option<usize>> = vec![None; cells];
    let mut open = PriorityQueue::with_capacity(64, compare_nodes);
    let mut expansions = 0usize;

    let start_index = index_of(grid, start);
    g_score[start_index] = 0.0;
    open.enqueue(OpenNode {
        f: heuristic(start),
        g: 0.0,
        index: start_index,
    });

    while let Ok(node) = open.dequeue() {
        if node.g > g_score[node.index] {
            continue;
        }

        let current = position_of(grid, node.index);

        if goals.contains(&current) {
            return Ok(Route {
                path: reconstruct(&came_from, grid, node.index),
                cost: node.g,
            });
        }

        expansions += 1;

        if expansions > options.max_expansions {
            debug!(
                "Route search from {} gave up after {} expansions",
                start, options.max_expansions
            );
            return Err(NoRoute::BudgetExhausted);
        }

        for (dx, dy) in mover.steps() {
            let next = current.offset(*dx, *dy);

            if !map.is_open(next, options.ignore_units) {
                continue;
            }

            let next_index = index_of(grid, next);
            let tentative = node.g + mode.edge_cost(mover, (dx * dx + dy * dy) as u32);

            if tentative >= g_score[next_index] {
                continue;
            }

            g_score[next_index] = tentative;
            came_from[next_index] = Some(node.index);
            open.enqueue(OpenNode {
                f: tentative + heuristic(next),
                g: tentative,
                index: next_index,
            });
        }
    }

    Err(NoRoute::Unreachable)
}

/// Cost from `start` to every tile, ignoring goals and robots. `None` marks
/// tiles that cannot be reached.
pub fn cost_field(start: Position, mode: NavigationMode, mover: &Mover, passable: &Grid<bool>) -> Grid<Option<f64>> {
    let mut field: Grid<Option<f64>> = Grid::new(passable.width(), passable.height(), None);

    if !passable.in_bounds(start) {
        return field;
    }

    let mut open = PriorityQueue::new(compare_nodes);
    let start_index = index_of(passable, start);

    field.set(start, Some(0.0));
    open.enqueue(OpenNode {
        f: 0.0,
        g: 0.0,
        index: start_index,
    });

    while let Ok(node) = open.dequeue() {
        let current = position_of(passable, node.index);

        if field.get(current).copied().flatten().map(|g| node.g > g).unwrap_or(false) {
            continue;
        }

        for (dx, dy) in mover.steps() {
            let next = current.offset(*dx, *dy);

            if !passable.is_set(next) {
                continue;
            }

            let tentative = node.g + mode.edge_cost(mover, (dx * dx + dy * dy) as u32);
            let better = field.get(next).copied().flatten().map(|g| tentative < g).unwrap_or(true);

            if better {
                field.set(next, Some(tentative));
                open.enqueue(OpenNode {
                    f: tentative,
                    g: tentative,
                    index: index_of(passable, next),
                });
            }
        }
    }

    field
}

/// Fastest-mode travel turns from the spawn tile, computed once per unit.
#[derive(Shrinkwrap, Clone, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TravelEstimates(pub Grid<Option<f64>>);

impl TravelEstimates {
    pub fn compute(start: Position, mover: &Mover, passable: &Grid<bool>) -> TravelEstimates {
        TravelEstimates(cost_field(start, NavigationMode::Fastest, mover, passable))
    }

    pub fn turns_to(&self, pos: Position) -> Option<u32> {
        self.get(pos).copied().flatten().map(|turns| turns.ceil() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::standard_stats;
    use crate::host::UnitType;
    use pathfinding::prelude::dijkstra;

    fn open_grid(size: u32) -> Grid<bool> {
        Grid::new(size, size, true)
    }

    #[test]
    fn diagonal_crossing_costs_chebyshev_distance() {
        let passable = open_grid(10);
        let mover = Mover::new(2, 1);
        let route = find_route(
            Position::new(0, 0),
            &[Position::new(9, 9)],
            NavigationMode::Fastest,
            &mover,
            &PathingMap::new(&passable),
            &RouteOptions::default(),
        )
        .unwrap();

        assert_eq!(route.cost, 9.0);
        assert_eq!(route.steps(), 9);
        assert_eq!(route.start(), Some(Position::new(0, 0)));
        assert_eq!(route.goal(), Some(Position::new(9, 9)));
    }

    #[test]
    fn nearest_goal_by_cost_wins() {
        let passable = open_grid(10);
        let mover = Mover::new(2, 1);
        let route = find_route(
            Position::new(2, 2),
            &[Position::new(5, 5), Position::new(1, 1)],
            NavigationMode::Fastest,
            &mover,
            &PathingMap::new(&passable),
            &RouteOptions::default(),
        )
        .unwrap();

        assert_eq!(route.path, vec![Position::new(2, 2), Position::new(1, 1)]);
        assert_eq!(route.cost, 1.0);
    }

    #[test]
    fn impassable_goals_fail_before_searching() {
        let mut passable = open_grid(5);
        passable.set(Position::new(4, 4), false);

        let result = find_route(
            Position::new(0, 0),
            &[Position::new(4, 4), Position::new(9, 9)],
            NavigationMode::Fastest,
            &Mover::new(2, 1),
            &PathingMap::new(&passable),
            &RouteOptions {
                max_expansions: 0,
                ignore_units: false,
            },
        );

        assert_eq!(result, Err(NoRoute::NoPassableGoal));
    }

    #[test]
    fn walled_off_goal_is_unreachable() {
        let passable = Grid::from_fn(7, 7, |p| p.x != 3);

        let result = find_route(
            Position::new(0, 3),
            &[Position::new(5, 3)],
            NavigationMode::Fastest,
            &Mover::new(2, 1),
            &PathingMap::new(&passable),
            &RouteOptions::default(),
        );

        assert_eq!(result, Err(NoRoute::Unreachable));

        // Crusaders jump the wall.
        let crusader = Mover::from_stats(&standard_stats(UnitType::Crusader));
        let result = find_route(
            Position::new(0, 3),
            &[Position::new(5, 3)],
            NavigationMode::Fastest,
            &crusader,
            &PathingMap::new(&passable),
            &RouteOptions::default(),
        );

        assert_eq!(result.map(|r| r.steps()), Ok(2));
    }

    #[test]
    fn occupied_tiles_block_unless_ignored() {
        let passable = open_grid(3);
        let mut occupancy = Grid::new(3, 3, 0);
        occupancy.set(Position::new(2, 2), 17);

        let map = PathingMap::new(&passable).with_occupancy(&occupancy);
        let mover = Mover::new(2, 1);
        let goals = [Position::new(2, 2)];

        let blocked = find_route(Position::new(0, 0), &goals, NavigationMode::Fastest, &mover, &map, &RouteOptions::default());
        assert_eq!(blocked, Err(NoRoute::NoPassableGoal));

        let ignoring = RouteOptions {
            ignore_units: true,
            ..RouteOptions::default()
        };
        assert!(find_route(Position::new(0, 0), &goals, NavigationMode::Fastest, &mover, &map, &ignoring).is_ok());
    }

    #[test]
    fn tiny_budget_gives_up() {
        let passable = open_grid(20);
        let result = find_route(
            Position::new(0, 0),
            &[Position::new(19, 19)],
            NavigationMode::Fastest,
            &Mover::new(2, 1),
            &PathingMap::new(&passable),
            &RouteOptions {
                max_expansions: 3,
                ignore_units: false,
            },
        );

        assert_eq!(result, Err(NoRoute::BudgetExhausted));
    }

    #[test]
    fn economic_mode_prefers_short_hops() {
        let passable = open_grid(10);
        let mover = Mover::from_stats(&standard_stats(UnitType::Crusader));
        let map = PathingMap::new(&passable);
        let goals = [Position::new(6, 0)];

        let economic = find_route(Position::new(0, 0), &goals, NavigationMode::Economic, &mover, &map, &RouteOptions::default()).unwrap();
        let fastest = find_route(Position::new(0, 0), &goals, NavigationMode::Fastest, &mover, &map, &RouteOptions::default()).unwrap();

        assert_eq!(economic.cost, 6.0);
        assert_eq!(fastest.steps(), 2);
        assert!(economic.steps() > fastest.steps());
    }

    #[test]
    fn matches_reference_dijkstra_on_obstacle_map() {
        let passable = Grid::from_fn(12, 12, |p| !(p.x == 5 && p.y < 9) && !(p.y == 4 && p.x > 6));
        let mover = Mover::from_stats(&standard_stats(UnitType::Prophet));
        let start = Position::new(1, 1);
        let goal = Position::new(10, 1);

        let route = find_route(
            start,
            &[goal],
            NavigationMode::Fastest,
            &mover,
            &PathingMap::new(&passable),
            &RouteOptions::default(),
        )
        .unwrap();

        let reference = dijkstra(
            &start,
            |p: &Position| {
                mover
                    .steps()
                    .iter()
                    .map(|(dx, dy)| p.offset(*dx, *dy))
                    .filter(|n| passable.is_set(*n))
                    .map(|n| (n, 1u32))
                    .collect::<Vec<_>>()
            },
            |p| *p == goal,
        )
        .unwrap();

        assert_eq!(route.cost as u32, reference.1);

        let field = cost_field(start, NavigationMode::Fastest, &mover, &passable);
        assert_eq!(field.get(goal).copied().flatten(), Some(reference.1 as f64));
    }

    #[test]
    fn travel_estimates_round_up_and_mark_unreachable() {
        let passable = Grid::from_fn(5, 5, |p| p != Position::new(4, 4));
        let estimates = TravelEstimates::compute(Position::new(0, 0), &Mover::new(2, 1), &passable);

        assert_eq!(estimates.turns_to(Position::new(0, 0)), Some(0));
        assert_eq!(estimates.turns_to(Position::new(3, 1)), Some(3));
        assert_eq!(estimates.turns_to(Position::new(4, 4)), None);
        assert_eq!(estimates.turns_to(Position::new(9, 9)), None);
    }
}
