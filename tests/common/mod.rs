use reflex_bot::constants::standard_stats;
use reflex_bot::grid::Grid;
use reflex_bot::host::*;

/// In-memory host: an open map, a fixed robot list and recorded sends.
pub struct MockHost {
    pub me: SelfState,
    pub resources: TeamResources,
    pub time_remaining_ms: u32,
    pub passable: Grid<bool>,
    pub karbonite: Grid<bool>,
    pub fuel: Grid<bool>,
    pub others: Vec<RobotInfo>,
    pub signals: Vec<(u16, u32)>,
    pub castle_talks: Vec<u8>,
    /// Turn on which reading team resources panics, standing in for a host fault.
    pub fail_turn: Option<u32>,
    robots: Vec<RobotInfo>,
    occupancy: Grid<i32>,
}

impl MockHost {
    pub fn new(size: u32, me: SelfState) -> MockHost {
        let mut host = MockHost {
            me,
            resources: TeamResources { karbonite: 100, fuel: 500 },
            time_remaining_ms: 100,
            passable: Grid::new(size, size, true),
            karbonite: Grid::new(size, size, false),
            fuel: Grid::new(size, size, false),
            others: Vec::new(),
            signals: Vec::new(),
            castle_talks: Vec::new(),
            fail_turn: None,
            robots: Vec::new(),
            occupancy: Grid::new(size, size, -1),
        };

        host.refresh();
        host
    }

    /// Rebuilds the robot list and occupancy after the fields changed.
    pub fn refresh(&mut self) {
        let vision_sq = standard_stats(self.me.unit).vision_radius_sq;
        let origin = self.me.position;

        self.occupancy = Grid::from_fn(self.passable.width(), self.passable.height(), |pos| {
            if pos.distance_sq(origin) <= vision_sq {
                0
            } else {
                -1
            }
        });

        self.robots = std::iter::once(RobotInfo {
            id: self.me.id,
            team: Some(self.me.team),
            unit: Some(self.me.unit),
            position: Some(self.me.position),
            health: Some(self.me.health),
            ..Default::default()
        })
        .chain(self.others.iter().cloned())
        .collect();

        for robot in self.robots.iter() {
            if let Some(pos) = robot.position {
                if self.occupancy.get(pos).map(|v| *v >= 0).unwrap_or(false) {
                    self.occupancy.set(pos, robot.id as i32);
                }
            }
        }
    }

    pub fn advance(&mut self) {
        self.me.turn += 1;
        self.refresh();
    }
}

impl Host for MockHost {
    fn me(&self) -> SelfState {
        self.me
    }

    fn team_resources(&self) -> TeamResources {
        if self.fail_turn == Some(self.me.turn) {
            panic!("team resources unavailable on turn {}", self.me.turn);
        }

        self.resources
    }

    fn time_remaining_ms(&self) -> u32 {
        self.time_remaining_ms
    }

    fn passable_map(&self) -> &Grid<bool> {
        &self.passable
    }

    fn karbonite_map(&self) -> &Grid<bool> {
        &self.karbonite
    }

    fn fuel_map(&self) -> &Grid<bool> {
        &self.fuel
    }

    fn visible_robots(&self) -> &[RobotInfo] {
        &self.robots
    }

    fn visible_robot_map(&self) -> &Grid<i32> {
        &self.occupancy
    }

    fn stats(&self, unit: UnitType) -> UnitStats {
        standard_stats(unit)
    }

    fn signal(&mut self, value: u16, radius_sq: u32) {
        self.signals.push((value, radius_sq));
    }

    fn castle_talk(&mut self, value: u8) {
        self.castle_talks.push(value);
    }
}

pub fn unit(id: u32, team: Team, unit: UnitType, x: i32, y: i32, turn: u32) -> SelfState {
    SelfState {
        id,
        team,
        unit,
        position: Position::new(x, y),
        health: standard_stats(unit).max_health,
        karbonite: 0,
        fuel: 0,
        turn,
    }
}

pub fn robot(id: u32, team: Team, unit: UnitType, x: i32, y: i32) -> RobotInfo {
    RobotInfo {
        id,
        team: Some(team),
        unit: Some(unit),
        position: Some(Position::new(x, y)),
        ..Default::default()
    }
}
