use crate::host::Position;
use serde::{Deserialize, Serialize};

/// Dense 2D map stored as a flat arena indexed by `y * width + x`. Every
/// accessor is bounds checked; out-of-bounds reads return `None` instead of
/// panicking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: u32, height: u32, fill: T) -> Grid<T> {
        Grid {
            width,
            height,
            cells: vec![fill; (width * height) as usize],
        }
    }
}

impl<T> Grid<T> {
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Grid<T>
    where
        F: FnMut(Position) -> T,
    {
        let mut cells = Vec::with_capacity((width * height) as usize);

        for y in 0..height as i32 {
            for x in 0..width as i32 {
                cells.push(f(Position::new(x, y)));
            }
        }

        Grid { width, height, cells }
    }

    /// Builds a grid from rows, as handed over by the host. Rows must all be
    /// `width` long.
    pub fn from_rows(rows: Vec<Vec<T>>) -> Option<Grid<T>> {
        let height = rows.len() as u32;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u32;

        if rows.iter().any(|r| r.len() as u32 != width) {
            return None;
        }

        Some(Grid {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width as usize + pos.x as usize)
        } else {
            None
        }
    }

    pub fn get(&self, pos: Position) -> Option<&T> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        self.index(pos).map(move |i| &mut self.cells[i])
    }

    /// Returns false if `pos` is outside the grid.
    pub fn set(&mut self, pos: Position, value: T) -> bool {
        match self.get_mut(pos) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let width = self.width as i32;
        let height = self.height as i32;

        (0..height).flat_map(move |y| (0..width).map(move |x| Position::new(x, y)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &T)> {
        self.positions().zip(self.cells.iter())
    }

    pub fn map<U, F>(&self, mut f: F) -> Grid<U>
    where
        F: FnMut(&T) -> U,
    {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(|c| f(c)).collect(),
        }
    }
}

impl<T: Copy + Default> Grid<T> {
    pub fn get_or_default(&self, pos: Position) -> T {
        self.get(pos).copied().unwrap_or_default()
    }
}

impl Grid<bool> {
    /// Out-of-bounds tiles count as not set.
    pub fn is_set(&self, pos: Position) -> bool {
        self.get(pos).copied().unwrap_or(false)
    }
}
