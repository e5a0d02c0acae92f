pub mod loader;

use std::cmp::Ordering;

use bracket_geometry::prelude::Point;
use bracket_pathfinding::prelude::{Algorithm2D, BaseMap};
use serde::Serialize;
use smallvec::SmallVec;

pub const GRID_ROWS: i32 = 51;
pub const GRID_COLS: i32 = 71;

/// A single move between orthogonal neighbours. `Up` decreases `y`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Up,
    Down,
    Left,
    Right,
}

/// Evaluation order used when two neighbours share the lowest height.
pub const STEP_ORDER: [Step; 4] = [Step::Up, Step::Down, Step::Left, Step::Right];

impl Step {
    pub fn delta(self) -> Point {
        match self {
            Step::Up => Point::new(0, -1),
            Step::Down => Point::new(0, 1),
            Step::Left => Point::new(-1, 0),
            Step::Right => Point::new(1, 0),
        }
    }

    pub fn apply(self, point: Point) -> Point {
        let delta = self.delta();
        Point::new(point.x + delta.x, point.y + delta.y)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Up => "up",
            Step::Down => "down",
            Step::Left => "left",
            Step::Right => "right",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TraversalMark {
    #[default]
    None,
    Start,
    End,
    Moved(Step),
}

impl From<Step> for TraversalMark {
    fn from(step: Step) -> Self {
        TraversalMark::Moved(step)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub height: i32,
    pub visited: bool,
    pub mark: TraversalMark,
}

impl Cell {
    /// Orders cells by height alone; visit state never takes part.
    pub fn cmp_height(&self, other: &Cell) -> Ordering {
        self.height.cmp(&other.height)
    }

    /// Visiting and marking always happen together so a visited cell is never unmarked.
    pub fn touch(&mut self, mark: TraversalMark) {
        debug_assert!(mark != TraversalMark::None);
        self.visited = true;
        self.mark = mark;
    }
}

/// Owned `cols × rows` elevation grid, row-major, `(0, 0)` in the top-left.
#[derive(Clone, Debug)]
pub struct Terrain {
    pub cols: i32,
    pub rows: i32,
    pub cells: Vec<Cell>,
}

impl Default for Terrain {
    fn default() -> Self {
        Terrain::new(GRID_COLS, GRID_ROWS)
    }
}

impl Terrain {
    pub fn new(cols: i32, rows: i32) -> Self {
        let size = (cols.max(0) * rows.max(0)) as usize;
        Self {
            cols,
            rows,
            cells: vec![Cell::default(); size],
        }
    }

    #[cfg(test)]
    /// Builds a grid from rows given top to bottom. Short rows are padded with zero.
    pub fn from_heights(rows: &[Vec<i32>]) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0) as i32;
        let mut terrain = Terrain::new(cols, rows.len() as i32);
        for (y, row) in rows.iter().enumerate() {
            for (x, &height) in row.iter().enumerate() {
                terrain.set_height(Point::new(x as i32, y as i32), height);
            }
        }
        terrain
    }

    fn idx(&self, point: Point) -> Option<usize> {
        if self.in_bounds(point) {
            Some(self.point2d_to_index(point))
        } else {
            None
        }
    }

    pub fn cell(&self, point: Point) -> Option<&Cell> {
        self.idx(point).map(|idx| &self.cells[idx])
    }

    pub fn cell_mut(&mut self, point: Point) -> Option<&mut Cell> {
        self.idx(point).map(|idx| &mut self.cells[idx])
    }

    #[cfg(test)]
    pub fn height_at(&self, point: Point) -> Option<i32> {
        self.cell(point).map(|cell| cell.height)
    }

    #[cfg(test)]
    pub fn set_height(&mut self, point: Point, height: i32) {
        if let Some(cell) = self.cell_mut(point) {
            cell.height = height;
        }
    }

    /// Marks the cell visited with `mark`. Returns false when `point` lies outside the grid.
    pub fn touch(&mut self, point: Point, mark: TraversalMark) -> bool {
        match self.cell_mut(point) {
            Some(cell) => {
                cell.touch(mark);
                true
            }
            None => false,
        }
    }

    /// Replaces every height, leaving visit state alone. `heights` must be row-major and full size.
    pub fn overwrite_heights(&mut self, heights: &[i32]) {
        debug_assert_eq!(heights.len(), self.cells.len());
        for (cell, &height) in self.cells.iter_mut().zip(heights) {
            cell.height = height;
        }
    }

    #[cfg(test)]
    pub fn heights(&self) -> Vec<i32> {
        self.cells.iter().map(|cell| cell.height).collect()
    }

    /// In-bounds orthogonal neighbours, in `STEP_ORDER`.
    pub fn neighbours(&self, point: Point) -> SmallVec<[(Step, Point); 4]> {
        STEP_ORDER
            .iter()
            .map(|&step| (step, step.apply(point)))
            .filter(|(_, dest)| self.in_bounds(*dest))
            .collect()
    }

    pub fn row(&self, y: i32) -> &[Cell] {
        let start = (y * self.cols) as usize;
        &self.cells[start..start + self.cols as usize]
    }
}

impl BaseMap for Terrain {}

impl Algorithm2D for Terrain {
    fn dimensions(&self) -> Point {
        Point::new(self.cols, self.rows)
    }

    fn in_bounds(&self, point: Point) -> bool {
        point.x >= 0 && point.x < self.cols && point.y >= 0 && point.y < self.rows
    }
}
