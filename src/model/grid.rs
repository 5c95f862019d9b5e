use serde::{Deserialize, Serialize};

/// Rectangular 2D mapping from (x, y) to an optional value.
///
/// Cells may be empty; width and height are fixed at construction.
/// Iteration is row-major (y outer, x inner) and deterministic, which the
/// sensing topologies rely on for stable input/output slot assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<Option<T>>,
}

impl<T> Grid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        cells.resize_with(width * height, || None);
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells[self.index(x, y)].as_ref()
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        self.cells[i].as_mut()
    }

    pub fn set(&mut self, x: usize, y: usize, value: Option<T>) {
        let i = self.index(x, y);
        self.cells[i] = value;
    }

    /// Row-major iteration over occupied cells.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        self.cells.iter().enumerate().filter_map(move |(i, c)| {
            c.as_ref()
                .map(|v| (i % self.width, i / self.width, v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width;
        self.cells
            .iter_mut()
            .enumerate()
            .filter_map(move |(i, c)| c.as_mut().map(|v| (i % width, i / width, v)))
    }

    /// Number of occupied cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn map<U>(&self, mut f: impl FnMut(usize, usize, &T) -> U) -> Grid<U> {
        let cells = self
            .cells
            .iter()
            .enumerate()
            .map(|(i, c)| {
                c.as_ref()
                    .map(|v| f(i % self.width, i / self.width, v))
            })
            .collect();
        Grid {
            width: self.width,
            height: self.height,
            cells,
        }
    }

    /// Builds a grid from nested rows; all rows must share one length.
    pub fn from_rows(rows: Vec<Vec<Option<T>>>) -> Self {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        debug_assert!(rows.iter().all(|r| r.len() == width));
        let cells = rows.into_iter().flatten().collect();
        Self {
            width,
            height,
            cells,
        }
    }
}
