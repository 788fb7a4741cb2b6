use std::ops::Index;

/// A square grid of real values, indexed `(x, y)` where `x` is the row
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    size: usize,
    cells: Vec<f64>,
}

impl Grid {
    /// Create a `size x size` grid with every cell set to `fill`
    pub fn new(size: usize, fill: f64) -> Self {
        Grid {
            size,
            cells: vec![fill; size * size],
        }
    }

    /// Side length of the grid
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn offset(&self, x: usize, y: usize) -> Option<usize> {
        if x < self.size && y < self.size {
            Some(x * self.size + y)
        } else {
            None
        }
    }

    /// Value at `(x, y)`, or `None` outside the grid
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        self.offset(x, y).map(|i| self.cells[i])
    }

    /// Write `value` at `(x, y)`; returns `false` and leaves the grid
    /// untouched when the coordinate is outside it
    pub fn set(&mut self, x: usize, y: usize, value: f64) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.cells[i] = value;
                true
            }
            None => false,
        }
    }

    /// Row-major view of all cells
    pub fn as_slice(&self) -> &[f64] {
        &self.cells
    }

    /// Iterate over rows, each a slice of `size` values
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks() panics on 0, an empty grid has no rows anyway
        self.cells.chunks(self.size.max(1))
    }

    /// Copy the grid into nested vectors, `result[x][y]`
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.rows().map(|row| row.to_vec()).collect()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.cells.iter().copied().reduce(f64::min)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.cells.iter().copied().reduce(f64::max)
    }

    /// Arithmetic mean of all cells
    pub fn mean(&self) -> Option<f64> {
        if self.cells.is_empty() {
            return None;
        }
        Some(self.cells.iter().sum::<f64>() / self.cells.len() as f64)
    }
}

impl Index<(usize, usize)> for Grid {
    type Output = f64;

    fn index(&self, (x, y): (usize, usize)) -> &f64 {
        assert!(
            x < self.size && y < self.size,
            "index ({}, {}) out of bounds for grid of size {}",
            x,
            y,
            self.size
        );
        &self.cells[x * self.size + y]
    }
}
