//! Game board: settled cells, full-row detection and row collapse

use crate::tetromino::ColorIndex;

/// Default board dimensions
pub const DEFAULT_WIDTH: usize = 11;
pub const DEFAULT_HEIGHT: usize = 19;

/// A cell on the board - either empty or filled with a palette color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled(ColorIndex),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_filled(&self) -> bool {
        matches!(self, Cell::Filled(_))
    }
}

/// The game board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    /// Grid stored as [row][col], row 0 is the top, row increases downward
    cells: Vec<Vec<Cell>>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl Board {
    /// Create a new empty board
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "board must have at least one cell");
        Self {
            width,
            height,
            cells: vec![vec![Cell::Empty; width]; height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get the cell at (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.cells
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    /// Overwrite the cell at (x, y). Panics if out of bounds.
    #[cfg(test)]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.cells[y][x] = cell;
    }

    /// Whether (x, y) holds a settled square. Panics if out of bounds.
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        self.cells[y][x].is_filled()
    }

    /// Write a settled piece's squares into the board.
    ///
    /// Every target must be in bounds and empty; the caller guarantees this
    /// with a collision check, so a violation is a bug.
    pub fn lock_cells(&mut self, positions: &[(i32, i32)], color: ColorIndex) {
        for &(x, y) in positions {
            assert!(
                x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height,
                "lock target ({x}, {y}) outside the board"
            );
            let cell = &mut self.cells[y as usize][x as usize];
            assert!(cell.is_empty(), "lock target ({x}, {y}) already occupied");
            *cell = Cell::Filled(color);
        }
    }

    /// Check if a row is completely filled
    pub fn is_full_row(&self, y: usize) -> bool {
        self.cells[y].iter().all(|cell| cell.is_filled())
    }

    /// Indices of all full rows, ascending (top to bottom)
    pub fn full_rows(&self) -> Vec<usize> {
        (0..self.height).filter(|&y| self.is_full_row(y)).collect()
    }

    /// Remove the given rows, shifting everything above each one down by one.
    ///
    /// Rows are processed in ascending order. Removing a row only moves the
    /// rows above it, so the pending indices further down stay valid.
    pub fn collapse(&mut self, rows: &[usize]) {
        let mut rows = rows.to_vec();
        rows.sort_unstable();
        rows.dedup();

        for row in rows {
            for y in (1..=row).rev() {
                self.cells[y] = self.cells[y - 1].clone();
            }
            self.cells[0] = vec![Cell::Empty; self.width];
        }
    }

    /// Check if the board is completely empty
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.cells
            .iter()
            .all(|row| row.iter().all(|cell| cell.is_empty()))
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.iter().map(|row| row.as_slice())
    }
}
