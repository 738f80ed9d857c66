use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cell::Cell;

/// Row 0 is the top of the board; gravity pulls towards `rows - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Offsets the position, returning `None` when either coordinate would go
    /// negative. Upper bounds are checked by the board.
    pub fn offset(self, d_row: isize, d_col: isize) -> Option<Position> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        Some(Position::new(row, col))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoardShapeError {
    #[error("board must have at least one row and one column (got {rows}x{cols})")]
    Empty { rows: usize, cols: usize },
    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Deserialize)]
struct BoardSnapshot {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Option<Cell>>>,
}

/// Fixed-size grid of optional cells.
///
/// Dimensions are set at construction and never change; `clear` empties
/// every slot in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoardSnapshot")]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Option<Cell>>>,
}

impl TryFrom<BoardSnapshot> for Board {
    type Error = BoardShapeError;

    fn try_from(snapshot: BoardSnapshot) -> Result<Self, Self::Error> {
        Board::from_rows(snapshot.cells).and_then(|board| {
            if board.rows != snapshot.rows {
                return Err(BoardShapeError::RowCount {
                    expected: snapshot.rows,
                    found: board.rows,
                });
            }
            if board.cols != snapshot.cols {
                return Err(BoardShapeError::RowWidth {
                    row: 0,
                    expected: snapshot.cols,
                    found: board.cols,
                });
            }
            Ok(board)
        })
    }
}

impl Board {
    /// Creates an empty board. Zero-sized dimensions are bumped to 1 so every
    /// board has at least one slot.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        Self {
            rows,
            cols,
            cells: vec![vec![None; cols]; rows],
        }
    }

    /// Builds a board from explicit rows, top row first.
    pub fn from_rows(cells: Vec<Vec<Option<Cell>>>) -> Result<Self, BoardShapeError> {
        let rows = cells.len();
        let cols = cells.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(BoardShapeError::Empty { rows, cols });
        }
        if let Some((row, found)) = cells
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != cols)
        {
            return Err(BoardShapeError::RowWidth {
                row,
                expected: cols,
                found,
            });
        }
        Ok(Self { rows, cols, cells })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.row < self.rows && pos.col < self.cols
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(pos.row)?.get(pos.col)?.as_ref()
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.cells.get_mut(pos.row)?.get_mut(pos.col)?.as_mut()
    }

    pub fn is_empty_at(&self, pos: Position) -> bool {
        self.get(pos).is_none()
    }

    /// Writes a cell, returning whatever occupied the slot before. Writes
    /// outside the board are dropped.
    pub fn set(&mut self, pos: Position, cell: Cell) -> Option<Cell> {
        match self.slot_mut(pos) {
            Some(slot) => slot.replace(cell),
            None => {
                debug!(%pos, rows = self.rows, cols = self.cols, "ignoring out-of-bounds write");
                None
            }
        }
    }

    /// Empties a slot and returns its former occupant.
    pub fn take(&mut self, pos: Position) -> Option<Cell> {
        self.slot_mut(pos)?.take()
    }

    pub fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(None);
        }
    }

    /// Commits a placed piece's cells into the board.
    pub fn commit<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (Position, Cell)>,
    {
        for (pos, cell) in cells {
            self.set(pos, cell);
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells
            .iter()
            .flat_map(|row| row.iter())
            .filter(|slot| slot.is_some())
            .count()
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| Position::new(row, col)))
    }

    pub fn occupied(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(col, slot)| slot.as_ref().map(|c| (Position::new(row, col), c)))
        })
    }

    pub fn row_cells(&self, row: usize) -> &[Option<Cell>] {
        self.cells.get(row).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn slot_mut(&mut self, pos: Position) -> Option<&mut Option<Cell>> {
        self.cells.get_mut(pos.row)?.get_mut(pos.col)
    }
}
