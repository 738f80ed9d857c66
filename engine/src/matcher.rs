use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::board::{Board, Position};
use crate::cell::{CellKind, Color};

pub const DEFAULT_MIN_RUN_LENGTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchDirection {
    Horizontal,
    Vertical,
    Diagonal,
}

/// A run of same-colored matchable cells along one line.
///
/// Positions are in scan order. `kinds[i]` is the kind of the cell that sat
/// at `positions[i]` when the board was scanned, so effect passes can tell
/// a special cell that has since been destroyed from one that never existed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub direction: MatchDirection,
    pub color: Color,
    pub positions: Vec<Position>,
    pub kinds: Vec<CellKind>,
}

impl Match {
    /// Builds a match where every cell is `Normal` unless listed in `specials`.
    pub fn new(
        direction: MatchDirection,
        color: impl Into<Color>,
        positions: Vec<Position>,
        specials: &[(Position, CellKind)],
    ) -> Self {
        let kinds = positions
            .iter()
            .map(|pos| {
                specials
                    .iter()
                    .find(|(special, _)| special == pos)
                    .map_or(CellKind::Normal, |&(_, kind)| kind)
            })
            .collect();
        Self {
            direction,
            color: color.into(),
            positions,
            kinds,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions.contains(&pos)
    }

    pub fn cells(&self) -> impl Iterator<Item = (Position, CellKind)> + '_ {
        self.positions.iter().copied().zip(self.kinds.iter().copied())
    }
}

/// Union of all positions across a set of matches.
pub fn matched_positions(matches: &[Match]) -> BTreeSet<Position> {
    matches
        .iter()
        .flat_map(|m| m.positions.iter().copied())
        .collect()
}

pub fn find_matches(board: &Board) -> Vec<Match> {
    find_matches_with(board, DEFAULT_MIN_RUN_LENGTH)
}

/// Scans rows, columns and both diagonal directions for runs of at least
/// `min_run` cells. Each pass is independent, so a cell can show up in
/// matches from several directions.
pub fn find_matches_with(board: &Board, min_run: usize) -> Vec<Match> {
    let min_run = min_run.max(2);
    let mut scanner = RunScanner::new(board, min_run);

    for row in 0..board.rows() {
        scanner.scan_line(MatchDirection::Horizontal, Position::new(row, 0), (0, 1));
    }
    for col in 0..board.cols() {
        scanner.scan_line(MatchDirection::Vertical, Position::new(0, col), (1, 0));
    }

    // Down-right sweeps start on the top row and the left column.
    for col in 0..board.cols() {
        scanner.scan_line(MatchDirection::Diagonal, Position::new(0, col), (1, 1));
    }
    for row in 1..board.rows() {
        scanner.scan_line(MatchDirection::Diagonal, Position::new(row, 0), (1, 1));
    }

    // Down-left sweeps start on the top row and the right column.
    let last_col = board.cols() - 1;
    for col in 0..board.cols() {
        scanner.scan_line(MatchDirection::Diagonal, Position::new(0, col), (1, -1));
    }
    for row in 1..board.rows() {
        scanner.scan_line(MatchDirection::Diagonal, Position::new(row, last_col), (1, -1));
    }

    scanner.matches
}

struct Run {
    color: Color,
    positions: Vec<Position>,
    kinds: Vec<CellKind>,
}

struct RunScanner<'a> {
    board: &'a Board,
    min_run: usize,
    matches: Vec<Match>,
}

impl<'a> RunScanner<'a> {
    fn new(board: &'a Board, min_run: usize) -> Self {
        Self {
            board,
            min_run,
            matches: Vec::new(),
        }
    }

    fn scan_line(&mut self, direction: MatchDirection, start: Position, step: (isize, isize)) {
        let board = self.board;
        let mut run: Option<Run> = None;
        let mut cursor = Some(start).filter(|&pos| board.in_bounds(pos));

        while let Some(pos) = cursor {
            cursor = pos
                .offset(step.0, step.1)
                .filter(|&next| board.in_bounds(next));

            let cell = board.get(pos).filter(|cell| cell.is_matchable());
            if let (Some(cell), Some(current)) = (cell, run.as_mut()) {
                if current.color == *cell.color() {
                    current.positions.push(pos);
                    current.kinds.push(cell.kind());
                    continue;
                }
            }

            self.flush(direction, run.take());
            run = cell.map(|cell| Run {
                color: cell.color().clone(),
                positions: vec![pos],
                kinds: vec![cell.kind()],
            });
        }

        // Off-line sentinel: a run touching the edge still gets emitted.
        self.flush(direction, run);
    }

    fn flush(&mut self, direction: MatchDirection, run: Option<Run>) {
        let Some(run) = run else {
            return;
        };
        if run.positions.len() < self.min_run {
            return;
        }
        trace!(
            ?direction,
            color = %run.color,
            len = run.positions.len(),
            start = %run.positions[0],
            "match found"
        );
        self.matches.push(Match {
            direction,
            color: run.color,
            positions: run.positions,
            kinds: run.kinds,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, PainterDirection};

    fn put(board: &mut Board, cells: &[(usize, usize, &str)]) {
        for &(row, col, color) in cells {
            board.set(Position::new(row, col), Cell::normal(color));
        }
    }

    #[test]
    fn empty_board_has_no_matches() {
        assert!(find_matches(&Board::new(6, 6)).is_empty());
    }

    #[test]
    fn horizontal_run_touching_right_edge_is_flushed() {
        let mut board = Board::new(4, 5);
        put(&mut board, &[(3, 2, "red"), (3, 3, "red"), (3, 4, "red")]);

        let matches = find_matches(&board);
        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.direction, MatchDirection::Horizontal);
        assert_eq!(m.color, Color::new("red"));
        assert_eq!(
            m.positions,
            vec![Position::new(3, 2), Position::new(3, 3), Position::new(3, 4)]
        );
    }

    #[test]
    fn two_in_a_row_is_not_a_match() {
        let mut board = Board::new(4, 4);
        put(&mut board, &[(0, 0, "red"), (0, 1, "red"), (0, 2, "blue")]);
        assert!(find_matches(&board).is_empty());
    }

    #[test]
    fn vertical_run_is_listed_top_to_bottom() {
        let mut board = Board::new(5, 3);
        put(&mut board, &[(1, 1, "green"), (2, 1, "green"), (3, 1, "green"), (4, 1, "green")]);

        let matches = find_matches(&board);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].direction, MatchDirection::Vertical);
        assert_eq!(matches[0].positions.first(), Some(&Position::new(1, 1)));
        assert_eq!(matches[0].len(), 4);
    }

    #[test]
    fn blocking_cell_breaks_a_run_even_with_same_color() {
        let mut board = Board::new(1, 7);
        put(&mut board, &[(0, 0, "red"), (0, 1, "red"), (0, 3, "red"), (0, 4, "red")]);
        board.set(Position::new(0, 2), Cell::blocking("red"));
        assert!(find_matches(&board).is_empty());
    }

    #[test]
    fn gap_breaks_a_run() {
        let mut board = Board::new(1, 7);
        put(&mut board, &[(0, 0, "red"), (0, 1, "red"), (0, 3, "red"), (0, 4, "red")]);
        assert!(find_matches(&board).is_empty());
    }

    #[test]
    fn color_change_flushes_and_restarts() {
        let mut board = Board::new(1, 6);
        put(
            &mut board,
            &[(0, 0, "red"), (0, 1, "red"), (0, 2, "red"), (0, 3, "blue"), (0, 4, "blue"), (0, 5, "blue")],
        );
        let matches = find_matches(&board);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].color, Color::new("red"));
        assert_eq!(matches[1].color, Color::new("blue"));
        assert_eq!(matches[1].positions[0], Position::new(0, 3));
    }

    #[test]
    fn finds_both_diagonal_directions() {
        let mut board = Board::new(5, 5);
        put(&mut board, &[(1, 0, "red"), (2, 1, "red"), (3, 2, "red")]);
        put(&mut board, &[(0, 4, "blue"), (1, 3, "blue"), (2, 2, "blue")]);

        let matches = find_matches(&board);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.direction == MatchDirection::Diagonal));

        let red = matches.iter().find(|m| m.color == Color::new("red")).unwrap();
        assert_eq!(
            red.positions,
            vec![Position::new(1, 0), Position::new(2, 1), Position::new(3, 2)]
        );
        let blue = matches.iter().find(|m| m.color == Color::new("blue")).unwrap();
        assert_eq!(
            blue.positions,
            vec![Position::new(0, 4), Position::new(1, 3), Position::new(2, 2)]
        );
    }

    #[test]
    fn corner_diagonals_are_scanned_once() {
        let mut board = Board::new(3, 3);
        put(&mut board, &[(0, 0, "red"), (1, 1, "red"), (2, 2, "red")]);
        let matches = find_matches(&board);
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn overlapping_directions_each_produce_a_match() {
        let mut board = Board::new(3, 3);
        put(
            &mut board,
            &[(2, 0, "red"), (2, 1, "red"), (2, 2, "red"), (0, 0, "red"), (1, 0, "red")],
        );
        let matches = find_matches(&board);
        let directions: Vec<_> = matches.iter().map(|m| m.direction).collect();
        assert!(directions.contains(&MatchDirection::Horizontal));
        assert!(directions.contains(&MatchDirection::Vertical));
        assert!(matches.iter().all(|m| m.contains(Position::new(2, 0))));
    }

    #[test]
    fn special_cells_match_by_color_and_record_their_kind() {
        let mut board = Board::new(1, 3);
        board.set(Position::new(0, 0), Cell::normal("red"));
        board.set(Position::new(0, 1), Cell::painter(PainterDirection::Vertical, "red"));
        board.set(Position::new(0, 2), Cell::exploding("red"));

        let matches = find_matches(&board);
        assert_eq!(matches.len(), 1);
        assert_eq!(
            matches[0].kinds,
            vec![CellKind::Normal, CellKind::PainterV, CellKind::Exploding]
        );
    }

    #[test]
    fn min_run_length_is_configurable() {
        let mut board = Board::new(1, 5);
        put(&mut board, &[(0, 0, "red"), (0, 1, "red"), (0, 2, "red")]);
        assert_eq!(find_matches_with(&board, 3).len(), 1);
        assert!(find_matches_with(&board, 4).is_empty());
        // A single cell never counts as a run.
        let mut lone = Board::new(1, 1);
        put(&mut lone, &[(0, 0, "red")]);
        assert!(find_matches_with(&lone, 0).is_empty());
    }

    #[test]
    fn matched_positions_deduplicates_overlaps() {
        let mut board = Board::new(3, 3);
        put(
            &mut board,
            &[(2, 0, "red"), (2, 1, "red"), (2, 2, "red"), (0, 0, "red"), (1, 0, "red")],
        );
        let positions = matched_positions(&find_matches(&board));
        assert_eq!(positions.len(), 5);
    }
}
