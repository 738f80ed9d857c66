use std::collections::BTreeSet;

use crate::board::{Board, Position};

/// Packs every column in `affected_columns` (all columns when empty) so its
/// cells rest on the bottom row, keeping their top-to-bottom order.
///
/// Returns whether any cell moved. Column indices past the board edge are
/// ignored.
pub fn apply_gravity(board: &mut Board, affected_columns: &[usize]) -> bool {
    let columns: BTreeSet<usize> = if affected_columns.is_empty() {
        (0..board.cols()).collect()
    } else {
        affected_columns
            .iter()
            .copied()
            .filter(|&col| col < board.cols())
            .collect()
    };

    let mut moved = false;
    for col in columns {
        moved |= compact_column(board, col);
    }
    moved
}

fn compact_column(board: &mut Board, col: usize) -> bool {
    let mut moved = false;
    // Next free slot, filled from the bottom up.
    let mut write_row = board.rows();
    for read_row in (0..board.rows()).rev() {
        let from = Position::new(read_row, col);
        let Some(cell) = board.take(from) else {
            continue;
        };
        write_row -= 1;
        if write_row != read_row {
            moved = true;
        }
        board.set(Position::new(write_row, col), cell);
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    fn column_colors(board: &Board, col: usize) -> Vec<Option<String>> {
        (0..board.rows())
            .map(|row| {
                board
                    .get(Position::new(row, col))
                    .map(|cell| cell.color().to_string())
            })
            .collect()
    }

    #[test]
    fn cells_fall_and_keep_order() {
        let mut board = Board::new(5, 1);
        board.set(Position::new(0, 0), Cell::normal("a"));
        board.set(Position::new(2, 0), Cell::normal("b"));
        board.set(Position::new(3, 0), Cell::blocking("c"));

        assert!(apply_gravity(&mut board, &[]));
        assert_eq!(
            column_colors(&board, 0),
            vec![
                None,
                None,
                Some("a".to_string()),
                Some("b".to_string()),
                Some("c".to_string())
            ]
        );
    }

    #[test]
    fn settled_board_reports_no_movement() {
        let mut board = Board::new(3, 2);
        board.set(Position::new(2, 0), Cell::normal("a"));
        board.set(Position::new(1, 0), Cell::normal("b"));
        assert!(!apply_gravity(&mut board, &[]));
    }

    #[test]
    fn only_listed_columns_are_compacted() {
        let mut board = Board::new(3, 2);
        board.set(Position::new(0, 0), Cell::normal("a"));
        board.set(Position::new(0, 1), Cell::normal("b"));

        assert!(apply_gravity(&mut board, &[1, 1, 7]));
        assert!(board.get(Position::new(0, 0)).is_some());
        assert!(board.get(Position::new(2, 1)).is_some());
        assert!(board.get(Position::new(0, 1)).is_none());
    }
}
