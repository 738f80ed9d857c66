use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::board::{Board, Position};
use crate::cell::{CellKind, Color, PainterDirection};
use crate::matcher::Match;

pub const DEFAULT_EXPLOSION_RADIUS: usize = 3;

/// A cell recolored by a painter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintedCell {
    pub position: Position,
    pub old_color: Color,
    pub new_color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecialEffect {
    Explode,
    Paint(PainterDirection),
}

fn special_effect(kind: CellKind) -> Option<SpecialEffect> {
    match kind {
        CellKind::Exploding => Some(SpecialEffect::Explode),
        CellKind::PainterH => Some(SpecialEffect::Paint(PainterDirection::Horizontal)),
        CellKind::PainterV => Some(SpecialEffect::Paint(PainterDirection::Vertical)),
        CellKind::PainterDiagNe => Some(SpecialEffect::Paint(PainterDirection::DiagonalNe)),
        CellKind::PainterDiagNw => Some(SpecialEffect::Paint(PainterDirection::DiagonalNw)),
        CellKind::Normal | CellKind::Blocking => None,
    }
}

pub fn process_explosions(board: &mut Board, matches: &[Match]) -> Vec<Position> {
    process_explosions_with(board, matches, DEFAULT_EXPLOSION_RADIUS)
}

/// Clears a `(2 * radius + 1)` square around every exploding cell that sits
/// inside one of `matches`, clipped to the board.
///
/// Centers are collected before anything is cleared, so an exploding cell
/// caught in a blast does not detonate in the same call. Returns each
/// cleared position once, in the order it was cleared.
pub fn process_explosions_with(
    board: &mut Board,
    matches: &[Match],
    radius: usize,
) -> Vec<Position> {
    let mut seen = BTreeSet::new();
    let centers: Vec<Position> = matches
        .iter()
        .flat_map(|m| m.positions.iter().copied())
        .filter(|&pos| {
            board
                .get(pos)
                .and_then(|cell| special_effect(cell.kind()))
                .is_some_and(|effect| effect == SpecialEffect::Explode)
        })
        .filter(|&pos| seen.insert(pos))
        .collect();

    let mut cleared = Vec::new();
    for center in centers {
        let rows = clipped_span(center.row, radius, board.rows());
        let cols = clipped_span(center.col, radius, board.cols());
        for row in rows {
            for col in cols.clone() {
                let pos = Position::new(row, col);
                if board.take(pos).is_some() {
                    cleared.push(pos);
                }
            }
        }
    }
    cleared
}

/// `center ± radius` clipped to `0..len`.
fn clipped_span(center: usize, radius: usize, len: usize) -> std::ops::RangeInclusive<usize> {
    let last = len.saturating_sub(1);
    center.saturating_sub(radius)..=center.saturating_add(radius).min(last)
}

/// Fires at most one painter per match: the first painter in scan order.
///
/// If that painter is gone from the board (an explosion got it first) the
/// match paints nothing. Every occupied, non-blocking cell on the painter's
/// line takes its color. Diagonal painters paint both diagonals through
/// their cell, so the painter itself is reported once per diagonal.
pub fn process_painters(board: &mut Board, matches: &[Match]) -> Vec<PaintedCell> {
    let mut painted = Vec::new();
    for m in matches {
        let Some((pos, _)) = m
            .cells()
            .find(|&(_, kind)| matches!(special_effect(kind), Some(SpecialEffect::Paint(_))))
        else {
            continue;
        };

        let Some((color, direction)) = board.get(pos).and_then(|cell| {
            match special_effect(cell.kind()) {
                Some(SpecialEffect::Paint(direction)) => Some((cell.color().clone(), direction)),
                Some(SpecialEffect::Explode) | None => None,
            }
        }) else {
            continue;
        };

        for target in painter_lines(board, pos, direction) {
            let Some(cell) = board.get_mut(target) else {
                continue;
            };
            if cell.kind() == CellKind::Blocking {
                continue;
            }
            let old_color = cell.repaint(color.clone());
            painted.push(PaintedCell {
                position: target,
                old_color,
                new_color: color.clone(),
            });
        }
    }
    painted
}

fn painter_lines(board: &Board, pos: Position, direction: PainterDirection) -> Vec<Position> {
    match direction {
        PainterDirection::Horizontal => (0..board.cols())
            .map(|col| Position::new(pos.row, col))
            .collect(),
        PainterDirection::Vertical => (0..board.rows())
            .map(|row| Position::new(row, pos.col))
            .collect(),
        PainterDirection::DiagonalNe | PainterDirection::DiagonalNw => {
            let mut line = diagonal_through(board, pos, 1);
            line.extend(diagonal_through(board, pos, -1));
            line
        }
    }
}

/// Full diagonal through `pos`, top to bottom. `col_step` is `1` for the
/// down-right diagonal and `-1` for the down-left one.
fn diagonal_through(board: &Board, pos: Position, col_step: isize) -> Vec<Position> {
    let back = if col_step > 0 {
        pos.row.min(pos.col)
    } else {
        pos.row.min(board.cols() - 1 - pos.col)
    };
    let mut cursor = pos.offset(-(back as isize), -col_step * back as isize);
    let mut line = Vec::new();
    while let Some(current) = cursor.filter(|&p| board.in_bounds(p)) {
        line.push(current);
        cursor = current.offset(1, col_step);
    }
    line
}
