//! Plain-text boards for the CLI and tests.
//!
//! One line per row, top row first, cells separated by whitespace:
//!
//! ```text
//! // comment lines and blank lines are skipped
//! .    .      .
//! red  blue:x .
//! red  red:h  #
//! ```
//!
//! `.` is empty, `#` is a gray blocking cell, and `color:kind` picks a
//! special kind: `x` exploding, `h`/`v`/`ne`/`nw` painters, `#` blocking.

use match_engine::{Board, Cell, CellKind, PainterDirection};

pub const BLOCKING_DEFAULT_COLOR: &str = "gray";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FixtureError {
    #[error("fixture has no rows")]
    Empty,
    #[error("line {line}: unknown cell kind in `{token}`")]
    UnknownKind { line: usize, token: String },
    #[error("line {line}: missing color in `{token}`")]
    MissingColor { line: usize, token: String },
    #[error("line {line}: expected {expected} cells, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

pub fn parse_board(text: &str) -> Result<Board, FixtureError> {
    let mut rows: Vec<Vec<Option<Cell>>> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        let cells = trimmed
            .split_whitespace()
            .map(|token| parse_token(line, token))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(first) = rows.first() {
            if first.len() != cells.len() {
                return Err(FixtureError::RaggedRow {
                    line,
                    expected: first.len(),
                    found: cells.len(),
                });
            }
        }
        rows.push(cells);
    }

    if rows.is_empty() {
        return Err(FixtureError::Empty);
    }
    // Rows are non-empty and equal width, so the shape is always valid.
    Board::from_rows(rows).map_err(|_| FixtureError::Empty)
}

fn parse_token(line: usize, token: &str) -> Result<Option<Cell>, FixtureError> {
    match token {
        "." => return Ok(None),
        "#" => return Ok(Some(Cell::blocking(BLOCKING_DEFAULT_COLOR))),
        _ => {}
    }

    let (color, kind) = match token.split_once(':') {
        Some((color, suffix)) => (color, kind_from_suffix(suffix)),
        None => (token, Some(CellKind::Normal)),
    };
    if color.is_empty() {
        return Err(FixtureError::MissingColor {
            line,
            token: token.to_string(),
        });
    }
    let kind = kind.ok_or_else(|| FixtureError::UnknownKind {
        line,
        token: token.to_string(),
    })?;
    Ok(Some(Cell::new(kind, color)))
}

fn kind_from_suffix(suffix: &str) -> Option<CellKind> {
    match suffix {
        "x" => Some(CellKind::Exploding),
        "h" => Some(CellKind::painter(PainterDirection::Horizontal)),
        "v" => Some(CellKind::painter(PainterDirection::Vertical)),
        "ne" => Some(CellKind::painter(PainterDirection::DiagonalNe)),
        "nw" => Some(CellKind::painter(PainterDirection::DiagonalNw)),
        "#" => Some(CellKind::Blocking),
        _ => None,
    }
}

fn kind_suffix(kind: CellKind) -> Option<&'static str> {
    match kind {
        CellKind::Normal => None,
        CellKind::Exploding => Some("x"),
        CellKind::PainterH => Some("h"),
        CellKind::PainterV => Some("v"),
        CellKind::PainterDiagNe => Some("ne"),
        CellKind::PainterDiagNw => Some("nw"),
        CellKind::Blocking => Some("#"),
    }
}

fn render_cell(cell: Option<&Cell>) -> String {
    let Some(cell) = cell else {
        return ".".to_string();
    };
    let color = cell.color().as_str();
    match kind_suffix(cell.kind()) {
        Some("#") if color == BLOCKING_DEFAULT_COLOR => "#".to_string(),
        Some(suffix) => format!("{color}:{suffix}"),
        None => color.to_string(),
    }
}

/// Formats a board in the fixture syntax, with columns padded to line up.
pub fn render_board(board: &Board) -> String {
    let tokens: Vec<Vec<String>> = (0..board.rows())
        .map(|row| board.row_cells(row).iter().map(|slot| render_cell(slot.as_ref())).collect())
        .collect();
    let width = tokens
        .iter()
        .flat_map(|row| row.iter().map(String::len))
        .max()
        .unwrap_or(1);

    let mut out = String::new();
    for row in tokens {
        let line = row
            .iter()
            .map(|token| format!("{token:<width$}"))
            .collect::<Vec<_>>()
            .join(" ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}
