use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque color tag. Two cells match when their colors compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Color {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Color {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The line a painter repaints when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PainterDirection {
    Horizontal,
    Vertical,
    /// Diagonal painters repaint both diagonals through their cell,
    /// whichever way they lean.
    DiagonalNe,
    DiagonalNw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Normal,
    Exploding,
    PainterH,
    PainterV,
    PainterDiagNe,
    PainterDiagNw,
    Blocking,
}

impl CellKind {
    pub const ALL: [CellKind; 7] = [
        CellKind::Normal,
        CellKind::Exploding,
        CellKind::PainterH,
        CellKind::PainterV,
        CellKind::PainterDiagNe,
        CellKind::PainterDiagNw,
        CellKind::Blocking,
    ];

    pub fn is_matchable(self) -> bool {
        !matches!(self, CellKind::Blocking)
    }

    pub fn is_special(self) -> bool {
        !matches!(self, CellKind::Normal)
    }

    pub fn is_exploding(self) -> bool {
        matches!(self, CellKind::Exploding)
    }

    pub fn painter_direction(self) -> Option<PainterDirection> {
        match self {
            CellKind::PainterH => Some(PainterDirection::Horizontal),
            CellKind::PainterV => Some(PainterDirection::Vertical),
            CellKind::PainterDiagNe => Some(PainterDirection::DiagonalNe),
            CellKind::PainterDiagNw => Some(PainterDirection::DiagonalNw),
            CellKind::Normal | CellKind::Exploding | CellKind::Blocking => None,
        }
    }

    pub fn is_painter(self) -> bool {
        self.painter_direction().is_some()
    }

    pub fn painter(direction: PainterDirection) -> Self {
        match direction {
            PainterDirection::Horizontal => CellKind::PainterH,
            PainterDirection::Vertical => CellKind::PainterV,
            PainterDirection::DiagonalNe => CellKind::PainterDiagNe,
            PainterDirection::DiagonalNw => CellKind::PainterDiagNw,
        }
    }
}

/// A ball on the board. The kind is fixed at creation; painters may
/// rewrite the color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    kind: CellKind,
    color: Color,
}

impl Cell {
    pub fn new(kind: CellKind, color: impl Into<Color>) -> Self {
        Self {
            kind,
            color: color.into(),
        }
    }

    pub fn normal(color: impl Into<Color>) -> Self {
        Self::new(CellKind::Normal, color)
    }

    pub fn exploding(color: impl Into<Color>) -> Self {
        Self::new(CellKind::Exploding, color)
    }

    pub fn painter(direction: PainterDirection, color: impl Into<Color>) -> Self {
        Self::new(CellKind::painter(direction), color)
    }

    pub fn blocking(color: impl Into<Color>) -> Self {
        Self::new(CellKind::Blocking, color)
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    /// Replaces the color and returns the previous one.
    pub fn repaint(&mut self, color: Color) -> Color {
        std::mem::replace(&mut self.color, color)
    }

    pub fn is_matchable(&self) -> bool {
        self.kind.is_matchable()
    }

    pub fn is_special(&self) -> bool {
        self.kind.is_special()
    }

    pub fn is_exploding(&self) -> bool {
        self.kind.is_exploding()
    }

    pub fn is_painter(&self) -> bool {
        self.kind.is_painter()
    }

    pub fn painter_direction(&self) -> Option<PainterDirection> {
        self.kind.painter_direction()
    }
}
