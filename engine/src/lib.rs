//! Match and cascade resolution for a falling-ball puzzle board.
//!
//! Everything here is synchronous and operates on a caller-owned [`Board`].
//! Pacing, persistence and rendering live with the caller.

pub mod board;
pub mod cascade;
pub mod cell;
pub mod config;
pub mod duration_ms;
pub mod effects;
pub mod gravity;
pub mod matcher;

pub use board::{Board, BoardShapeError, Position};
pub use cascade::{CascadeController, CascadePhase, CascadeReport, StepEvent, StepResult};
pub use cell::{Cell, CellKind, Color, PainterDirection};
pub use config::{ConfigError, EngineConfig};
pub use effects::{
    DEFAULT_EXPLOSION_RADIUS, PaintedCell, process_explosions, process_explosions_with,
    process_painters,
};
pub use gravity::apply_gravity;
pub use matcher::{
    DEFAULT_MIN_RUN_LENGTH, Match, MatchDirection, find_matches, find_matches_with,
    matched_positions,
};
