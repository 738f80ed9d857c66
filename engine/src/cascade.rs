use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::{Board, Position};
use crate::config::EngineConfig;
use crate::effects::{PaintedCell, process_explosions_with, process_painters};
use crate::gravity::apply_gravity;
use crate::matcher::{Match, find_matches_with, matched_positions};

/// What one resolving pass did to the board. Handed to renderers and scorers;
/// nothing in it feeds back into the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// 1-based index of this step within its cascade.
    pub step_index: usize,
    pub matches: Vec<Match>,
    pub exploded: Vec<Position>,
    pub painted: Vec<PaintedCell>,
    /// Matched positions that still held a cell when matches were removed.
    pub cleared: Vec<Position>,
    /// Filled in once the step settles; `false` while it is still resolving.
    pub balls_moved: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePhase {
    Idle,
    Scanning,
    Resolving,
    Settling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// No cascade is running.
    Idle,
    Scanned { step_index: usize, matches: usize },
    Resolved(StepResult),
    Settled { step_index: usize, balls_moved: bool },
    /// The board is stable. `cascade_steps` is zero when nothing ever matched.
    Finished { cascade_steps: usize },
}

/// Step results of a finished cascade, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub cascade_steps: usize,
    pub steps: Vec<StepResult>,
}

impl CascadeReport {
    pub fn record(&mut self, event: &StepEvent) {
        match event {
            StepEvent::Resolved(result) => self.steps.push(result.clone()),
            StepEvent::Settled {
                step_index,
                balls_moved,
            } => {
                if let Some(step) = self
                    .steps
                    .iter_mut()
                    .rev()
                    .find(|step| step.step_index == *step_index)
                {
                    step.balls_moved = *balls_moved;
                }
            }
            StepEvent::Finished { cascade_steps } => self.cascade_steps = *cascade_steps,
            StepEvent::Idle | StepEvent::Scanned { .. } => {}
        }
    }
}

#[derive(Debug, Clone, Default)]
enum Phase {
    #[default]
    Idle,
    Scanning,
    Resolving {
        matches: Vec<Match>,
    },
    Settling {
        step_index: usize,
        columns: Vec<usize>,
    },
}

/// Drives SCANNING -> RESOLVING -> SETTLING until a scan comes back empty.
///
/// The controller never owns the board; every `step` borrows it for one
/// transition so a driver can pause between transitions.
#[derive(Debug, Clone)]
pub struct CascadeController {
    config: EngineConfig,
    phase: Phase,
    steps: usize,
}

impl CascadeController {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: config.sanitized(),
            phase: Phase::Idle,
            steps: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> CascadePhase {
        match self.phase {
            Phase::Idle => CascadePhase::Idle,
            Phase::Scanning => CascadePhase::Scanning,
            Phase::Resolving { .. } => CascadePhase::Resolving,
            Phase::Settling { .. } => CascadePhase::Settling,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Steps completed so far in the running cascade.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Starts a cascade. Returns `false` without touching anything when one
    /// is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_active() {
            debug!(phase = ?self.phase(), "cascade already running; ignoring begin");
            return false;
        }
        self.phase = Phase::Scanning;
        self.steps = 0;
        true
    }

    /// Drops any in-flight work and releases the guard.
    pub fn cancel(&mut self) {
        if self.is_active() {
            debug!(phase = ?self.phase(), steps = self.steps, "cascade cancelled");
        }
        self.phase = Phase::Idle;
        self.steps = 0;
    }

    /// Performs exactly one state transition against `board`.
    pub fn step(&mut self, board: &mut Board) -> StepEvent {
        match std::mem::take(&mut self.phase) {
            Phase::Idle => StepEvent::Idle,
            Phase::Scanning => self.scan(board),
            Phase::Resolving { matches } => self.resolve(board, matches),
            Phase::Settling {
                step_index,
                columns,
            } => {
                let balls_moved = apply_gravity(board, &columns);
                debug!(step_index, columns = columns.len(), balls_moved, "cascade step settled");
                self.phase = Phase::Scanning;
                StepEvent::Settled {
                    step_index,
                    balls_moved,
                }
            }
        }
    }

    /// Runs a whole cascade synchronously. Returns `None` when a cascade was
    /// already in flight.
    pub fn run_to_completion(&mut self, board: &mut Board) -> Option<CascadeReport> {
        if !self.begin() {
            return None;
        }
        let mut report = CascadeReport::default();
        loop {
            let event = self.step(board);
            report.record(&event);
            if let StepEvent::Finished { .. } | StepEvent::Idle = event {
                return Some(report);
            }
        }
    }

    fn scan(&mut self, board: &Board) -> StepEvent {
        let matches = find_matches_with(board, self.config.min_run_length);
        if matches.is_empty() {
            return self.finish();
        }
        if self.steps >= self.config.max_cascade_steps {
            warn!(
                steps = self.steps,
                pending_matches = matches.len(),
                "cascade step limit reached; stopping with matches still on the board"
            );
            return self.finish();
        }

        self.steps += 1;
        let count = matches.len();
        debug!(step_index = self.steps, matches = count, "cascade step scanned");
        self.phase = Phase::Resolving { matches };
        StepEvent::Scanned {
            step_index: self.steps,
            matches: count,
        }
    }

    fn resolve(&mut self, board: &mut Board, matches: Vec<Match>) -> StepEvent {
        let exploded = process_explosions_with(board, &matches, self.config.explosion_radius);
        let painted = process_painters(board, &matches);

        let cleared: Vec<Position> = matched_positions(&matches)
            .into_iter()
            .filter(|&pos| board.take(pos).is_some())
            .collect();

        let columns: BTreeSet<usize> = exploded
            .iter()
            .chain(cleared.iter())
            .map(|pos| pos.col)
            .collect();

        debug!(
            step_index = self.steps,
            exploded = exploded.len(),
            painted = painted.len(),
            cleared = cleared.len(),
            "cascade step resolved"
        );

        self.phase = Phase::Settling {
            step_index: self.steps,
            columns: columns.into_iter().collect(),
        };
        StepEvent::Resolved(StepResult {
            step_index: self.steps,
            matches,
            exploded,
            painted,
            cleared,
            balls_moved: false,
        })
    }

    fn finish(&mut self) -> StepEvent {
        let cascade_steps = self.steps;
        debug!(cascade_steps, "cascade finished");
        self.phase = Phase::Idle;
        self.steps = 0;
        StepEvent::Finished { cascade_steps }
    }
}

impl Default for CascadeController {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
