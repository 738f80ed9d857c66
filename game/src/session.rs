use match_engine::{
    Board, CascadeController, CascadeReport, Cell, EngineConfig, Position, StepEvent, StepResult,
};
use tracing::{debug, info};

use crate::settings::Settings;

/// Hooks for the renderer and scorer. Everything they receive is advisory.
pub trait CascadeListener {
    fn on_resolved(&mut self, _step: &StepResult) {}

    fn on_settled(&mut self, _step_index: usize, _balls_moved: bool) {}

    /// Called once per cascade with the number of steps it took, for
    /// step-indexed score multipliers.
    fn on_finished(&mut self, _cascade_steps: usize) {}
}

impl CascadeListener for () {}

/// Proof that a cascade was started in a given board epoch. A reset bumps the
/// epoch, which invalidates every outstanding ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeTicket {
    epoch: u64,
}

/// One player's board plus the cascade running on it.
#[derive(Debug, Clone)]
pub struct GameSession {
    board: Board,
    cascade: CascadeController,
    epoch: u64,
    last_cascade_steps: usize,
    total_cascade_steps: usize,
    cascades_finished: u32,
}

impl GameSession {
    pub fn new(rows: usize, cols: usize, config: EngineConfig) -> Self {
        Self::with_board(Board::new(rows, cols), config)
    }

    /// Empty board with the configured dimensions.
    pub fn from_settings(settings: &Settings) -> Self {
        let settings = settings.sanitized();
        Self::new(settings.board.rows, settings.board.cols, settings.engine)
    }

    pub fn with_board(board: Board, config: EngineConfig) -> Self {
        Self {
            board,
            cascade: CascadeController::new(config),
            epoch: 0,
            last_cascade_steps: 0,
            total_cascade_steps: 0,
            cascades_finished: 0,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &EngineConfig {
        self.cascade.config()
    }

    pub fn is_cascading(&self) -> bool {
        self.cascade.is_active()
    }

    pub fn last_cascade_steps(&self) -> usize {
        self.last_cascade_steps
    }

    pub fn total_cascade_steps(&self) -> usize {
        self.total_cascade_steps
    }

    pub fn cascades_finished(&self) -> u32 {
        self.cascades_finished
    }

    /// Commits a landed piece's cells. Refused while a cascade is still
    /// resolving the previous placement.
    pub fn place<I>(&mut self, cells: I) -> bool
    where
        I: IntoIterator<Item = (Position, Cell)>,
    {
        if self.cascade.is_active() {
            debug!(epoch = self.epoch, "placement refused while cascade is running");
            return false;
        }
        self.board.commit(cells);
        true
    }

    /// Starts resolving the board. `None` if a cascade is already running.
    pub fn start_cascade(&mut self) -> Option<CascadeTicket> {
        if !self.cascade.begin() {
            return None;
        }
        Some(CascadeTicket { epoch: self.epoch })
    }

    /// Advances the cascade by one transition. `None` once the ticket has been
    /// invalidated by a reset.
    pub fn advance(&mut self, ticket: CascadeTicket) -> Option<StepEvent> {
        if ticket.epoch != self.epoch {
            return None;
        }
        let event = self.cascade.step(&mut self.board);
        if let StepEvent::Finished { cascade_steps } = event {
            self.last_cascade_steps = cascade_steps;
            self.total_cascade_steps += cascade_steps;
            self.cascades_finished += 1;
        }
        Some(event)
    }

    /// Runs a full cascade without pausing. Returns `None` when one is already
    /// in flight.
    pub fn settle(&mut self) -> Option<CascadeReport> {
        self.settle_with(&mut ())
    }

    pub fn settle_with<L: CascadeListener + ?Sized>(
        &mut self,
        listener: &mut L,
    ) -> Option<CascadeReport> {
        let ticket = self.start_cascade()?;
        let mut report = CascadeReport::default();
        loop {
            let event = self.advance(ticket)?;
            report.record(&event);
            if notify(listener, &event) {
                return Some(report);
            }
        }
    }

    /// Empties the board in place and abandons any running cascade.
    pub fn reset(&mut self) {
        if self.cascade.is_active() {
            info!(epoch = self.epoch, "board reset mid-cascade; discarding in-flight results");
        }
        self.cascade.cancel();
        self.board.clear();
        self.epoch += 1;
        self.last_cascade_steps = 0;
    }
}

/// Forwards an event to the listener. Returns `true` when the event ends the
/// cascade.
pub(crate) fn notify<L: CascadeListener + ?Sized>(listener: &mut L, event: &StepEvent) -> bool {
    match event {
        StepEvent::Resolved(step) => listener.on_resolved(step),
        StepEvent::Settled {
            step_index,
            balls_moved,
        } => listener.on_settled(*step_index, *balls_moved),
        StepEvent::Finished { cascade_steps } => {
            listener.on_finished(*cascade_steps);
            return true;
        }
        StepEvent::Idle => return true,
        StepEvent::Scanned { .. } => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn red_row(session: &mut GameSession, row: usize) -> bool {
        session.place((0..3).map(|col| (Position::new(row, col), Cell::normal("red"))))
    }

    #[test]
    fn placement_is_refused_mid_cascade() {
        let mut session = GameSession::new(4, 4, EngineConfig::default());
        assert!(red_row(&mut session, 3));

        let ticket = session.start_cascade().expect("idle session starts");
        assert!(session.start_cascade().is_none());
        assert!(!red_row(&mut session, 0));

        while !matches!(session.advance(ticket), Some(StepEvent::Finished { .. })) {}
        assert!(red_row(&mut session, 0));
    }

    #[test]
    fn reset_invalidates_outstanding_tickets() {
        let mut session = GameSession::new(4, 4, EngineConfig::default());
        red_row(&mut session, 3);
        let ticket = session.start_cascade().expect("idle session starts");
        session.advance(ticket);

        session.reset();
        assert!(session.advance(ticket).is_none());
        assert!(!session.is_cascading());
        assert_eq!(session.board().occupied_count(), 0);
        assert_eq!((session.board().rows(), session.board().cols()), (4, 4));
        assert!(session.start_cascade().is_some());
    }

    #[test]
    fn from_settings_uses_board_dimensions() {
        let mut settings = Settings::default();
        settings.board.rows = 6;
        settings.board.cols = 0;
        settings.engine.min_run_length = 4;

        let session = GameSession::from_settings(&settings);
        assert_eq!((session.board().rows(), session.board().cols()), (6, 1));
        assert_eq!(session.board().occupied_count(), 0);
        assert_eq!(session.config().min_run_length, 4);

        let defaults = GameSession::from_settings(&Settings::default());
        assert_eq!((defaults.board().rows(), defaults.board().cols()), (10, 8));
    }

    #[test]
    fn finished_cascades_accumulate_step_counts() {
        let mut session = GameSession::new(4, 4, EngineConfig::default());
        red_row(&mut session, 3);
        assert_eq!(session.settle().map(|r| r.cascade_steps), Some(1));
        assert_eq!(session.settle().map(|r| r.cascade_steps), Some(0));
        red_row(&mut session, 3);
        session.settle();

        assert_eq!(session.last_cascade_steps(), 1);
        assert_eq!(session.total_cascade_steps(), 2);
        assert_eq!(session.cascades_finished(), 3);
    }
}
