use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use match_engine::CascadeReport;
use tracing::debug;

use crate::session::{CascadeListener, GameSession, notify};

pub type SharedSession = Arc<Mutex<GameSession>>;

pub fn shared(session: GameSession) -> SharedSession {
    Arc::new(Mutex::new(session))
}

/// Locks the session. A panic while holding the lock cannot leave the board
/// half-written (every transition completes under one lock), so poisoning is
/// ignored.
pub fn lock(session: &SharedSession) -> MutexGuard<'_, GameSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives a cascade using the session's configured step delay.
pub async fn drive<L: CascadeListener + ?Sized>(
    session: &SharedSession,
    listener: &mut L,
) -> Option<CascadeReport> {
    let delay = lock(session).config().step_delay;
    drive_cascade(session, delay, listener).await
}

/// Runs a cascade one transition at a time, pausing `delay` between
/// transitions so a renderer can animate each phase.
///
/// The session lock is only held for a single transition, never across a
/// pause. Returns `None` if another cascade already holds the guard, or if
/// the session was reset before this one finished.
pub async fn drive_cascade<L: CascadeListener + ?Sized>(
    session: &SharedSession,
    delay: Duration,
    listener: &mut L,
) -> Option<CascadeReport> {
    let Some(ticket) = lock(session).start_cascade() else {
        debug!("cascade already in flight; not starting another");
        return None;
    };

    let mut report = CascadeReport::default();
    loop {
        let Some(event) = lock(session).advance(ticket) else {
            debug!(steps = report.steps.len(), "cascade abandoned after reset");
            return None;
        };
        report.record(&event);
        if notify(listener, &event) {
            return Some(report);
        }
        pause(delay).await;
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}
