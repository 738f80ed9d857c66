pub mod driver;
pub mod fixture;
pub mod session;
pub mod settings;

pub use driver::{SharedSession, drive, drive_cascade, lock, shared};
pub use fixture::{FixtureError, parse_board, render_board};
pub use session::{CascadeListener, CascadeTicket, GameSession};
pub use settings::{BoardSettings, Settings, SettingsError, SettingsStore};
