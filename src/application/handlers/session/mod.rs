//! Session handlers - start a session, process turns, report progress.

mod get_session;
mod process_turn;
mod start_session;

pub use get_session::{GetSessionError, GetSessionHandler, GetSessionQuery, SessionProgress};
pub use process_turn::{ProcessTurnCommand, ProcessTurnError, ProcessTurnHandler};
pub use start_session::{
    StartSessionCommand, StartSessionError, StartSessionHandler, StartSessionResult,
};
