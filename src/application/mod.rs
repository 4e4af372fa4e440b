//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer coordinates the dialog engine with the session store and the
//! placeholder detector. Commands mutate sessions; the progress query reads.

pub mod handlers;
mod session_locks;

pub use handlers::{
    GetSessionError, GetSessionHandler, GetSessionQuery, ProcessTurnCommand, ProcessTurnError,
    ProcessTurnHandler, SessionProgress, StartSessionCommand, StartSessionError,
    StartSessionHandler, StartSessionResult,
};
pub use session_locks::SessionLocks;
