//! Application handlers.
//!
//! Command and query handlers that wire the session store to the dialog engine.

pub mod session;

pub use session::{
    GetSessionError, GetSessionHandler, GetSessionQuery, ProcessTurnCommand, ProcessTurnError,
    ProcessTurnHandler, SessionProgress, StartSessionCommand, StartSessionError,
    StartSessionHandler, StartSessionResult,
};
