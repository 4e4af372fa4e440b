//! Storage Adapters
//!
//! Implementations of the SessionStore port.
//!
//! ## Available Adapters
//!
//! - **InMemorySessionStore** - Stores sessions in memory (binary, tests)

mod in_memory_session_store;

pub use in_memory_session_store::InMemorySessionStore;
