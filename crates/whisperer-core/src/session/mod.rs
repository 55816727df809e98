//! Session domain module.
//!
//! Conversational memory: the ordered record of completed turns and their
//! chosen attempts. The session is an explicitly owned, explicitly scoped
//! value passed into the controller, not ambient global state, so multiple
//! independent chat sessions can coexist and tests stay deterministic.

mod model;

// Re-export public API
pub use model::{Session, TurnRecord};
