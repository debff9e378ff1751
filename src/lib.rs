//! Shared object model for the pattern catalogue.
//!
//! Every binary under `src/bin/` is a self-contained pattern program. What
//! they share lives here: the narration channel their output flows through,
//! the error kinds, demo configuration, diagnostics, lifetime bookkeeping and
//! the undo/redo stacks used by the Command and Memento programs.

pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod logging;
pub mod narration;
pub mod runner;

pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
    pub use crate::config::{DemoConfig, Pacing};
    pub use crate::error::{ErrorKind, PatternError, Result};
    pub use crate::history::History;
    pub use crate::lifecycle::{Census, Lifeline, ScopeGuard};
    pub use crate::narrate;
    pub use crate::narration::{Narrator, Report};
}
