//! Choice-resolution engine for command-palette launchers.
//!
//! On every keystroke the engine either resolves the input directly through a
//! fast path (triggers, postfixes, shortcodes) or re-ranks the working set of
//! choices and regroups them for display.

pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod search;
pub mod session;
pub mod tracing;
pub mod types;
pub mod worker;

pub use classify::{Outcome, Resolution, SearchState};
pub use config::EngineConfig;
pub use engine::{Engine, Event};
pub use error::EngineError;
pub use registry::{Catalog, ReplaceOptions};
pub use search::{ALIAS_GROUP, EXACT_MATCH_GROUP, FuzzyIndex, LAST_MATCH_GROUP, rank};
pub use session::{Scope, Session};
pub use types::{
    Choice, FlagSpec, FlagsSpec, ListKind, MatchSpan, Pass, ScoredChoice, SearchKey, SessionId,
};
pub use worker::{Debouncer, Invocation};
