//! Private City CLI
//!
//! Replays JSON operation scripts through the ledger and reports the
//! resulting state.

pub mod config;
pub mod replay;
pub mod report;

pub use config::{Config, ConfigError};
pub use replay::{example_script, load_script, parse_script, replay, ReplayReport};
