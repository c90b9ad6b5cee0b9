//! Command implementations for the CLI.

mod config;
mod known;
mod run;

pub use config::cmd_config;
pub use known::cmd_known;
pub use run::{RunOptions, cmd_run};
