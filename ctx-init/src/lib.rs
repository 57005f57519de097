//! ctx-init: a PID 1 supervisor for containers.
//!
//! Resolves secret references in the environment, runs an optional
//! pre-start command, the main command with signal forwarding, and an
//! optional post-stop command, while reaping orphaned zombies throughout.

pub mod args;
pub mod cli;
pub mod config;
pub mod error;
pub mod forward;
pub mod lifecycle;
pub mod logging;
pub mod pid1;
pub mod reaper;
pub mod runner;
pub mod termination;

pub use config::{Config, LogConfig, LogOutput};
pub use error::{InitError, InitResult, LaunchError};
pub use lifecycle::{Phase, Supervisor};
pub use termination::Termination;
