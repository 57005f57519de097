use secret_store::EnvSnapshot;
use tracing::level_filters::LevelFilter;

use crate::cli::Cli;
use crate::error::{InitError, InitResult};

/// Default verbosity when `LOG_LEVEL` is unset or invalid.
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::WARN;

/// Shape of diagnostic output, selected by `LOG_OUTPUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Human-readable text with ANSI colors.
    Color,
    /// Human-readable text without colors (`nocolor`).
    Plain,
    /// One JSON object per line (`json`).
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub output: LogOutput,
}

impl LogConfig {
    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self {
            level: parse_level(env.get("LOG_LEVEL").unwrap_or_default()),
            output: parse_output(env.get("LOG_OUTPUT").unwrap_or_default()),
        }
    }
}

fn parse_level(value: &str) -> LevelFilter {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" | "fatal" | "panic" => LevelFilter::ERROR,
        "off" | "disabled" => LevelFilter::OFF,
        _ => DEFAULT_LOG_LEVEL,
    }
}

fn parse_output(value: &str) -> LogOutput {
    match value {
        "json" => LogOutput::Json,
        "nocolor" => LogOutput::Plain,
        _ => LogOutput::Color,
    }
}

/// Everything the supervisor needs, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Pre-start command line, tokenized before use. `None` when unset or empty.
    pub pre_start: Option<String>,
    /// Post-stop command line, tokenized before use. `None` when unset or empty.
    pub post_stop: Option<String>,
    /// Main command and its arguments, used verbatim.
    pub command: Vec<String>,
    pub log: LogConfig,
}

impl Config {
    pub fn new(cli: Cli, log: LogConfig) -> InitResult<Self> {
        if cli.command.is_empty() {
            return Err(InitError::NoMainCommand);
        }
        Ok(Self {
            pre_start: cli.pre.filter(|c| !c.is_empty()),
            post_stop: cli.post.filter(|c| !c.is_empty()),
            command: cli.command,
            log,
        })
    }
}
