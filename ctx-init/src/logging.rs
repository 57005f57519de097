//! Diagnostic output setup.

use crate::config::{LogConfig, LogOutput};

/// Value of the `component` field on the root span.
pub const COMPONENT: &str = "ctx-init";

/// Install the global `tracing` subscriber. Diagnostics are written to
/// stderr; the workload owns stdout.
pub fn init(config: &LogConfig) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_writer(std::io::stderr)
        .with_target(false);

    match config.output {
        LogOutput::Json => builder.json().init(),
        LogOutput::Plain => builder.with_ansi(false).init(),
        LogOutput::Color => builder.with_ansi(true).init(),
    }
}
