//! Stderr logging setup: crate-tagged lines, colored level tags for warnings.

use colored::Colorize;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Initialize the global logger. `verbose` raises this crate to debug;
/// dependencies stay at warn either way.
pub fn setup_logging(verbose: bool) {
    let own_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), own_level)
        .format(|buf, record| {
            let tag = env!("CARGO_PKG_NAME").cyan();
            let line = match record.level() {
                Level::Warn => format!("[{} {}] {}", tag, "WARN".yellow(), record.args()),
                Level::Error => format!("[{} {}] {}", tag, "ERROR".red(), record.args()),
                Level::Debug | Level::Trace => {
                    format!("[{} {}] {}", tag, "debug".dimmed(), record.args())
                }
                Level::Info => format!("[{}] {}", tag, record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .init();
}
