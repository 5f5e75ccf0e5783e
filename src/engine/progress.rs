//! Progress reporting: an opaque sink fed once per second from the scan and
//! match loops.

use std::io::Write;

use crate::types::Counters;

/// Receives periodic progress updates. The core only guarantees the cadence
/// (roughly one second) and the counter values; rendering is up to the sink.
pub trait ProgressSink {
    /// `phase` names the current work ("dirs", "items", "matching");
    /// `percent` is -1 when no meaningful total exists yet.
    fn update(&mut self, phase: &str, counters: &Counters, total_files: u64, percent: i32);

    /// Erase any partial output line before normal printing resumes.
    fn clear(&mut self) {}
}

/// Stderr carriage-return progress line.
#[derive(Default)]
pub struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn update(&mut self, phase: &str, counters: &Counters, total_files: u64, percent: i32) {
        let mut err = std::io::stderr().lock();
        if total_files == 0 {
            let _ = write!(
                err,
                "\rScanning: {} files, {} dirs ({})",
                counters.files, counters.items, phase
            );
        } else if percent >= 0 {
            let _ = write!(
                err,
                "\rProgress [{}/{}, {} pairs matched] {}%",
                counters.progress, total_files, counters.dupe_pairs, percent
            );
        } else {
            let _ = write!(
                err,
                "\rProgress [{}/{}, {} pairs matched]",
                counters.progress, total_files, counters.dupe_pairs
            );
        }
        let _ = err.flush();
    }

    fn clear(&mut self) {
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{:60}\r", " ");
        let _ = err.flush();
    }
}

/// Sink used with `--hide-progress` and in tests.
#[derive(Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn update(&mut self, _phase: &str, _counters: &Counters, _total: u64, _percent: i32) {}
}
