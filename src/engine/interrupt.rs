//! Interrupt, soft-abort, and progress-timer flags.
//!
//! Cancellation is cooperative: signal handlers only store atomics, and the
//! I/O loops poll them at chunk boundaries. SIGINT requests an abort (or a
//! soft abort when enabled); SIGUSR1 toggles soft-abort mode at runtime; a
//! ticker thread raises the progress flag once per second.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread;
use std::time::Duration;

use crate::utils::config::PROGRESS_INTERVAL_SECS;

static INTERRUPT: AtomicBool = AtomicBool::new(false);
static SOFT_ABORT: AtomicBool = AtomicBool::new(false);
static PROGRESS_ALARM: AtomicBool = AtomicBool::new(false);
/// 0 = no pending notice, 1 = toggled on, 2 = toggled off.
static USR1_TOGGLE: AtomicU8 = AtomicU8::new(0);

pub fn interrupted() -> bool {
    INTERRUPT.load(Ordering::Relaxed)
}

/// Re-arm after a soft abort so the action phase can be interrupted again.
pub fn clear_interrupt() {
    INTERRUPT.store(false, Ordering::Relaxed);
}

pub fn soft_abort_enabled() -> bool {
    SOFT_ABORT.load(Ordering::Relaxed)
}

/// Consume the one-second progress flag; true at most once per interval.
pub fn take_progress_alarm() -> bool {
    PROGRESS_ALARM.swap(false, Ordering::Relaxed)
}

/// Print the pending soft-abort toggle notice, if SIGUSR1 arrived since the
/// last poll.
pub fn check_sigusr1() {
    match USR1_TOGGLE.swap(0, Ordering::Relaxed) {
        1 => eprintln!("\nreceived a USR1 signal; soft abort is now ON"),
        2 => eprintln!("\nreceived a USR1 signal; soft abort is now OFF"),
        _ => {}
    }
}

extern "C" fn on_sigusr1(_sig: libc::c_int) {
    // Async-signal-safe: atomics only.
    if SOFT_ABORT.load(Ordering::Relaxed) {
        SOFT_ABORT.store(false, Ordering::Relaxed);
        USR1_TOGGLE.store(2, Ordering::Relaxed);
    } else {
        SOFT_ABORT.store(true, Ordering::Relaxed);
        USR1_TOGGLE.store(1, Ordering::Relaxed);
    }
}

/// Install the SIGINT/SIGUSR1 handlers and start the progress ticker.
/// Call once per process, before scanning.
pub fn install_handlers(soft_abort: bool) -> Result<()> {
    SOFT_ABORT.store(soft_abort, Ordering::Relaxed);

    ctrlc::set_handler(|| {
        INTERRUPT.store(true, Ordering::Relaxed);
    })
    .context("set Ctrl+C handler")?;

    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGUSR1, on_sigusr1 as usize);
    }

    thread::Builder::new()
        .name("progress-tick".into())
        .spawn(|| {
            loop {
                thread::sleep(Duration::from_secs(PROGRESS_INTERVAL_SECS));
                PROGRESS_ALARM.store(true, Ordering::Relaxed);
            }
        })
        .context("spawn progress ticker")?;

    Ok(())
}
