//! Dupescan: find sets of byte-identical files and optionally collapse them.
//!
//! The matching pipeline layers cheap checks over expensive ones: file size,
//! pairwise exclusion rules, a 4 KiB partial hash, a whole-file hash, and
//! finally a byte-for-byte comparison. Confirmed duplicates form ordered
//! chains that the selected action (print, delete, hard link, relative
//! symlink, or kernel copy-on-write dedupe) consumes. An optional on-disk
//! hash database keyed on `(path, mtime)` carries digests across runs.

pub mod actions;
pub mod engine;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use anyhow::Result;
use log::{debug, warn};
use std::path::PathBuf;

use engine::hashdb::resolve_db_path;
use pipeline::ScanResults;

/// Single entry point: scan `roots` with `cfg`, run the configured action on
/// the resulting chains, and write back the hash database on clean exit.
///
/// Returns the process exit code: 0 on clean completion, 255 when
/// error-on-dupe fired. Signal handlers are the caller's business (the CLI
/// installs them; library callers and tests usually don't want them).
pub fn run(cfg: &ScanConfig, roots: &[PathBuf]) -> Result<i32> {
    let results = match pipeline::run_scan(cfg, roots) {
        Ok(r) => r,
        Err(e) => {
            if let Some(dupe) = e.downcast_ref::<DupeFound>() {
                eprintln!("Exiting based on user request (--error-on-dupe); duplicates found:");
                println!("{}\n{}", dupe.first.display(), dupe.second.display());
                return Ok(255);
            }
            return Err(e);
        }
    };
    let ScanResults {
        mut store,
        counters,
        hashdb,
        aborted,
    } = results;

    debug!(
        "scan done: {} files, {} dupe pairs, {} hash failures",
        counters.files, counters.dupe_pairs, counters.hash_fails
    );
    if aborted {
        warn!("scan was soft-aborted; acting on chains confirmed so far");
    }

    actions::run_action(&mut store, cfg);

    // Write-back happens on clean exit only; a hard abort never gets here.
    if let (Some(opt), Some(mut db)) = (&cfg.hash_db, hashdb) {
        for id in store.ids() {
            db.update_from_record(store.get(id));
        }
        let path = resolve_db_path(opt);
        match db.save(&path, cfg.algorithm) {
            Ok(()) => debug!("hash database: saved {} entries", db.entry_count()),
            Err(e) => warn!("could not save hash database: {e:#}"),
        }
    }

    Ok(0)
}
