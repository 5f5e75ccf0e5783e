//! Directory walker: enumerates roots, applies the filter gate, and appends
//! accepted files to the discovery list, descending per the recursion policy
//! under the double-traversal guard.

use log::warn;
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::engine::filters::check_singlefile;
use crate::engine::interrupt::{check_sigusr1, interrupted, take_progress_alarm};
use crate::engine::travcheck::Traversal;

use super::ScanSession;

/// Load one directory's contents into the discovery list, recursing as the
/// policy allows. Stat failures on the directory itself warn and return so
/// remaining roots still get walked.
pub fn load_dir(sess: &mut ScanSession, dir: &Path, recurse: bool) {
    let meta = match fs::metadata(dir) {
        Ok(m) => m,
        Err(e) => {
            warn!("could not stat dir '{}': {}", dir.display(), e);
            return;
        }
    };

    // Plain-file arguments are refused: the same file could be reached both
    // here and through a recursion, and nothing deduplicates the discovery
    // list yet.
    if !meta.is_dir() {
        if !sess.warned_single_file {
            warn!("file arguments are disabled for safety; skipping '{}'", dir.display());
            sess.warned_single_file = true;
        } else {
            warn!("skipping file argument '{}'", dir.display());
        }
        return;
    }

    let device = meta.dev();
    if !sess.cfg.no_trav_check
        && sess.guard.check_and_mark(device, meta.ino()) == Traversal::AlreadySeen
    {
        return;
    }

    sess.counters.items += 1;

    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            warn!("could not open directory '{}': {}", dir.display(), e);
            return;
        }
    };

    for entry in entries {
        if interrupted() {
            return;
        }
        check_sigusr1();
        if take_progress_alarm() {
            sess.sink.update("dirs", &sess.counters, 0, -1);
        }

        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("error reading directory '{}': {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();

        let id = sess.store.allocate(&path, sess.user_order);
        if check_singlefile(sess.store.get_mut(id), sess.cfg) {
            sess.store.discard(id);
            continue;
        }

        let rec = sess.store.get(id);
        if rec.is_dir() {
            let sub_device = rec.device;
            let sub_symlink = rec.is_symlink;
            sess.store.discard(id);
            if recurse {
                if sess.cfg.one_filesystem && sub_device != device {
                    continue;
                }
                if sess.cfg.follow_symlinks || !sub_symlink {
                    load_dir(sess, &path, recurse);
                }
            }
            continue;
        }

        // Regular file, or a symlink to one when following is on.
        if rec.is_symlink && !sess.cfg.follow_symlinks {
            sess.store.discard(id);
            continue;
        }

        if let Some(db) = sess.hashdb.as_mut() {
            db.preload(sess.store.get_mut(id));
        }
        sess.counters.files += 1;
    }
}
