//! Hard link and symlink actions built on the safe-link transaction:
//! rename target aside, create the link, then drop the staged original.
//! A failure at any step leaves the original file recoverable on disk.

use log::{error, warn};
use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::engine::store::FileStore;
use crate::types::ScanConfig;
use crate::utils::config::LINK_TEMP_SUFFIX;
use crate::utils::paths::{RelativeLink, relative_link_target};

fn temp_name(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(LINK_TEMP_SUFFIX);
    PathBuf::from(os)
}

fn writable(path: &Path) -> bool {
    let Ok(c) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c.as_ptr(), libc::W_OK) == 0 }
}

enum LinkKind<'a> {
    Hard(&'a Path),
    /// Relative path to write into the symlink.
    Soft(&'a Path),
}

enum LinkOutcome {
    Linked,
    Failed,
    /// The filesystem's per-inode link count limit was hit; the caller
    /// should switch to a new source file.
    LinkLimit,
}

/// One safe-link transaction: Staged → Linked → Cleaned, with a rollback
/// from every state. A rollback failure prints both names so the operator
/// can recover the file by hand; it never masks the original failure.
fn safe_link(source: LinkKind<'_>, target: &Path) -> LinkOutcome {
    let temp = temp_name(target);

    // Stage: move the target aside. Its content stays reachable under the
    // temp name for the rest of the transaction.
    if let Err(e) = fs::rename(target, &temp) {
        warn!(
            "cannot move link target to a temporary name, not linking: '{}': {}",
            target.display(),
            e
        );
        let _ = fs::rename(&temp, target);
        return LinkOutcome::Failed;
    }

    // Link: recreate the target name.
    let linked = match source {
        LinkKind::Hard(src) => fs::hard_link(src, target),
        LinkKind::Soft(rel) => std::os::unix::fs::symlink(rel, target),
    };
    if let Err(e) = linked {
        let limit = e.raw_os_error() == Some(libc::EMLINK);
        if limit {
            warn!("maximum link count reached on source, not linking: '{}'", target.display());
        } else {
            warn!("unable to link '{}': {}", target.display(), e);
        }
        if fs::rename(&temp, target).is_err() {
            error!("cannot rename temp file back to original");
            error!("original: {}", target.display());
            error!("current:  {}", temp.display());
        }
        return if limit {
            LinkOutcome::LinkLimit
        } else {
            LinkOutcome::Failed
        };
    }

    // Clean: drop the staged original. If even that fails, reverse the whole
    // transaction rather than leave two names pointing at different inodes.
    if let Err(e) = fs::remove_file(&temp) {
        warn!("can't delete temp file, reverting: '{}': {}", temp.display(), e);
        if fs::remove_file(target).is_err() {
            warn!("couldn't remove link to restore original file");
        } else if fs::rename(&temp, target).is_err() {
            error!("couldn't revert the file to its original name");
            error!("original: {}", target.display());
            error!("current:  {}", temp.display());
        }
        return LinkOutcome::Failed;
    }

    LinkOutcome::Linked
}

/// Replace every non-source chain member with a link. `hard` selects hard
/// links (source = chain head) over relative symlinks (source = first
/// non-symlink member). Per-target failures never stop the chain.
pub fn link_files(store: &FileStore, cfg: &ScanConfig, hard: bool) {
    for head in store.chain_heads() {
        let chain = store.chain_members(head);

        let (mut src_idx, first_target) = if hard {
            (0usize, 1usize)
        } else {
            // Symlinks must point at a real file.
            match chain.iter().position(|&id| !store.get(id).is_symlink) {
                Some(s) => (s, 0usize),
                None => continue,
            }
        };

        if !cfg.hide_progress {
            println!("[SRC] {}", store.get(chain[src_idx]).path.display());
        }

        for x in first_target..chain.len() {
            let target = chain[x];
            let target_path = store.get(target).path.clone();

            if hard {
                if store.get(chain[src_idx]).device != store.get(target).device {
                    warn!(
                        "hard link target on different device, not linking: '{}'",
                        target_path.display()
                    );
                    continue;
                }
                // Already the same inode: nothing to do. Only mention it when
                // hard links were matched on purpose.
                if store.get(chain[src_idx]).inode == store.get(target).inode {
                    if cfg.consider_hardlinks && !cfg.hide_progress {
                        println!("-==-> {}", target_path.display());
                    }
                    continue;
                }
            } else {
                if x == src_idx {
                    continue;
                }
                if store.get(target).is_symlink && store.get(chain[src_idx]).is_symlink {
                    continue;
                }
            }

            if !writable(&target_path) {
                warn!(
                    "link target is a read-only file, not linking: '{}'",
                    target_path.display()
                );
                continue;
            }

            // Re-check both sides right before the destructive step. A
            // changed source is replaced by the current target; a changed
            // target is left alone.
            if store.get(chain[src_idx]).has_changed(cfg.no_change_check) {
                warn!(
                    "source file modified since scanned; changing source file: '{}'",
                    target_path.display()
                );
                src_idx = x;
                continue;
            }
            if store.get(target).has_changed(cfg.no_change_check) {
                warn!(
                    "target file modified since scanned, not linking: '{}'",
                    target_path.display()
                );
                continue;
            }

            let src_path = store.get(chain[src_idx]).path.clone();
            let outcome = if hard {
                safe_link(LinkKind::Hard(&src_path), &target_path)
            } else {
                match relative_link_target(&src_path, &target_path) {
                    Ok(RelativeLink::SamePath) => {
                        warn!("files to be linked have the same canonical path; not linking");
                        continue;
                    }
                    Ok(RelativeLink::Target(rel)) => safe_link(LinkKind::Soft(&rel), &target_path),
                    Err(e) => {
                        warn!("could not compute relative link path: {e:#}");
                        continue;
                    }
                }
            };

            match outcome {
                LinkOutcome::Linked => {
                    if !cfg.hide_progress {
                        println!(
                            "{} {}",
                            if hard { "---->" } else { "-@@->" },
                            target_path.display()
                        );
                    }
                }
                LinkOutcome::LinkLimit => {
                    src_idx = x;
                }
                LinkOutcome::Failed => {
                    if !cfg.hide_progress {
                        println!("-//-> {}", target_path.display());
                    }
                }
            }
        }
        if !cfg.hide_progress {
            println!();
        }
    }
}
