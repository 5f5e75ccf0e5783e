//! Scan orchestration: walk the roots, feed every discovered file through
//! the match tree, confirm candidates, and build duplicate chains.

pub mod walk;

use anyhow::{Result, bail};
use log::{debug, warn};
use std::path::PathBuf;

use crate::engine::confirm::Confirmer;
use crate::engine::hashdb::{HashDb, resolve_db_path};
use crate::engine::hashing::HashEngine;
use crate::engine::interrupt::{
    check_sigusr1, clear_interrupt, interrupted, soft_abort_enabled, take_progress_alarm,
};
use crate::engine::match_tree::MatchTree;
use crate::engine::progress::{ProgressSink, SilentProgress, StderrProgress};
use crate::engine::registrar::register_pair;
use crate::engine::store::FileStore;
use crate::engine::travcheck::TravGuard;
use crate::types::{Counters, Recursion, ScanConfig};

/// Everything one scan touches. Single-threaded; only the signal flags are
/// shared with the outside.
pub struct ScanSession<'cfg> {
    pub cfg: &'cfg ScanConfig,
    pub store: FileStore,
    pub guard: TravGuard,
    pub engine: HashEngine,
    pub confirmer: Confirmer,
    pub hashdb: Option<HashDb>,
    pub counters: Counters,
    pub sink: Box<dyn ProgressSink>,
    /// 1-based index of the root currently being walked.
    pub user_order: u32,
    pub(crate) warned_single_file: bool,
}

impl<'cfg> ScanSession<'cfg> {
    pub fn new(cfg: &'cfg ScanConfig) -> Self {
        let hashdb = cfg.hash_db.as_deref().map(|opt| {
            let path = resolve_db_path(opt);
            if path.exists() {
                match HashDb::load(&path, cfg.algorithm) {
                    Ok(db) => {
                        debug!("hash database: loaded {} entries", db.entry_count());
                        db
                    }
                    Err(e) => {
                        warn!("ignoring hash database: {e:#}");
                        HashDb::new()
                    }
                }
            } else {
                HashDb::new()
            }
        });

        let sink: Box<dyn ProgressSink> = if cfg.hide_progress {
            Box::new(SilentProgress)
        } else {
            Box::new(StderrProgress)
        };

        ScanSession {
            cfg,
            store: FileStore::new(),
            guard: TravGuard::new(),
            engine: HashEngine::new(cfg.algorithm, cfg.chunk_size),
            confirmer: Confirmer::new(cfg.chunk_size),
            hashdb,
            counters: Counters::default(),
            sink,
            user_order: 0,
            warned_single_file: false,
        }
    }
}

/// What a completed (or soft-aborted) scan hands to the action phase.
#[derive(Debug)]
pub struct ScanResults {
    pub store: FileStore,
    pub counters: Counters,
    pub hashdb: Option<HashDb>,
    /// True when scanning stopped early under soft abort; confirmed chains
    /// are still valid.
    pub aborted: bool,
}

/// Walk all roots and match every discovered file. The match tree and the
/// traversal guard live only inside this function.
pub fn run_scan(cfg: &ScanConfig, roots: &[PathBuf]) -> Result<ScanResults> {
    let mut sess = ScanSession::new(cfg);

    for (idx, root) in roots.iter().enumerate() {
        sess.user_order = idx as u32 + 1;
        let recurse = match cfg.recursion {
            Recursion::None => false,
            Recursion::All => true,
            Recursion::After(split) => idx >= split,
        };
        walk::load_dir(&mut sess, root, recurse);
    }

    debug!(
        "walk done: {} files in {} dirs",
        sess.counters.files, sess.counters.items
    );

    let total = sess.counters.files;
    let mut tree = MatchTree::new();
    let mut aborted = false;

    let ids: Vec<_> = sess.store.ids().collect();
    for id in ids {
        if interrupted() {
            sess.sink.clear();
            warn!("stopping file scan due to user abort");
            if !soft_abort_enabled() {
                bail!("scan aborted by user");
            }
            clear_interrupt();
            aborted = true;
            break;
        }

        if tree.is_empty() {
            tree.set_root(id);
        } else if let Some(node) = tree.check_match(
            &mut sess.store,
            &mut sess.engine,
            sess.hashdb.as_mut(),
            cfg,
            id,
        ) {
            let head = tree.file_of(node);

            // Quick and partial-only modes never run the confirmer; neither
            // do hard-link aliases, which are equal by identity.
            let skip_confirm = cfg.quick
                || cfg.partial_only
                || (cfg.consider_hardlinks
                    && sess.store.get(id).inode == sess.store.get(head).inode
                    && sess.store.get(id).device == sess.store.get(head).device);

            let confirmed = if skip_confirm {
                true
            } else {
                let (p1, p2, size) = {
                    let new = sess.store.get(id);
                    let old = sess.store.get(head);
                    (new.path.clone(), old.path.clone(), new.size)
                };
                match sess.confirmer.confirm(&p1, &p2, size) {
                    Ok(same) => {
                        if !same {
                            sess.counters.hash_fails += 1;
                        }
                        same
                    }
                    Err(e) => {
                        warn!("skipping pair, {}: '{}'", e, p1.display());
                        false
                    }
                }
            };

            if confirmed {
                register_pair(&mut sess.store, &mut tree, node, id, cfg)
                    .map_err(anyhow::Error::new)?;
                sess.counters.dupe_pairs += 1;
            }
        }

        sess.counters.progress += 1;
        check_sigusr1();
        if take_progress_alarm() {
            let percent = if total > 0 {
                (sess.counters.progress * 100 / total) as i32
            } else {
                -1
            };
            sess.sink.update("matching", &sess.counters, total, percent);
        }
    }

    sess.sink.clear();

    Ok(ScanResults {
        store: sess.store,
        counters: sess.counters,
        hashdb: sess.hashdb,
        aborted,
    })
}
