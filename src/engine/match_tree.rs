//! Size-ordered match tree with a lazily evaluated layered signature:
//! size → pairwise exclusions → partial hash → full hash. Equality at the
//! last layer emits a candidate pair for the byte confirmer.

use crate::engine::hashdb::HashDb;
use crate::engine::hashing::{HashEngine, ensure_full_hash, ensure_partial_hash};
use crate::engine::store::{FileId, FileRecord, FileStore};
use crate::types::ScanConfig;
use crate::utils::config::PARTIAL_HASH_SIZE;

/// Handle into the match tree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub u32);

struct TreeNode {
    file: FileId,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

/// Unbalanced BST over file records; built during the scan, discarded before
/// actions run.
#[derive(Default)]
pub struct MatchTree {
    nodes: Vec<TreeNode>,
}

/// Outcome of the pairwise exclusion rules for (tree file, new file).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Conditions {
    /// New file is smaller; order left.
    Less,
    /// New file is larger; order right.
    Greater,
    /// Same (device, inode) and hard links count as duplicates.
    HardMatch,
    /// Same (device, inode) but hard links are not duplicates.
    HardNoMatch,
    /// The pair must not be reported as duplicates regardless of content;
    /// content-derived ordering still applies.
    CannotMatch,
    /// No exclusion fired; continue with content comparison.
    Pass,
}

/// Fixed pairwise rule set. `tree_file` is the resident record, `file` the
/// one being inserted.
fn check_conditions(tree_file: &FileRecord, file: &FileRecord, cfg: &ScanConfig) -> Conditions {
    if file.size < tree_file.size {
        return Conditions::Less;
    }
    if file.size > tree_file.size {
        return Conditions::Greater;
    }

    if cfg.isolate && tree_file.user_order == file.user_order {
        return Conditions::CannotMatch;
    }

    if cfg.one_filesystem && tree_file.device != file.device {
        return Conditions::CannotMatch;
    }

    if cfg.match_permissions
        && (tree_file.mode != file.mode
            || tree_file.uid != file.uid
            || tree_file.gid != file.gid)
    {
        return Conditions::CannotMatch;
    }

    if tree_file.inode == file.inode && tree_file.device == file.device {
        return if cfg.consider_hardlinks {
            Conditions::HardMatch
        } else {
            Conditions::HardNoMatch
        };
    }

    Conditions::Pass
}

impl MatchTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Seed the tree with the first scanned file.
    pub fn set_root(&mut self, file: FileId) {
        debug_assert!(self.nodes.is_empty());
        self.alloc(file);
    }

    pub fn file_of(&self, node: NodeId) -> FileId {
        self.nodes[node.0 as usize].file
    }

    /// Point a node at a different record; used when the registrar picks a
    /// new chain head.
    pub fn set_file(&mut self, node: NodeId, file: FileId) {
        self.nodes[node.0 as usize].file = file;
    }

    fn alloc(&mut self, file: FileId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            file,
            left: None,
            right: None,
        });
        id
    }

    /// Insert `file`, lazily hashing along the descent. Returns the node
    /// holding a candidate match when every comparison layer ties; `None`
    /// means the file was attached somewhere as a non-match.
    ///
    /// Hash failures on either side abort the attempt for this file, which
    /// the tree treats as non-matching (the file is not attached either).
    pub fn check_match(
        &mut self,
        store: &mut FileStore,
        engine: &mut HashEngine,
        hashdb: Option<&mut HashDb>,
        cfg: &ScanConfig,
        file: FileId,
    ) -> Option<NodeId> {
        debug_assert!(!self.nodes.is_empty());
        let mut cur = NodeId(0);
        let mut hashdb = hashdb;

        loop {
            let tree_file = self.file_of(cur);
            let mut cant_match = false;

            let mut cmp: i32 = match check_conditions(store.get(tree_file), store.get(file), cfg)
            {
                Conditions::HardMatch => return Some(cur),
                Conditions::HardNoMatch => return None,
                Conditions::Less => -1,
                Conditions::Greater => 1,
                Conditions::CannotMatch => {
                    cant_match = true;
                    0
                }
                Conditions::Pass => 0,
            };

            if cmp == 0 {
                // Attempt to exclude the pair cheaply with partial hashes.
                ensure_partial_hash(engine, store.get_mut(tree_file)).ok()?;
                ensure_partial_hash(engine, store.get_mut(file)).ok()?;

                let p_new = store.get(file).partial_hash;
                let p_tree = store.get(tree_file).partial_hash;
                cmp = cmp_u64(p_new, p_tree);

                let size = store.get(file).size;
                if size <= PARTIAL_HASH_SIZE as i64 || cfg.partial_only {
                    // Small file or partial-only mode: the partial hash is
                    // the full hash by definition.
                    for id in [file, tree_file] {
                        let rec = store.get_mut(id);
                        if !rec.full_valid {
                            rec.full_hash = rec.partial_hash;
                            rec.full_valid = true;
                        }
                    }
                } else if cmp == 0 {
                    ensure_full_hash(engine, store.get_mut(tree_file)).ok()?;
                    ensure_full_hash(engine, store.get_mut(file)).ok()?;
                    cmp = cmp_u64(store.get(file).full_hash, store.get(tree_file).full_hash);
                }
            }

            // Keep the persistent cache abreast of anything just hashed.
            if let Some(db) = hashdb.as_deref_mut() {
                db.update_from_record(store.get(file));
                db.update_from_record(store.get(tree_file));
            }

            if cant_match && cmp == 0 {
                cmp = -1;
            }

            if cmp == 0 {
                // Every layer tied: candidate match.
                return Some(cur);
            }

            let next = {
                let node = &self.nodes[cur.0 as usize];
                if cmp < 0 { node.left } else { node.right }
            };
            match next {
                Some(n) => cur = n,
                None => {
                    let new = self.alloc(file);
                    let node = &mut self.nodes[cur.0 as usize];
                    if cmp < 0 {
                        node.left = Some(new);
                    } else {
                        node.right = Some(new);
                    }
                    return None;
                }
            }
        }
    }
}

fn cmp_u64(a: u64, b: u64) -> i32 {
    if a < b {
        -1
    } else if a > b {
        1
    } else {
        0
    }
}
