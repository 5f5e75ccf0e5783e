//! Pair registrar: joins a confirmed pair into the existing chain, keeping
//! the chain ordered by the configured comparator so the first member is the
//! source for destructive actions.

use crate::engine::match_tree::{MatchTree, NodeId};
use crate::engine::sort::cmp_pair;
use crate::engine::store::{FileId, FileStore};
use crate::types::{Action, DupeFound, ScanConfig};

/// Insert `newmatch` into the chain headed by the record at `node`. When the
/// new file sorts before the current head, the tree node is repointed at the
/// new head so later candidates keep comparing against a chain member.
///
/// In error-on-dupe mode no chain is built; the first confirmed pair aborts
/// the whole run.
pub fn register_pair(
    store: &mut FileStore,
    tree: &mut MatchTree,
    node: NodeId,
    newmatch: FileId,
    cfg: &ScanConfig,
) -> Result<(), DupeFound> {
    let head = tree.file_of(node);

    if cfg.action == Action::ErrorOnDupe {
        return Err(DupeFound {
            first: store.get(head).path.clone(),
            second: store.get(newmatch).path.clone(),
        });
    }

    store.get_mut(head).has_dupes = true;

    let mut back: Option<FileId> = None;
    let mut traverse = Some(head);

    while let Some(cur) = traverse {
        if cmp_pair(store.get(newmatch), store.get(cur), cfg) <= 0 {
            store.get_mut(newmatch).next_dup = Some(cur);
            match back {
                None => {
                    // New head of the chain.
                    tree.set_file(node, newmatch);
                    store.get_mut(newmatch).has_dupes = true;
                    store.get_mut(cur).has_dupes = false;
                }
                Some(b) => store.get_mut(b).next_dup = Some(newmatch),
            }
            return Ok(());
        }
        if store.get(cur).next_dup.is_none() {
            store.get_mut(cur).next_dup = Some(newmatch);
            return Ok(());
        }
        back = Some(cur);
        traverse = store.get(cur).next_dup;
    }
    Ok(())
}
