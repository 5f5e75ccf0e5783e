//! Double-traversal guard: a BST of visited directory (device, inode) pairs.
//! Keeps recursion out of cycles and bind-mount aliases.

/// Result of consulting the guard for one directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Traversal {
    /// First visit; the pair is now marked.
    Fresh,
    /// This directory was already entered; skip it entirely.
    AlreadySeen,
}

struct TravNode {
    device: u64,
    inode: u64,
    hash: u64,
    left: Option<u32>,
    right: Option<u32>,
}

/// Scramble the inode so sequential inode order does not degenerate the tree.
fn trav_hash(device: u64, inode: u64) -> u64 {
    inode.rotate_left(55).wrapping_add(device.wrapping_shl(13))
}

/// Arena-backed BST of visited directories, ordered by the scrambled hash.
/// Lives for the duration of one scan.
#[derive(Default)]
pub struct TravGuard {
    nodes: Vec<TravNode>,
}

impl TravGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look the pair up, inserting it when absent.
    pub fn check_and_mark(&mut self, device: u64, inode: u64) -> Traversal {
        let hash = trav_hash(device, inode);
        if self.nodes.is_empty() {
            self.alloc(device, inode, hash);
            return Traversal::Fresh;
        }
        let mut cur = 0u32;
        loop {
            let node = &self.nodes[cur as usize];
            if node.inode == inode && node.device == device {
                return Traversal::AlreadySeen;
            }
            let next = if hash > node.hash { node.right } else { node.left };
            match next {
                Some(n) => cur = n,
                None => {
                    let new = self.alloc(device, inode, hash);
                    let node = &mut self.nodes[cur as usize];
                    if hash > node.hash {
                        node.right = Some(new);
                    } else {
                        node.left = Some(new);
                    }
                    return Traversal::Fresh;
                }
            }
        }
    }

    fn alloc(&mut self, device: u64, inode: u64, hash: u64) -> u32 {
        let idx = self.nodes.len() as u32;
        self.nodes.push(TravNode {
            device,
            inode,
            hash,
            left: None,
            right: None,
        });
        idx
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
