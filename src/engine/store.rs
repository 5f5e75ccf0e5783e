//! File record store: arena-owned per-file metadata, discovery order, and
//! duplicate chain links.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Stable handle into the [`FileStore`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

/// One discovered regular file (or followed symlink target). Mutated only by
/// the hash engine (hash fields and validity flags) and the registrar
/// (duplicate links).
#[derive(Clone, Debug)]
pub struct FileRecord {
    /// Exact path used for all I/O, never re-derived.
    pub path: PathBuf,
    /// Size in bytes; -1 until a stat succeeds.
    pub size: i64,
    pub device: u64,
    pub inode: u64,
    pub mode: u32,
    pub nlink: u64,
    pub mtime: i64,
    pub atime: i64,
    pub uid: u32,
    pub gid: u32,
    /// 1-based index of the root argument this file was reached from.
    pub user_order: u32,
    pub partial_hash: u64,
    pub full_hash: u64,
    pub stat_valid: bool,
    pub is_symlink: bool,
    pub partial_valid: bool,
    pub full_valid: bool,
    /// Set on exactly one member (the head) of each duplicate chain.
    pub has_dupes: bool,
    /// Set on every member of any chain; used by the unique-files report.
    pub not_unique: bool,
    /// Next member of this file's duplicate chain.
    pub next_dup: Option<FileId>,
}

impl FileRecord {
    fn new(path: PathBuf, user_order: u32) -> Self {
        FileRecord {
            path,
            size: -1,
            device: 0,
            inode: 0,
            mode: 0,
            nlink: 0,
            mtime: 0,
            atime: 0,
            uid: 0,
            gid: 0,
            user_order,
            partial_hash: 0,
            full_hash: 0,
            stat_valid: false,
            is_symlink: false,
            partial_valid: false,
            full_valid: false,
            has_dupes: false,
            not_unique: false,
            next_dup: None,
        }
    }

    /// Take the stat snapshot for this record. Follows symlinks for the main
    /// snapshot, then lstats to remember whether the path itself is a link.
    /// Only the first call does any work. Returns false on stat failure.
    pub fn fill_stats(&mut self) -> bool {
        if self.stat_valid {
            return true;
        }
        self.stat_valid = true;
        let meta = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(_) => return false,
        };
        self.size = meta.size() as i64;
        self.device = meta.dev();
        self.inode = meta.ino();
        self.mode = meta.mode();
        self.nlink = meta.nlink();
        self.mtime = meta.mtime();
        self.atime = meta.atime();
        self.uid = meta.uid();
        self.gid = meta.gid();
        match fs::symlink_metadata(&self.path) {
            Ok(lm) => self.is_symlink = lm.file_type().is_symlink(),
            Err(_) => return false,
        }
        true
    }

    pub fn is_dir(&self) -> bool {
        self.mode & libc::S_IFMT == libc::S_IFDIR
    }

    pub fn is_regular(&self) -> bool {
        self.mode & libc::S_IFMT == libc::S_IFREG
    }

    /// Re-stat and compare against the discovery snapshot. Any drift in size,
    /// identity, mode, times, ownership, or symlink-ness counts as changed.
    /// `no_change_check` bypasses the whole check.
    pub fn has_changed(&self, no_change_check: bool) -> bool {
        if no_change_check {
            return false;
        }
        if !self.stat_valid {
            return true;
        }
        let meta = match fs::metadata(&self.path) {
            Ok(m) => m,
            Err(_) => return true,
        };
        if self.inode != meta.ino()
            || self.size != meta.size() as i64
            || self.device != meta.dev()
            || self.mode != meta.mode()
            || self.mtime != meta.mtime()
            || self.uid != meta.uid()
            || self.gid != meta.gid()
        {
            return true;
        }
        match fs::symlink_metadata(&self.path) {
            Ok(lm) => lm.file_type().is_symlink() != self.is_symlink,
            Err(_) => true,
        }
    }
}

/// Owns every [`FileRecord`]; arena order is discovery order.
#[derive(Default, Debug)]
pub struct FileStore {
    files: Vec<FileRecord>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a zero-initialized record (size -1) at the end of the
    /// discovery list.
    pub fn allocate(&mut self, path: &Path, user_order: u32) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(FileRecord::new(path.to_path_buf(), user_order));
        id
    }

    /// Drop a record that failed the filter gate. Only the most recently
    /// allocated record may be discarded.
    pub fn discard(&mut self, id: FileId) {
        debug_assert_eq!(id.0 as usize, self.files.len() - 1);
        self.files.pop();
    }

    pub fn get(&self, id: FileId) -> &FileRecord {
        &self.files[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: FileId) -> &mut FileRecord {
        &mut self.files[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All records in discovery order.
    pub fn ids(&self) -> impl Iterator<Item = FileId> + use<> {
        (0..self.files.len() as u32).map(FileId)
    }

    /// IDs of chain heads, in discovery order.
    pub fn chain_heads(&self) -> Vec<FileId> {
        self.ids().filter(|&id| self.get(id).has_dupes).collect()
    }

    /// Collect a full chain starting at its head.
    pub fn chain_members(&self, head: FileId) -> Vec<FileId> {
        let mut members = Vec::new();
        let mut cur = Some(head);
        while let Some(id) = cur {
            members.push(id);
            cur = self.get(id).next_dup;
        }
        members
    }
}
