//! Public and internal types for the dupescan API and pipeline.

use std::fmt;
use std::path::PathBuf;

use crate::engine::filters::ExtFilter;

/// Content hash algorithm, selectable at runtime. The choice is process-wide
/// and recorded in the persistent hash database header; databases written
/// with a different algorithm are refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// xxHash64. Not resumable: full hashes always restart from offset 0.
    Xxhash64 = 0,
    /// jodyhash64. Resumable: the full hash continues from the partial state.
    Jodyhash64 = 1,
}

impl HashAlgorithm {
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Xxhash64),
            1 => Some(Self::Jodyhash64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Xxhash64 => "xxhash64",
            Self::Jodyhash64 => "jodyhash64",
        }
    }
}

/// Which comparator orders members inside a duplicate chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Name,
    Time,
}

/// What to do with each confirmed duplicate chain once the scan is complete.
/// Exactly one action runs per invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Action {
    /// Print matched sets to stdout (the default).
    #[default]
    Print,
    /// Print files that belong to no chain.
    PrintUnique,
    /// Print a one-line space summary.
    Summarize,
    /// Print match sets as JSON.
    Json,
    /// Delete all but the preserved member of each chain.
    Delete,
    /// Replace chain members with hard links to the head.
    LinkHard,
    /// Replace chain members with relative symlinks to the first regular file.
    LinkSoft,
    /// Ask the kernel to share blocks between chain members.
    Dedupe,
    /// Abort with exit code 255 on the first confirmed pair.
    ErrorOnDupe,
}

/// How the walker descends from each root.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Recursion {
    #[default]
    None,
    /// Recurse under every root.
    All,
    /// Recurse only under roots at or after the given 0-based index.
    After(usize),
}

/// Full scan configuration, built once from the CLI and passed by reference
/// into the walker, the match tree, the action executors, and the reporters.
#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub recursion: Recursion,
    /// Do not descend into directories on a different filesystem, and treat
    /// same-content files on different devices as non-matching.
    pub one_filesystem: bool,
    /// Skip dotfiles and dot-directories.
    pub exclude_hidden: bool,
    /// Treat hard-link aliases of the same inode as duplicates.
    pub consider_hardlinks: bool,
    /// Follow symlinks while walking and match their targets.
    pub follow_symlinks: bool,
    /// Files reached from the same root argument never match each other.
    pub isolate: bool,
    /// Files with differing mode/uid/gid never match each other.
    pub match_permissions: bool,
    /// Include zero-length files (excluded by default).
    pub include_empty: bool,
    /// Skip the byte-for-byte confirmation; a full hash match is final.
    pub quick: bool,
    /// Stop at the partial hash; implies no full hash and no confirmation.
    pub partial_only: bool,
    /// Disable the stat re-check before destructive actions.
    pub no_change_check: bool,
    /// Disable the (device, inode) directory traversal guard.
    pub no_trav_check: bool,
    /// Invert the chain comparator.
    pub reverse_sort: bool,
    /// Root argument position takes precedence in chain ordering.
    pub param_order: bool,
    pub order: SortOrder,
    pub algorithm: HashAlgorithm,
    /// Effective I/O chunk size for hashing and byte confirmation.
    pub chunk_size: usize,
    /// Persistent hash database path, when enabled.
    pub hash_db: Option<PathBuf>,
    /// Extended filter stack; every filter must pass for a file to be kept.
    pub filters: Vec<ExtFilter>,
    pub action: Action,
    /// Delete without prompting.
    pub no_prompt: bool,
    /// Enter soft-abort mode: an interrupt stops scanning but still runs the
    /// action on chains confirmed so far.
    pub soft_abort: bool,
    // Presentation.
    pub omit_first: bool,
    pub show_size: bool,
    pub print_null: bool,
    pub hide_progress: bool,
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Xxhash64
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            recursion: Recursion::default(),
            one_filesystem: false,
            exclude_hidden: false,
            consider_hardlinks: false,
            follow_symlinks: false,
            isolate: false,
            match_permissions: false,
            include_empty: false,
            quick: false,
            partial_only: false,
            no_change_check: false,
            no_trav_check: false,
            reverse_sort: false,
            param_order: false,
            order: SortOrder::default(),
            algorithm: HashAlgorithm::default(),
            chunk_size: crate::utils::config::ChunkConsts::DEFAULT,
            hash_db: None,
            filters: Vec::new(),
            action: Action::default(),
            no_prompt: false,
            soft_abort: false,
            omit_first: false,
            show_size: false,
            print_null: false,
            hide_progress: true,
        }
    }
}

/// Raised by the registrar in [`Action::ErrorOnDupe`] mode; the CLI maps it
/// to exit code 255 after printing both paths.
#[derive(Debug)]
pub struct DupeFound {
    pub first: PathBuf,
    pub second: PathBuf,
}

impl fmt::Display for DupeFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "duplicates found:\n{}\n{}",
            self.first.display(),
            self.second.display()
        )
    }
}

impl std::error::Error for DupeFound {}

/// Per-file recoverable failure inside the match pipeline. These never abort
/// the run; the affected file or pair is skipped with a warning.
#[derive(Debug, PartialEq, Eq)]
pub enum FileError {
    NotFound,
    IoFailed,
    NotRegular,
    StatDrifted,
    NotApplicable,
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "file not found",
            Self::IoFailed => "I/O failure",
            Self::NotRegular => "not a regular file",
            Self::StatDrifted => "file changed since being scanned",
            Self::NotApplicable => "action not applicable",
        };
        f.write_str(s)
    }
}

impl std::error::Error for FileError {}

/// Counters kept across the scan, reported through the progress sink and the
/// debug summary.
#[derive(Clone, Copy, Debug, Default)]
pub struct Counters {
    /// Regular files accepted into the discovery list.
    pub files: u64,
    /// Directories entered.
    pub items: u64,
    /// Confirmed duplicate pairs.
    pub dupe_pairs: u64,
    /// Pairs where hashes matched but bytes differed.
    pub hash_fails: u64,
    /// Files processed so far in the match phase.
    pub progress: u64,
}
