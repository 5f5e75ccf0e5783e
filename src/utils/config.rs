//! Application configuration constants.
//! Tuning and thresholds in one place.

// ---- Hashing / matching ----

/// Number of leading bytes covered by the partial hash (bytes).
pub const PARTIAL_HASH_SIZE: u64 = 4096;

/// I/O chunk sizing for the hash engine and the byte confirmer.
/// The effective chunk size is picked at startup by
/// [`auto_chunk_size`](crate::engine::hashing::auto_chunk_size).
pub struct ChunkConsts;

impl ChunkConsts {
    /// Default read chunk when the L1 cache size cannot be detected (bytes). 64 KiB.
    pub const DEFAULT: usize = 65536;
    /// Lower clamp for auto or manual chunk sizes (bytes). 4 KiB.
    pub const MIN: usize = 4096;
    /// Upper clamp for auto or manual chunk sizes (bytes). 256 MiB.
    pub const MAX: usize = 256 * 1048576;
}

// ---- Hash database ----

/// Persistent hash database format parameters. The on-disk format is
/// inherited from jdupes hash databases, header prefix included.
pub struct HashDbConsts;

impl HashDbConsts {
    /// Only this on-disk format version is read or written.
    pub const VERSION: u32 = 1;
    pub const HEADER_PREFIX: &'static str = "jdupes hashdb:";
    /// Minimum entry line length: hashcount(1) + partial(16) + full(16) +
    /// mtime(16) + four commas + at least one path byte.
    pub const MIN_LINE_LEN: usize = 54;
    /// Byte offset of the path field within an entry line.
    pub const PATH_OFFSET: usize = 53;
    /// Database filename used when the option value is `.`.
    pub const DEFAULT_NAME: &'static str = "jdupes_hashdb.txt";
}

// ---- Actions ----

/// Suffix appended to a link target while the safe-link transaction is staged.
pub const LINK_TEMP_SUFFIX: &str = ".__jdupes__.tmp";

/// Largest byte range handed to the kernel per dedupe ioctl call. 16 MiB.
pub const KERNEL_DEDUPE_MAX: u64 = 16_777_216;

// ---- Progress ----

/// Seconds between progress sink updates (set by the ticker thread).
pub const PROGRESS_INTERVAL_SECS: u64 = 1;
