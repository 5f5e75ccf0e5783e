//! Matching core: file records, filters, hashing, the match tree, and the
//! supporting signal/progress plumbing.

pub mod arg_parser;
pub mod confirm;
pub mod filters;
pub mod hashdb;
pub mod hashing;
pub mod interrupt;
pub mod match_tree;
pub mod progress;
pub mod registrar;
pub mod sort;
pub mod store;
pub mod travcheck;

// Re-export commonly used items
pub use arg_parser::{Cli, build_config};
pub use confirm::Confirmer;
pub use hashdb::HashDb;
pub use hashing::{HashEngine, auto_chunk_size, jody_block_hash};
pub use match_tree::MatchTree;
pub use progress::{ProgressSink, SilentProgress, StderrProgress};
pub use sort::numeric_sort;
pub use store::{FileId, FileRecord, FileStore};
pub use travcheck::{TravGuard, Traversal};
