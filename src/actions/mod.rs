//! Action executors: exactly one runs per invocation, consuming the chains
//! the scan produced. Destructive actions re-check every file right before
//! touching it and never let one target's failure stop the run.

pub mod dedupe;
pub mod delete;
pub mod link;
pub mod report;

pub use delete::{DeletePrompt, KeepFirst, StdinPrompt};

use crate::engine::store::FileStore;
use crate::types::{Action, ScanConfig};

/// Dispatch the configured action over the scanned store.
pub fn run_action(store: &mut FileStore, cfg: &ScanConfig) {
    match cfg.action {
        Action::Print => report::print_matches(store, cfg),
        Action::PrintUnique => report::print_unique(store, cfg),
        Action::Summarize => report::summarize_matches(store),
        Action::Json => report::print_json(store),
        Action::Delete => {
            if cfg.no_prompt {
                delete::delete_files(store, cfg, &mut KeepFirst);
            } else {
                delete::delete_files(store, cfg, &mut StdinPrompt);
            }
        }
        Action::LinkHard => link::link_files(store, cfg, true),
        Action::LinkSoft => link::link_files(store, cfg, false),
        Action::Dedupe => dedupe::dedupe_files(store, cfg),
        // A completed scan in error-on-dupe mode means no duplicates exist;
        // the abort path never reaches here.
        Action::ErrorOnDupe => {}
    }
}
