//! Delete action: remove every non-preserved member of each chain, with an
//! optional interactive choice of which members to keep.

use log::warn;
use std::fs;
use std::io::{BufRead, Write};

use crate::engine::store::{FileRecord, FileStore};
use crate::types::ScanConfig;

/// Chooses which members of one chain survive. Implementations keep at
/// least one member unless the operator explicitly chooses none.
pub trait DeletePrompt {
    /// `chain` is the ordered member list; returns one keep-flag per member.
    fn choose(
        &mut self,
        chain: &[&FileRecord],
        cur_group: usize,
        groups: usize,
        show_size: bool,
    ) -> Vec<bool>;
}

/// Non-interactive policy: keep the chain head only.
pub struct KeepFirst;

impl DeletePrompt for KeepFirst {
    fn choose(&mut self, chain: &[&FileRecord], _: usize, _: usize, _: bool) -> Vec<bool> {
        let mut keep = vec![false; chain.len()];
        keep[0] = true;
        keep
    }
}

/// Interactive stdin prompt. Accepts 1-based decimal indices, `a`/`all`, or
/// `n`/`none`, separated by spaces or commas; re-prompts until at least one
/// file is preserved. End of input falls back to keeping the first file.
pub struct StdinPrompt;

impl StdinPrompt {
    fn parse(line: &str, len: usize) -> Vec<bool> {
        let mut keep = vec![false; len];
        let mut tokens = line.split([' ', ',', '\t']).filter(|t| !t.is_empty());
        let mut first = true;
        while let Some(tok) = tokens.next() {
            if first && (tok.starts_with('n') || tok.starts_with('N')) {
                // Preserve none; the caller deletes everything in this set.
                return keep;
            }
            first = false;
            if tok.starts_with('a') || tok.starts_with('A') {
                keep.iter_mut().for_each(|k| *k = true);
                continue;
            }
            if let Ok(n) = tok.parse::<usize>()
                && n >= 1
                && n <= len
            {
                keep[n - 1] = true;
            }
        }
        keep
    }
}

impl DeletePrompt for StdinPrompt {
    fn choose(
        &mut self,
        chain: &[&FileRecord],
        cur_group: usize,
        groups: usize,
        show_size: bool,
    ) -> Vec<bool> {
        for (i, rec) in chain.iter().enumerate() {
            println!("[{}] {}", i + 1, rec.path.display());
        }
        println!();

        let stdin = std::io::stdin();
        loop {
            print!(
                "Set {} of {}: keep which files? (1 - {}, [a]ll, [n]one)",
                cur_group,
                groups,
                chain.len()
            );
            if show_size {
                let size = chain[0].size;
                print!(" ({} byte{} each)", size, if size == 1 { "" } else { "s" });
            }
            print!(": ");
            let _ = std::io::stdout().flush();

            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => {
                    // No more input; keep the head rather than loop forever.
                    let mut keep = vec![false; chain.len()];
                    keep[0] = true;
                    return keep;
                }
                Ok(_) => {}
            }

            let trimmed = line.trim();
            let keep = Self::parse(trimmed, chain.len());
            // "none" is an explicit decision; anything else needs >= 1 kept.
            if keep.iter().any(|&k| k)
                || trimmed.starts_with('n')
                || trimmed.starts_with('N')
            {
                return keep;
            }
        }
    }
}

/// Delete all non-preserved members of every chain. Files that changed since
/// the scan are skipped with a warning; per-file failures never stop the run.
pub fn delete_files(store: &FileStore, cfg: &ScanConfig, prompt: &mut dyn DeletePrompt) {
    let heads = store.chain_heads();
    let groups = heads.len();

    for (group, head) in heads.iter().enumerate() {
        let chain = store.chain_members(*head);
        let records: Vec<&FileRecord> = chain.iter().map(|&id| store.get(id)).collect();

        let keep = prompt.choose(&records, group + 1, groups, cfg.show_size);
        debug_assert_eq!(keep.len(), records.len());
        println!();

        for (rec, preserved) in records.iter().zip(&keep) {
            if *preserved {
                println!("   [+] {}", rec.path.display());
                continue;
            }
            if rec.has_changed(cfg.no_change_check) {
                println!("   [!] {} -- file changed since being scanned", rec.path.display());
            } else if let Err(e) = fs::remove_file(&rec.path) {
                println!("   [!] {} -- unable to delete file", rec.path.display());
                warn!("delete failed for '{}': {}", rec.path.display(), e);
            } else {
                println!("   [-] {}", rec.path.display());
            }
        }
        println!();
    }
}
