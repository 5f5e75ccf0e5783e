//! Non-destructive reporters: matched sets, unique files, summary, JSON.

use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::engine::store::FileStore;
use crate::types::ScanConfig;

fn write_path(out: &mut impl Write, path: &Path, null_sep: bool) {
    if null_sep {
        let _ = write!(out, "{}\0", path.display());
    } else {
        let _ = writeln!(out, "{}", path.display());
    }
}

/// Print each duplicate set, one path per line, blank line between sets.
pub fn print_matches(store: &FileStore, cfg: &ScanConfig) {
    let mut out = std::io::stdout().lock();
    let heads = store.chain_heads();

    if heads.is_empty() {
        let _ = writeln!(out, "No duplicates found.");
        return;
    }

    for (i, head) in heads.iter().enumerate() {
        let chain = store.chain_members(*head);
        for (n, id) in chain.iter().enumerate() {
            let rec = store.get(*id);
            if n == 0 {
                if cfg.omit_first {
                    continue;
                }
                if cfg.show_size {
                    let _ = writeln!(
                        out,
                        "{} byte{} each:",
                        rec.size,
                        if rec.size == 1 { "" } else { "s" }
                    );
                }
            }
            write_path(&mut out, &rec.path, cfg.print_null);
        }
        if i + 1 < heads.len() {
            write_path(&mut out, Path::new(""), cfg.print_null);
        }
    }
}

/// Print files that belong to no duplicate chain.
pub fn print_unique(store: &mut FileStore, cfg: &ScanConfig) {
    // First sweep marks every chain member so the second can print the rest.
    for head in store.chain_heads() {
        for id in store.chain_members(head) {
            store.get_mut(id).not_unique = true;
        }
    }

    let mut out = std::io::stdout().lock();
    let mut printed = false;
    for id in store.ids() {
        let rec = store.get(id);
        if rec.not_unique {
            continue;
        }
        printed = true;
        if cfg.show_size {
            let _ = writeln!(
                out,
                "{} byte{} each:",
                rec.size,
                if rec.size == 1 { "" } else { "s" }
            );
        }
        write_path(&mut out, &rec.path, cfg.print_null);
    }
    if !printed {
        eprintln!("No unique files found.");
    }
}

/// One-line space summary across all sets.
pub fn summarize_matches(store: &FileStore) {
    let mut num_sets = 0u64;
    let mut num_files = 0u64;
    let mut num_bytes = 0i64;

    for head in store.chain_heads() {
        num_sets += 1;
        // Every member past the first is reclaimable.
        for id in store.chain_members(head).iter().skip(1) {
            num_files += 1;
            num_bytes += store.get(*id).size;
        }
    }

    if num_sets == 0 {
        println!("No duplicates found.");
        return;
    }
    print!("{num_files} duplicate files (in {num_sets} sets), occupying ");
    if num_bytes < 1000 {
        println!("{} byte{}", num_bytes, if num_bytes == 1 { "" } else { "s" });
    } else if num_bytes <= 1_000_000 {
        println!("{} KB", num_bytes / 1000);
    } else {
        println!("{} MB", num_bytes / 1_000_000);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonFile {
    file_path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSet {
    file_size: i64,
    file_list: Vec<JsonFile>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport {
    program: &'static str,
    version: &'static str,
    command_line: String,
    match_sets: Vec<JsonSet>,
}

/// Match sets as a single JSON document on stdout. Paths are emitted lossily
/// as UTF-8; JSON cannot carry raw bytes.
pub fn print_json(store: &FileStore) {
    let match_sets = store
        .chain_heads()
        .into_iter()
        .map(|head| JsonSet {
            file_size: store.get(head).size,
            file_list: store
                .chain_members(head)
                .into_iter()
                .map(|id| JsonFile {
                    file_path: store.get(id).path.to_string_lossy().into_owned(),
                })
                .collect(),
        })
        .collect();

    let report = JsonReport {
        program: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        command_line: std::env::args().collect::<Vec<_>>().join(" "),
        match_sets,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&report).unwrap_or_default()
    );
}
