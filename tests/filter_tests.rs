use std::path::Path;

use dupescan::engine::FileStore;
use dupescan::engine::filters::{check_singlefile, exclude_by_filters, parse_ext_filter};
use dupescan::types::ScanConfig;

fn record_with(path: &str, size: i64, mtime: i64) -> dupescan::engine::FileRecord {
    let mut store = FileStore::new();
    let id = store.allocate(Path::new(path), 1);
    let rec = store.get_mut(id);
    rec.size = size;
    rec.mtime = mtime;
    rec.stat_valid = true;
    rec.clone()
}

// --- parsing ---

#[test]
fn test_parse_unknown_tag_fails() {
    assert!(parse_ext_filter("nonsense:1").is_err());
}

#[test]
fn test_parse_size_suffixes() {
    let f = parse_ext_filter("size+:16k").unwrap();
    assert_eq!(f.value, 16384);
    let f = parse_ext_filter("size+:16kb").unwrap();
    assert_eq!(f.value, 16000);
    let f = parse_ext_filter("size+:16kib").unwrap();
    assert_eq!(f.value, 16384);
    let f = parse_ext_filter("size+:2M").unwrap();
    assert_eq!(f.value, 2 * 1024 * 1024);
    let f = parse_ext_filter("size+:100").unwrap();
    assert_eq!(f.value, 100);
}

#[test]
fn test_parse_bad_size_fails() {
    assert!(parse_ext_filter("size+:abc").is_err());
    assert!(parse_ext_filter("size+:10x").is_err());
    assert!(parse_ext_filter("size+:").is_err());
}

#[test]
fn test_parse_dates() {
    let f = parse_ext_filter("newer:2020-01-02").unwrap();
    assert!(f.value > 0);
    let with_time = parse_ext_filter("newer:2020-01-02 03:04:05").unwrap();
    assert!(with_time.value > f.value);
    assert!(parse_ext_filter("newer:02/01/2020").is_err());
    assert!(parse_ext_filter("older:").is_err());
}

#[test]
fn test_parse_ext_requires_value() {
    assert!(parse_ext_filter("noext").is_err());
    assert!(parse_ext_filter("onlyext:").is_err());
}

// --- size filters ---

#[test]
fn test_size_filters_cumulative() {
    // size+:99 and size-:101 together keep only exactly 100 bytes.
    let filters = vec![
        parse_ext_filter("size+:99").unwrap(),
        parse_ext_filter("size-:101").unwrap(),
    ];
    assert!(exclude_by_filters(&record_with("f", 99, 0), &filters));
    assert!(!exclude_by_filters(&record_with("f", 100, 0), &filters));
    assert!(exclude_by_filters(&record_with("f", 101, 0), &filters));
}

#[test]
fn test_size_eq_and_bounds() {
    let eq = vec![parse_ext_filter("size=:50").unwrap()];
    assert!(!exclude_by_filters(&record_with("f", 50, 0), &eq));
    assert!(exclude_by_filters(&record_with("f", 51, 0), &eq));

    let gteq = vec![parse_ext_filter("size+=:50").unwrap()];
    assert!(!exclude_by_filters(&record_with("f", 50, 0), &gteq));
    assert!(exclude_by_filters(&record_with("f", 49, 0), &gteq));
}

// --- extension filters ---

#[test]
fn test_extension_match_case_insensitive() {
    let noext = vec![parse_ext_filter("noext:jpg,png").unwrap()];
    assert!(exclude_by_filters(&record_with("photo.JPG", 1, 0), &noext));
    assert!(exclude_by_filters(&record_with("a/b/c.png", 1, 0), &noext));
    assert!(!exclude_by_filters(&record_with("notes.txt", 1, 0), &noext));
    // Dot in a directory name is not an extension.
    assert!(!exclude_by_filters(&record_with("x.jpg/readme", 1, 0), &noext));
    // Trailing dot means no extension.
    assert!(!exclude_by_filters(&record_with("oddname.", 1, 0), &noext));
}

#[test]
fn test_only_extension_inverts() {
    let only = vec![parse_ext_filter("onlyext:txt").unwrap()];
    assert!(!exclude_by_filters(&record_with("notes.txt", 1, 0), &only));
    assert!(exclude_by_filters(&record_with("photo.jpg", 1, 0), &only));
    assert!(exclude_by_filters(&record_with("no_extension", 1, 0), &only));
}

// --- substring filters ---

#[test]
fn test_substring_case_sensitive() {
    let nostr = vec![parse_ext_filter("nostr:/cache/").unwrap()];
    assert!(exclude_by_filters(&record_with("/tmp/cache/f", 1, 0), &nostr));
    assert!(!exclude_by_filters(&record_with("/tmp/Cache/f", 1, 0), &nostr));

    let onlystr = vec![parse_ext_filter("onlystr:keep").unwrap()];
    assert!(!exclude_by_filters(&record_with("keepsake", 1, 0), &onlystr));
    assert!(exclude_by_filters(&record_with("other", 1, 0), &onlystr));
}

// --- date filters ---

#[test]
fn test_date_filters() {
    let cutoff = parse_ext_filter("newer:2020-01-02").unwrap();
    let epoch = cutoff.value;
    let filters = vec![cutoff];
    assert!(exclude_by_filters(&record_with("f", 1, epoch - 1), &filters));
    assert!(!exclude_by_filters(&record_with("f", 1, epoch), &filters));

    let older = vec![parse_ext_filter("older:2020-01-02").unwrap()];
    let epoch = older[0].value;
    assert!(!exclude_by_filters(&record_with("f", 1, epoch - 1), &older));
    assert!(exclude_by_filters(&record_with("f", 1, epoch), &older));
}

// --- the gate itself ---

#[test]
fn test_gate_rejects_hidden() {
    let cfg = ScanConfig {
        exclude_hidden: true,
        ..ScanConfig::default()
    };
    let mut store = FileStore::new();
    let id = store.allocate(Path::new("/tmp/.hidden_file_for_gate"), 1);
    assert!(check_singlefile(store.get_mut(id), &cfg));
}

#[test]
fn test_gate_rejects_missing_file() {
    let cfg = ScanConfig::default();
    let mut store = FileStore::new();
    let id = store.allocate(Path::new("/no/such/path/exists_here"), 1);
    assert!(check_singlefile(store.get_mut(id), &cfg));
}

#[test]
fn test_gate_empty_files_only_with_zero_match() {
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty");
    std::fs::write(&empty, b"").unwrap();

    let cfg = ScanConfig::default();
    let mut store = FileStore::new();
    let id = store.allocate(&empty, 1);
    assert!(check_singlefile(store.get_mut(id), &cfg));

    let cfg = ScanConfig {
        include_empty: true,
        ..ScanConfig::default()
    };
    let mut store = FileStore::new();
    let id = store.allocate(&empty, 1);
    assert!(!check_singlefile(store.get_mut(id), &cfg));
}
