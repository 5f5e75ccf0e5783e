use std::path::Path;

use dupescan::engine::hashing::{ensure_full_hash, ensure_partial_hash};
use dupescan::engine::{FileId, FileStore, HashEngine, jody_block_hash};
use dupescan::types::HashAlgorithm;
use dupescan::utils::config::ChunkConsts;

fn statted(store: &mut FileStore, path: &Path) -> FileId {
    let id = store.allocate(path, 1);
    assert!(store.get_mut(id).fill_stats());
    id
}

// --- jody_block_hash ---

#[test]
fn test_jody_chunked_equals_oneshot() {
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let oneshot = jody_block_hash(&data, 0);

    let mut chained = 0u64;
    for chunk in data.chunks(1024) {
        chained = jody_block_hash(chunk, chained);
    }
    assert_eq!(oneshot, chained);
}

#[test]
fn test_jody_tail_bytes_matter() {
    let a = jody_block_hash(b"0123456789", 0);
    let b = jody_block_hash(b"0123456780", 0);
    assert_ne!(a, b);
}

#[test]
fn test_jody_empty_block_is_identity() {
    assert_eq!(jody_block_hash(b"", 42), 42);
}

// --- engine: partial and full digests ---

#[test]
fn test_partial_covers_first_4096_bytes_only() {
    let dir = tempfile::tempdir().unwrap();
    let mut head = vec![0xabu8; 4096];
    let p1 = dir.path().join("one");
    let p2 = dir.path().join("two");
    std::fs::write(&p1, &head).unwrap();
    head.extend_from_slice(b"different tail");
    std::fs::write(&p2, &head).unwrap();

    let mut store = FileStore::new();
    let a = statted(&mut store, &p1);
    let b = statted(&mut store, &p2);

    for algo in [HashAlgorithm::Xxhash64, HashAlgorithm::Jodyhash64] {
        let mut engine = HashEngine::new(algo, ChunkConsts::DEFAULT);
        let mut ra = store.get(a).clone();
        let mut rb = store.get(b).clone();
        ensure_partial_hash(&mut engine, &mut ra).unwrap();
        ensure_partial_hash(&mut engine, &mut rb).unwrap();
        assert_eq!(ra.partial_hash, rb.partial_hash, "{algo:?}");
    }
}

#[test]
fn test_jody_full_resumes_from_partial_state() {
    let dir = tempfile::tempdir().unwrap();
    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 13) as u8).collect();
    let path = dir.path().join("payload");
    std::fs::write(&path, &data).unwrap();

    let mut store = FileStore::new();
    let id = statted(&mut store, &path);
    let mut engine = HashEngine::new(HashAlgorithm::Jodyhash64, ChunkConsts::DEFAULT);

    let rec = store.get_mut(id);
    ensure_partial_hash(&mut engine, rec).unwrap();
    assert_eq!(rec.partial_hash, jody_block_hash(&data[..4096], 0));
    ensure_full_hash(&mut engine, rec).unwrap();
    assert_eq!(rec.full_hash, jody_block_hash(&data, 0));
}

#[test]
fn test_xxh_full_restarts_from_offset_zero() {
    let dir = tempfile::tempdir().unwrap();
    let data: Vec<u8> = (0..20_000u32).map(|i| (i % 17) as u8).collect();
    let path = dir.path().join("payload");
    std::fs::write(&path, &data).unwrap();

    let mut store = FileStore::new();
    let id = statted(&mut store, &path);
    let mut engine = HashEngine::new(HashAlgorithm::Xxhash64, ChunkConsts::DEFAULT);

    let rec = store.get_mut(id);
    ensure_partial_hash(&mut engine, rec).unwrap();
    assert_eq!(rec.partial_hash, xxhash_rust::xxh64::xxh64(&data[..4096], 0));
    ensure_full_hash(&mut engine, rec).unwrap();
    assert_eq!(rec.full_hash, xxhash_rust::xxh64::xxh64(&data, 0));
}

#[test]
fn test_full_equals_partial_at_4096_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exact");
    std::fs::write(&path, vec![7u8; 4096]).unwrap();

    let mut store = FileStore::new();
    let id = statted(&mut store, &path);

    for algo in [HashAlgorithm::Xxhash64, HashAlgorithm::Jodyhash64] {
        let mut engine = HashEngine::new(algo, ChunkConsts::DEFAULT);
        let mut rec = store.get(id).clone();
        ensure_partial_hash(&mut engine, &mut rec).unwrap();
        ensure_full_hash(&mut engine, &mut rec).unwrap();
        assert_eq!(rec.partial_hash, rec.full_hash, "{algo:?}");
    }
}
