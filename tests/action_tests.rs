use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use dupescan::actions::delete::{KeepFirst, delete_files};
use dupescan::actions::link::link_files;
use dupescan::pipeline::{ScanResults, run_scan};
use dupescan::types::{Action, ScanConfig};

fn scan(cfg: &ScanConfig, root: &Path) -> ScanResults {
    run_scan(cfg, &[root.to_path_buf()]).unwrap()
}

fn no_temp_files(dir: &Path) {
    for entry in fs::read_dir(dir).unwrap() {
        let name = entry.unwrap().file_name();
        assert!(
            !name.to_string_lossy().ends_with(".__jdupes__.tmp"),
            "leftover temp file: {name:?}"
        );
    }
}

// --- hard link action ---

#[test]
fn test_hardlink_action_collapses_chain() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    let c = dir.path().join("c");
    for p in [&a, &b, &c] {
        fs::write(p, b"identical content").unwrap();
    }
    let original_mtime = fs::metadata(&a).unwrap().mtime();

    let cfg = ScanConfig::default();
    let results = scan(&cfg, dir.path());
    link_files(&results.store, &cfg, true);

    let ino = fs::metadata(&a).unwrap().ino();
    assert_eq!(fs::metadata(&b).unwrap().ino(), ino);
    assert_eq!(fs::metadata(&c).unwrap().ino(), ino);
    assert_eq!(fs::metadata(&a).unwrap().nlink(), 3);
    assert_eq!(fs::read(&b).unwrap(), b"identical content");
    assert_eq!(fs::metadata(&a).unwrap().mtime(), original_mtime);
    no_temp_files(dir.path());
}

#[test]
fn test_hardlink_action_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"stuff").unwrap();
    fs::write(&b, b"stuff").unwrap();

    let cfg = ScanConfig::default();
    let results = scan(&cfg, dir.path());
    link_files(&results.store, &cfg, true);
    let ino = fs::metadata(&a).unwrap().ino();

    // Rescan with -H so the now-linked pair is still one chain; linking
    // again must change nothing.
    let cfg = ScanConfig {
        consider_hardlinks: true,
        ..ScanConfig::default()
    };
    let results = scan(&cfg, dir.path());
    link_files(&results.store, &cfg, true);
    assert_eq!(fs::metadata(&a).unwrap().ino(), ino);
    assert_eq!(fs::metadata(&b).unwrap().ino(), ino);
    no_temp_files(dir.path());
}

#[test]
fn test_hardlink_skips_target_changed_after_scan() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"same-size-1").unwrap();
    fs::write(&b, b"same-size-1").unwrap();

    let cfg = ScanConfig::default();
    let results = scan(&cfg, dir.path());
    // Change b between scan and action (size drift).
    fs::write(&b, b"changed meanwhile").unwrap();

    link_files(&results.store, &cfg, true);
    assert_ne!(
        fs::metadata(&a).unwrap().ino(),
        fs::metadata(&b).unwrap().ino()
    );
    assert_eq!(fs::read(&b).unwrap(), b"changed meanwhile");
    no_temp_files(dir.path());
}

// --- symlink action ---

#[test]
fn test_symlink_action_uses_relative_target() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("sub/b");
    fs::write(&a, b"linked bytes").unwrap();
    fs::write(&b, b"linked bytes").unwrap();

    let cfg = ScanConfig {
        recursion: dupescan::types::Recursion::All,
        ..ScanConfig::default()
    };
    let results = scan(&cfg, dir.path());
    link_files(&results.store, &cfg, false);

    // One of the two is now a relative symlink to the other; both names
    // still resolve to the same bytes.
    let a_is_link = fs::symlink_metadata(&a).unwrap().file_type().is_symlink();
    let b_is_link = fs::symlink_metadata(&b).unwrap().file_type().is_symlink();
    assert!(a_is_link ^ b_is_link);
    let link = if a_is_link { &a } else { &b };
    assert!(fs::read_link(link).unwrap().is_relative());
    assert_eq!(fs::read(&a).unwrap(), b"linked bytes");
    assert_eq!(fs::read(&b).unwrap(), b"linked bytes");
    no_temp_files(dir.path());
}

// --- delete action ---

#[test]
fn test_delete_keeps_head_only() {
    let dir = tempfile::tempdir().unwrap();
    let x = dir.path().join("x");
    let y = dir.path().join("y");
    let z = dir.path().join("z");
    for p in [&x, &y, &z] {
        fs::write(p, b"doomed").unwrap();
    }

    let cfg = ScanConfig {
        action: Action::Delete,
        no_prompt: true,
        ..ScanConfig::default()
    };
    let results = scan(&cfg, dir.path());
    delete_files(&results.store, &cfg, &mut KeepFirst);

    assert!(x.exists());
    assert!(!y.exists());
    assert!(!z.exists());
}

#[test]
fn test_delete_skips_changed_file() {
    let dir = tempfile::tempdir().unwrap();
    let x = dir.path().join("x");
    let y = dir.path().join("y");
    let z = dir.path().join("z");
    for p in [&x, &y, &z] {
        fs::write(p, b"doomed").unwrap();
    }

    let cfg = ScanConfig {
        action: Action::Delete,
        no_prompt: true,
        ..ScanConfig::default()
    };
    let results = scan(&cfg, dir.path());
    fs::write(&y, b"changed since the scan").unwrap();
    delete_files(&results.store, &cfg, &mut KeepFirst);

    assert!(x.exists());
    assert!(y.exists());
    assert!(!z.exists());
}

// --- hash database round trip through the full run ---

#[test]
fn test_hash_db_round_trip_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("hashes.db");
    let x1 = dir.path().join("x1");
    let x2 = dir.path().join("x2");
    let y = dir.path().join("y");
    let z = dir.path().join("z");
    fs::write(&x1, b"first pair members").unwrap();
    fs::write(&x2, b"first pair members").unwrap();
    // Same size as the pair so everything gets hashed.
    fs::write(&y, b"same-length decoy 1").unwrap();
    fs::write(&z, b"same-length decoy 2").unwrap();
    assert_eq!(
        fs::metadata(&x1).unwrap().len(),
        fs::metadata(&y).unwrap().len()
    );

    let cfg = ScanConfig {
        hash_db: Some(db_path.clone()),
        ..ScanConfig::default()
    };
    let roots: Vec<PathBuf> = vec![dir.path().to_path_buf()];
    assert_eq!(dupescan::run(&cfg, &roots).unwrap(), 0);
    assert!(db_path.exists());
    let first = fs::read_to_string(&db_path).unwrap();
    assert!(first.starts_with("jdupes hashdb:1,0,"));
    assert!(first.contains("x1"));

    // Touch y (mtime drift) and remove z between runs.
    let f = fs::File::options().append(true).open(&y).unwrap();
    f.set_times(
        fs::FileTimes::new()
            .set_modified(std::time::SystemTime::now() - std::time::Duration::from_secs(9000)),
    )
    .unwrap();
    drop(f);
    fs::remove_file(&z).unwrap();

    assert_eq!(dupescan::run(&cfg, &roots).unwrap(), 0);
    let second = fs::read_to_string(&db_path).unwrap();

    // y was re-hashed under its new mtime; its entry carries that mtime.
    let y_mtime = fs::metadata(&y).unwrap().mtime() as u64;
    let y_line = second.lines().find(|l| l.ends_with("/y")).unwrap();
    assert!(y_line.contains(&format!("{y_mtime:016x}")));
    // The confirmed pair reached the full-hash stage; hashcount is 2.
    let x1_line = second.lines().find(|l| l.ends_with("/x1")).unwrap();
    assert!(x1_line.starts_with('2'));
}

// --- error-on-dupe exit code through the full run ---

#[test]
fn test_error_on_dupe_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("p"), b"twice").unwrap();
    fs::write(dir.path().join("q"), b"twice").unwrap();

    let cfg = ScanConfig {
        action: Action::ErrorOnDupe,
        ..ScanConfig::default()
    };
    let code = dupescan::run(&cfg, &[dir.path().to_path_buf()]).unwrap();
    assert_eq!(code, 255);
}
