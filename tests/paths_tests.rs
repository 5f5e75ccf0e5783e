use std::path::{Path, PathBuf};

use dupescan::utils::paths::{RelativeLink, collapse_dotdot, relative_link_target};

// --- collapse_dotdot ---

#[test]
fn test_collapse_requires_absolute() {
    assert!(collapse_dotdot(b"relative/path").is_none());
}

#[test]
fn test_collapse_passthrough() {
    assert_eq!(collapse_dotdot(b"/a/b/c").unwrap(), b"/a/b/c");
}

#[test]
fn test_collapse_single_dots() {
    assert_eq!(collapse_dotdot(b"/a/./b/./c").unwrap(), b"/a/b/c");
}

#[test]
fn test_collapse_dotdots() {
    assert_eq!(collapse_dotdot(b"/a/b/../c").unwrap(), b"/a/c");
    assert_eq!(collapse_dotdot(b"/a/b/c/../../d").unwrap(), b"/a/d");
}

#[test]
fn test_collapse_dotdot_at_root() {
    assert_eq!(collapse_dotdot(b"/../a").unwrap(), b"/a");
    assert_eq!(collapse_dotdot(b"/..").unwrap(), b"/");
}

#[test]
fn test_collapse_repeated_slashes() {
    assert_eq!(collapse_dotdot(b"/a//b///c").unwrap(), b"/a/b/c");
}

// --- relative_link_target ---

fn rel(src: &str, dest: &str) -> PathBuf {
    match relative_link_target(Path::new(src), Path::new(dest)).unwrap() {
        RelativeLink::Target(p) => p,
        RelativeLink::SamePath => panic!("unexpected SamePath"),
    }
}

#[test]
fn test_relative_same_directory() {
    assert_eq!(rel("/data/a", "/data/b"), PathBuf::from("a"));
}

#[test]
fn test_relative_target_deeper() {
    // Target sits one directory below the source's parent.
    assert_eq!(rel("/data/a", "/data/sub/b"), PathBuf::from("../a"));
}

#[test]
fn test_relative_source_deeper() {
    assert_eq!(rel("/data/sub/a", "/data/b"), PathBuf::from("sub/a"));
}

#[test]
fn test_relative_disjoint_trees() {
    assert_eq!(rel("/one/two/a", "/three/four/b"), PathBuf::from("../../one/two/a"));
}

#[test]
fn test_relative_collapses_dots_first() {
    assert_eq!(rel("/data/./a", "/data/sub/../sub/b"), PathBuf::from("../a"));
}

#[test]
fn test_relative_same_file_detected() {
    let r = relative_link_target(Path::new("/data/x/../a"), Path::new("/data/a")).unwrap();
    assert!(matches!(r, RelativeLink::SamePath));
}
