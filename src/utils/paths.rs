//! Relative symlink path math: dot-component collapse and common-prefix
//! replacement. Works on raw path bytes; no decoding beyond `/` and `.`.

use anyhow::{Context, Result, bail};
use std::env;
use std::ffi::OsString;
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

/// Outcome of computing a relative link target.
pub enum RelativeLink {
    /// Both canonical paths are identical; linking would point a file at itself.
    SamePath,
    Target(PathBuf),
}

/// Collapse `.` and `..` components and repeated slashes in an absolute path.
/// Returns `None` when the input is not absolute. Dot-dots that would climb
/// above the root are dropped.
pub fn collapse_dotdot(path: &[u8]) -> Option<Vec<u8>> {
    if path.first() != Some(&b'/') {
        return None;
    }
    let mut out: Vec<u8> = Vec::with_capacity(path.len());
    for comp in path.split(|&b| b == b'/') {
        match comp {
            b"" | b"." => {}
            b".." => {
                while let Some(&b) = out.last() {
                    out.pop();
                    if b == b'/' {
                        break;
                    }
                }
            }
            c => {
                out.push(b'/');
                out.extend_from_slice(c);
            }
        }
    }
    if out.is_empty() {
        out.push(b'/');
    }
    Some(out)
}

fn absolutize(p: &Path) -> Result<Vec<u8>> {
    let b = p.as_os_str().as_bytes();
    if b.first() == Some(&b'/') {
        return Ok(b.to_vec());
    }
    let cwd = env::current_dir().context("get current directory")?;
    let mut out = cwd.into_os_string().into_vec();
    out.push(b'/');
    out.extend_from_slice(b);
    Ok(out)
}

/// Compute the relative path written into a symlink at `dest` so that it
/// resolves to `src`: shared leading directories are replaced with one `..`
/// per directory remaining in the target's own suffix.
pub fn relative_link_target(src: &Path, dest: &Path) -> Result<RelativeLink> {
    let p1 = collapse_dotdot(&absolutize(src)?).context("collapse source path")?;
    let p2 = collapse_dotdot(&absolutize(dest)?).context("collapse target path")?;
    if p1 == p2 {
        return Ok(RelativeLink::SamePath);
    }

    // Find where the paths diverge, remembering the last slash both share.
    let mut last_slash = 0usize;
    let mut i = 0usize;
    while i < p1.len() && i < p2.len() && p1[i] == p2[i] {
        if p1[i] == b'/' {
            last_slash = i;
        }
        i += 1;
    }

    // One dot-dot per directory level left in the target's suffix, then the
    // source's suffix below the shared directory.
    let mut rel: Vec<u8> = Vec::new();
    for &b in &p2[i..] {
        if b == b'/' {
            rel.extend_from_slice(b"../");
        }
    }
    rel.extend_from_slice(&p1[last_slash + 1..]);

    if rel.is_empty() || rel.last() == Some(&b'/') {
        bail!("relative link computation produced a directory path");
    }
    Ok(RelativeLink::Target(PathBuf::from(OsString::from_vec(rel))))
}
