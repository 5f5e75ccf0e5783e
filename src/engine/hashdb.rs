//! Persistent hash database: `(path, mtime) → (partial, full)` digests kept
//! across runs so unchanged files are never re-read.
//!
//! Text format (compatible with jdupes hash databases). Header line:
//! `jdupes hashdb:<dec_version>,<dec_algo>,<hex_mtime>`; entry lines:
//! `<hex_hashcount>,<hex_partial>,<hex_full>,<hex_mtime>,<path>` with the
//! hash and mtime fields zero-padded to 16 hex digits. The database is
//! written on clean exit only, via a temp file renamed into place; no
//! concurrent writers are assumed.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::hashing::jody_block_hash;
use crate::engine::store::FileRecord;
use crate::types::HashAlgorithm;
use crate::utils::config::HashDbConsts;

/// 64-bit key for the in-memory tree; collisions fall back to byte-exact
/// path comparison.
pub fn path_hash_of(path: &Path) -> u64 {
    jody_block_hash(path.as_os_str().as_bytes(), 0)
}

/// Resolve the `--hash-db` option value; `.` means the default filename in
/// the current directory.
pub fn resolve_db_path(opt: &Path) -> PathBuf {
    if opt.as_os_str().as_bytes() == b"." {
        PathBuf::from(HashDbConsts::DEFAULT_NAME)
    } else {
        opt.to_path_buf()
    }
}

#[derive(Debug)]
struct DbNode {
    path_hash: u64,
    path: PathBuf,
    mtime: i64,
    partial: u64,
    full: u64,
    /// 1 = partial only, 2 = partial + full, 0 = invalidated (not saved).
    hashcount: u8,
    left: Option<u32>,
    right: Option<u32>,
}

/// In-memory BST over path hashes, arena-backed. Node 0 is the root.
#[derive(Default, Debug)]
pub struct HashDb {
    nodes: Vec<DbNode>,
}

impl HashDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a database written by a prior run. Refuses incompatible versions
    /// and databases hashed with a different algorithm.
    pub fn load(dbpath: &Path, algo: HashAlgorithm) -> Result<Self> {
        let file = File::open(dbpath)
            .with_context(|| format!("open hash database '{}'", dbpath.display()))?;
        let mut reader = BufReader::new(file);

        let mut line: Vec<u8> = Vec::new();
        reader.read_until(b'\n', &mut line)?;
        let header = std::str::from_utf8(&line)
            .ok()
            .and_then(|h| h.trim_end().strip_prefix(HashDbConsts::HEADER_PREFIX))
            .with_context(|| format!("bad header in hash database '{}'", dbpath.display()))?;
        let fields: Vec<&str> = header.split(',').collect();
        if fields.len() != 3 {
            bail!("bad header in hash database '{}'", dbpath.display());
        }
        let version: u32 = fields[0].parse().unwrap_or(0);
        let db_algo: u32 = fields[1].parse().unwrap_or(u32::MAX);
        if version != HashDbConsts::VERSION {
            bail!(
                "bad version {} in hash database '{}'",
                version,
                dbpath.display()
            );
        }
        if db_algo != algo as u32 {
            bail!(
                "hash database '{}' was written with a different hash algorithm",
                dbpath.display()
            );
        }

        let mut db = HashDb::new();
        let mut linenum = 1usize;
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            linenum += 1;
            if line.last() == Some(&b'\n') {
                line.pop();
            }
            let entry = parse_entry_line(&line).with_context(|| {
                format!(
                    "bad line {} in hash database '{}'",
                    linenum,
                    dbpath.display()
                )
            })?;
            db.insert_node(entry);
        }
        Ok(db)
    }

    fn insert_node(&mut self, node: DbNode) {
        if self.nodes.is_empty() {
            self.nodes.push(node);
            return;
        }
        let new_idx = self.nodes.len() as u32;
        let hash = node.path_hash;
        let mut cur = 0u32;
        loop {
            let parent = &mut self.nodes[cur as usize];
            let slot = if parent.path_hash >= hash {
                &mut parent.left
            } else {
                &mut parent.right
            };
            match *slot {
                Some(n) => cur = n,
                None => {
                    *slot = Some(new_idx);
                    self.nodes.push(node);
                    return;
                }
            }
        }
    }

    /// Preload cached digests into a freshly statted record when path and
    /// mtime both match. An mtime mismatch invalidates the stored entry so
    /// it is dropped from the next save.
    pub fn preload(&mut self, rec: &mut FileRecord) {
        if self.nodes.is_empty() {
            return;
        }
        let hash = path_hash_of(&rec.path);
        let mut cur = Some(0u32);
        while let Some(c) = cur {
            let node = &mut self.nodes[c as usize];
            if node.path_hash != hash {
                cur = if hash < node.path_hash {
                    node.left
                } else {
                    node.right
                };
                continue;
            }
            if node.path != rec.path {
                // Hash collision; equal keys were inserted leftward.
                cur = node.left;
                continue;
            }
            if node.mtime != rec.mtime {
                node.hashcount = 0;
                return;
            }
            if node.hashcount >= 1 {
                rec.partial_hash = node.partial;
                rec.partial_valid = true;
            }
            if node.hashcount == 2 {
                rec.full_hash = node.full;
                rec.full_valid = true;
            }
            return;
        }
    }

    /// Insert or refresh the entry for a record that carries at least a
    /// partial hash.
    pub fn update_from_record(&mut self, rec: &FileRecord) {
        if !rec.partial_valid {
            return;
        }
        let hashcount = if rec.full_valid { 2 } else { 1 };
        let hash = path_hash_of(&rec.path);
        let mut cur = 0u32;
        if !self.nodes.is_empty() {
            loop {
                let node = &mut self.nodes[cur as usize];
                if node.path_hash == hash && node.path == rec.path {
                    node.mtime = rec.mtime;
                    node.partial = rec.partial_hash;
                    node.full = rec.full_hash;
                    node.hashcount = hashcount;
                    return;
                }
                let next = if node.path_hash >= hash {
                    node.left
                } else {
                    node.right
                };
                match next {
                    Some(n) => cur = n,
                    None => break,
                }
            }
        }
        self.insert_node(DbNode {
            path_hash: hash,
            path: rec.path.clone(),
            mtime: rec.mtime,
            partial: rec.partial_hash,
            full: rec.full_hash,
            hashcount,
            left: None,
            right: None,
        });
    }

    /// Number of live (non-invalidated) entries.
    pub fn entry_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.hashcount > 0).count()
    }

    /// Write every live entry back to disk: temp file in the same directory,
    /// then rename over the target.
    pub fn save(&self, dbpath: &Path, algo: HashAlgorithm) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let mut tmp_name = dbpath.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        let file = File::create(&tmp)
            .with_context(|| format!("create hash database '{}'", tmp.display()))?;
        let mut out = BufWriter::new(file);
        writeln!(
            out,
            "{}{},{},{:016x}",
            HashDbConsts::HEADER_PREFIX,
            HashDbConsts::VERSION,
            algo as u32,
            now
        )?;
        for node in self.nodes.iter().filter(|n| n.hashcount > 0) {
            write!(
                out,
                "{:x},{:016x},{:016x},{:016x},",
                node.hashcount, node.partial, node.full, node.mtime as u64
            )?;
            out.write_all(node.path.as_os_str().as_bytes())?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        drop(out);
        std::fs::rename(&tmp, dbpath)
            .with_context(|| format!("rename hash database into '{}'", dbpath.display()))?;
        Ok(())
    }
}

/// Parse one entry line (newline already stripped). Field layout is fixed
/// width: the path always starts at byte 53.
fn parse_entry_line(line: &[u8]) -> Result<DbNode> {
    if line.len() < HashDbConsts::MIN_LINE_LEN {
        bail!("line too short");
    }
    if line[1] != b',' || line[18] != b',' || line[35] != b',' || line[52] != b',' {
        bail!("malformed fields");
    }
    let hashcount = (line[0] as char).to_digit(16).context("bad hashcount")? as u8;
    if hashcount < 1 || hashcount > 2 {
        bail!("hashcount out of range");
    }
    let hex_u64 = |bytes: &[u8]| -> Result<u64> {
        let s = std::str::from_utf8(bytes).context("non-ASCII hex field")?;
        u64::from_str_radix(s, 16).context("bad hex field")
    };
    let partial = hex_u64(&line[2..18])?;
    let full = if hashcount == 2 {
        hex_u64(&line[19..35])?
    } else {
        0
    };
    let mtime = hex_u64(&line[36..52])? as i64;
    let path_bytes = &line[HashDbConsts::PATH_OFFSET..];
    let path = PathBuf::from(std::ffi::OsString::from_vec(path_bytes.to_vec()));
    Ok(DbNode {
        path_hash: path_hash_of(&path),
        path,
        mtime,
        partial,
        full,
        hashcount,
        left: None,
        right: None,
    })
}
