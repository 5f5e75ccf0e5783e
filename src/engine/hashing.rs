//! Content hash engine: chunked streaming jodyhash64 / xxHash64 digests with
//! the partial-then-full optimization, plus I/O chunk auto-sizing.
//!
//! Neither algorithm is cryptographic. Hashes are a fast-fail filter only;
//! the byte confirmer has the final word on equality.

use log::warn;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use xxhash_rust::xxh64::Xxh64;

use crate::engine::interrupt::interrupted;
use crate::engine::store::FileRecord;
use crate::types::{FileError, HashAlgorithm};
use crate::utils::config::{ChunkConsts, PARTIAL_HASH_SIZE};

const JODY_HASH_SHIFT: u32 = 11;
const JODY_HASH_SALT: u64 = 0x1f3d5b79;

/// Zeroes out buffer bytes past the end of the data in the final partial word.
const TAIL_MASK: [u64; 8] = [
    0x0000000000000000,
    0x00000000000000ff,
    0x000000000000ffff,
    0x0000000000ffffff,
    0x00000000ffffffff,
    0x000000ffffffffff,
    0x0000ffffffffffff,
    0x00ffffffffffffff,
];

/// jodyhash64 over one block. Pass 0 as `start_hash` for the first block and
/// the previous return value for each following block; every block except the
/// last must be a multiple of 8 bytes.
pub fn jody_block_hash(data: &[u8], start_hash: u64) -> u64 {
    let mut hash = start_hash;
    if data.is_empty() {
        return hash;
    }

    let mut words = data.chunks_exact(8);
    for word in &mut words {
        let element = u64::from_le_bytes(word.try_into().unwrap());
        hash = hash.wrapping_add(element);
        hash = hash.wrapping_add(JODY_HASH_SALT);
        hash = hash.rotate_left(JODY_HASH_SHIFT);
        hash ^= element;
        hash = hash.rotate_left(JODY_HASH_SHIFT);
        hash ^= JODY_HASH_SALT;
        hash = hash.wrapping_add(element);
    }

    let rem = words.remainder();
    if !rem.is_empty() {
        let mut padded = [0u8; 8];
        padded[..rem.len()].copy_from_slice(rem);
        let element = u64::from_le_bytes(padded);
        let tail = element.wrapping_add(JODY_HASH_SALT) & TAIL_MASK[rem.len()];
        hash = hash.wrapping_add(tail);
        hash = hash.rotate_left(JODY_HASH_SHIFT);
        hash ^= tail;
        hash = hash.rotate_left(JODY_HASH_SHIFT);
        hash ^= JODY_HASH_SALT;
        hash = hash.wrapping_add(tail);
    }

    hash
}

/// Read `/sys/devices/system/cpu/cpu0/cache/indexN/<field>`.
#[cfg(target_os = "linux")]
fn read_cache_field(index: u32, field: &str) -> Option<String> {
    let path = format!("/sys/devices/system/cpu/cpu0/cache/index{index}/{field}");
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

/// Detect the L1 data (or unified) cache size in bytes; 0 when unknown.
#[cfg(target_os = "linux")]
fn l1_cache_size() -> usize {
    for index in 0..9u32 {
        let Some(level) = read_cache_field(index, "level") else {
            break;
        };
        if level != "1" {
            continue;
        }
        let Some(ty) = read_cache_field(index, "type") else {
            break;
        };
        if ty != "Data" && ty != "Unified" {
            continue;
        }
        let Some(size) = read_cache_field(index, "size") else {
            break;
        };
        // Sizes read as e.g. "32K".
        let kib: usize = size
            .trim_end_matches(|c: char| !c.is_ascii_digit())
            .parse()
            .unwrap_or(0);
        return kib * 1024;
    }
    0
}

#[cfg(not(target_os = "linux"))]
fn l1_cache_size() -> usize {
    0
}

/// Pick the I/O chunk size: the manual override when given, otherwise half
/// the L1 data cache. Either way the result is clamped to
/// [`ChunkConsts::MIN`], [`ChunkConsts::MAX`] and rounded up to a 4 KiB
/// boundary.
pub fn auto_chunk_size(manual: Option<usize>) -> usize {
    let mut chunk = match manual {
        Some(m) => m,
        None => {
            let l1 = l1_cache_size();
            if l1 == 0 {
                return ChunkConsts::DEFAULT;
            }
            l1 / 2
        }
    };
    if chunk < ChunkConsts::MIN || chunk > ChunkConsts::MAX {
        chunk = ChunkConsts::DEFAULT;
    }
    (chunk + 0xfff) & !0xfff
}

#[cfg(target_os = "linux")]
fn advise_sequential(file: &File, offset: i64, len: i64) {
    use std::os::fd::AsRawFd;
    unsafe {
        libc::posix_fadvise(file.as_raw_fd(), offset, len, libc::POSIX_FADV_SEQUENTIAL);
        libc::posix_fadvise(file.as_raw_fd(), offset, len, libc::POSIX_FADV_WILLNEED);
    }
}

#[cfg(not(target_os = "linux"))]
fn advise_sequential(_file: &File, _offset: i64, _len: i64) {}

/// Fill `buf` from `file`, tolerating short reads; returns bytes read (less
/// than `buf.len()` only at end of file).
fn read_full(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}

/// Streaming hasher with one lazily allocated, reused chunk buffer.
pub struct HashEngine {
    algo: HashAlgorithm,
    chunk_size: usize,
    chunk: Vec<u8>,
}

impl HashEngine {
    pub fn new(algo: HashAlgorithm, chunk_size: usize) -> Self {
        HashEngine {
            algo,
            chunk_size,
            chunk: Vec::new(),
        }
    }

    /// Hash the first `max_read` bytes of the record's file; `max_read == 0`
    /// means the entire file.
    ///
    /// When the partial hash is already known: for jodyhash64 the digest
    /// resumes from that state past the first 4 KiB; xxHash64 cannot resume,
    /// so the full digest restarts at offset 0. Any open/seek/read failure
    /// yields no digest and the caller treats the file as non-matching.
    pub fn hash_file(&mut self, rec: &FileRecord, max_read: u64) -> Result<u64, FileError> {
        if rec.size < 0 {
            return Err(FileError::NotFound);
        }
        let mut fsize = rec.size;
        if max_read > 0 && fsize > max_read as i64 {
            fsize = max_read as i64;
        }

        let mut hash: u64 = 0;
        if rec.partial_valid {
            hash = rec.partial_hash;
            // Nothing more to read if the partial hash already covers it.
            if max_read != 0 && max_read <= PARTIAL_HASH_SIZE {
                return Ok(hash);
            }
        }

        let mut file = File::open(&rec.path).map_err(|e| {
            warn!("error opening file '{}': {}", rec.path.display(), e);
            FileError::IoFailed
        })?;

        let resume =
            rec.partial_valid && self.algo == HashAlgorithm::Jodyhash64 && max_read == 0;
        if resume {
            if file.seek(SeekFrom::Start(PARTIAL_HASH_SIZE)).is_err() {
                warn!("error seeking in file '{}'", rec.path.display());
                return Err(FileError::IoFailed);
            }
            fsize -= PARTIAL_HASH_SIZE as i64;
            advise_sequential(&file, PARTIAL_HASH_SIZE as i64, fsize);
        } else {
            hash = 0;
            advise_sequential(&file, 0, fsize);
        }

        if self.chunk.is_empty() {
            self.chunk = vec![0u8; self.chunk_size];
        }

        let mut xxh = (self.algo == HashAlgorithm::Xxhash64).then(|| Xxh64::new(0));
        let mut remain = fsize;
        while remain > 0 {
            if interrupted() {
                return Err(FileError::IoFailed);
            }
            let want = (remain as usize).min(self.chunk_size);
            let got = read_full(&mut file, &mut self.chunk[..want]).map_err(|e| {
                warn!("error reading from file '{}': {}", rec.path.display(), e);
                FileError::IoFailed
            })?;
            if got < want {
                warn!("error reading from file '{}': short read", rec.path.display());
                return Err(FileError::IoFailed);
            }
            match &mut xxh {
                Some(state) => state.update(&self.chunk[..got]),
                None => hash = jody_block_hash(&self.chunk[..got], hash),
            }
            remain -= got as i64;
        }

        if let Some(state) = xxh {
            hash = state.digest();
        }
        Ok(hash)
    }
}

/// Compute and store the partial hash if the record doesn't have one yet.
pub fn ensure_partial_hash(engine: &mut HashEngine, rec: &mut FileRecord) -> Result<(), FileError> {
    if rec.partial_valid {
        return Ok(());
    }
    rec.partial_hash = engine.hash_file(rec, PARTIAL_HASH_SIZE)?;
    rec.partial_valid = true;
    Ok(())
}

/// Compute and store the full hash if the record doesn't have one yet.
pub fn ensure_full_hash(engine: &mut HashEngine, rec: &mut FileRecord) -> Result<(), FileError> {
    if rec.full_valid {
        return Ok(());
    }
    rec.full_hash = engine.hash_file(rec, 0)?;
    rec.full_valid = true;
    Ok(())
}
