//! Byte-for-byte confirmation of candidate pairs. Hashes only filter; two
//! different files can still produce the same signature, so every candidate
//! pair is read in full before it is registered (unless quick mode says
//! otherwise).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::engine::interrupt::interrupted;
use crate::types::FileError;

#[cfg(target_os = "linux")]
fn advise_sequential(file: &File, len: i64) {
    use std::os::fd::AsRawFd;
    unsafe {
        libc::posix_fadvise(file.as_raw_fd(), 0, len, libc::POSIX_FADV_SEQUENTIAL);
        libc::posix_fadvise(file.as_raw_fd(), 0, len, libc::POSIX_FADV_WILLNEED);
    }
}

#[cfg(not(target_os = "linux"))]
fn advise_sequential(_file: &File, _len: i64) {}

/// Parallel chunked reader comparing two files of equal size. Owns two
/// lazily allocated, reused chunk buffers.
pub struct Confirmer {
    chunk_size: usize,
    buf1: Vec<u8>,
    buf2: Vec<u8>,
}

impl Confirmer {
    pub fn new(chunk_size: usize) -> Self {
        Confirmer {
            chunk_size,
            buf1: Vec::new(),
            buf2: Vec::new(),
        }
    }

    /// Read both files in lockstep and compare every chunk. Returns
    /// `Ok(true)` only when all bytes matched; a length mismatch (either
    /// file changed size) or content mismatch returns `Ok(false)`. An
    /// interrupt mid-comparison counts as a mismatch so nothing registers.
    pub fn confirm(&mut self, path1: &Path, path2: &Path, size: i64) -> Result<bool, FileError> {
        if self.buf1.is_empty() {
            self.buf1 = vec![0u8; self.chunk_size];
            self.buf2 = vec![0u8; self.chunk_size];
        }

        let mut f1 = File::open(path1).map_err(|_| FileError::IoFailed)?;
        let mut f2 = File::open(path2).map_err(|_| FileError::IoFailed)?;
        advise_sequential(&f1, size);
        advise_sequential(&f2, size);

        loop {
            if interrupted() {
                return Ok(false);
            }
            let r1 = read_some(&mut f1, &mut self.buf1)?;
            let r2 = read_some(&mut f2, &mut self.buf2)?;
            if r1 != r2 {
                return Ok(false);
            }
            if r1 == 0 {
                return Ok(true);
            }
            if self.buf1[..r1] != self.buf2[..r2] {
                return Ok(false);
            }
        }
    }
}

fn read_some(file: &mut File, buf: &mut [u8]) -> Result<usize, FileError> {
    let mut total = 0;
    while total < buf.len() {
        let n = file.read(&mut buf[total..]).map_err(|_| FileError::IoFailed)?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
