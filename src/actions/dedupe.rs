//! Copy-on-write dedupe: hand each chain to the kernel in bounded slices so
//! identical blocks get shared. Linux-only; elsewhere this degrades to the
//! hard-link action.

use crate::engine::store::FileStore;
use crate::types::ScanConfig;

#[cfg(target_os = "linux")]
mod ioctl {
    // Mirrors struct file_dedupe_range from linux/fs.h for kernels whose
    // headers predate it.
    #[repr(C)]
    pub struct FileDedupeRange {
        pub src_offset: u64,
        pub src_length: u64,
        pub dest_count: u16,
        pub reserved1: u16,
        pub reserved2: u32,
        pub info: [FileDedupeRangeInfo; 1],
    }

    #[repr(C)]
    pub struct FileDedupeRangeInfo {
        pub dest_fd: i64,
        pub dest_offset: u64,
        pub bytes_deduped: u64,
        pub status: i32,
        pub reserved: u32,
    }

    pub const FIDEDUPERANGE: libc::c_ulong = 0xc0189436;
    pub const FILE_DEDUPE_RANGE_SAME: i32 = 0;
    pub const FILE_DEDUPE_RANGE_DIFFERS: i32 = 1;
}

#[cfg(target_os = "linux")]
pub fn dedupe_files(store: &FileStore, cfg: &ScanConfig) {
    use log::warn;
    use std::fs::File;
    use std::os::fd::AsRawFd;

    use crate::utils::config::KERNEL_DEDUPE_MAX;
    use ioctl::*;

    let mut total_files: u64 = 0;

    for head in store.chain_heads() {
        let chain = store.chain_members(head);

        // Open the source; if the head won't open, walk down the chain for a
        // usable one.
        let mut src_idx = 0usize;
        let src = loop {
            match File::open(&store.get(chain[src_idx]).path) {
                Ok(f) => break Some(f),
                Err(_) => {
                    warn!(
                        "dedupe: open failed (skipping): {}",
                        store.get(chain[src_idx]).path.display()
                    );
                    if src_idx + 2 >= chain.len() {
                        break None;
                    }
                    src_idx += 1;
                }
            }
        };
        let Some(src) = src else { continue };
        let src_rec = store.get(chain[src_idx]);
        println!("  [SRC] {}", src_rec.path.display());

        for &dupe_id in chain.iter().skip(src_idx + 1) {
            let dupe = store.get(dupe_id);

            // The kernel rejects dedupe onto the same inode anyway.
            if dupe.device == src_rec.device && dupe.inode == src_rec.inode {
                println!("  -==-> {}", dupe.path.display());
                continue;
            }

            let dest = match File::open(&dupe.path) {
                Ok(f) => f,
                Err(_) => {
                    warn!("dedupe: open failed (skipping): {}", dupe.path.display());
                    continue;
                }
            };

            let mut range = FileDedupeRange {
                src_offset: 0,
                src_length: 0,
                dest_count: 1,
                reserved1: 0,
                reserved2: 0,
                info: [FileDedupeRangeInfo {
                    dest_fd: dest.as_raw_fd() as i64,
                    dest_offset: 0,
                    bytes_deduped: 0,
                    status: FILE_DEDUPE_RANGE_SAME,
                    reserved: 0,
                }],
            };

            // Feed the file to the kernel 16 MiB or less at a time.
            let size = dupe.size.max(0) as u64;
            let mut remain = size;
            let mut errno: i32 = 0;
            while remain > 0 {
                range.src_offset = size - remain;
                range.info[0].dest_offset = range.src_offset;
                range.src_length = remain.min(KERNEL_DEDUPE_MAX);
                let rc = unsafe {
                    libc::ioctl(src.as_raw_fd(), FIDEDUPERANGE, &mut range as *mut _)
                };
                errno = if rc < 0 {
                    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
                } else {
                    0
                };
                if range.info[0].status < 0 || errno != 0 {
                    break;
                }
                remain -= range.src_length;
            }

            let status = range.info[0].status;
            if status != FILE_DEDUPE_RANGE_SAME || errno != 0 {
                println!("  -XX-> {}", dupe.path.display());
                if status == FILE_DEDUPE_RANGE_DIFFERS {
                    warn!("not identical (files modified between scan and dedupe?)");
                } else if status < 0 {
                    warn!("{}", std::io::Error::from_raw_os_error(-status));
                } else if errno != 0 {
                    warn!("{}", std::io::Error::from_raw_os_error(errno));
                }
            } else {
                println!("  ====> {}", dupe.path.display());
                total_files += 1;
            }
        }
        println!();
        total_files += 1;
    }

    if !cfg.hide_progress {
        eprintln!("Deduplication done ({total_files} files processed)");
    }
}

/// No kernel dedupe elsewhere; hard links are the closest equivalent.
#[cfg(not(target_os = "linux"))]
pub fn dedupe_files(store: &FileStore, cfg: &ScanConfig) {
    super::link::link_files(store, cfg, true);
}
