//! Chain ordering: natural (numeric-aware) name sort and the pair
//! comparators that decide which chain member becomes the action source.

use std::os::unix::ffi::OsStrExt;

use crate::engine::store::FileRecord;
use crate::types::{ScanConfig, SortOrder};

/// Natural sort over raw path bytes. Runs of digits compare numerically
/// (longer run of significant digits sorts later, leading zeros break ties
/// via run length); other bytes compare case-insensitively with symbols and
/// spaces (below ASCII `.`) sorting after letters. `direction` is 1 or -1.
pub fn numeric_sort(c1: &[u8], c2: &[u8], direction: i32) -> i32 {
    let mut i = 0usize;
    let mut j = 0usize;
    let mut len1 = 0usize;
    let mut len2 = 0usize;

    while i < c1.len() && j < c2.len() {
        len1 = 0;
        len2 = 0;
        let rewind1 = i;
        let rewind2 = j;

        while i < c1.len() && c1[i] == b'0' {
            len1 += 1;
            i += 1;
        }
        while j < c2.len() && c2[j] == b'0' {
            len2 += 1;
            j += 1;
        }

        let num1 = i < c1.len() && c1[i].is_ascii_digit();
        let num2 = j < c2.len() && c2[j].is_ascii_digit();
        if num1 && num2 {
            let mut precompare = 0;

            while i < c1.len()
                && j < c2.len()
                && c1[i].is_ascii_digit()
                && c2[j].is_ascii_digit()
            {
                if c1[i] < c2[j] {
                    precompare = -direction;
                }
                if c1[i] > c2[j] {
                    precompare = direction;
                }
                len1 += 1;
                len2 += 1;
                i += 1;
                j += 1;

                // Once a difference is known only the run lengths matter.
                if precompare != 0 {
                    while i < c1.len()
                        && j < c2.len()
                        && c1[i].is_ascii_digit()
                        && c2[j].is_ascii_digit()
                    {
                        len1 += 1;
                        len2 += 1;
                        i += 1;
                        j += 1;
                    }
                    break;
                }
            }

            // One run ended first: the longer number is larger.
            let more1 = i < c1.len() && c1[i].is_ascii_digit();
            let more2 = j < c2.len() && c2[j].is_ascii_digit();
            if more1 != more2 {
                return if more1 { direction } else { -direction };
            }
            if precompare != 0 {
                return precompare;
            }
        } else {
            // Zeroes not followed by a digit; rewind and compare as text.
            i = rewind1;
            j = rewind2;
            len1 = 0;
            len2 = 0;
        }

        let a = if i < c1.len() { c1[i] } else { 0 };
        let b = if j < c2.len() { c2[j] } else { 0 };
        if a == b && a != 0 && b != 0 {
            i += 1;
            j += 1;
            len1 += 1;
            len2 += 1;
        } else if b < b'.' && a >= b'.' {
            return -direction;
        } else if a < b'.' && b >= b'.' {
            return direction;
        } else {
            let s1 = a.to_ascii_uppercase();
            let s2 = b.to_ascii_uppercase();
            return if s1 > s2 { direction } else { -direction };
        }
    }

    // A longer final run sorts later (counts leading zeros).
    if len1 < len2 {
        return -direction;
    }
    if len1 > len2 {
        return direction;
    }

    if i >= c1.len() && j < c2.len() {
        return -direction;
    }
    if i < c1.len() && j >= c2.len() {
        return direction;
    }
    0
}

fn direction(cfg: &ScanConfig) -> i32 {
    if cfg.reverse_sort { -1 } else { 1 }
}

fn cmp_by_param_order(f1: &FileRecord, f2: &FileRecord, cfg: &ScanConfig, dir: i32) -> i32 {
    if !cfg.param_order {
        return 0;
    }
    if f1.user_order < f2.user_order {
        return -dir;
    }
    if f1.user_order > f2.user_order {
        return dir;
    }
    0
}

fn cmp_by_filename(f1: &FileRecord, f2: &FileRecord, dir: i32) -> i32 {
    numeric_sort(
        f1.path.as_os_str().as_bytes(),
        f2.path.as_os_str().as_bytes(),
        dir,
    )
}

/// Compare two chain members with the configured comparator. Negative means
/// `f1` belongs before `f2`.
pub fn cmp_pair(f1: &FileRecord, f2: &FileRecord, cfg: &ScanConfig) -> i32 {
    let dir = direction(cfg);
    let po = cmp_by_param_order(f1, f2, cfg, dir);
    if po != 0 {
        return po;
    }
    match cfg.order {
        SortOrder::Name => cmp_by_filename(f1, f2, dir),
        SortOrder::Time => {
            if f1.mtime < f2.mtime {
                -dir
            } else if f1.mtime > f2.mtime {
                dir
            } else {
                // Tie-break equal mtimes by name.
                cmp_by_filename(f1, f2, dir)
            }
        }
    }
}
