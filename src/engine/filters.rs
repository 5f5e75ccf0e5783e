//! Single-file filter gate and the stacked extended filter language
//! (`--ext-filter TAG[:VALUE]`).

use anyhow::{Result, bail};
use std::os::unix::ffi::OsStrExt;

use crate::engine::store::FileRecord;
use crate::types::ScanConfig;
use crate::utils::datetime::parse_datetime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    NoExt,
    OnlyExt,
    SizeEq,
    SizeGt,
    SizeLt,
    SizeGtEq,
    SizeLtEq,
    NoStr,
    OnlyStr,
    Newer,
    Older,
}

/// One entry of the extended filter stack. Filters are cumulative: a file is
/// kept only when no filter excludes it.
#[derive(Clone, Debug)]
pub struct ExtFilter {
    pub kind: FilterKind,
    /// Size threshold or epoch seconds, depending on the tag.
    pub value: i64,
    /// Extension list or path substring, raw bytes.
    pub param: Vec<u8>,
}

pub const EXT_FILTER_HELP: &str = "\
Extended filter options, general format: --ext-filter filter[:value]

noext:ext1[,ext2,...]    Exclude files with certain extension(s)
onlyext:ext1[,ext2,...]  Only include files with certain extension(s)
size[+-=]:size[suffix]   Only include files matching size criteria
                         + larger, - smaller, = equal; specs can be mixed,
                         e.g. size+=:100k includes files of 100 KiB or more
nostr:text_string        Exclude all paths containing the string
onlystr:text_string      Only allow paths containing the string
newer:datetime           Only include files newer than specified date
older:datetime           Only include files older than specified date
                         Date/time format: \"YYYY-MM-DD HH:MM:SS\"
                         (time is optional)

Sizes accept the multipliers K/M/G/T/P/E with or without an added iB or B.
Multipliers are binary-style unless the B suffix is used, which is decimal:
16k or 16kib = 16384; 16kb = 16000. Multipliers are case-insensitive.

Filters have cumulative effects: --ext-filter size+:99 --ext-filter size-:101
will only include files of exactly 100 bytes in size.

Extension matching is case-insensitive.
Path substring matching is case-sensitive.";

/// Parse one integer-with-suffix size spec. Binary multipliers by default;
/// a trailing `B` (without `i`) switches to decimal.
fn parse_size_spec(spec: &str) -> Result<i64> {
    let digits_end = spec
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(spec.len());
    if digits_end == 0 {
        bail!("size filter needs a leading integer: '{spec}'");
    }
    let base: i64 = spec[..digits_end].parse()?;
    let mult: i64 = match spec[digits_end..].to_ascii_lowercase().as_str() {
        "" | "b" => 1,
        "k" | "kib" => 1 << 10,
        "kb" => 1_000,
        "m" | "mib" => 1 << 20,
        "mb" => 1_000_000,
        "g" | "gib" => 1 << 30,
        "gb" => 1_000_000_000,
        "t" | "tib" => 1 << 40,
        "tb" => 1_000_000_000_000,
        "p" | "pib" => 1 << 50,
        "pb" => 1_000_000_000_000_000,
        "e" | "eib" => 1 << 60,
        "eb" => 1_000_000_000_000_000_000,
        other => bail!("invalid size suffix '{other}'; use B or K/M/G/T/P/E[i][B]"),
    };
    Ok(base.saturating_mul(mult))
}

/// Parse one `tag[:value]` spec into a stack entry. Unknown tags, missing
/// values, bad sizes, and bad dates are all fatal configuration errors.
pub fn parse_ext_filter(option: &str) -> Result<ExtFilter> {
    let (tag, value) = match option.split_once(':') {
        Some((t, v)) => (t, v),
        None => (option, ""),
    };

    let kind = match tag {
        "noext" => FilterKind::NoExt,
        "onlyext" => FilterKind::OnlyExt,
        "size=" => FilterKind::SizeEq,
        "size+" => FilterKind::SizeGt,
        "size-" => FilterKind::SizeLt,
        "size+=" => FilterKind::SizeGtEq,
        "size-=" => FilterKind::SizeLtEq,
        "nostr" => FilterKind::NoStr,
        "onlystr" => FilterKind::OnlyStr,
        "newer" => FilterKind::Newer,
        "older" => FilterKind::Older,
        other => bail!("invalid --ext-filter name '{other}'"),
    };

    match kind {
        FilterKind::SizeEq
        | FilterKind::SizeGt
        | FilterKind::SizeLt
        | FilterKind::SizeGtEq
        | FilterKind::SizeLtEq => Ok(ExtFilter {
            kind,
            value: parse_size_spec(value)?,
            param: Vec::new(),
        }),
        FilterKind::Newer | FilterKind::Older => {
            let Some(epoch) = parse_datetime(value) else {
                bail!("invalid --ext-filter date[time] '{value}'");
            };
            Ok(ExtFilter {
                kind,
                value: epoch,
                param: Vec::new(),
            })
        }
        FilterKind::NoExt | FilterKind::OnlyExt => {
            if value.is_empty() {
                bail!("--ext-filter {tag} needs a value: {tag}:ext1[,ext2,...]");
            }
            Ok(ExtFilter {
                kind,
                value: 0,
                param: value.as_bytes().to_vec(),
            })
        }
        FilterKind::NoStr | FilterKind::OnlyStr => Ok(ExtFilter {
            kind,
            value: 0,
            param: value.as_bytes().to_vec(),
        }),
    }
}

/// Does the path's extension (after the final dot of the basename) appear in
/// the comma-separated list? Case-insensitive.
fn match_extensions(path: &[u8], extlist: &[u8]) -> bool {
    let mut dot: Option<usize> = None;
    for (idx, &b) in path.iter().enumerate() {
        if b == b'.' {
            dot = Some(idx);
        }
        if b == b'/' {
            dot = None;
        }
    }
    let Some(d) = dot else { return false };
    let ext = &path[d + 1..];
    if ext.is_empty() {
        return false;
    }
    extlist
        .split(|&b| b == b',')
        .filter(|e| !e.is_empty())
        .any(|e| e.eq_ignore_ascii_case(ext))
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}

/// True when any filter on the stack excludes this (already statted) record.
pub fn exclude_by_filters(rec: &FileRecord, filters: &[ExtFilter]) -> bool {
    let path = rec.path.as_os_str().as_bytes();
    filters.iter().any(|f| match f.kind {
        FilterKind::SizeEq => rec.size != f.value,
        FilterKind::SizeGtEq => rec.size < f.value,
        FilterKind::SizeLtEq => rec.size > f.value,
        FilterKind::SizeGt => rec.size <= f.value,
        FilterKind::SizeLt => rec.size >= f.value,
        FilterKind::NoExt => match_extensions(path, &f.param),
        FilterKind::OnlyExt => !match_extensions(path, &f.param),
        FilterKind::NoStr => contains(path, &f.param),
        FilterKind::OnlyStr => !contains(path, &f.param),
        FilterKind::Newer => rec.mtime < f.value,
        FilterKind::Older => rec.mtime >= f.value,
    })
}

/// Single-file accept/reject gate, run on each record right after allocation.
/// Returns true when the file must be rejected. Evaluation order: hidden,
/// stat failure, file type, empty file, extended filters.
pub fn check_singlefile(rec: &mut FileRecord, cfg: &ScanConfig) -> bool {
    if cfg.exclude_hidden
        && let Some(name) = rec.path.file_name()
    {
        let name = name.as_bytes();
        if name.first() == Some(&b'.') && name != b"." && name != b".." {
            return true;
        }
    }

    if !rec.fill_stats() || rec.size == -1 {
        return true;
    }

    if !rec.is_regular() && !rec.is_dir() {
        return true;
    }

    if !rec.is_dir() {
        if rec.size == 0 && !cfg.include_empty {
            return true;
        }
        if exclude_by_filters(rec, &cfg.filters) {
            return true;
        }
    }

    false
}
