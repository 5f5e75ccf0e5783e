//! CLI definition and translation into a validated [`ScanConfig`].

use anyhow::{Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

use crate::engine::filters::{EXT_FILTER_HELP, parse_ext_filter};
use crate::engine::hashing::auto_chunk_size;
use crate::types::{Action, HashAlgorithm, Recursion, ScanConfig, SortOrder};
use crate::utils::config::ChunkConsts;

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OrderArg {
    Name,
    Time,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum AlgoArg {
    Xxhash64,
    Jodyhash64,
}

/// Find and act on duplicate files.
#[derive(Clone, Parser)]
#[command(name = "dupescan", version)]
#[command(about = "Find byte-identical files; print, delete, link, or dedupe them.")]
pub struct Cli {
    /// Recurse into subdirectories of every root.
    #[arg(short = 'r', long)]
    pub recurse: bool,

    /// Recurse only for the roots listed after this option. Must be the last
    /// option before those roots.
    #[arg(short = 'R', long = "recurse-after")]
    pub recurse_after: bool,

    /// Do not cross filesystem boundaries; files on different devices never match.
    #[arg(short = '1', long = "one-file-system")]
    pub one_file_system: bool,

    /// Exclude hidden files and directories.
    #[arg(short = 'A', long = "no-hidden")]
    pub no_hidden: bool,

    /// Treat hard-linked files as duplicates.
    #[arg(short = 'H', long = "hard-links")]
    pub hard_links: bool,

    /// Follow symbolic links and match their targets.
    #[arg(short = 's', long = "follow-symlinks")]
    pub follow_symlinks: bool,

    /// Files reached from the same root argument never match each other.
    #[arg(short = 'I', long)]
    pub isolate: bool,

    /// Files with differing mode/owner/group never match each other.
    #[arg(short = 'p', long)]
    pub permissions: bool,

    /// Include zero-length files.
    #[arg(short = 'z', long = "zero-match")]
    pub zero_match: bool,

    /// Skip the byte-for-byte confirmation; a full hash match is final.
    #[arg(short = 'Q', long)]
    pub quick: bool,

    /// Match on the partial hash alone. Dangerous; must be given twice.
    #[arg(short = 'T', long = "partial-only", action = ArgAction::Count)]
    pub partial_only: u8,

    /// Skip the file-change re-check before destructive actions.
    #[arg(short = 't', long = "no-change-check")]
    pub no_change_check: bool,

    /// Disable the double-traversal guard (dangerous with bind mounts).
    #[arg(short = 'U', long = "no-trav-check")]
    pub no_trav_check: bool,

    /// Reverse the chain sort order.
    #[arg(short = 'i', long)]
    pub reverse: bool,

    /// Chain ordering: by name (natural sort) or by modification time.
    #[arg(short = 'o', long, value_enum, default_value = "name")]
    pub order: OrderArg,

    /// Root argument position takes precedence in chain ordering.
    #[arg(short = 'O', long = "param-order")]
    pub param_order: bool,

    /// Add an extended filter (TAG[:VALUE]); `help` lists them. Repeatable.
    #[arg(short = 'X', long = "ext-filter", value_name = "SPEC")]
    pub ext_filter: Vec<String>,

    /// Enable the persistent hash database; `.` means jdupes_hashdb.txt.
    #[arg(short = 'y', long = "hash-db", value_name = "FILE")]
    pub hash_db: Option<PathBuf>,

    /// Content hash algorithm. The hash database records this choice.
    #[arg(long = "hash-algo", value_enum, default_value = "xxhash64")]
    pub hash_algo: AlgoArg,

    /// Manual I/O chunk size in bytes (multiple of 4096).
    #[arg(short = 'C', long = "chunk-size", value_name = "BYTES")]
    pub chunk_size: Option<usize>,

    // ---- Actions (mutually exclusive) ----
    /// Delete duplicates, prompting for which files to keep.
    #[arg(short = 'd', long)]
    pub delete: bool,

    /// With --delete: keep the first file of each set, no prompt.
    #[arg(short = 'N', long = "no-prompt")]
    pub no_prompt: bool,

    /// Replace duplicates with hard links to the first file.
    #[arg(short = 'L', long = "link-hard")]
    pub link_hard: bool,

    /// Replace duplicates with relative symlinks.
    #[arg(short = 'l', long = "link-soft")]
    pub link_soft: bool,

    /// Ask the kernel to share identical blocks (copy-on-write dedupe).
    #[arg(short = 'B', long)]
    pub dedupe: bool,

    /// Print a summary of duplicate statistics instead of the sets.
    #[arg(short = 'm', long)]
    pub summarize: bool,

    /// Print files that have no duplicates.
    #[arg(short = 'u', long = "print-unique")]
    pub print_unique: bool,

    /// Print match sets as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Exit with status 255 as soon as any duplicate pair is confirmed.
    #[arg(short = 'E', long = "error-on-dupe")]
    pub error_on_dupe: bool,

    // ---- Presentation ----
    /// Show the size of each duplicate set.
    #[arg(short = 'S', long = "size")]
    pub show_size: bool,

    /// Omit the first file of each printed set.
    #[arg(short = 'f', long = "omit-first")]
    pub omit_first: bool,

    /// Separate printed paths with NUL instead of newline.
    #[arg(short = '0', long = "print-null")]
    pub print_null: bool,

    /// Hide the progress indicator.
    #[arg(short = 'q', long = "hide-progress")]
    pub hide_progress: bool,

    /// Soft abort: on interrupt, stop scanning but still run the action on
    /// pairs confirmed so far. SIGUSR1 toggles this at runtime.
    #[arg(short = 'Z', long = "soft-abort")]
    pub soft_abort: bool,

    /// Verbose (debug) logging.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Directories to scan, in order; the order defines each file's root index.
    #[arg(value_name = "DIR", required = true)]
    pub roots: Vec<PathBuf>,
}

/// Locate the `-R` split in the raw argument list: roots at or after the
/// first non-option following the flag are walked recursively, earlier roots
/// are not. The flag must be the last option on the line.
fn recurse_split(raw_args: &[String], root_count: usize) -> Result<usize> {
    let flag_pos = raw_args
        .iter()
        .position(|a| a == "-R" || a == "--recurse-after");
    let Some(pos) = flag_pos else {
        bail!("-R option must be isolated from other options");
    };
    let after = raw_args[pos + 1..]
        .iter()
        .filter(|a| !a.starts_with('-'))
        .count();
    if after == 0 {
        bail!("-R option must be isolated from other options");
    }
    Ok(root_count.saturating_sub(after))
}

/// Validate the parsed CLI and produce the scan configuration plus the root
/// list. `raw_args` is the unparsed argv (used only to locate `-R`).
pub fn build_config(cli: &Cli, raw_args: &[String]) -> Result<(ScanConfig, Vec<PathBuf>)> {
    // Detailed filter help short-circuits everything else.
    if cli.ext_filter.iter().any(|s| s.eq_ignore_ascii_case("help")) {
        println!("{EXT_FILTER_HELP}");
        std::process::exit(0);
    }

    let mut filters = Vec::with_capacity(cli.ext_filter.len());
    for spec in &cli.ext_filter {
        filters.push(parse_ext_filter(spec)?);
    }

    if cli.partial_only == 1 {
        bail!("--partial-only is dangerous and must be specified twice to activate");
    }
    if cli.partial_only >= 2 && cli.quick {
        bail!("--partial-only and --quick are mutually exclusive");
    }
    if cli.recurse && cli.recurse_after {
        bail!("--recurse and --recurse-after cannot be used together");
    }

    let recursion = if cli.recurse_after {
        Recursion::After(recurse_split(raw_args, cli.roots.len())?)
    } else if cli.recurse {
        Recursion::All
    } else {
        Recursion::None
    };

    let mut actions = 0u32;
    let mut action = Action::Print;
    for (set, a) in [
        (cli.delete, Action::Delete),
        (cli.link_hard, Action::LinkHard),
        (cli.link_soft, Action::LinkSoft),
        (cli.dedupe, Action::Dedupe),
        (cli.summarize, Action::Summarize),
        (cli.print_unique, Action::PrintUnique),
        (cli.json, Action::Json),
        (cli.error_on_dupe, Action::ErrorOnDupe),
    ] {
        if set {
            actions += 1;
            action = a;
        }
    }
    if actions > 1 {
        bail!(
            "only one of --delete, --link-hard, --link-soft, --dedupe, --summarize, \
             --print-unique, --json, or --error-on-dupe may be used"
        );
    }

    if let Some(chunk) = cli.chunk_size
        && (chunk < ChunkConsts::MIN || chunk > ChunkConsts::MAX || chunk % 4096 != 0)
    {
        bail!("invalid chunk size: must be a multiple of 4096 between 4K and 256M");
    }

    let cfg = ScanConfig {
        recursion,
        one_filesystem: cli.one_file_system,
        exclude_hidden: cli.no_hidden,
        consider_hardlinks: cli.hard_links,
        follow_symlinks: cli.follow_symlinks,
        isolate: cli.isolate,
        match_permissions: cli.permissions,
        include_empty: cli.zero_match,
        quick: cli.quick,
        partial_only: cli.partial_only >= 2,
        no_change_check: cli.no_change_check,
        no_trav_check: cli.no_trav_check,
        reverse_sort: cli.reverse,
        param_order: cli.param_order,
        order: match cli.order {
            OrderArg::Name => SortOrder::Name,
            OrderArg::Time => SortOrder::Time,
        },
        algorithm: match cli.hash_algo {
            AlgoArg::Xxhash64 => HashAlgorithm::Xxhash64,
            AlgoArg::Jodyhash64 => HashAlgorithm::Jodyhash64,
        },
        chunk_size: auto_chunk_size(cli.chunk_size),
        hash_db: cli.hash_db.clone(),
        filters,
        action,
        no_prompt: cli.no_prompt,
        soft_abort: cli.soft_abort,
        omit_first: cli.omit_first,
        show_size: cli.show_size,
        print_null: cli.print_null,
        hide_progress: cli.hide_progress,
    };

    Ok((cfg, cli.roots.clone()))
}
