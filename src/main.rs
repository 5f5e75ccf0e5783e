//! Dupescan CLI: scan directories for duplicate files and act on them.

use anyhow::Result;
use clap::Parser;
use dupescan::engine::arg_parser::{Cli, build_config};
use dupescan::engine::interrupt::install_handlers;
use dupescan::utils::setup_logging;
use std::time::Instant;

fn run(cli: &Cli, raw_args: &[String]) -> Result<i32> {
    let (cfg, roots) = build_config(cli, raw_args)?;
    install_handlers(cfg.soft_abort)?;
    dupescan::run(&cfg, &roots)
}

fn main() {
    let start_time = Instant::now();
    let raw_args: Vec<String> = std::env::args().collect();
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let code = match run(&cli, &raw_args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            1
        }
    };

    log::debug!("Total time: {:?}", start_time.elapsed());
    std::process::exit(code);
}
