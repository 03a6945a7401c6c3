//! rgview - bounded, streaming ripgrep search over a single directory tree
//!
//! rgview provides:
//! - Time- and count-bounded collection of `rg --json` output
//! - Results grouped by file in discovery order
//! - Path-scoped file viewing confined to the search root
//! - Unified output format (jsonl/json/md/raw)

use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::io::Write;

mod backends;
mod cli;
mod core;
mod flows;

fn setup_logging(cli: &cli::Cli) {
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    };

    let mut builder = Builder::from_env(Env::default().default_filter_or(level.as_str()));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });
    builder.target(Target::Stderr);
    builder.init();
}

fn main() {
    let cli = cli::Cli::parse();
    setup_logging(&cli);

    if let Err(err) = cli::run(cli) {
        eprintln!("Error: {:#}", err);
        std::process::exit(cli::exit_code_for(&err));
    }
}
