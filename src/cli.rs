//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use crate::backends::doctor::run_doctor;
use crate::core::config::Config;
use crate::core::error::ServiceError;
use crate::core::render::{OutputFormat, RenderConfig, Renderer};
use crate::flows::auth::AllowList;
use crate::flows::service::{RipgrepBackend, SearchQuery, SearchService};

/// Exit code for failures that are not service errors
const EXIT_FAILURE: i32 = 1;

/// rgview - bounded ripgrep search over one directory tree.
#[derive(Parser, Debug)]
#[command(name = "rgview")]
#[command(
    author,
    version,
    about,
    long_about = r#"rgview runs ripgrep over a single root directory with a hard time budget
and a cap on the number of matches, and prints the results grouped by file.

A search always returns what was found before a limit was hit; the summary
says which limit (if any) cut it short.

Output formats:
- jsonl: one JSON object per file group, then a summary line (default)
- json: the whole report as one JSON object
- md: human-friendly Markdown with aligned line numbers
- raw: grep-style path:line:text (colored on terminals)

Examples:
    rgview --root ~/src/app search "TODO|FIXME"
    rgview --root ~/src/app search -i -g '*.rs' -C 2 unwrap
    rgview --root ~/src/app search -F -- '--verbose'
    rgview --root ~/src/app view src/main.rs --format md
    rgview --root ~/src/app doctor
"#
)]
pub struct Cli {
    /// Root directory that is searched and viewed.
    #[arg(
        long,
        global = true,
        env = "RGVIEW_ROOT",
        value_name = "ROOT",
        long_help = "Root directory that is searched and viewed. Required by search and view.\n\n\
All paths in results are relative to this root, and view refuses any path that\n\
resolves outside of it (including through symlinks)."
    )]
    pub root: Option<PathBuf>,

    /// Wall-clock budget for one search, in seconds.
    #[arg(
        long,
        global = true,
        env = "RGVIEW_TIME_LIMIT",
        default_value = "1.0",
        value_name = "SECONDS",
        value_parser = parse_time_limit,
        long_help = "Wall-clock budget for one search, in seconds (fractions allowed).\n\n\
When it runs out the search process is stopped and the results collected so far\n\
are returned with truncated_by_time set."
    )]
    pub time_limit: Duration,

    /// Maximum number of matches per search.
    #[arg(
        long,
        global = true,
        env = "RGVIEW_MAX_RESULTS",
        default_value = "2000",
        value_name = "N",
        value_parser = parse_max_results,
        long_help = "Maximum number of matching lines per search (at least 1).\n\n\
Context lines do not count. When more matches exist the search is stopped and\n\
truncated_by_count is set."
    )]
    pub max_results: usize,

    /// ripgrep executable to run.
    #[arg(
        long,
        global = true,
        env = "RGVIEW_RG",
        default_value = "rg",
        value_name = "PATH",
        long_help = "ripgrep executable to run: a name looked up on PATH, or a path to a binary."
    )]
    pub rg_path: PathBuf,

    /// Identity of the caller, checked against --allow-actor.
    #[arg(long, global = true, env = "RGVIEW_ACTOR", value_name = "NAME")]
    pub actor: Option<String>,

    /// Actors allowed to search and view (comma-separated).
    #[arg(
        long,
        global = true,
        env = "RGVIEW_ALLOWED_ACTORS",
        value_name = "NAMES",
        value_delimiter = ',',
        long_help = "Actors allowed to search and view, comma-separated or repeated.\n\n\
When empty, everyone is allowed. Otherwise --actor must name one of them."
    )]
    pub allow_actor: Vec<String>,

    /// Output format (jsonl/json/md/raw).
    #[arg(
        long,
        global = true,
        default_value = "jsonl",
        value_name = "FORMAT",
        long_help = "Select the output format.\n\n\
Supported values:\n\
- jsonl (default)\n\
- json\n\
- md (markdown)\n\
- raw\n\n\
Tip: Prefer jsonl when you want stable, line-oriented output for piping."
    )]
    pub format: String,

    /// Disable colored output (when applicable).
    #[arg(
        long,
        global = true,
        long_help = "Disable colored output. This is useful when piping to files or when your\n\
terminal does not support ANSI colors."
    )]
    pub no_color: bool,

    /// Quiet mode (errors only on stderr).
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable debug diagnostics on stderr, including the search process's own\n\
stderr output. RUST_LOG overrides this."
    )]
    pub verbose: bool,

    /// Pretty-print JSON/JSONL output with indentation.
    #[arg(
        long,
        global = true,
        long_help = "Pretty-print JSON and JSONL output with indentation for human readability.\n\n\
Has no effect on md/raw formats."
    )]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the root for PATTERN.
    #[command(
        long_about = "Run ripgrep for PATTERN under ROOT within the configured time budget and\n\
match cap, and print the matches grouped by file in the order ripgrep found them.\n\n\
A blank PATTERN prints an empty report without running ripgrep.\n\
Put PATTERN after `--` when it starts with a dash.\n\n\
Examples:\n\
  rgview search 'fn main'\n\
  rgview search -i -g '*.md' -g '!vendor/**' readme\n\
  rgview search -- -foo\n"
    )]
    Search {
        /// Regular expression (or literal with -F) to search for.
        #[arg(value_name = "PATTERN")]
        pattern: Option<String>,

        /// Match case-insensitively.
        #[arg(short = 'i', long)]
        ignore_case: bool,

        /// Treat PATTERN as a literal string.
        #[arg(short = 'F', long)]
        literal: bool,

        /// Include/exclude glob (repeatable; prefix with ! to exclude).
        #[arg(
            short,
            long,
            value_name = "GLOB",
            long_help = "Only search files matching GLOB; prefix with ! to exclude instead.\n\n\
May be given several times. Globs apply in the order given, later ones taking precedence."
        )]
        glob: Vec<String>,

        /// Lines of context around each match.
        #[arg(short = 'C', long, default_value = "0", value_name = "N")]
        context: usize,
    },

    /// Print a file under the root with line numbers.
    #[command(
        long_about = "Print the file at PATH (relative to ROOT) as numbered lines.\n\n\
Paths that resolve outside ROOT are refused, directories and missing files are\n\
reported as not found, and invalid UTF-8 is replaced.\n\n\
Example:\n\
  rgview view src/lib.rs --format md\n"
    )]
    View {
        /// File path relative to ROOT.
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Check ripgrep availability and the root configuration.
    Doctor,
}

fn parse_time_limit(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid number of seconds: {}", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("time limit must be a positive number of seconds: {}", s));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

fn parse_max_results(s: &str) -> Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid count: {}", s))?;
    if n == 0 {
        return Err("max results must be at least 1".to_string());
    }
    Ok(n)
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            root: self
                .root
                .as_ref()
                .map(|r| r.canonicalize().unwrap_or_else(|_| r.clone())),
            time_limit: self.time_limit,
            max_results: self.max_results,
            rg_program: self.rg_path.clone(),
            ..Default::default()
        }
    }

    fn render_config(&self) -> RenderConfig {
        let format: OutputFormat = self.format.parse().unwrap_or_default();
        if self.no_color {
            colored::control::set_override(false);
        }
        RenderConfig::new(format)
            .with_pretty(self.pretty)
            .with_color(!self.no_color && format == OutputFormat::Raw)
    }
}

/// Exit code for an error returned by [`run`]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<ServiceError>() {
        Some(service_err) => {
            debug!("request failed with status {}", service_err.status());
            service_err.exit_code()
        }
        None => EXIT_FAILURE,
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let render_config = cli.render_config();
    let renderer = Renderer::with_config(render_config);
    let config = cli.config();
    debug!("configuration: {:?}", config);

    let Cli {
        actor,
        allow_actor,
        command,
        ..
    } = cli;

    let service = SearchService::new(
        config.clone(),
        RipgrepBackend::from_config(&config),
        AllowList::new(allow_actor),
    );
    let stdout = io::stdout();

    match command {
        Commands::Search {
            pattern,
            ignore_case,
            literal,
            glob,
            context,
        } => {
            let query = SearchQuery {
                pattern,
                ignore: ignore_case,
                literal,
                glob,
                context,
            };

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to start async runtime")?;
            let report = runtime.block_on(service.search(actor.as_deref(), &query))?;

            renderer.write_report(&report, stdout.lock())?;
        }

        Commands::View { path } => {
            let view = service.view(actor.as_deref(), &path)?;
            renderer.write_view(&view, stdout.lock())?;
        }

        Commands::Doctor => run_doctor(&config, render_config)?,
    }

    stdout.lock().flush()?;
    Ok(())
}
