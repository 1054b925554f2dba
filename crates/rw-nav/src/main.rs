//! RW navigation CLI.
//!
//! Provides commands for:
//! - `toc`: Load, expand and restructure a TOC and print the result
//! - `nearest`: Find the TOC owning each content file
//! - `xref`: Resolve uids against the configured xref maps

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{NearestArgs, TocArgs, XRefArgs};
use output::Output;

/// RW navigation - TOC and cross-reference tools.
#[derive(Parser)]
#[command(name = "rw-nav", version, about)]
struct Cli {
    /// Enable verbose output (show timing logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a TOC file and print it.
    Toc(TocArgs),
    /// Find the nearest TOC for content files.
    Nearest(NearestArgs),
    /// Resolve cross-reference uids.
    Xref(XRefArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(cli.verbose, rust_log.as_deref());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Toc(args) => args.execute(),
        Commands::Nearest(args) => args.execute(),
        Commands::Xref(args) => {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
            rt.block_on(args.execute())
        }
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

/// `--verbose` enables INFO level, otherwise use `RUST_LOG` or default to WARN.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("info");
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}
