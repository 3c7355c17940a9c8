//! servor CLI - HTTPS static file server with live reload.
//!
//! ```text
//! servor [ROOT] [FALLBACK] [PORT] [RELOAD_PORT] [--no-browser] [--no-reload]
//! ```

mod error;
mod network;
mod output;
mod serve;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use output::Output;
use serve::ServeArgs;

/// Default log filter when `RUST_LOG` is unset: request lines are visible.
const DEFAULT_FILTER: &str = "servor=info,servor_server=info";

/// Log filter for `--verbose`.
const VERBOSE_FILTER: &str = "info,servor=debug,servor_server=debug";

/// servor - serve a directory over HTTPS and reload browsers on change.
#[derive(Parser)]
#[command(name = "servor", version, about)]
struct Cli {
    #[command(flatten)]
    serve: ServeArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose wins over RUST_LOG
    let filter = if cli.serve.verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    if let Err(err) = rt.block_on(cli.serve.execute()) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
