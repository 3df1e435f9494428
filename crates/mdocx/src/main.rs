//! mdocx CLI - Markdown to DOCX converter.
//!
//! Converts a Markdown document to DOCX, rendering embedded Mermaid
//! diagrams to images via the local Mermaid CLI or a remote rendering
//! service with configurable fallback.

mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::ConvertArgs;
use output::Output;

/// mdocx - Markdown to DOCX converter.
#[derive(Parser)]
#[command(name = "mdocx", version, about)]
struct Cli {
    #[command(flatten)]
    convert: ConvertArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.convert.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = cli.convert.execute(&output) {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
