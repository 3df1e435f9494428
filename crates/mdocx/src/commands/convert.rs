//! The convert command: markdown in, DOCX out.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;

use mdocx_config::{CliSettings, Config};
use mdocx_diagrams::{RenderChain, RenderResult};
use mdocx_docx::assemble;
use mdocx_segment::segment;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Input markdown file.
    input: PathBuf,

    /// Output DOCX file.
    output: PathBuf,

    /// Rendering strategies to try, in order (comma-separated: local,remote).
    #[arg(long, value_delimiter = ',')]
    strategy_order: Option<Vec<String>>,

    /// Remote rendering service base URL.
    #[arg(long)]
    service_url: Option<String>,

    /// Mermaid CLI command for local rendering.
    #[arg(long)]
    command: Option<String>,

    /// Per-strategy render timeout in seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Path to a configuration file (default: discover mdocx.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    pub(crate) fn execute(&self, out: &Output) -> Result<(), CliError> {
        let settings = CliSettings {
            strategy_order: self.strategy_order.clone(),
            service_url: self.service_url.clone(),
            command: self.command.clone(),
            timeout_secs: self.timeout_secs,
        };
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        let rendering = config.to_rendering_config();

        let markdown = std::fs::read_to_string(&self.input)?;
        let blocks = segment(&markdown);
        let diagram_count = blocks.iter().filter(|b| b.is_diagram()).count();
        out.info(&format!(
            "Converting {} ({} diagram{})",
            self.input.display(),
            diagram_count,
            if diagram_count == 1 { "" } else { "s" }
        ));

        let chain = RenderChain::from_config(&rendering);
        let results = chain.resolve_all(&blocks, &rendering);

        let failures = failure_lines(&results);
        let failed = failures.len();
        for line in &failures {
            out.warning(line);
        }

        let document = assemble(&blocks, &results, &rendering);
        let bytes = document.to_bytes()?;
        std::fs::write(&self.output, bytes)?;

        if failed > 0 {
            out.warning(&format!(
                "Wrote {} with {failed} of {diagram_count} diagrams as placeholders",
                self.output.display()
            ));
        } else {
            out.success(&format!("Wrote {}", self.output.display()));
        }
        Ok(())
    }
}

/// One warning line per failed diagram, numbered by diagram position in
/// the document rather than by block ordinal.
fn failure_lines(results: &BTreeMap<usize, RenderResult>) -> Vec<String> {
    results
        .values()
        .enumerate()
        .filter_map(|(index, result)| {
            result
                .as_ref()
                .err()
                .map(|failure| format!("Diagram {}: {failure}", index + 1))
        })
        .collect()
}
