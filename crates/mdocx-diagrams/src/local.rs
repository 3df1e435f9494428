//! Local rendering via the Mermaid CLI (`mmdc`).

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::config::{RenderingConfig, StrategyKind};
use crate::error::RenderFailure;
use crate::raster::RenderedImage;
use crate::renderer::DiagramRenderer;

/// Interval between child exit polls while waiting under a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Cap on stderr excerpt length carried in failure details.
const MAX_DETAIL_LEN: usize = 400;

/// Renders diagrams by invoking an external Mermaid CLI process.
///
/// The diagram source is written to a transient `.mmd` file and the CLI is
/// invoked with an output path plus explicit pixel dimensions, matching the
/// `mmdc` contract. Both temp files are removed on every exit path, and a
/// child that exceeds the per-attempt timeout is forcibly killed.
pub struct LocalProcessRenderer;

/// Removes the output file when the render attempt ends, whatever the path.
struct OutputGuard(PathBuf);

impl Drop for OutputGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

impl DiagramRenderer for LocalProcessRenderer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Local
    }

    fn render(
        &self,
        source: &str,
        config: &RenderingConfig,
    ) -> Result<RenderedImage, RenderFailure> {
        // Input file is cleaned up by NamedTempFile's Drop.
        let mut input = tempfile::Builder::new()
            .prefix("mdocx_")
            .suffix(".mmd")
            .tempfile()
            .map_err(|e| RenderFailure::process(format!("cannot create temp file: {e}")))?;
        input
            .write_all(source.as_bytes())
            .map_err(|e| RenderFailure::process(format!("cannot write diagram source: {e}")))?;

        let output = OutputGuard(output_path(source, config));

        let mut child = Command::new(&config.command)
            .arg("-i")
            .arg(input.path())
            .arg("-o")
            .arg(&output.0)
            .args(["-t", "default", "-b", "white"])
            .arg("--width")
            .arg(config.image_width_px.to_string())
            .arg("--height")
            .arg(config.image_height_px.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RenderFailure::process(format!("cannot run '{}': {e}", config.command)))?;

        // Drain stderr concurrently; a child filling the pipe buffer would
        // otherwise never exit and be misreported as a timeout.
        let stderr_pipe = child.stderr.take();
        let stderr_reader = std::thread::spawn(move || {
            let mut stderr = String::new();
            if let Some(mut pipe) = stderr_pipe {
                let _ = pipe.read_to_string(&mut stderr);
            }
            stderr
        });

        let status = wait_with_timeout(&mut child, config.per_strategy_timeout)?;

        if !status.success() {
            let stderr = stderr_reader.join().unwrap_or_default();
            return Err(RenderFailure::process(format!(
                "'{}' exited with {status}: {}",
                config.command,
                truncate(&stderr)
            )));
        }

        let data = std::fs::read(&output.0).map_err(|_| {
            RenderFailure::process(format!("'{}' produced no output file", config.command))
        })?;

        RenderedImage::from_png(data)
    }
}

/// Poll the child until exit or deadline; kill and report timeout on expiry.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, RenderFailure> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(RenderFailure::timeout(format!(
                        "render process killed after {}s",
                        timeout.as_secs_f64()
                    )));
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RenderFailure::process(format!("wait failed: {e}")));
            }
        }
    }
}

fn truncate(s: &str) -> &str {
    let s = s.trim();
    match s.char_indices().nth(MAX_DETAIL_LEN) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Transient output path, unique per render attempt.
///
/// The content hash keeps the filename diagnosable; the process id and
/// attempt counter keep concurrent renders of identical source from
/// sharing a path and deleting each other's output.
fn output_path(source: &str, config: &RenderingConfig) -> PathBuf {
    static ATTEMPT: AtomicU64 = AtomicU64::new(0);
    let nonce = ATTEMPT.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "mdocx_{}_{nonce}_{}.png",
        std::process::id(),
        &content_hash(source, config)[..12]
    ))
}

/// Content hash carried in the transient output filename.
fn content_hash(source: &str, config: &RenderingConfig) -> String {
    let mut hasher = Sha256::new();
    hasher.update(config.image_width_px.to_be_bytes());
    hasher.update(config.image_height_px.to_be_bytes());
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}
