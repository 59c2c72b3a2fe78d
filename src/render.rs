//! Rendering mined patterns to image artifacts.
//!
//! Rendering is best-effort fan-out: the caller logs a failure and moves on
//! to the next pattern. Nothing here is fatal to the pipeline.

use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

use crate::slicer::Pattern;

/// Render one pattern's graph into `output_dir` as a PNG via graphviz.
pub fn render_pattern(pattern: &Pattern, output_dir: &Path) -> Result<()> {
    let dot = which::which("dot").context("graphviz `dot` not found in PATH")?;
    if !pattern.graph.is_file() {
        bail!("graph file `{}` does not exist", pattern.graph.display());
    }

    let artifact = output_dir.join(format!("{}.png", pattern.id));
    let output = Command::new(dot)
        .arg("-Tpng")
        .arg(&pattern.graph)
        .arg("-o")
        .arg(&artifact)
        .output()
        .context("failed to run dot")?;
    if !output.status.success() {
        bail!(
            "dot exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    log::debug!("rendered {} -> {}", pattern.id, artifact.display());
    Ok(())
}
