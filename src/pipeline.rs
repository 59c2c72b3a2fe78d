//! The patterns workflow: validate output, build, mine, render.
//!
//! Stages run strictly in order and block to completion. Stages 1-4 fail
//! closed; the rendering fan-out fails open per pattern. The slicer session
//! opened in stage 3 is torn down on every exit path, normal or not.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{ConfigSet, Subject};
use crate::errors::MineError;
use crate::invoke::{self, ToolInvoker};
use crate::render;
use crate::slicer::{Pattern, SlicerSession};

/// Options for one run of the patterns workflow. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub output_dir: PathBuf,
    /// Discard candidates observed at fewer call sites than this.
    pub minimum_sites: u64,
    /// Opaque percentage string handed to the mining engine unparsed.
    pub pattern_min_support: String,
    pub no_build: bool,
    pub show_logs: bool,
    /// Pass-through arguments for the mining stage.
    pub extra_args: Vec<String>,
}

/// Run the full patterns workflow for `subject`, returning the patterns
/// retained after the `minimum_sites` filter (rendered, or skipped with a
/// logged warning).
pub fn run(
    _conf: &ConfigSet,
    subject_name: &str,
    subject: &Subject,
    request: &PipelineRequest,
) -> Result<Vec<Pattern>, MineError> {
    // Stage 1: the output directory must exist, empty, before anything is
    // spawned.
    prepare_output_dir(&request.output_dir)?;

    let home = invoke::jpdg_home();
    let invoker = ToolInvoker::new(request.show_logs);

    // Stage 2
    if request.no_build {
        log::info!("skipping slicer build (--no-build)");
    } else {
        invoker.build("slicer toolchain", &mut invoke::build_toolchain_cmd(&home))?;
    }

    // Stages 3-4: session teardown is guaranteed by drop even when mine
    // fails; close() on the success path reaps the engine eagerly.
    let candidates = {
        let mut session = SlicerSession::open(&invoke::slicer_program(&home), request.show_logs)?;
        let candidates = session.mine(subject, request)?;
        session.close()?;
        candidates
    };

    let patterns = filter_by_sites(candidates, request.minimum_sites);
    log::info!(
        "{subject_name}: {} pattern(s) at or above {} call site(s)",
        patterns.len(),
        request.minimum_sites
    );

    // Stage 5: best-effort fan-out
    for pattern in &patterns {
        if let Err(e) = render::render_pattern(pattern, &request.output_dir) {
            log::warn!("failed to render pattern {}: {e:#}", pattern.id);
        }
    }

    Ok(patterns)
}

/// Ensure `dir` exists as a fresh, empty directory. A non-directory at the
/// path is a conflict the user has to resolve; a stale directory is cleared
/// so re-runs leave only current outputs.
pub fn prepare_output_dir(dir: &Path) -> Result<(), MineError> {
    if dir.exists() && !dir.is_dir() {
        return Err(MineError::OutputPathConflict {
            path: dir.to_path_buf(),
        });
    }
    if dir.is_dir() {
        fs::remove_dir_all(dir).map_err(|source| MineError::OutputDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::create_dir_all(dir).map_err(|source| MineError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn filter_by_sites(candidates: Vec<Pattern>, minimum: u64) -> Vec<Pattern> {
    let before = candidates.len();
    let kept: Vec<Pattern> = candidates
        .into_iter()
        .filter(|p| p.sites >= minimum)
        .collect();
    let dropped = before - kept.len();
    if dropped > 0 {
        log::info!("discarded {dropped} candidate(s) below {minimum} call site(s)");
    }
    kept
}
