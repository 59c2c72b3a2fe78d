//! Supervision of external build and extraction tools.
//!
//! Every invocation is a blocking call: the child runs to completion before
//! the orchestrator proceeds. Output handling follows the caller's
//! verbosity choice, with one exception: when a child fails, its captured
//! output is always surfaced in the error, suppression or not.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::Subject;
use crate::errors::MineError;

/// Runs external build and extraction steps as supervised child processes.
pub struct ToolInvoker {
    show_logs: bool,
}

impl ToolInvoker {
    pub fn new(show_logs: bool) -> Self {
        Self { show_logs }
    }

    /// Run a build step to completion.
    pub fn build(&self, desc: &str, cmd: &mut Command) -> Result<(), MineError> {
        log::info!("building {desc}");
        self.run(desc, cmd)
    }

    /// Run `cmd` to completion. When logs are shown the child inherits the
    /// parent's standard streams; otherwise output is captured in memory
    /// and discarded unless the child fails.
    pub fn run(&self, desc: &str, cmd: &mut Command) -> Result<(), MineError> {
        log::debug!("running {desc}: {cmd:?}");
        if self.show_logs {
            let status = cmd.status().map_err(|source| MineError::ToolSpawn {
                desc: desc.to_string(),
                source,
            })?;
            if !status.success() {
                return Err(MineError::ToolFailed {
                    desc: desc.to_string(),
                    status: status.to_string(),
                    output: String::new(),
                });
            }
        } else {
            let output = cmd
                .stdin(Stdio::null())
                .output()
                .map_err(|source| MineError::ToolSpawn {
                    desc: desc.to_string(),
                    source,
                })?;
            if !output.status.success() {
                let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
                captured.push_str(&String::from_utf8_lossy(&output.stderr));
                return Err(MineError::ToolFailed {
                    desc: desc.to_string(),
                    status: output.status.to_string(),
                    output: captured,
                });
            }
        }
        Ok(())
    }
}

/// Root of the extraction toolchain: `$JPDG_HOME`, or `~/jpdg` when unset.
pub fn jpdg_home() -> PathBuf {
    match std::env::var_os("JPDG_HOME") {
        Some(home) => PathBuf::from(home),
        None => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jpdg"),
    }
}

/// The slicing/mining engine executable inside the toolchain.
pub fn slicer_program(home: &Path) -> PathBuf {
    home.join("bin").join("slicer")
}

/// Build the toolchain jars in place.
pub fn build_toolchain_cmd(home: &Path) -> Command {
    let gradle = which::which("gradle").unwrap_or_else(|_| PathBuf::from("gradle"));
    let mut cmd = Command::new(gradle);
    cmd.arg("jar").current_dir(home);
    cmd
}

/// Run the extraction tool against `subject`, writing the serialized
/// dependence graph to `output`.
pub fn extract_cmd(home: &Path, subject: &Subject, output: &Path) -> Command {
    let java = which::which("java").unwrap_or_else(|_| PathBuf::from("java"));
    let mut cmd = Command::new(java);
    cmd.arg("-jar")
        .arg(home.join("build").join("jpdg.jar"))
        .arg("-c")
        .arg(&subject.classpath);
    for dir in &subject.lib_dirs {
        cmd.arg("-l").arg(dir);
    }
    for dir in &subject.class_dirs {
        cmd.arg("-d").arg(dir);
    }
    cmd.arg("-o").arg(output).current_dir(&subject.base_dir);
    cmd
}
