//! Scoped sessions against the external slicing/mining engine.
//!
//! The engine is a child process speaking line-delimited JSON: one request
//! object on stdin, one pattern object per stdout line, response terminated
//! by a blank line. Premature EOF means the engine died mid-response.
//!
//! [`SlicerSession`] owns the child for its whole lifetime. [`close`] ends
//! the session exactly once; a session dropped without `close` (early
//! return, `?`, panic unwinding) is killed and reaped in `Drop`, so no
//! engine process outlives the pipeline that started it.
//!
//! [`close`]: SlicerSession::close

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::Subject;
use crate::errors::MineError;
use crate::pipeline::PipelineRequest;

/// An opaque mined subgraph, passed through to rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    /// Number of call sites the pattern was observed at.
    pub sites: u64,
    /// Engine-reported support, uninterpreted by the orchestrator.
    pub support: String,
    /// Graph file the engine wrote for this pattern.
    pub graph: PathBuf,
}

#[derive(Serialize)]
struct MineRequest<'a> {
    subject: &'a str,
    base_dir: &'a Path,
    classpath: &'a str,
    class_dirs: &'a [PathBuf],
    output_dir: &'a Path,
    minimum_sites: u64,
    min_support: &'a str,
    args: &'a [String],
}

/// A live connection to the mining engine.
#[derive(Debug)]
pub struct SlicerSession {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
}

impl SlicerSession {
    /// Start the engine process. Failure to spawn is fatal to the
    /// enclosing command and leaves nothing behind to clean up.
    pub fn open(program: &Path, show_logs: bool) -> Result<Self, MineError> {
        let stderr = if show_logs {
            Stdio::inherit()
        } else {
            Stdio::null()
        };
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .spawn()
            .map_err(|source| MineError::SlicerStart {
                program: program.to_path_buf(),
                source,
            })?;
        log::debug!("slicer started: {}", program.display());
        let stdin = child.stdin.take();
        let stdout = child.stdout.take().map(BufReader::new);
        Ok(Self {
            child: Some(child),
            stdin,
            stdout,
        })
    }

    /// Submit one mining request and collect every candidate pattern the
    /// engine reports. Thresholds travel with the request; filtering by
    /// site count is the caller's job.
    pub fn mine(
        &mut self,
        subject: &Subject,
        request: &PipelineRequest,
    ) -> Result<Vec<Pattern>, MineError> {
        self.exchange(subject, request)
            .map_err(|e| MineError::Slicer(format!("{e:#}")))
    }

    fn exchange(
        &mut self,
        subject: &Subject,
        request: &PipelineRequest,
    ) -> anyhow::Result<Vec<Pattern>> {
        let wire = MineRequest {
            subject: &subject.name,
            base_dir: &subject.base_dir,
            classpath: &subject.classpath,
            class_dirs: &subject.class_dirs,
            output_dir: &request.output_dir,
            minimum_sites: request.minimum_sites,
            min_support: &request.pattern_min_support,
            args: &request.extra_args,
        };
        let line = serde_json::to_string(&wire).context("failed to encode mine request")?;

        let stdin = self.stdin.as_mut().context("session already closed")?;
        stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush())
            .context("failed to send mine request")?;

        let stdout = self.stdout.as_mut().context("session already closed")?;
        let mut patterns = Vec::new();
        loop {
            let mut line = String::new();
            let read = stdout
                .read_line(&mut line)
                .context("failed to read from engine")?;
            if read == 0 {
                anyhow::bail!("engine closed the stream before finishing its response");
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            let pattern: Pattern = serde_json::from_str(line)
                .with_context(|| format!("engine sent a malformed pattern line: {line}"))?;
            patterns.push(pattern);
        }
        log::debug!("engine reported {} candidate pattern(s)", patterns.len());
        Ok(patterns)
    }

    /// End the session: signal EOF on the engine's stdin and reap it.
    /// Calling `close` on an already-closed session is a no-op.
    pub fn close(&mut self) -> Result<(), MineError> {
        drop(self.stdin.take());
        drop(self.stdout.take());
        if let Some(mut child) = self.child.take() {
            let status = child
                .wait()
                .map_err(|e| MineError::Slicer(format!("failed to reap engine: {e}")))?;
            log::debug!("slicer exited: {status}");
        }
        Ok(())
    }
}

impl Drop for SlicerSession {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> Subject {
        Subject {
            name: "demo".into(),
            base_dir: "/src/demo".into(),
            classpath: "/src/demo/classes".into(),
            lib_dirs: vec![],
            class_dirs: vec!["/src/demo/classes".into()],
            target: "/tmp/demo".into(),
        }
    }

    fn request(dir: &Path) -> PipelineRequest {
        PipelineRequest {
            output_dir: dir.to_path_buf(),
            minimum_sites: 1,
            pattern_min_support: "50%".into(),
            no_build: true,
            show_logs: false,
            extra_args: vec![],
        }
    }

    #[cfg(unix)]
    fn fake_engine(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("slicer.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn missing_engine_is_a_start_error() {
        let err = SlicerSession::open(Path::new("/nonexistent/slicer"), false).unwrap_err();
        match err {
            MineError::SlicerStart { program, .. } => {
                assert_eq!(program, PathBuf::from("/nonexistent/slicer"));
            }
            other => panic!("expected SlicerStart, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn mine_collects_patterns_until_blank_line() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(
            dir.path(),
            concat!(
                "read line\n",
                r#"printf '{"id":"p1","sites":2,"support":"66%%","graph":"/tmp/p1.dot"}\n'"#,
                "\n",
                r#"printf '{"id":"p2","sites":5,"support":"80%%","graph":"/tmp/p2.dot"}\n'"#,
                "\n",
                "printf '\\n'",
            ),
        );

        let mut session = SlicerSession::open(&engine, false).unwrap();
        let patterns = session.mine(&subject(), &request(dir.path())).unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[0].id, "p1");
        assert_eq!(patterns[1].sites, 5);
        session.close().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn engine_dying_mid_response_is_an_error_and_still_reaps() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "read line\nexit 7");

        let mut session = SlicerSession::open(&engine, false).unwrap();
        let err = session.mine(&subject(), &request(dir.path())).unwrap_err();
        match err {
            MineError::Slicer(message) => assert!(message.contains("before finishing")),
            other => panic!("expected Slicer, got {other:?}"),
        }
        // teardown still works exactly once after the failure
        session.close().unwrap();
        session.close().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn malformed_pattern_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(
            dir.path(),
            "read line\nprintf 'this is not json\\n'\nprintf '\\n'",
        );

        let mut session = SlicerSession::open(&engine, false).unwrap();
        let err = session.mine(&subject(), &request(dir.path())).unwrap_err();
        assert!(matches!(err, MineError::Slicer(_)));
    }

    #[cfg(unix)]
    #[test]
    fn double_close_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "cat > /dev/null");

        let mut session = SlicerSession::open(&engine, false).unwrap();
        session.close().unwrap();
        session.close().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn drop_without_close_reaps_the_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "sleep 30");

        let session = SlicerSession::open(&engine, false).unwrap();
        // no close: Drop must kill and reap rather than leak the child
        drop(session);
    }
}
