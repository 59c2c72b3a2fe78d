//! Shared error types for the orchestrator

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Process exit statuses, one per fatal error class.
///
/// The numeric values are not a published contract beyond being stable and
/// distinct from each other, so scripts can tell a config problem from a
/// failed tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Usage,
    Version,
    Option,
    Config,
    Tool,
    Slicer,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Usage => 1,
            ExitStatus::Version => 2,
            ExitStatus::Option => 3,
            ExitStatus::Config => 4,
            ExitStatus::Tool => 5,
            ExitStatus::Slicer => 6,
        }
    }
}

/// A non-fatal problem encountered while loading one configuration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Main error type for mine operations
#[derive(Debug, Error)]
pub enum MineError {
    /// Every configuration source that was present failed to load
    #[error("no usable configuration source")]
    ConfigLoad { errors: Vec<SourceError> },

    /// No subject name was supplied on the command line
    #[error("no subject given")]
    MissingSubject { known: Vec<String> },

    /// The requested subject is not defined in any configuration source
    #[error("unknown subject `{name}`")]
    UnknownSubject { name: String, known: Vec<String> },

    /// No subcommand was supplied on the command line
    #[error("no command given")]
    MissingCommand { known: Vec<String> },

    /// The requested subcommand is not registered
    #[error("unknown command `{name}`")]
    UnknownCommand { name: String, known: Vec<String> },

    /// Help was requested, or subcommand options failed to parse.
    /// `text` is the fully rendered clap output.
    #[error("{text}")]
    Usage { text: String, is_help: bool },

    /// A path that must be a directory exists as something else
    #[error("output path `{}` exists and is not a directory", .path.display())]
    OutputPathConflict { path: PathBuf },

    /// The output directory could not be cleared or created
    #[error("cannot prepare output directory `{}`", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external build or run step exited non-zero
    #[error("{desc}: {status}")]
    ToolFailed {
        desc: String,
        status: String,
        output: String,
    },

    /// An external tool could not be spawned at all
    #[error("failed to run {desc}")]
    ToolSpawn {
        desc: String,
        #[source]
        source: std::io::Error,
    },

    /// The slicing engine could not be started
    #[error("failed to start slicer `{}`", .program.display())]
    SlicerStart {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The slicing engine misbehaved mid-session
    #[error("slicer session failed: {0}")]
    Slicer(String),
}

impl MineError {
    /// The process exit status this error maps to.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            MineError::ConfigLoad { .. } => ExitStatus::Config,
            MineError::MissingSubject { .. }
            | MineError::UnknownSubject { .. }
            | MineError::MissingCommand { .. }
            | MineError::UnknownCommand { .. }
            | MineError::OutputPathConflict { .. }
            | MineError::OutputDir { .. } => ExitStatus::Option,
            MineError::Usage { .. } => ExitStatus::Usage,
            MineError::ToolFailed { .. } | MineError::ToolSpawn { .. } => ExitStatus::Tool,
            MineError::SlicerStart { .. } | MineError::Slicer(_) => ExitStatus::Slicer,
        }
    }
}
