//! Error types for corpus cleaning runs.
//!
//! Three tiers, matching how far a failure reaches:
//! - [`ExtractError`] is per-source and never aborts a run.
//! - [`SetupError`] aborts before anything is deleted.
//! - [`PipelineError`] aborts a run that is already under way.

use std::path::PathBuf;

use crate::progress::Stage;

/// Per-source failures. The source is skipped and left on disk.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8 text")]
    Decode { path: PathBuf },

    #[error("Could not parse JSON from {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ExtractError {
    /// Path of the source that failed.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Decode { path } | Self::Malformed { path, .. } => path,
        }
    }
}

/// Failures detected before the first destructive action.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Folder '{0}' does not exist")]
    RootMissing(PathBuf),

    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    #[error("No .txt or .json files found in '{0}' or its subdirectories")]
    NoSources(PathBuf),

    #[error("Could not scan '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Fatal failures during a run. Partial intermediates may remain.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Could not create temporary workspace: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("{stage} failed on {path}: {source}")]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            stage,
            path: path.into(),
            source,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
