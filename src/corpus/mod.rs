//! Corpus sources: discovery and text extraction.
//!
//! - [`enumerate`] lists eligible files under a root in lexicographic order
//! - [`extract`] turns one source into its textual payload

pub mod extract;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::SetupError;

pub use extract::{extract_structured, extract_text};

/// How a source's text is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    /// `.txt`: raw UTF-8 content
    PlainText,
    /// `.json`: `body[*].text` of a structured record
    StructuredRecord,
}

impl SourceKind {
    /// Classify by extension (case-insensitive).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" => Some(Self::PlainText),
            "json" => Some(Self::StructuredRecord),
            _ => None,
        }
    }
}

/// An input file awaiting consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub kind: SourceKind,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Build from a path, if the extension is recognized.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let kind = SourceKind::from_path(&path)?;
        Some(Self { path, kind })
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// List every eligible file under `root`, sorted by path.
///
/// `exclude` is skipped even when its extension matches; the CLI passes the
/// final output path so a previous run's result is never consumed. Paths are
/// compared after resolving, so `./out.txt` and `/abs/dir/out.txt` name the
/// same file.
pub fn enumerate(root: &Path, exclude: Option<&Path>) -> Result<Vec<SourceFile>, SetupError> {
    if !root.exists() {
        return Err(SetupError::RootMissing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(SetupError::NotADirectory(root.to_path_buf()));
    }

    let excluded = exclude.and_then(resolve);
    let mut sources = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| SetupError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if excluded
            .as_deref()
            .is_some_and(|excluded| is_same_file(entry.path(), excluded))
        {
            continue;
        }
        if let Some(source) = SourceFile::from_path(entry.path()) {
            sources.push(source);
        }
    }

    if sources.is_empty() {
        return Err(SetupError::NoSources(root.to_path_buf()));
    }

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!("Found {} sources under {}", sources.len(), root.display());
    Ok(sources)
}

/// Absolute, symlink-free form of `path`. A file that does not exist yet is
/// resolved through its parent directory.
fn resolve(path: &Path) -> Option<PathBuf> {
    if let Ok(resolved) = fs::canonicalize(path) {
        return Some(resolved);
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Some(fs::canonicalize(parent).ok()?.join(path.file_name()?))
}

fn is_same_file(candidate: &Path, resolved: &Path) -> bool {
    // Cheap name check before touching the filesystem
    if candidate.file_name() != resolved.file_name() {
        return false;
    }
    fs::canonicalize(candidate).is_ok_and(|path| path == resolved)
}

/// Counts shown before the confirmation gate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSummary {
    pub total: usize,
    pub plain_text: usize,
    pub structured: usize,
    /// Folder (relative to the root) -> number of sources in it
    pub folders: BTreeMap<PathBuf, usize>,
}

impl SourceSummary {
    pub fn new(root: &Path, sources: &[SourceFile]) -> Self {
        let mut summary = Self {
            total: sources.len(),
            ..Self::default()
        };
        for source in sources {
            match source.kind {
                SourceKind::PlainText => summary.plain_text += 1,
                SourceKind::StructuredRecord => summary.structured += 1,
            }
            let parent = source.path.parent().unwrap_or(root);
            let relative = parent.strip_prefix(root).unwrap_or(parent).to_path_buf();
            *summary.folders.entry(relative).or_insert(0) += 1;
        }
        summary
    }
}
