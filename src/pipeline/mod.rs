//! Streaming corpus cleaning pipeline.
//!
//! Three stages run strictly one after another:
//!
//! ```text
//! sources --combine--> combined.txt --clean--> cleaned.txt --filter--> output
//! ```
//!
//! Each stage drains its input completely before the next one opens it, and
//! each intermediate file is deleted as soon as it has been consumed. Peak
//! disk use is about twice the combined text; peak memory is one read buffer
//! plus the line filter's record of kept lines.
//!
//! # Module Structure
//!
//! - [`combine`] - concatenation with delete-after-write
//! - [`sanitize`] - character-level cleaning
//! - [`filter`] - line-level filtering and deduplication
//! - [`dedup`] - kept-line memory strategies
//! - [`stats`] - run counters

pub mod combine;
pub mod dedup;
pub mod filter;
pub mod sanitize;
pub mod stats;

use std::fs;
use std::path::Path;
use std::time::Instant;

pub use combine::Combiner;
pub use dedup::{seen_lines, ExactLines, HashedLines, SeenLines};
pub use filter::{LineFilter, LineVerdict};
pub use sanitize::Sanitizer;
pub use stats::{CombineStats, FilterStats, RunStats, SanitizeStats};

use crate::config::Config;
use crate::corpus::SourceFile;
use crate::error::{PipelineError, PipelineResult};
use crate::progress::{ProgressReporter, Stage};

/// Name of the combiner's output inside the temporary workspace.
const COMBINED_FILE: &str = "temp_combined.txt";
/// Name of the sanitizer's output inside the temporary workspace.
const CLEANED_FILE: &str = "temp_cleaned.txt";

/// Runs combine, clean and filter over a list of sources.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    sanitizer: Sanitizer,
}

impl Pipeline {
    /// Build a pipeline. Fails only if the metadata lexicon cannot be
    /// compiled.
    pub fn new(config: Config) -> Result<Self, regex::Error> {
        let sanitizer = Sanitizer::new(&config.sanitize)?;
        Ok(Self { config, sanitizer })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage, writing the result to `output`.
    ///
    /// Sources are deleted as they are consumed. A fatal error leaves
    /// already-deleted sources deleted.
    pub fn run(
        &self,
        sources: &[SourceFile],
        output: &Path,
        reporter: &mut dyn ProgressReporter,
    ) -> PipelineResult<RunStats> {
        let started = Instant::now();
        let workspace = tempfile::Builder::new()
            .prefix("corpus-clean-")
            .tempdir()
            .map_err(PipelineError::TempDir)?;
        let combined = workspace.path().join(COMBINED_FILE);
        let cleaned = workspace.path().join(CLEANED_FILE);
        let chunk_size = self.config.io.chunk_size;

        tracing::debug!("Using workspace {}", workspace.path().display());

        let combine = Combiner::new(chunk_size).run(sources, &combined, reporter)?;

        let sanitize = self
            .sanitizer
            .run(&combined, &cleaned, chunk_size, reporter)?;
        remove_intermediate(Stage::Clean, &combined)?;

        let filter = LineFilter::new(&self.config.filter).run(&cleaned, output, reporter)?;
        remove_intermediate(Stage::Filter, &cleaned)?;

        let output_bytes = fs::metadata(output)
            .map_err(|e| PipelineError::io(Stage::Filter, output, e))?
            .len();

        workspace.close().map_err(PipelineError::TempDir)?;

        Ok(RunStats {
            combine,
            sanitize,
            filter,
            output_bytes,
            elapsed: started.elapsed(),
        })
    }
}

fn remove_intermediate(stage: Stage, path: &Path) -> PipelineResult<()> {
    fs::remove_file(path).map_err(|e| PipelineError::io(stage, path, e))
}
