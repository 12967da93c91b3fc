//! Corpus Clean - streaming corpus hygiene.
//!
//! Combines a tree of `.txt` and `.json` corpus files into one stream,
//! strips everything but letters, whitespace and `.,!?`, drops degenerate
//! and duplicate lines, and writes a single cleaned file. Sources are
//! deleted as they are consumed; memory stays bounded by the read chunk
//! size plus the set of kept lines.

pub mod config;
pub mod corpus;
pub mod error;
pub mod pipeline;
pub mod progress;

pub use config::Config;
pub use corpus::{enumerate, SourceFile, SourceKind, SourceSummary};
pub use error::{ExtractError, PipelineError, SetupError};
pub use pipeline::{Pipeline, RunStats};
