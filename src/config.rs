//! Run configuration.
//!
//! Every field has a default, so an empty or partial TOML file is valid.
//! Lookup order: an explicit `--config` path, then
//! `<config_dir>/corpus-clean/config.toml`, then built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Default chunk size for streamed reads (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Default name of the final output file.
pub const DEFAULT_OUTPUT_NAME: &str = "combined_cleaned.txt";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub io: IoConfig,
    pub sanitize: SanitizeConfig,
    pub filter: FilterConfig,
}

/// Streaming I/O settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Bytes read per chunk by the combiner and sanitizer.
    pub chunk_size: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Which characters count as letters when filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterSet {
    /// `A-Z` and `a-z` only
    #[default]
    Ascii,
    /// Any Unicode alphabetic character
    Unicode,
}

/// Character sanitizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeConfig {
    /// Literal markers removed as whole words, case-insensitively.
    pub metadata_tokens: Vec<String>,
    /// Letter class kept by the character filter.
    pub letters: LetterSet,
    /// Fold non-ASCII text to ASCII before filtering.
    pub transliterate: bool,
    /// Collapse runs of the same punctuation mark (`!!` -> `!`).
    pub collapse_repeated_punctuation: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            metadata_tokens: vec!["gutenberg".to_string()],
            letters: LetterSet::Ascii,
            transliterate: false,
            collapse_repeated_punctuation: false,
        }
    }
}

/// How previously kept lines are remembered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupStrategy {
    /// Full line text; exact, memory grows with distinct lines
    #[default]
    Exact,
    /// 64-bit fingerprints; far smaller, with a negligible false-duplicate rate
    Hashed,
}

/// Line filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Maximum consecutive blank lines written.
    pub max_blank_run: usize,
    /// Minimum word count before the repetition check applies.
    pub spam_min_words: usize,
    /// A line is spam when its most frequent word's share exceeds this.
    pub spam_ratio: f64,
    pub dedup: DedupStrategy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_blank_run: 2,
            spam_min_words: 5,
            spam_ratio: 0.8,
            dedup: DedupStrategy::Exact,
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(dir.join("corpus-clean").join("config.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present and built-in defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => match Self::config_path() {
                Ok(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        tracing::debug!("Loading config from {}", path.display());
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.io.chunk_size == 0 {
            bail!("io.chunk_size must be greater than 0");
        }
        if !(self.filter.spam_ratio > 0.0 && self.filter.spam_ratio <= 1.0) {
            bail!(
                "filter.spam_ratio must be in (0, 1], got {}",
                self.filter.spam_ratio
            );
        }
        if self.sanitize.metadata_tokens.iter().any(|t| t.trim().is_empty()) {
            bail!("sanitize.metadata_tokens must not contain empty entries");
        }
        Ok(())
    }
}
