//! Counters accumulated over one run.

use std::time::Duration;

/// Combiner results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombineStats {
    /// Sources handed to the combiner
    pub sources: usize,
    /// Sources whose text reached the combined stream
    pub processed: usize,
    /// Processed sources that were removed from disk
    pub deleted: usize,
    /// Sources skipped after a soft error (left on disk)
    pub skipped: usize,
    /// UTF-8 bytes of extracted text written, excluding separators
    pub bytes: u64,
}

/// Character sanitizer results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeStats {
    pub chars_in: u64,
    pub chars_out: u64,
}

impl SanitizeStats {
    pub fn removed(&self) -> u64 {
        self.chars_in.saturating_sub(self.chars_out)
    }

    /// Share of input characters removed, in percent.
    pub fn removed_percent(&self) -> f64 {
        if self.chars_in == 0 {
            return 0.0;
        }
        self.removed() as f64 * 100.0 / self.chars_in as f64
    }
}

/// Line filter results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Every line read, blank or not
    pub total_lines: u64,
    /// Non-blank lines written
    pub kept: u64,
    /// Blank lines written
    pub blank_kept: u64,
    /// Blank lines dropped for exceeding the run limit
    pub blank_suppressed: u64,
    pub single_word: u64,
    pub duplicates: u64,
    pub spam: u64,
}

impl FilterStats {
    /// Non-blank lines dropped for any reason.
    pub fn dropped(&self) -> u64 {
        self.single_word + self.duplicates + self.spam
    }
}

/// Everything reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub combine: CombineStats,
    pub sanitize: SanitizeStats,
    pub filter: FilterStats,
    /// Size of the final output file in bytes
    pub output_bytes: u64,
    pub elapsed: Duration,
}
