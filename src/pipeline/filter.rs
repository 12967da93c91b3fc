//! Line filter: drops degenerate lines from the sanitized stream.
//!
//! Rules per line, first match wins:
//! 1. blank lines pass, up to `max_blank_run` in a row
//! 2. lines of at most one word are dropped
//! 3. lines of `spam_min_words`+ words where one word (case-insensitive)
//!    makes up more than `spam_ratio` of them are dropped
//! 4. lines identical to an earlier kept line are dropped

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use super::dedup::{seen_lines, SeenLines};
use super::stats::FilterStats;
use crate::config::FilterConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::progress::{ProgressReporter, Stage, Throttle};

/// What happened to one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineVerdict {
    /// Written to the output
    Kept,
    /// Blank line written to the output
    Blank,
    /// Blank line beyond the run limit
    BlankSuppressed,
    SingleWord,
    SpamRepetition,
    Duplicate,
}

impl LineVerdict {
    /// Whether the line appears in the output.
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Kept | Self::Blank)
    }
}

/// Stateful per-line classifier.
pub struct LineFilter {
    config: FilterConfig,
    seen: Box<dyn SeenLines>,
    blank_run: usize,
    stats: FilterStats,
}

impl LineFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            config: config.clone(),
            seen: seen_lines(config.dedup),
            blank_run: 0,
            stats: FilterStats::default(),
        }
    }

    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Classify one line and update the counters. The line is trimmed
    /// first; a `Kept` line is remembered for deduplication.
    pub fn classify(&mut self, line: &str) -> LineVerdict {
        self.stats.total_lines += 1;
        let line = line.trim();

        if line.is_empty() {
            self.blank_run += 1;
            if self.blank_run <= self.config.max_blank_run {
                self.stats.blank_kept += 1;
                return LineVerdict::Blank;
            }
            self.stats.blank_suppressed += 1;
            return LineVerdict::BlankSuppressed;
        }
        self.blank_run = 0;

        let words: Vec<&str> = line.split_whitespace().collect();
        if words.len() <= 1 {
            self.stats.single_word += 1;
            return LineVerdict::SingleWord;
        }

        if words.len() >= self.config.spam_min_words && self.is_repetitive(&words) {
            self.stats.spam += 1;
            return LineVerdict::SpamRepetition;
        }

        if !self.seen.insert(line) {
            self.stats.duplicates += 1;
            return LineVerdict::Duplicate;
        }

        self.stats.kept += 1;
        LineVerdict::Kept
    }

    fn is_repetitive(&self, words: &[&str]) -> bool {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in words {
            *counts.entry(word.to_lowercase()).or_insert(0) += 1;
        }
        let max = counts.values().copied().max().unwrap_or(0);
        max as f64 / words.len() as f64 > self.config.spam_ratio
    }

    /// Filter `input` into `output` line by line.
    pub fn run(
        mut self,
        input: &Path,
        output: &Path,
        reporter: &mut dyn ProgressReporter,
    ) -> PipelineResult<FilterStats> {
        let read_err = |e| PipelineError::io(Stage::Filter, input, e);
        let write_err = |e| PipelineError::io(Stage::Filter, output, e);

        let total = fs::metadata(input).map_err(read_err)?.len();
        let mut reader = BufReader::new(File::open(input).map_err(read_err)?);
        let mut writer = BufWriter::new(File::create(output).map_err(write_err)?);
        let mut throttle = Throttle::new(reporter, Stage::Filter);

        let mut line = String::new();
        let mut consumed = 0u64;
        loop {
            line.clear();
            let n = reader.read_line(&mut line).map_err(read_err)?;
            if n == 0 {
                break;
            }
            consumed += n as u64;

            match self.classify(&line) {
                LineVerdict::Kept => {
                    writer.write_all(line.trim().as_bytes()).map_err(write_err)?;
                    writer.write_all(b"\n").map_err(write_err)?;
                }
                LineVerdict::Blank => writer.write_all(b"\n").map_err(write_err)?,
                _ => {}
            }
            throttle.tick(consumed, total);
        }

        writer.flush().map_err(write_err)?;
        throttle.finish(total);
        tracing::info!(
            "Filtered {} lines: {} kept, {} single-word, {} duplicate, {} repetitive",
            self.stats.total_lines,
            self.stats.kept,
            self.stats.single_word,
            self.stats.duplicates,
            self.stats.spam
        );
        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DedupStrategy;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    fn filter() -> LineFilter {
        LineFilter::new(&FilterConfig::default())
    }

    #[test]
    fn drops_single_word_lines() {
        let mut f = filter();
        assert_eq!(f.classify("hello"), LineVerdict::SingleWord);
        assert_eq!(f.classify("   lonely   "), LineVerdict::SingleWord);
        assert_eq!(f.stats().single_word, 2);
    }

    #[test]
    fn drops_spam_repetition() {
        let mut f = filter();
        // 5 of 6 words, about 83%
        assert_eq!(
            f.classify("spam spam spam spam spam word"),
            LineVerdict::SpamRepetition
        );
        assert_eq!(f.stats().spam, 1);
    }

    #[test]
    fn spam_check_is_case_insensitive() {
        let mut f = filter();
        assert_eq!(
            f.classify("La la LA lA la la"),
            LineVerdict::SpamRepetition
        );
    }

    #[test]
    fn exactly_eighty_percent_is_not_spam() {
        let mut f = filter();
        assert_eq!(f.classify("go go go go stop"), LineVerdict::Kept);
    }

    #[test]
    fn short_lines_skip_spam_check() {
        let mut f = filter();
        assert_eq!(f.classify("no no no no"), LineVerdict::Kept);
    }

    #[test]
    fn drops_exact_duplicates_only() {
        let mut f = filter();
        assert_eq!(f.classify("hello world"), LineVerdict::Kept);
        assert_eq!(f.classify("  hello world \n"), LineVerdict::Duplicate);
        assert_eq!(f.classify("Hello world"), LineVerdict::Kept);
        assert_eq!(f.stats().duplicates, 1);
        assert_eq!(f.stats().kept, 2);
        assert!(LineVerdict::Kept.is_written());
        assert!(!LineVerdict::Duplicate.is_written());
    }

    #[test]
    fn rejected_lines_are_not_remembered() {
        let mut f = filter();
        assert_eq!(f.classify("a a a a a"), LineVerdict::SpamRepetition);
        assert_eq!(f.classify("a a a a a"), LineVerdict::SpamRepetition);
        assert_eq!(f.stats().duplicates, 0);
    }

    #[test]
    fn caps_blank_runs() {
        let mut f = filter();
        let verdicts: Vec<_> = ["", " ", "\t", "", "one two", "", ""]
            .iter()
            .map(|line| f.classify(line))
            .collect();
        assert_eq!(
            verdicts,
            vec![
                LineVerdict::Blank,
                LineVerdict::Blank,
                LineVerdict::BlankSuppressed,
                LineVerdict::BlankSuppressed,
                LineVerdict::Kept,
                LineVerdict::Blank,
                LineVerdict::Blank,
            ]
        );
        assert_eq!(f.stats().blank_suppressed, 2);
        assert_eq!(f.stats().total_lines, 7);
    }

    #[test]
    fn any_non_blank_line_resets_blank_run() {
        let mut f = filter();
        f.classify("");
        f.classify("");
        assert_eq!(f.classify("single"), LineVerdict::SingleWord);
        assert_eq!(f.classify(""), LineVerdict::Blank);
    }

    #[test]
    fn hashed_strategy_detects_duplicates() {
        let mut f = LineFilter::new(&FilterConfig {
            dedup: DedupStrategy::Hashed,
            ..FilterConfig::default()
        });
        assert_eq!(f.classify("hello world"), LineVerdict::Kept);
        assert_eq!(f.classify("hello world"), LineVerdict::Duplicate);
    }

    #[test]
    fn streams_file() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("cleaned.txt");
        let output = dir.path().join("out.txt");
        fs::write(
            &input,
            "hello world\nword\n\n\n\n\n  hello world  \nspam spam spam spam spam word\nlast line here",
        )
        .unwrap();

        let stats = filter().run(&input, &output, &mut NoProgress).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "hello world\n\n\nlast line here\n"
        );
        assert_eq!(stats.total_lines, 9);
        assert_eq!(stats.kept, 2);
        assert_eq!(stats.single_word, 1);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.spam, 1);
        assert_eq!(stats.blank_kept, 2);
        assert_eq!(stats.blank_suppressed, 2);
    }

    #[test]
    fn every_output_line_has_two_words_or_is_blank() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("cleaned.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "a\nb c\nd\ne f g\ne f g\nh\n").unwrap();

        filter().run(&input, &output, &mut NoProgress).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        for line in text.lines().filter(|l| !l.is_empty()) {
            assert!(line.split_whitespace().count() >= 2, "{line:?}");
        }
        assert_eq!(text, "b c\ne f g\n");
    }
}
