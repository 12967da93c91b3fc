//! Character sanitizer: reduces the combined stream to letters, whitespace
//! and `.,!?`, dropping metadata markers and stuttered words on the way.
//!
//! Steps per chunk, in order:
//! 1. (optional) transliterate to ASCII
//! 2. remove metadata markers (whole words, case-insensitive)
//! 3. delete characters outside the allowed set
//! 4. per line, collapse consecutive repeats of a word (case-insensitive,
//!    first spelling kept) and join tokens with single spaces
//!
//! Chunks are cut at the last line break in the buffer, so per-line steps
//! see whole lines. Only a line longer than `MAX_LINE_CHUNKS` chunks is
//! split, at whitespace, and a repeat straddling that split survives.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use deunicode::deunicode;
use regex::Regex;

use super::combine::read_chunk;
use super::stats::SanitizeStats;
use crate::config::{LetterSet, SanitizeConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::progress::{ProgressReporter, Stage, Throttle};

/// Punctuation kept by the character filter.
const ALLOWED_PUNCTUATION: &[char] = &['.', ',', '!', '?'];

/// A line longer than this many chunks is split at whitespace.
const MAX_LINE_CHUNKS: usize = 64;

/// Streams text through the sanitizing steps.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    metadata: Option<Regex>,
    letters: LetterSet,
    transliterate: bool,
    collapse_punctuation: bool,
}

impl Sanitizer {
    /// Compile the metadata lexicon into one matcher.
    pub fn new(config: &SanitizeConfig) -> Result<Self, regex::Error> {
        let metadata = if config.metadata_tokens.is_empty() {
            None
        } else {
            let mut tokens: Vec<&str> = config
                .metadata_tokens
                .iter()
                .map(|token| token.trim())
                .collect();
            // Longest first, so `c++` wins over a listed `c`
            tokens.sort_by(|a, b| b.len().cmp(&a.len()));
            let alternatives: Vec<String> = tokens.into_iter().map(token_pattern).collect();
            Some(Regex::new(&format!(
                "(?i)(?:{})",
                alternatives.join("|")
            ))?)
        };

        Ok(Self {
            metadata,
            letters: config.letters,
            transliterate: config.transliterate,
            collapse_punctuation: config.collapse_repeated_punctuation,
        })
    }

    /// Whether `c` survives the character filter.
    pub fn is_allowed(&self, c: char) -> bool {
        let letter = match self.letters {
            LetterSet::Ascii => c.is_ascii_alphabetic(),
            LetterSet::Unicode => c.is_alphabetic(),
        };
        letter || c.is_whitespace() || ALLOWED_PUNCTUATION.contains(&c)
    }

    /// Apply every step to one chunk of text. Line breaks are preserved.
    pub fn clean(&self, chunk: &str) -> String {
        let text: Cow<str> = if self.transliterate {
            Cow::Owned(deunicode(chunk))
        } else {
            Cow::Borrowed(chunk)
        };

        let text = match &self.metadata {
            Some(re) if re.is_match(&text) => Cow::Owned(re.replace_all(&text, "").into_owned()),
            _ => text,
        };

        let filtered = self.filter_chars(&text);

        let mut out = String::with_capacity(filtered.len());
        for (index, line) in filtered.split('\n').enumerate() {
            if index > 0 {
                out.push('\n');
            }
            push_collapsed_line(&mut out, line);
        }
        out
    }

    fn filter_chars(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last: Option<char> = None;
        for c in text.chars() {
            if !self.is_allowed(c) {
                continue;
            }
            if self.collapse_punctuation && ALLOWED_PUNCTUATION.contains(&c) && last == Some(c) {
                continue;
            }
            out.push(c);
            last = Some(c);
        }
        out
    }

    /// Sanitize `input` into `output` chunk by chunk.
    pub fn run(
        &self,
        input: &Path,
        output: &Path,
        chunk_size: usize,
        reporter: &mut dyn ProgressReporter,
    ) -> PipelineResult<SanitizeStats> {
        let chunk_size = chunk_size.max(1);
        let max_line_bytes = chunk_size.saturating_mul(MAX_LINE_CHUNKS);
        self.stream(input, output, chunk_size, max_line_bytes, reporter)
    }

    fn stream(
        &self,
        input: &Path,
        output: &Path,
        chunk_size: usize,
        max_line_bytes: usize,
        reporter: &mut dyn ProgressReporter,
    ) -> PipelineResult<SanitizeStats> {
        let read_err = |e| PipelineError::io(Stage::Clean, input, e);
        let write_err = |e| PipelineError::io(Stage::Clean, output, e);
        let invalid = |e: std::str::Utf8Error| read_err(io::Error::new(io::ErrorKind::InvalidData, e));

        let total = fs::metadata(input).map_err(read_err)?.len();
        let mut reader = File::open(input).map_err(read_err)?;
        let mut writer = BufWriter::new(File::create(output).map_err(write_err)?);
        let mut throttle = Throttle::new(reporter, Stage::Clean);
        let mut stats = SanitizeStats::default();

        let mut buf: Vec<u8> = Vec::with_capacity(chunk_size + 4);
        let mut carried = 0usize;
        let mut consumed = 0u64;
        // Last character written, to rejoin a line split across chunks
        let mut last_written: Option<char> = None;

        loop {
            buf.resize(carried + chunk_size, 0);
            let n = read_chunk(&mut reader, &mut buf[carried..]).map_err(read_err)?;
            let filled = carried + n;
            buf.truncate(filled);
            if filled == 0 {
                break;
            }
            let at_eof = n == 0;

            let cut = if at_eof {
                filled
            } else if let Some(pos) = buf.iter().rposition(|&b| b == b'\n') {
                pos + 1
            } else if filled < max_line_bytes {
                // Keep reading until the line ends
                carried = filled;
                continue;
            } else {
                split_point(&buf).map_err(invalid)?
            };

            let chunk = std::str::from_utf8(&buf[..cut]).map_err(invalid)?;
            let cleaned = self.clean(chunk);
            stats.chars_in += chunk.chars().count() as u64;

            let continues_line = last_written.is_some_and(|c| c != '\n')
                && cleaned.chars().next().is_some_and(|c| c != '\n');
            if continues_line {
                writer.write_all(b" ").map_err(write_err)?;
                stats.chars_out += 1;
            }
            writer.write_all(cleaned.as_bytes()).map_err(write_err)?;
            stats.chars_out += cleaned.chars().count() as u64;
            if let Some(c) = cleaned.chars().next_back() {
                last_written = Some(c);
            }

            consumed += cut as u64;
            buf.copy_within(cut.., 0);
            carried = filled - cut;
            throttle.tick(consumed, total);

            if at_eof {
                break;
            }
        }

        writer.flush().map_err(write_err)?;
        throttle.finish(total);
        tracing::info!(
            "Cleaned {} characters down to {}",
            stats.chars_in,
            stats.chars_out
        );
        Ok(stats)
    }
}

/// Pattern for one metadata marker. A `\b` only holds next to a word
/// character, so it guards just the edges where the marker starts or ends
/// with one; a symbol edge such as the `<` of `<eos>` delimits itself.
fn token_pattern(token: &str) -> String {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = if token.starts_with(is_word) { r"\b" } else { "" };
    let trail = if token.ends_with(is_word) { r"\b" } else { "" };
    format!("{}{}{}", lead, regex::escape(token), trail)
}

/// Where to split a line longer than the read limit: after the last ASCII
/// whitespace byte, else after the last complete character.
fn split_point(buf: &[u8]) -> Result<usize, std::str::Utf8Error> {
    if let Some(pos) = buf.iter().rposition(|b| b.is_ascii_whitespace()) {
        return Ok(pos + 1);
    }
    match std::str::from_utf8(buf) {
        Ok(_) => Ok(buf.len()),
        Err(e) if e.error_len().is_none() && e.valid_up_to() > 0 => Ok(e.valid_up_to()),
        Err(e) => Err(e),
    }
}

/// Append `line` with consecutive repeated words removed. Joining with a
/// single space also collapses whitespace runs.
fn push_collapsed_line(out: &mut String, line: &str) {
    let mut previous: Option<&str> = None;
    for token in line.split_whitespace() {
        if let Some(prev) = previous {
            if same_word(prev, token) {
                continue;
            }
            out.push(' ');
        }
        out.push_str(token);
        previous = Some(token);
    }
}

fn same_word(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
