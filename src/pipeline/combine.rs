//! Combiner: concatenates all sources into one stream, deleting each
//! source once its text is safely on disk.
//!
//! A source is deleted only after the combined stream has been flushed.
//! A source that fails mid-read is rolled back out of the stream by
//! truncating the file to where that source began.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::stats::CombineStats;
use crate::corpus::{extract_structured, SourceFile, SourceKind};
use crate::error::{ExtractError, PipelineError, PipelineResult};
use crate::progress::{ProgressReporter, Stage, Throttle};

/// Why appending one source failed.
enum AppendError {
    /// The source itself was unusable; skip it.
    Source(ExtractError),
    /// Writing the combined stream failed; abort the run.
    Sink(io::Error),
}

impl From<ExtractError> for AppendError {
    fn from(err: ExtractError) -> Self {
        Self::Source(err)
    }
}

/// The combined stream plus the byte position of its logical end.
struct CombinedStream {
    writer: BufWriter<File>,
    position: u64,
}

impl CombinedStream {
    fn create(path: &Path, chunk_size: usize) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::with_capacity(chunk_size, file),
            position: 0,
        })
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), AppendError> {
        self.writer.write_all(bytes).map_err(AppendError::Sink)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn commit(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Discard everything written after `start`.
    fn rollback(&mut self, start: u64) -> io::Result<()> {
        self.writer.flush()?;
        let file = self.writer.get_mut();
        file.set_len(start)?;
        file.seek(SeekFrom::Start(start))?;
        self.position = start;
        Ok(())
    }
}

/// Streams sources into one file.
pub struct Combiner {
    chunk_size: usize,
}

impl Combiner {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Combine `sources` into `output` in the given order.
    ///
    /// Soft errors skip the source and leave it on disk. Any failure to
    /// write `output` aborts with [`PipelineError`].
    pub fn run(
        &self,
        sources: &[SourceFile],
        output: &Path,
        reporter: &mut dyn ProgressReporter,
    ) -> PipelineResult<CombineStats> {
        let sink_err = |e| PipelineError::io(Stage::Combine, output, e);
        let mut stream = CombinedStream::create(output, self.chunk_size).map_err(sink_err)?;
        let mut throttle = Throttle::new(reporter, Stage::Combine);
        let mut stats = CombineStats {
            sources: sources.len(),
            ..CombineStats::default()
        };
        let total = sources.len() as u64;

        for (index, source) in sources.iter().enumerate() {
            let start = stream.position;
            match self.append(&mut stream, source) {
                Ok(bytes) => {
                    stream.commit().map_err(sink_err)?;
                    stats.processed += 1;
                    stats.bytes += bytes;
                    if remove_source(&source.path) {
                        stats.deleted += 1;
                    }
                }
                Err(AppendError::Source(err)) => {
                    tracing::warn!("Skipping {}: {}", source.path.display(), err);
                    stream.rollback(start).map_err(sink_err)?;
                    stats.skipped += 1;
                }
                Err(AppendError::Sink(err)) => return Err(sink_err(err)),
            }
            throttle.tick(index as u64 + 1, total);
        }

        stream.commit().map_err(sink_err)?;
        throttle.finish(total);
        tracing::info!(
            "Combined {} of {} sources ({} bytes, {} deleted, {} skipped)",
            stats.processed,
            stats.sources,
            stats.bytes,
            stats.deleted,
            stats.skipped
        );
        Ok(stats)
    }

    /// Append one source. Returns the number of text bytes written.
    fn append(&self, stream: &mut CombinedStream, source: &SourceFile) -> Result<u64, AppendError> {
        match source.kind {
            SourceKind::PlainText => self.append_plain(stream, &source.path),
            SourceKind::StructuredRecord => {
                let text = extract_structured(&source.path)?;
                if text.is_empty() {
                    tracing::debug!("No text in {}", source.path.display());
                    return Ok(0);
                }
                stream.write(text.as_bytes())?;
                stream.write(b"\n")?;
                Ok(text.len() as u64)
            }
        }
    }

    /// Copy a plain-text file chunk by chunk, validating UTF-8 as it goes.
    fn append_plain(&self, stream: &mut CombinedStream, path: &Path) -> Result<u64, AppendError> {
        let read_err = |e| ExtractError::Read {
            path: path.to_path_buf(),
            source: e,
        };
        let decode_err = || ExtractError::Decode {
            path: path.to_path_buf(),
        };

        let mut file = File::open(path).map_err(read_err)?;
        let mut buf: Vec<u8> = Vec::with_capacity(self.chunk_size + 4);
        // Bytes of a multi-byte character cut off by the previous read
        let mut carried = 0usize;
        let mut written = 0u64;
        let mut ends_with_newline = false;

        loop {
            buf.resize(carried + self.chunk_size, 0);
            let n = read_chunk(&mut file, &mut buf[carried..]).map_err(read_err)?;
            if n == 0 {
                break;
            }
            let filled = carried + n;
            let valid = match std::str::from_utf8(&buf[..filled]) {
                Ok(_) => filled,
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(_) => return Err(decode_err().into()),
            };
            stream.write(&buf[..valid])?;
            written += valid as u64;
            if valid > 0 {
                ends_with_newline = buf[valid - 1] == b'\n';
            }
            buf.copy_within(valid..filled, 0);
            carried = filled - valid;
        }

        if carried > 0 {
            return Err(decode_err().into());
        }
        // Keep the next source on a fresh line
        if written > 0 && !ends_with_newline {
            stream.write(b"\n")?;
        }
        Ok(written)
    }
}

/// Fill `buf` as far as possible. Returns 0 only at end of file.
pub(crate) fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Delete a consumed source. Failure is logged, not fatal.
fn remove_source(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Could not delete {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NoProgress, RecordingProgress};
    use tempfile::TempDir;

    fn source(dir: &TempDir, name: &str, content: &[u8]) -> SourceFile {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        SourceFile::from_path(path).unwrap()
    }

    #[test]
    fn combines_text_and_json_in_order_and_deletes() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.txt", b"hello world\n");
        let b = source(&dir, "b.json", br#"{"body":[{"text":"foo bar","pos":"NN"}]}"#);
        let output = dir.path().join("combined.out");

        let stats = Combiner::new(1024)
            .run(&[a.clone(), b.clone()], &output, &mut NoProgress)
            .unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "hello world\nfoo bar\n");
        assert!(!a.exists());
        assert!(!b.exists());
        assert_eq!(stats.deleted, 2);
        assert_eq!(stats.processed, 2);
        assert_eq!(stats.bytes, 12 + 7);
    }

    #[test]
    fn plain_text_without_trailing_newline_gets_one() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.txt", b"hello world");
        let b = source(&dir, "b.txt", b"second file");
        let output = dir.path().join("combined.out");

        Combiner::new(4)
            .run(&[a, b], &output, &mut NoProgress)
            .unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "hello world\nsecond file\n"
        );
    }

    #[test]
    fn multibyte_characters_survive_tiny_chunks() {
        let dir = TempDir::new().unwrap();
        let text = "café naïve résumé ✓";
        let a = source(&dir, "a.txt", text.as_bytes());
        let output = dir.path().join("combined.out");

        let stats = Combiner::new(1).run(&[a], &output, &mut NoProgress).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), format!("{}\n", text));
        assert_eq!(stats.bytes, text.len() as u64);
    }

    #[test]
    fn undecodable_source_is_skipped_and_kept() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.txt", b"good line\n");
        // Valid prefix longer than one chunk, then an invalid byte
        let b = source(&dir, "b.txt", b"partially valid text \xff tail");
        let c = source(&dir, "c.txt", b"last line\n");
        let output = dir.path().join("combined.out");

        let stats = Combiner::new(4)
            .run(&[a, b.clone(), c], &output, &mut NoProgress)
            .unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "good line\nlast line\n"
        );
        assert!(b.exists());
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.deleted, 2);
    }

    #[test]
    fn truncated_multibyte_at_eof_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.txt", b"abc\xc3");
        let output = dir.path().join("combined.out");

        let stats = Combiner::new(2).run(&[a.clone()], &output, &mut NoProgress).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "");
        assert!(a.exists());
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn malformed_json_is_skipped_and_kept() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.json", b"{\"body\": [");
        let b = source(&dir, "b.txt", b"x y");
        let output = dir.path().join("combined.out");

        let stats = Combiner::new(64)
            .run(&[a.clone(), b], &output, &mut NoProgress)
            .unwrap();

        assert!(a.exists());
        assert_eq!(fs::read_to_string(&output).unwrap(), "x y\n");
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.deleted, 1);
    }

    #[test]
    fn json_without_text_contributes_nothing_but_is_deleted() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.json", br#"{"meta":{"author":"x"}}"#);
        let output = dir.path().join("combined.out");

        let stats = Combiner::new(64).run(&[a.clone()], &output, &mut NoProgress).unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "");
        assert!(!a.exists());
        assert_eq!(stats.deleted, 1);
        assert_eq!(stats.bytes, 0);
    }

    #[test]
    fn missing_source_is_skipped() {
        let dir = TempDir::new().unwrap();
        let ghost = SourceFile::new(dir.path().join("ghost.txt"), SourceKind::PlainText);
        let output = dir.path().join("combined.out");

        let stats = Combiner::new(64).run(&[ghost], &output, &mut NoProgress).unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.processed, 0);
    }

    #[test]
    fn reports_final_progress() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.txt", b"one two");
        let b = source(&dir, "b.txt", b"three four");
        let output = dir.path().join("combined.out");
        let mut recorder = RecordingProgress::default();

        Combiner::new(64).run(&[a, b], &output, &mut recorder).unwrap();

        let last = recorder.updates.last().unwrap();
        assert_eq!((last.current, last.total), (2, 2));
        assert_eq!(last.stage, Stage::Combine);
    }

    #[test]
    fn unwritable_output_is_fatal() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.txt", b"hello world");
        let output = dir.path().join("missing-dir").join("combined.out");

        let err = Combiner::new(64).run(&[a.clone()], &output, &mut NoProgress).unwrap_err();
        assert!(matches!(err, PipelineError::Io { stage: Stage::Combine, .. }));
        assert!(a.exists());
    }
}
