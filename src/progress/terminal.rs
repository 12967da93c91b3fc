//! Single-line progress bar drawn on stderr.

use std::io::{self, Write};
use std::time::Duration;

use super::{ProgressReporter, ProgressUpdate};

/// Number of cells in the bar.
const BAR_WIDTH: usize = 50;

/// Line width used when the terminal size is unknown.
const FALLBACK_COLUMNS: usize = 120;

/// Format the remaining time estimate.
///
/// Returns `None` until there is enough data for a rate.
pub fn format_eta(current: u64, total: u64, elapsed: Duration) -> Option<String> {
    let secs = elapsed.as_secs_f64();
    if current == 0 || secs <= 0.0 {
        return None;
    }
    let rate = current as f64 / secs;
    let remaining = total.saturating_sub(current) as f64 / rate;
    let remaining = remaining as u64;

    Some(if remaining < 60 {
        format!("{}s", remaining)
    } else if remaining < 3600 {
        format!("{}m {}s", remaining / 60, remaining % 60)
    } else {
        format!("{}h {}m", remaining / 3600, (remaining % 3600) / 60)
    })
}

/// Build the visible progress line, cut to `max_columns` characters.
pub fn render_line(update: &ProgressUpdate, max_columns: usize) -> String {
    let filled = if update.total == 0 {
        BAR_WIDTH
    } else {
        ((BAR_WIDTH as u128 * update.current as u128) / update.total as u128).min(BAR_WIDTH as u128)
            as usize
    };

    let mut line = String::with_capacity(max_columns + 16);
    line.push_str(update.stage.label());
    line.push_str(": |");
    line.extend(std::iter::repeat('█').take(filled));
    line.extend(std::iter::repeat('░').take(BAR_WIDTH - filled));
    line.push_str(&format!(
        "| {:.1}% ({}/{})",
        update.percent(),
        update.current,
        update.total
    ));
    if let Some(eta) = format_eta(update.current, update.total, update.elapsed) {
        line.push_str(" ETA: ");
        line.push_str(&eta);
    }

    if line.chars().count() > max_columns {
        line = line.chars().take(max_columns).collect();
    }
    line
}

/// Renders updates as a carriage-return progress bar.
pub struct TerminalProgress<W: Write = io::Stderr> {
    out: W,
    columns: usize,
}

impl TerminalProgress {
    /// Draw on stderr, sized to the current terminal.
    pub fn stderr() -> Self {
        let columns = terminal_size::terminal_size()
            .map(|(terminal_size::Width(w), _)| w as usize)
            .filter(|&w| w > 0)
            .unwrap_or(FALLBACK_COLUMNS)
            .min(FALLBACK_COLUMNS);
        Self::new(io::stderr(), columns)
    }
}

impl<W: Write> TerminalProgress<W> {
    pub fn new(out: W, columns: usize) -> Self {
        Self { out, columns }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressReporter for TerminalProgress<W> {
    fn report(&mut self, update: ProgressUpdate) {
        let line = render_line(&update, self.columns);
        // Rendering is best effort; a closed terminal must not stop the run
        let _ = write!(self.out, "\r{}\x1b[K", line);
        if update.is_complete() {
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }
}
