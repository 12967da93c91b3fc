//! The combine-clean-filter run.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use corpus_clean::progress::{NoProgress, ProgressReporter, TerminalProgress};
use corpus_clean::{enumerate, Config, Pipeline, RunStats, SourceSummary};

use crate::cli::Cli;
use crate::theme::{current_theme, Theme};

const RULE: &str = "============================================================";

/// Scan, confirm, run. Returns `Ok(false)` when the user declines.
#[cfg(not(tarpaulin_include))]
pub fn handle(cli: &Cli) -> Result<bool> {
    let theme = current_theme();
    let config = Config::load(cli.config.as_deref())?;
    let pipeline = Pipeline::new(config).context("Invalid sanitize.metadata_tokens")?;
    let output = cli.output_path();

    println!("{}", theme.secondary_text("Scanning for files recursively..."));
    let sources = enumerate(&cli.folder, Some(&output))?;
    check_output_dir(&output)?;

    let summary = SourceSummary::new(&cli.folder, &sources);
    print_found(&theme, &summary);

    println!();
    println!(
        "{}",
        theme.primary_text(&format!(
            "Will combine into '{}', clean, and DELETE originals as processed.",
            output.display()
        ))
    );
    println!(
        "{}",
        theme.warning_text("WARNING: Original files will be DELETED as they are read!")
    );
    println!(
        "{}",
        theme.warning_text("If a later step fails, files already deleted are NOT restored.")
    );

    if !cli.yes && !prompt_confirmation(&theme, "Proceed?")? {
        println!("{}", theme.primary_text("Operation cancelled."));
        return Ok(false);
    }

    let mut terminal;
    let mut quiet = NoProgress;
    let reporter: &mut dyn ProgressReporter = if cli.quiet {
        &mut quiet
    } else {
        terminal = TerminalProgress::stderr();
        &mut terminal
    };

    println!();
    println!(
        "{}",
        theme.primary_text("Combining, cleaning and filtering...")
    );
    let stats = pipeline
        .run(&sources, &output, reporter)
        .context("Run aborted; partial output and temporary files may remain")?;

    print_report(&theme, &summary, &stats, &output);
    Ok(true)
}

/// The output must be creatable before anything is deleted.
fn check_output_dir(output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            bail!("Output directory '{}' does not exist", parent.display());
        }
    }
    Ok(())
}

fn print_found(theme: &Theme, summary: &SourceSummary) {
    println!();
    println!(
        "{}",
        theme.accent_text(&format!("Found {} files total:", summary.total))
    );
    println!("  {} text files", summary.plain_text);
    println!("  {} JSON files", summary.structured);
    println!();
    println!("{}", theme.accent_text("Files from folders:"));
    for (folder, count) in &summary.folders {
        println!(
            "  {}/  {}",
            folder.display(),
            theme.secondary_text(&format!("({} files)", count))
        );
    }
}

fn print_report(theme: &Theme, summary: &SourceSummary, stats: &RunStats, output: &Path) {
    let sanitize = &stats.sanitize;
    let filter = &stats.filter;

    println!();
    println!("{}", theme.accent_text("Cleaning statistics:"));
    println!("  Original: {} characters", group_digits(sanitize.chars_in));
    println!("  Cleaned:  {} characters", group_digits(sanitize.chars_out));
    println!(
        "  Removed:  {} characters ({:.1}%)",
        group_digits(sanitize.removed()),
        sanitize.removed_percent()
    );

    println!();
    println!("{}", theme.accent_text("Line processing statistics:"));
    println!("  Total lines: {}", group_digits(filter.total_lines));
    println!("  Removed single-word lines: {}", group_digits(filter.single_word));
    println!("  Removed duplicates: {}", group_digits(filter.duplicates));
    println!(
        "  Removed lines with excessive repetition: {}",
        group_digits(filter.spam)
    );

    println!();
    println!("{}", theme.secondary_text(RULE));
    println!("{}", theme.success_text("ALL DONE!"));
    println!("{}", theme.secondary_text(RULE));
    println!(
        "Combined {} files ({} txt, {} json)",
        stats.combine.processed, summary.plain_text, summary.structured
    );
    println!(
        "Deleted {}/{} original files",
        stats.combine.deleted, summary.total
    );
    if stats.combine.skipped > 0 {
        println!(
            "{}",
            theme.warning_text(&format!(
                "Skipped {} unreadable files (left in place)",
                stats.combine.skipped
            ))
        );
    }
    println!(
        "Combined text: {}",
        humansize::format_size(stats.combine.bytes, humansize::DECIMAL)
    );
    println!(
        "Removed {} unwanted characters",
        group_digits(sanitize.removed())
    );
    println!("Removed {} single-word lines", group_digits(filter.single_word));
    println!("Removed {} duplicate lines", group_digits(filter.duplicates));
    println!(
        "Removed {} lines with excessive word repetition",
        group_digits(filter.spam)
    );
    println!(
        "Final file size: {} ({} bytes)",
        humansize::format_size(stats.output_bytes, humansize::DECIMAL),
        group_digits(stats.output_bytes)
    );
    println!(
        "{}",
        theme.success_text(&format!("Saved to: {}", output.display()))
    );
    println!("{}", theme.secondary_text(RULE));
}

/// Format an integer with `,` thousands separators.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Prompt user for yes/no confirmation.
///
/// Returns true if user confirms (y/yes), false otherwise.
/// If stdin is not a TTY (non-interactive), returns false.
fn prompt_confirmation(theme: &Theme, message: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        println!(
            "{}",
            theme.secondary_text("Non-interactive mode: use --yes to proceed without a prompt")
        );
        return Ok(false);
    }

    print!("\n{} (y/N): ", theme.primary_text(message));
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
