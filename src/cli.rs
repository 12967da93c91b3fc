//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;
use clap_complete::Shell;

use corpus_clean::config::DEFAULT_OUTPUT_NAME;

/// Combine, clean and deduplicate a tree of .txt and .json corpus files.
///
/// Original files are DELETED as they are read.
#[derive(Debug, Parser)]
#[command(name = "corpus-clean", version, about, long_about = None)]
#[command(after_help = "\
Processing steps:
  1. Combine every .txt and .json file (recursively), deleting each one once read
  2. Remove digits and symbols, keeping letters and .,!? punctuation
  3. Drop single-word, duplicate and repetitive lines

JSON files contribute only the 'text' field of each entry in their 'body' list.")]
pub struct Cli {
    /// Folder containing .txt/.json files
    #[arg(default_value = ".")]
    pub folder: PathBuf,

    /// Output file name; relative paths are placed inside FOLDER
    #[arg(default_value = DEFAULT_OUTPUT_NAME)]
    pub output: PathBuf,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Do not draw progress bars
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase log detail (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Read settings from this TOML file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print a shell completion script and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

impl Cli {
    /// Where the final output goes.
    pub fn output_path(&self) -> PathBuf {
        self.folder.join(&self.output)
    }
}
