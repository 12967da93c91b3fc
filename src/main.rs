use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod theme;

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = if let Some(shell) = cli.completions {
        commands::completions::handle(shell).map(|()| true)
    } else if cli.show_config {
        commands::config::handle_show(cli.config.as_deref()).map(|()| true)
    } else {
        commands::clean::handle(&cli)
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `RUST_LOG` overrides the verbosity flags.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "corpus_clean=warn",
        1 => "corpus_clean=info",
        _ => "corpus_clean=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
