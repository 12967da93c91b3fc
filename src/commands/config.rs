//! Configuration display.

use std::path::Path;

use anyhow::Result;

use corpus_clean::Config;

use crate::theme::current_theme;

/// Show the effective configuration as TOML.
#[cfg(not(tarpaulin_include))]
pub fn handle_show(explicit: Option<&Path>) -> Result<()> {
    let theme = current_theme();
    let config = Config::load(explicit)?;
    let source = match explicit {
        Some(path) => format!("# Loaded from {}", path.display()),
        None => match Config::config_path() {
            Ok(path) if path.exists() => format!("# Loaded from {}", path.display()),
            Ok(path) => format!("# Defaults (no file at {})", path.display()),
            Err(_) => "# Defaults".to_string(),
        },
    };
    println!("{}", theme.secondary_text(&source));
    print!("{}", theme.primary_text(&toml::to_string_pretty(&config)?));
    Ok(())
}
