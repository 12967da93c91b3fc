//! Command handlers for the CLI.

pub mod clean;
pub mod completions;
pub mod config;
