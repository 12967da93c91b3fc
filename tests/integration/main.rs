//! Integration tests for the corpus-clean binary.

mod cli_test;
mod helpers;
