//! CLI argument parsing and command dispatch.

pub mod args;
pub mod bill;
pub mod doctor;
pub mod leak;
pub mod status;

pub use args::{Cli, Commands, OutputFormat};

/// Print rendered output with exactly one trailing newline.
pub(crate) fn print_output(output: &str) {
    println!("{}", output.trim_end_matches('\n'));
}
