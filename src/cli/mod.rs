//! CLI module for kubeplan.
//!
//! This module provides the command-line interface for validating and
//! reconciling cluster plans.

mod commands;
mod output;

pub use commands::{Cli, Commands, OutputFormat};
pub use output::OutputFormatter;
