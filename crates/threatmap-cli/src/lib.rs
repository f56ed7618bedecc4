//! threatmap CLI library.
//!
//! Output formatting shared by the `threatmap-cli` subcommands.

pub mod output;
