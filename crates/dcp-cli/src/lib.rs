//! DCP command line
//!
//! Library side of the `dcp` binary: configuration, logging setup and the
//! subcommands.
//!
//! - `dcp preview`: resolve target packages and names of a deep copy
//! - `dcp tree`: print the structure with its copy-or-link decisions

#![warn(unreachable_pub)]

pub mod commands;
pub mod config;
pub mod logging;

pub use commands::{load_structure, preview, tree, PreviewArgs, TreeArgs};
pub use config::CliConfig;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
