//! DCP Settings
//!
//! Persists copy-or-link decisions so they can be restored on a structure
//! built later, where object identities differ.
//!
//! # Core Concepts
//!
//! - [`SettingsEntry`]: One decision, identified by names
//! - [`SettingsCodec`]: Serializes a [`dcp_status::TreeStatus`] and restores it
//! - [`SettingsDocument`]: Versioned file format (JSON or YAML)
//!
//! # Example
//!
//! ```rust,ignore
//! use dcp_model::DateBasedNamingStrategy;
//! use dcp_settings::{SettingsCodec, SettingsDocument};
//!
//! let naming = DateBasedNamingStrategy::default();
//! let codec = SettingsCodec::new(&naming);
//! SettingsDocument::capture(&codec, &status).save("copy.yaml")?;
//!
//! let report = codec.restore(&SettingsDocument::load("copy.yaml")?.entries, &mut rebuilt)?;
//! ```

#![warn(unreachable_pub)]

mod codec;
mod document;
mod entry;
mod error;

pub use codec::{Resolution, ResolvedEntry, RestoreReport, SettingsCodec};
pub use document::{SettingsDocument, FORMAT_VERSION};
pub use entry::{LinkType, SettingsEntry};
pub use error::SettingsError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
