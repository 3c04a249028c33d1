//! DCP Preview
//!
//! Computes where every copied object goes and what it will be called, and
//! reports what stands in the way.
//!
//! # Core Concepts
//!
//! - [`PreviewResolver`]: Target packages, new names, collision detection
//! - [`PreviewOptions`]: Target package, search/replace, version id
//! - [`TargetFile`]: Package, name and kind of a copy
//! - [`PreviewIssue`]: Problem attached to one position
//! - [`ProgressMonitor`]: Progress and cancellation
//!
//! # Example
//!
//! ```rust,ignore
//! use dcp_model::DateBasedNamingStrategy;
//! use dcp_preview::{NullProgress, PreviewOptions, PreviewResolver};
//!
//! let naming = DateBasedNamingStrategy::default();
//! let options = PreviewOptions::new("new.pkg".parse()?).with_version_id("2025-01");
//! let mut resolver = PreviewResolver::new(&status, &naming, options);
//! let handles = resolver.handles(&NullProgress)?;
//! ```

#![warn(unreachable_pub)]

mod issue;
mod options;
mod progress;
mod report;
mod resolver;
mod target;

pub use issue::{IssueKind, PreviewIssue};
pub use options::PreviewOptions;
pub use progress::{CancellationToken, NullProgress, ProgressMonitor};
pub use report::{PreviewReport, ReportEntry};
pub use resolver::{segments_to_ignore, PreviewError, PreviewResolver, ValidationOutcome};
pub use target::TargetFile;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
