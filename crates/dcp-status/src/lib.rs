//! DCP Status
//!
//! Copy-or-link decisions for the positions of a product structure.
//!
//! # Core Concepts
//!
//! - [`LinkStatus`]: Decision shared by every position reaching the same part
//! - [`TreeStatus`]: Stores decisions, derives checked / enabled / copy-or-link
//! - [`DefaultPolicy`] and [`SmartModeBehavior`]: Defaults for new decisions
//! - [`StatusEvent`]: Published on every effective change
//!
//! # Example
//!
//! ```rust,ignore
//! use dcp_status::{CopyOrLink, DefaultPolicy, TreeStatus};
//!
//! let mut status = TreeStatus::new(structure, DefaultPolicy::Smart);
//! status.subscribe(|event| println!("{event:?}"));
//! status.set_copy_or_link(child, CopyOrLink::Link);
//! let copied = status.all_enabled_elements(CopyOrLink::Copy, false);
//! ```

#![warn(unreachable_pub)]

mod error;
mod events;
mod link_status;
mod policy;
mod tree_status;

pub use error::{ParseError, StatusError};
pub use events::{Listener, StatusChange, StatusEvent, SubscriptionId};
pub use link_status::{CopyOrLink, LinkStatus, StatusKey};
pub use policy::{DefaultPolicy, SameRootSmartMode, SmartModeBehavior};
pub use tree_status::TreeStatus;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
