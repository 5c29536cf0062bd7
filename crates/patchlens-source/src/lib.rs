//! Change reference resolution and platform retrieval for patchlens.
//!
//! Provides the three acquisition components of the pipeline:
//! - [`locate`] — classify a raw reference string into a typed
//!   [`patchlens_core::ChangeDescriptor`]
//! - [`PatchFetcher`] — download the literal diff text for a change
//! - [`CommentAggregator`] — collect pre-existing review feedback,
//!   tolerating partial or total failure

mod comments;
mod fetch;
mod locator;

pub use comments::{unsupported_platform_entry, CommentAggregator};
pub use fetch::PatchFetcher;
pub use locator::locate;
