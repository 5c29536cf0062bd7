//! Core types, configuration, and error handling for the patchlens pipeline.
//!
//! This crate provides the shared foundation used by all other patchlens
//! crates:
//! - [`PatchlensError`] — unified error type using `thiserror`
//! - [`PatchlensConfig`] — configuration loaded from `.patchlens.toml`
//! - Shared types: [`ChangeDescriptor`], [`PatchText`], [`CommentEntry`],
//!   [`WorkingCopy`], [`ApplyReport`], [`FindingSeverity`]

mod config;
mod error;
mod types;

pub use config::{
    AgentConfig, CheckoutConfig, GithubConfig, PatchlensConfig, ReviewConfig,
};
pub use error::PatchlensError;
pub use types::{
    ApplyOutcome, ApplyReport, ApplyStrategy, ChangeDescriptor, ChangeRef, CommentEntry,
    CommentKind, CommentLocation, FindingSeverity, PatchText, WorkingCopy,
    DIFFERENTIAL_OWNER, DIFFERENTIAL_REPO,
};

/// A convenience `Result` type for patchlens operations.
pub type Result<T> = std::result::Result<T, PatchlensError>;
