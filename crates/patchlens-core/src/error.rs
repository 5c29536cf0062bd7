/// Errors that can occur across the patchlens pipeline.
///
/// Each variant wraps a specific failure domain. Library crates use this type
/// directly; the binary crate converts to `miette` diagnostics at the boundary.
/// Only [`PatchlensError::UnrecognizedReference`], [`PatchlensError::Repository`]
/// (when a checkout was requested), and [`PatchlensError::Agent`] abort a run;
/// every other kind is caught at its component boundary and degraded to an
/// empty or failure-flagged value.
///
/// # Examples
///
/// ```
/// use patchlens_core::PatchlensError;
///
/// let err = PatchlensError::Config("missing agent command".into());
/// assert!(err.to_string().contains("missing agent command"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum PatchlensError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The input string matched no known change-hosting platform.
    #[error("unrecognized change reference: {0}")]
    UnrecognizedReference(String),

    /// A network retrieval (diff or comments) failed.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// The repository could not be cloned or updated.
    #[error("repository unavailable: {0}")]
    Repository(String),

    /// A git subprocess failed.
    #[error("git error: {0}")]
    Git(String),

    /// The analysis agent could not be invoked, failed, or timed out.
    #[error("analysis agent error: {0}")]
    Agent(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
