use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Owner used for differentials, whose URLs carry no repository coordinates.
///
/// Phabricator differential URLs identify only the revision, so the working
/// copy is mapped to a fixed repository. This is a documented limitation, not
/// an inference.
pub const DIFFERENTIAL_OWNER: &str = "mozilla-firefox";

/// Repository used for differentials. See [`DIFFERENTIAL_OWNER`].
pub const DIFFERENTIAL_REPO: &str = "firefox";

/// A reviewable code change on a known hosting platform.
///
/// # Examples
///
/// ```
/// use patchlens_core::ChangeRef;
///
/// let change = ChangeRef::PullRequest {
///     owner: "acme".into(),
///     repo: "widgets".into(),
///     number: 42,
/// };
/// assert_eq!(change.owner(), "acme");
/// assert_eq!(change.slug(), "acme-widgets-pr-42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeRef {
    /// A hosted pull request.
    PullRequest {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
        /// Pull request number.
        number: u64,
    },
    /// A single hosted commit.
    Commit {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
        /// Commit hash (full or abbreviated).
        sha: String,
    },
    /// A Phabricator differential revision.
    Differential {
        /// Revision id (the number after `D`).
        id: u64,
        /// Scheme + host of the review service, e.g.
        /// `https://phabricator.services.mozilla.com`.
        base: String,
    },
}

impl ChangeRef {
    /// Owner of the repository the change targets.
    pub fn owner(&self) -> &str {
        match self {
            ChangeRef::PullRequest { owner, .. } | ChangeRef::Commit { owner, .. } => owner,
            ChangeRef::Differential { .. } => DIFFERENTIAL_OWNER,
        }
    }

    /// Name of the repository the change targets.
    pub fn repo(&self) -> &str {
        match self {
            ChangeRef::PullRequest { repo, .. } | ChangeRef::Commit { repo, .. } => repo,
            ChangeRef::Differential { .. } => DIFFERENTIAL_REPO,
        }
    }

    /// HTTPS clone URL for the target repository.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchlens_core::ChangeRef;
    ///
    /// let change = ChangeRef::Commit {
    ///     owner: "acme".into(),
    ///     repo: "widgets".into(),
    ///     sha: "deadbeef".into(),
    /// };
    /// assert_eq!(change.clone_url(), "https://github.com/acme/widgets.git");
    /// ```
    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner(), self.repo())
    }

    /// A stable filesystem-safe identifier for this change.
    ///
    /// Used to name saved-review files so repeat runs against the same change
    /// find their previous output.
    pub fn slug(&self) -> String {
        match self {
            ChangeRef::PullRequest {
                owner,
                repo,
                number,
            } => format!("{owner}-{repo}-pr-{number}"),
            ChangeRef::Commit { owner, repo, sha } => {
                let short = &sha[..sha.len().min(8)];
                format!("{owner}-{repo}-commit-{short}")
            }
            ChangeRef::Differential { id, .. } => {
                format!("{DIFFERENTIAL_OWNER}-{DIFFERENTIAL_REPO}-phab-D{id}")
            }
        }
    }
}

/// A resolved change reference plus its canonical URL.
///
/// Immutable once resolved; consumed by every downstream component.
///
/// # Examples
///
/// ```
/// use patchlens_core::{ChangeDescriptor, ChangeRef};
///
/// let descriptor = ChangeDescriptor {
///     change: ChangeRef::PullRequest {
///         owner: "acme".into(),
///         repo: "widgets".into(),
///         number: 42,
///     },
///     url: "https://github.com/acme/widgets/pull/42".into(),
/// };
/// assert_eq!(descriptor.change.repo(), "widgets");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeDescriptor {
    /// The classified change.
    pub change: ChangeRef,
    /// Canonical URL, normalized from the raw input (query and fragment
    /// stripped).
    pub url: String,
}

/// Result of fetching the literal diff text for a change.
///
/// Retrieval failure is a degraded state, not an error: downstream components
/// treat [`PatchText::Unavailable`] as "no patch content available" and adjust
/// behavior rather than aborting the run.
///
/// # Examples
///
/// ```
/// use patchlens_core::PatchText;
///
/// let patch = PatchText::Fetched("diff --git a/x b/x".into());
/// assert!(patch.is_fetched());
/// assert_eq!(patch.content(), Some("diff --git a/x b/x"));
///
/// let missing = PatchText::Unavailable("HTTP 404".into());
/// assert_eq!(missing.content(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchText {
    /// Raw unified diff text.
    Fetched(String),
    /// Retrieval failed; carries a human-readable reason.
    Unavailable(String),
}

impl PatchText {
    /// Returns `true` if diff text was retrieved.
    pub fn is_fetched(&self) -> bool {
        matches!(self, PatchText::Fetched(_))
    }

    /// The diff text, if retrieval succeeded.
    pub fn content(&self) -> Option<&str> {
        match self {
            PatchText::Fetched(text) => Some(text),
            PatchText::Unavailable(_) => None,
        }
    }

    /// The failure reason, if retrieval failed.
    pub fn reason(&self) -> Option<&str> {
        match self {
            PatchText::Fetched(_) => None,
            PatchText::Unavailable(reason) => Some(reason),
        }
    }
}

/// Kind of pre-existing review feedback attached to a change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentKind {
    /// Inline code comment anchored to a file and line.
    Inline,
    /// General discussion comment on the change.
    General,
    /// A reviewer's overall disposition (approve, request changes, ...).
    Verdict {
        /// The disposition reported by the platform, e.g. `APPROVED`.
        state: String,
    },
}

/// File and line a comment is anchored to, when the platform reports one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentLocation {
    /// Path of the commented file, relative to the repository root.
    pub path: String,
    /// Line number in the new version, if known.
    pub line: Option<u64>,
}

/// One normalized item of pre-existing review feedback.
///
/// The `Display` impl is the formatting contract for the prompt: it always
/// carries author attribution and, when available, the `file:line` location.
/// This is the only context the analysis agent has about prior human
/// judgment on the change.
///
/// # Examples
///
/// ```
/// use patchlens_core::{CommentEntry, CommentKind, CommentLocation};
///
/// let entry = CommentEntry {
///     author: "alice".into(),
///     location: Some(CommentLocation { path: "src/lib.rs".into(), line: Some(7) }),
///     body: "off-by-one here".into(),
///     kind: CommentKind::Inline,
/// };
/// let text = entry.to_string();
/// assert!(text.contains("alice"));
/// assert!(text.contains("src/lib.rs:7"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEntry {
    /// Login of the comment author, or `"Unknown"`.
    pub author: String,
    /// Anchor location for inline comments.
    pub location: Option<CommentLocation>,
    /// Comment text.
    pub body: String,
    /// What kind of feedback this is.
    pub kind: CommentKind,
}

impl fmt::Display for CommentEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CommentKind::Inline => match &self.location {
                Some(loc) => {
                    let line = loc
                        .line
                        .map(|l| l.to_string())
                        .unwrap_or_else(|| "N/A".into());
                    write!(
                        f,
                        "Review comment by {} on {}:{line}\n{}",
                        self.author, loc.path, self.body
                    )
                }
                None => write!(f, "Review comment by {}\n{}", self.author, self.body),
            },
            CommentKind::General => {
                write!(f, "General comment by {}\n{}", self.author, self.body)
            }
            CommentKind::Verdict { state } => {
                write!(f, "Review by {} ({state})\n{}", self.author, self.body)
            }
        }
    }
}

/// A local clone of the target repository.
///
/// The repository manager is the sole creator; the patch applier is the only
/// component that mutates its branch pointer and working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopy {
    /// Absolute path of the checkout.
    pub path: PathBuf,
    /// Name of the remote's default branch, e.g. `main`.
    pub default_branch: String,
}

/// One tolerance level for mapping diff hunks onto the working copy.
///
/// # Examples
///
/// ```
/// use patchlens_core::ApplyStrategy;
///
/// assert_eq!(ApplyStrategy::Strict.to_string(), "strict");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStrategy {
    /// Three-way merge apply; best conflict resolution, may partially merge.
    ThreeWay,
    /// Plain apply, no fuzzing.
    Strict,
    /// Accepts hunks that differ only in whitespace.
    WhitespaceFix,
}

impl fmt::Display for ApplyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyStrategy::ThreeWay => write!(f, "3way"),
            ApplyStrategy::Strict => write!(f, "strict"),
            ApplyStrategy::WhitespaceFix => write!(f, "whitespace"),
        }
    }
}

/// Terminal outcome of the apply strategy sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A strategy succeeded; records which one.
    Applied(ApplyStrategy),
    /// Every strategy failed.
    Failed {
        /// Human-readable conflict details and per-file statistics.
        diagnostics: String,
    },
}

impl ApplyOutcome {
    /// Returns `true` if any strategy succeeded.
    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied(_))
    }
}

/// Result of one apply attempt against the working copy.
///
/// Created once per run; never retried beyond the fixed strategy sequence.
/// The branch exists even when the outcome is a failure, so a human can
/// inspect or clean it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// What happened.
    pub outcome: ApplyOutcome,
    /// Name of the branch created for this run.
    pub branch: String,
}

/// Severity scale the analysis agent must use for per-finding lines.
///
/// Ordered least to most severe. The variants are spelled out verbatim in the
/// prompt's required-output-shape section.
///
/// # Examples
///
/// ```
/// use patchlens_core::FindingSeverity;
///
/// assert_eq!(FindingSeverity::High.to_string(), "HIGH");
/// assert_eq!(FindingSeverity::ALL.len(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingSeverity {
    /// Style nit or trivial polish.
    Pedantic,
    /// Minor issue.
    Low,
    /// Issue worth fixing before merge.
    Medium,
    /// Likely bug or serious defect.
    High,
}

impl FindingSeverity {
    /// All levels, least to most severe.
    pub const ALL: [FindingSeverity; 4] = [
        FindingSeverity::Pedantic,
        FindingSeverity::Low,
        FindingSeverity::Medium,
        FindingSeverity::High,
    ];
}

impl fmt::Display for FindingSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingSeverity::Pedantic => write!(f, "PEDANTIC"),
            FindingSeverity::Low => write!(f, "LOW"),
            FindingSeverity::Medium => write!(f, "MEDIUM"),
            FindingSeverity::High => write!(f, "HIGH"),
        }
    }
}
