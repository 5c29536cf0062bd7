use std::time::Duration;

use patchlens_core::{
    ChangeDescriptor, ChangeRef, CommentEntry, CommentKind, CommentLocation, PatchlensError,
};
use serde::Deserialize;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "patchlens";
const API_ROOT: &str = "https://api.github.com";

/// Collects pre-existing review feedback for a change.
///
/// Retrieval never raises: any failing sub-source contributes zero entries
/// and the aggregate still returns whatever succeeded.
pub struct CommentAggregator {
    http: reqwest::Client,
    token: Option<String>,
}

impl CommentAggregator {
    /// Create an aggregator.
    ///
    /// `token` is optional; when present it is sent as a bearer token to
    /// raise API rate limits.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Retrieval`] if the HTTP client cannot be
    /// built.
    pub fn new(token: Option<String>) -> Result<Self, PatchlensError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| PatchlensError::Retrieval(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http, token })
    }

    /// Retrieve all feedback attached to `descriptor`, in fixed order.
    ///
    /// Pull requests aggregate three independent sub-sources (inline review
    /// comments, general comments, review verdicts), issued concurrently but
    /// always concatenated in that order. Commits have a single comment
    /// source. Differentials are not queried: a synthetic entry documents the
    /// gap so the caller still renders a deterministic "no comments" section.
    pub async fn collect(&self, descriptor: &ChangeDescriptor) -> Vec<CommentEntry> {
        match &descriptor.change {
            ChangeRef::PullRequest {
                owner,
                repo,
                number,
            } => {
                let (inline, general, verdicts) = tokio::join!(
                    self.pull_inline_comments(owner, repo, *number),
                    self.pull_general_comments(owner, repo, *number),
                    self.pull_verdicts(owner, repo, *number),
                );
                inline.into_iter().chain(general).chain(verdicts).collect()
            }
            ChangeRef::Commit { owner, repo, sha } => {
                self.commit_comments(owner, repo, sha).await
            }
            ChangeRef::Differential { .. } => vec![unsupported_platform_entry()],
        }
    }

    async fn pull_inline_comments(&self, owner: &str, repo: &str, number: u64) -> Vec<CommentEntry> {
        let url = format!("{API_ROOT}/repos/{owner}/{repo}/pulls/{number}/comments?per_page=100");
        match self.get_json::<Vec<InlineCommentDto>>(&url).await {
            Ok(comments) => comments.into_iter().map(inline_entry).collect(),
            Err(reason) => warn_and_skip("inline review comments", &reason),
        }
    }

    async fn pull_general_comments(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Vec<CommentEntry> {
        let url = format!("{API_ROOT}/repos/{owner}/{repo}/issues/{number}/comments?per_page=100");
        match self.get_json::<Vec<IssueCommentDto>>(&url).await {
            Ok(comments) => comments.into_iter().map(general_entry).collect(),
            Err(reason) => warn_and_skip("general comments", &reason),
        }
    }

    async fn pull_verdicts(&self, owner: &str, repo: &str, number: u64) -> Vec<CommentEntry> {
        let url = format!("{API_ROOT}/repos/{owner}/{repo}/pulls/{number}/reviews?per_page=100");
        match self.get_json::<Vec<ReviewDto>>(&url).await {
            Ok(reviews) => reviews.into_iter().filter_map(verdict_entry).collect(),
            Err(reason) => warn_and_skip("review verdicts", &reason),
        }
    }

    async fn commit_comments(&self, owner: &str, repo: &str, sha: &str) -> Vec<CommentEntry> {
        let url = format!("{API_ROOT}/repos/{owner}/{repo}/commits/{sha}/comments?per_page=100");
        match self.get_json::<Vec<InlineCommentDto>>(&url).await {
            Ok(comments) => comments.into_iter().map(inline_entry).collect(),
            Err(reason) => warn_and_skip("commit comments", &reason),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, String> {
        let mut request = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| format!("request to {url} failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("{url} returned HTTP {status}"));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| format!("failed to decode response from {url}: {e}"))
    }
}

fn warn_and_skip(what: &str, reason: &str) -> Vec<CommentEntry> {
    eprintln!("Warning: failed to fetch {what}: {reason}");
    Vec::new()
}

/// The deterministic placeholder entry for platforms without comment
/// retrieval, so the "no comments" case renders instead of vanishing.
pub fn unsupported_platform_entry() -> CommentEntry {
    CommentEntry {
        author: "patchlens".into(),
        location: None,
        body: "Review-context retrieval is not supported for this platform; \
               no existing feedback was collected."
            .into(),
        kind: CommentKind::General,
    }
}

#[derive(Deserialize)]
struct UserDto {
    login: Option<String>,
}

#[derive(Deserialize)]
struct InlineCommentDto {
    user: Option<UserDto>,
    body: Option<String>,
    path: Option<String>,
    line: Option<u64>,
}

#[derive(Deserialize)]
struct IssueCommentDto {
    user: Option<UserDto>,
    body: Option<String>,
}

#[derive(Deserialize)]
struct ReviewDto {
    user: Option<UserDto>,
    state: Option<String>,
    body: Option<String>,
}

fn author(user: Option<UserDto>) -> String {
    user.and_then(|u| u.login).unwrap_or_else(|| "Unknown".into())
}

fn inline_entry(dto: InlineCommentDto) -> CommentEntry {
    CommentEntry {
        author: author(dto.user),
        location: dto.path.map(|path| CommentLocation {
            path,
            line: dto.line,
        }),
        body: dto.body.unwrap_or_default(),
        kind: CommentKind::Inline,
    }
}

fn general_entry(dto: IssueCommentDto) -> CommentEntry {
    CommentEntry {
        author: author(dto.user),
        location: None,
        body: dto.body.unwrap_or_default(),
        kind: CommentKind::General,
    }
}

// Verdicts without text are noise (every inline comment also produces an
// implicit COMMENTED review), so bodyless reviews are dropped.
fn verdict_entry(dto: ReviewDto) -> Option<CommentEntry> {
    let body = dto.body.filter(|b| !b.trim().is_empty())?;
    Some(CommentEntry {
        author: author(dto.user),
        location: None,
        body,
        kind: CommentKind::Verdict {
            state: dto.state.unwrap_or_else(|| "COMMENTED".into()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchlens_core::ChangeRef;

    #[test]
    fn inline_entry_carries_location() {
        let dto = InlineCommentDto {
            user: Some(UserDto {
                login: Some("alice".into()),
            }),
            body: Some("rename this".into()),
            path: Some("src/lib.rs".into()),
            line: Some(14),
        };
        let entry = inline_entry(dto);
        assert_eq!(entry.author, "alice");
        assert_eq!(entry.kind, CommentKind::Inline);
        let location = entry.location.unwrap();
        assert_eq!(location.path, "src/lib.rs");
        assert_eq!(location.line, Some(14));
    }

    #[test]
    fn missing_user_becomes_unknown() {
        let dto = IssueCommentDto {
            user: None,
            body: Some("drive-by comment".into()),
        };
        let entry = general_entry(dto);
        assert_eq!(entry.author, "Unknown");
    }

    #[test]
    fn bodyless_verdict_is_dropped() {
        let dto = ReviewDto {
            user: Some(UserDto {
                login: Some("bob".into()),
            }),
            state: Some("APPROVED".into()),
            body: Some("   ".into()),
        };
        assert!(verdict_entry(dto).is_none());
    }

    #[test]
    fn verdict_keeps_state() {
        let dto = ReviewDto {
            user: Some(UserDto {
                login: Some("bob".into()),
            }),
            state: Some("CHANGES_REQUESTED".into()),
            body: Some("please add tests".into()),
        };
        let entry = verdict_entry(dto).unwrap();
        assert_eq!(
            entry.kind,
            CommentKind::Verdict {
                state: "CHANGES_REQUESTED".into()
            }
        );
    }

    #[test]
    fn unsupported_entry_is_informational() {
        let entry = unsupported_platform_entry();
        assert_eq!(entry.kind, CommentKind::General);
        assert!(entry.body.contains("not supported"));
    }

    #[tokio::test]
    async fn differential_collect_returns_single_synthetic_entry() {
        let aggregator = CommentAggregator::new(None).unwrap();
        let descriptor = ChangeDescriptor {
            change: ChangeRef::Differential {
                id: 7,
                base: "https://phabricator.services.mozilla.com".into(),
            },
            url: "https://phabricator.services.mozilla.com/D7".into(),
        };
        let entries = aggregator.collect(&descriptor).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0], unsupported_platform_entry());
    }
}
