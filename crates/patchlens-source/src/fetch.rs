use std::time::Duration;

use patchlens_core::{ChangeDescriptor, ChangeRef, PatchText, PatchlensError};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "patchlens";

/// Downloads the literal diff text for a change.
///
/// Fetches the platform's plain-diff representation rather than the full API
/// payload: the minimal textual diff keeps prompt size bounded and avoids
/// merge-commit metadata noise.
pub struct PatchFetcher {
    http: reqwest::Client,
}

impl PatchFetcher {
    /// Create a fetcher with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Retrieval`] if the HTTP client cannot be
    /// built.
    pub fn new() -> Result<Self, PatchlensError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| PatchlensError::Retrieval(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// The raw-diff URL for a change.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchlens_source::{locate, PatchFetcher};
    ///
    /// let descriptor = locate("https://github.com/acme/widgets/pull/42").unwrap();
    /// assert_eq!(
    ///     PatchFetcher::diff_url(&descriptor),
    ///     "https://github.com/acme/widgets/pull/42.diff"
    /// );
    /// ```
    pub fn diff_url(descriptor: &ChangeDescriptor) -> String {
        match &descriptor.change {
            ChangeRef::PullRequest {
                owner,
                repo,
                number,
            } => format!("https://github.com/{owner}/{repo}/pull/{number}.diff"),
            ChangeRef::Commit { owner, repo, sha } => {
                format!("https://github.com/{owner}/{repo}/commit/{sha}.diff")
            }
            ChangeRef::Differential { id, base } => format!("{base}/D{id}?download=true"),
        }
    }

    /// Fetch the diff for `descriptor`.
    ///
    /// Never fails the run: network errors, non-success statuses, and empty
    /// bodies all degrade to [`PatchText::Unavailable`] with a diagnostic
    /// string.
    pub async fn fetch(&self, descriptor: &ChangeDescriptor) -> PatchText {
        let url = Self::diff_url(descriptor);
        match self.fetch_inner(&url).await {
            Ok(text) => PatchText::Fetched(text),
            Err(reason) => PatchText::Unavailable(reason),
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<String, String> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| format!("failed to fetch {url}: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("diff download from {url} returned HTTP {status}"));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read diff body from {url}: {e}"))?;

        if body.trim().is_empty() {
            return Err(format!("diff download from {url} returned an empty body"));
        }

        Ok(body)
    }
}
