use patchlens_core::{ChangeDescriptor, ChangeRef, PatchlensError};
use url::Url;

/// Classify a raw reference string into exactly one [`ChangeDescriptor`].
///
/// Recognized forms:
/// - `https://github.com/{owner}/{repo}/pull/{number}`
/// - `https://github.com/{owner}/{repo}/commit/{sha}`
/// - `https://{mozilla phabricator host}/D{id}`
///
/// A trailing `.git` on the repository segment is stripped; query strings and
/// fragments are dropped from the canonical URL. Differential URLs carry no
/// repository coordinates, so those descriptors map to the fixed default
/// repository (see [`patchlens_core::DIFFERENTIAL_OWNER`]).
///
/// # Errors
///
/// Returns [`PatchlensError::UnrecognizedReference`] for anything else,
/// never a silently-wrong descriptor.
///
/// # Examples
///
/// ```
/// use patchlens_core::ChangeRef;
/// use patchlens_source::locate;
///
/// let descriptor = locate("https://github.com/acme/widgets/pull/42").unwrap();
/// assert!(matches!(descriptor.change, ChangeRef::PullRequest { number: 42, .. }));
/// assert_eq!(descriptor.url, "https://github.com/acme/widgets/pull/42");
/// ```
pub fn locate(reference: &str) -> Result<ChangeDescriptor, PatchlensError> {
    let unrecognized = || PatchlensError::UnrecognizedReference(reference.to_string());

    let parsed = Url::parse(reference).map_err(|_| unrecognized())?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(unrecognized());
    }
    let host = parsed.host_str().ok_or_else(unrecognized)?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();

    if host == "github.com" || host == "www.github.com" {
        return locate_github(&segments).ok_or_else(unrecognized);
    }

    if host.contains("phabricator") && host.contains("mozilla") {
        if let [revision] = segments.as_slice() {
            if let Some(id) = revision
                .strip_prefix('D')
                .and_then(|digits| digits.parse::<u64>().ok())
            {
                let base = format!("{}://{host}", parsed.scheme());
                return Ok(ChangeDescriptor {
                    url: format!("{base}/D{id}"),
                    change: ChangeRef::Differential { id, base },
                });
            }
        }
        return Err(unrecognized());
    }

    Err(unrecognized())
}

fn locate_github(segments: &[&str]) -> Option<ChangeDescriptor> {
    let [owner, repo, kind, id, ..] = segments else {
        return None;
    };
    let owner = owner.to_string();
    let repo = repo.trim_end_matches(".git").to_string();
    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    match *kind {
        "pull" => {
            let number: u64 = id.parse().ok()?;
            Some(ChangeDescriptor {
                url: format!("https://github.com/{owner}/{repo}/pull/{number}"),
                change: ChangeRef::PullRequest {
                    owner,
                    repo,
                    number,
                },
            })
        }
        "commit" => {
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_hexdigit()) {
                return None;
            }
            let sha = id.to_lowercase();
            Some(ChangeDescriptor {
                url: format!("https://github.com/{owner}/{repo}/commit/{sha}"),
                change: ChangeRef::Commit { owner, repo, sha },
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_pull_request() {
        let descriptor = locate("https://github.com/acme/widgets/pull/42").unwrap();
        assert_eq!(
            descriptor.change,
            ChangeRef::PullRequest {
                owner: "acme".into(),
                repo: "widgets".into(),
                number: 42,
            }
        );
        assert_eq!(descriptor.url, "https://github.com/acme/widgets/pull/42");
    }

    #[test]
    fn recognizes_pull_request_with_query_and_fragment() {
        let descriptor =
            locate("https://github.com/acme/widgets/pull/42?diff=split#discussion_r1").unwrap();
        assert_eq!(descriptor.url, "https://github.com/acme/widgets/pull/42");
    }

    #[test]
    fn recognizes_pull_request_files_tab() {
        let descriptor = locate("https://github.com/acme/widgets/pull/42/files").unwrap();
        assert!(matches!(
            descriptor.change,
            ChangeRef::PullRequest { number: 42, .. }
        ));
    }

    #[test]
    fn recognizes_commit() {
        let descriptor =
            locate("https://github.com/acme/widgets/commit/deadbeefcafe").unwrap();
        assert_eq!(
            descriptor.change,
            ChangeRef::Commit {
                owner: "acme".into(),
                repo: "widgets".into(),
                sha: "deadbeefcafe".into(),
            }
        );
    }

    #[test]
    fn strips_git_suffix_from_repo() {
        let descriptor = locate("https://github.com/acme/widgets.git/pull/7").unwrap();
        assert_eq!(descriptor.change.repo(), "widgets");
    }

    #[test]
    fn recognizes_differential() {
        let descriptor =
            locate("https://phabricator.services.mozilla.com/D123456").unwrap();
        assert_eq!(
            descriptor.change,
            ChangeRef::Differential {
                id: 123456,
                base: "https://phabricator.services.mozilla.com".into(),
            }
        );
        assert_eq!(
            descriptor.url,
            "https://phabricator.services.mozilla.com/D123456"
        );
    }

    #[test]
    fn rejects_non_integer_pull_number() {
        assert!(locate("https://github.com/acme/widgets/pull/abc").is_err());
    }

    #[test]
    fn rejects_non_hex_commit() {
        assert!(locate("https://github.com/acme/widgets/commit/zzz999").is_err());
    }

    #[test]
    fn rejects_bare_repository_url() {
        assert!(locate("https://github.com/acme/widgets").is_err());
    }

    #[test]
    fn rejects_unknown_host() {
        assert!(locate("https://example.com/acme/widgets/pull/42").is_err());
    }

    #[test]
    fn rejects_non_mozilla_phabricator() {
        assert!(locate("https://phabricator.example.com/D42").is_err());
    }

    #[test]
    fn rejects_non_url_input() {
        let err = locate("not a url at all").unwrap_err();
        assert!(matches!(err, PatchlensError::UnrecognizedReference(_)));
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(locate("ftp://github.com/acme/widgets/pull/42").is_err());
    }
}
