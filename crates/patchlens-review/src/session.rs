use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use patchlens_core::{ChangeDescriptor, PatchlensError};

/// A previously saved analysis of the same change.
pub struct SavedReview {
    /// The saved text, including its header.
    pub content: String,
    /// When the file was last written.
    pub saved_at: DateTime<Local>,
}

/// Persists one analysis per change under a `reviews/` directory.
///
/// Filenames derive from the change's stable slug, so a repeat run against
/// the same pull request, commit, or differential finds its previous output
/// and can ask the agent to compare.
pub struct ReviewStore {
    root: PathBuf,
}

impl ReviewStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The conventional store: `reviews/` under the invocation directory.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Io`] if the current directory cannot be
    /// determined.
    pub fn in_current_dir() -> Result<Self, PatchlensError> {
        Ok(Self::new(std::env::current_dir()?.join("reviews")))
    }

    /// The file a review of `descriptor` is stored at.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchlens_core::{ChangeDescriptor, ChangeRef};
    /// use patchlens_review::ReviewStore;
    ///
    /// let store = ReviewStore::new("/tmp/reviews");
    /// let descriptor = ChangeDescriptor {
    ///     change: ChangeRef::PullRequest {
    ///         owner: "acme".into(),
    ///         repo: "widgets".into(),
    ///         number: 42,
    ///     },
    ///     url: "https://github.com/acme/widgets/pull/42".into(),
    /// };
    /// let path = store.review_path(&descriptor);
    /// assert!(path.ends_with("acme-widgets-pr-42-latest.txt"));
    /// ```
    pub fn review_path(&self, descriptor: &ChangeDescriptor) -> PathBuf {
        self.root
            .join(format!("{}-latest.txt", descriptor.change.slug()))
    }

    /// Load the previous review of `descriptor`, if one was saved.
    ///
    /// Any read failure is treated as "no previous review".
    pub fn load_previous(&self, descriptor: &ChangeDescriptor) -> Option<SavedReview> {
        let path = self.review_path(descriptor);
        let content = std::fs::read_to_string(&path).ok()?;
        let saved_at = std::fs::metadata(&path)
            .ok()
            .and_then(|m| m.modified().ok())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(Local::now);
        Some(SavedReview { content, saved_at })
    }

    /// Save `output` as the latest review of `descriptor`.
    ///
    /// A timestamp and the change URL are prepended so the file is
    /// self-describing when read later.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Io`] if the directory or file cannot be
    /// written.
    pub fn save(
        &self,
        descriptor: &ChangeDescriptor,
        output: &str,
    ) -> Result<PathBuf, PatchlensError> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.review_path(descriptor);
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let rule = "=".repeat(80);
        let content = format!(
            "Review generated: {timestamp}\nPatch URL: {}\n\n{rule}\n\n{output}",
            descriptor.url
        );
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use patchlens_core::ChangeRef;

    fn descriptor() -> ChangeDescriptor {
        ChangeDescriptor {
            change: ChangeRef::PullRequest {
                owner: "acme".into(),
                repo: "widgets".into(),
                number: 42,
            },
            url: "https://github.com/acme/widgets/pull/42".into(),
        }
    }

    #[test]
    fn missing_review_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::new(dir.path());
        assert!(store.load_previous(&descriptor()).is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::new(dir.path().join("reviews"));
        let descriptor = descriptor();

        let path = store.save(&descriptor, "the analysis body").unwrap();
        assert!(path.ends_with("acme-widgets-pr-42-latest.txt"));

        let saved = store.load_previous(&descriptor).unwrap();
        assert!(saved.content.contains("the analysis body"));
        assert!(saved.content.contains("Review generated:"));
        assert!(saved
            .content
            .contains("Patch URL: https://github.com/acme/widgets/pull/42"));
    }

    #[test]
    fn saving_twice_overwrites_the_latest_review() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReviewStore::new(dir.path());
        let descriptor = descriptor();

        store.save(&descriptor, "first").unwrap();
        store.save(&descriptor, "second").unwrap();

        let saved = store.load_previous(&descriptor).unwrap();
        assert!(saved.content.contains("second"));
        assert!(!saved.content.contains("first"));
    }
}
