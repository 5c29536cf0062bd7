use std::path::{Path, PathBuf};

use patchlens_core::{ChangeDescriptor, PatchlensError, WorkingCopy};

use crate::git::git;

/// Ensures a local working copy of the target repository exists and is
/// current.
///
/// Working copies live at `{base_dir}/{owner}/{repo}`. A missing copy is
/// cloned in full; an existing one gets its default branch fetched. No
/// working-tree resets happen here: destructive cleanup belongs to the
/// patch applier, which owns branch-creation semantics.
pub struct RepositoryManager {
    base_dir: PathBuf,
}

impl RepositoryManager {
    /// Create a manager rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Clone or update the repository for `descriptor`.
    ///
    /// A failed fetch on an existing copy is a warning, not an error; a
    /// failed clone is fatal because nothing downstream can proceed without
    /// a checkout.
    ///
    /// # Errors
    ///
    /// Returns [`PatchlensError::Repository`] when the clone fails or the
    /// target directory cannot be created.
    pub async fn ensure(&self, descriptor: &ChangeDescriptor) -> Result<WorkingCopy, PatchlensError> {
        let change = &descriptor.change;
        let path = self.base_dir.join(change.owner()).join(change.repo());

        if path.join(".git").exists() {
            eprintln!("Repository already exists at: {}", path.display());
            let default_branch = default_branch(&path).await;
            eprintln!("Updating {default_branch} from origin...");
            match git(&path, &["fetch", "origin", default_branch.as_str()]).await {
                Ok(_) => eprintln!("Repository updated successfully"),
                Err(e) => eprintln!("Warning: failed to update repository: {e}"),
            }
            return Ok(WorkingCopy {
                path,
                default_branch,
            });
        }

        let clone_url = change.clone_url();
        eprintln!("Cloning {clone_url} into {}", path.display());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PatchlensError::Repository(format!(
                    "failed to create {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let target = path.to_string_lossy().into_owned();
        git(&self.base_dir, &["clone", clone_url.as_str(), target.as_str()])
            .await
            .map_err(|e| {
                PatchlensError::Repository(format!("failed to clone {clone_url}: {e}"))
            })?;

        let default_branch = default_branch(&path).await;
        Ok(WorkingCopy {
            path,
            default_branch,
        })
    }
}

/// Determine the remote's default branch name for the checkout at `path`.
///
/// Queries the remote-tracking symbolic HEAD first, then scans remote
/// branches for the conventional names, and finally falls back to `main`.
pub async fn default_branch(path: &Path) -> String {
    if let Ok(head) = git(path, &["symbolic-ref", "refs/remotes/origin/HEAD"]).await {
        if let Some(name) = head.rsplit('/').next() {
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }

    if let Ok(branches) = git(path, &["branch", "-r"]).await {
        if branches.contains("origin/main") {
            return "main".into();
        }
        if branches.contains("origin/master") {
            return "master".into();
        }
    }

    "main".into()
}
