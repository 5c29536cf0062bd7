use patchlens_core::{ApplyOutcome, ApplyReport, ApplyStrategy, PatchlensError, WorkingCopy};

use crate::git::{git, git_capture, git_ok};

/// Prefix for per-run review branches.
pub const BRANCH_PREFIX: &str = "patch-review-";

/// The deterministic branch name for this process.
///
/// The process id disambiguates concurrent runs against the same working
/// copy and makes leftover branches trivially identifiable for manual
/// cleanup.
///
/// # Examples
///
/// ```
/// use patchlens_workcopy::run_branch_name;
///
/// assert!(run_branch_name().starts_with("patch-review-"));
/// ```
pub fn run_branch_name() -> String {
    format!("{BRANCH_PREFIX}{}", std::process::id())
}

/// Ordered strategy sequence, attempted left to right with early exit on
/// success. Adding a strategy is a data change, not new control flow.
const STRATEGIES: [(ApplyStrategy, &[&str]); 3] = [
    (ApplyStrategy::ThreeWay, &["apply", "--3way", "-"]),
    (ApplyStrategy::Strict, &["apply", "-"]),
    (ApplyStrategy::WhitespaceFix, &["apply", "--whitespace=fix", "-"]),
];

/// Materializes a patch onto a fresh branch of the working copy.
///
/// The applier is the only component that mutates branch pointers and
/// tracked file contents. Each run gets its own branch; runs sharing a
/// branch name are out of contract.
pub struct PatchApplier<'a> {
    workcopy: &'a WorkingCopy,
}

impl<'a> PatchApplier<'a> {
    /// Create an applier for `workcopy`.
    pub fn new(workcopy: &'a WorkingCopy) -> Self {
        Self { workcopy }
    }

    /// Apply `patch` through the fixed strategy sequence.
    ///
    /// Never fails the run: any git failure along the way, including all
    /// three strategies failing, produces [`ApplyOutcome::Failed`] with
    /// human-readable diagnostics. When branch preparation succeeded the
    /// branch exists even on failure, so the working copy can still be
    /// inspected.
    pub async fn apply(&self, patch: &str) -> ApplyReport {
        let branch = run_branch_name();

        if let Err(e) = self.prepare_branch(&branch).await {
            return ApplyReport {
                outcome: ApplyOutcome::Failed {
                    diagnostics: format!("failed to prepare branch {branch}: {e}"),
                },
                branch,
            };
        }

        for (strategy, args) in STRATEGIES {
            match git_capture(&self.workcopy.path, args, Some(patch)).await {
                Ok(output) if output.success() => {
                    eprintln!("Patch applied with the {strategy} strategy");
                    return ApplyReport {
                        outcome: ApplyOutcome::Applied(strategy),
                        branch,
                    };
                }
                Ok(_) => eprintln!("{strategy} apply failed"),
                Err(e) => eprintln!("{strategy} apply could not run: {e}"),
            }
            // A failed attempt must not leave partial hunks behind for the
            // next strategy.
            self.discard_unstaged().await;
        }

        eprintln!("All apply strategies failed, collecting conflict details...");
        let diagnostics = self.failure_diagnostics(patch).await;
        ApplyReport {
            outcome: ApplyOutcome::Failed { diagnostics },
            branch,
        }
    }

    /// Reset to a clean tree, sync the default branch, and check out the
    /// fresh per-run branch.
    async fn prepare_branch(&self, branch: &str) -> Result<(), PatchlensError> {
        let path = &self.workcopy.path;
        let default_branch = &self.workcopy.default_branch;

        self.clean_tree().await?;

        git(path, &["checkout", default_branch.as_str()]).await?;
        if let Err(e) = git(path, &["pull", "origin", default_branch.as_str()]).await {
            eprintln!("Warning: failed to pull {default_branch}: {e}");
        }

        git(path, &["checkout", "-b", branch]).await?;
        Ok(())
    }

    /// Stash (or, failing that, hard-reset) any uncommitted local changes.
    async fn clean_tree(&self) -> Result<(), PatchlensError> {
        let path = &self.workcopy.path;
        let status = git(path, &["status", "--porcelain"]).await?;
        if status.is_empty() {
            return Ok(());
        }

        eprintln!("Found uncommitted changes, stashing them...");
        if git_ok(
            path,
            &["stash", "push", "-u", "-m", "patchlens pre-apply stash"],
        )
        .await
        {
            return Ok(());
        }

        eprintln!("Failed to stash changes, hard-resetting the tree...");
        git(path, &["reset", "--hard", "HEAD"]).await?;
        git(path, &["clean", "-fd"]).await?;
        Ok(())
    }

    async fn discard_unstaged(&self) {
        let path = &self.workcopy.path;
        if !git_ok(path, &["reset", "--hard", "HEAD"]).await {
            eprintln!("Warning: failed to reset tree between apply attempts");
        }
        if !git_ok(path, &["clean", "-fd"]).await {
            eprintln!("Warning: failed to clean tree between apply attempts");
        }
    }

    /// Non-mutating conflict report: `git apply --check` stderr plus the
    /// per-file `--stat` summary.
    async fn failure_diagnostics(&self, patch: &str) -> String {
        let path = &self.workcopy.path;
        let mut diagnostics = String::new();

        if let Ok(check) = git_capture(path, &["apply", "--check", "-"], Some(patch)).await {
            let details = check.stderr.trim();
            if !details.is_empty() {
                diagnostics.push_str(details);
            }
        }

        if let Ok(stat) = git_capture(path, &["apply", "--stat", "-"], Some(patch)).await {
            let summary = stat.stdout.trim();
            if stat.success() && !summary.is_empty() {
                if !diagnostics.is_empty() {
                    diagnostics.push_str("\n\n");
                }
                diagnostics.push_str("Patch summary:\n");
                diagnostics.push_str(summary);
            }
        }

        if diagnostics.trim().is_empty() {
            "git apply produced no diagnostics; the patch may be empty or malformed".into()
        } else {
            diagnostics
        }
    }
}
