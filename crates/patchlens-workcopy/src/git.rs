//! Git subprocess runner.
//!
//! Every version-control operation shells out to `git`; exit status and
//! stderr are the only failure signal.

use std::path::Path;
use std::process::Stdio;

use patchlens_core::PatchlensError;
use tokio::io::AsyncWriteExt;

/// Captured output of one git invocation.
pub(crate) struct GitOutput {
    status: std::process::ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

impl GitOutput {
    pub(crate) fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run `git` in `dir`, optionally feeding `input` on stdin, and capture both
/// output streams regardless of exit status.
///
/// Only spawn/IO failures are errors; a non-zero exit is reported through
/// [`GitOutput`] so callers can inspect stderr.
pub(crate) async fn git_capture(
    dir: &Path,
    args: &[&str],
    input: Option<&str>,
) -> Result<GitOutput, PatchlensError> {
    let mut command = tokio::process::Command::new("git");
    command
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    command.stdin(if input.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    });

    let mut child = command
        .spawn()
        .map_err(|e| PatchlensError::Git(format!("failed to run git: {e}")))?;

    if let Some(text) = input {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PatchlensError::Git("failed to open git stdin".into()))?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| PatchlensError::Git(format!("failed to write git stdin: {e}")))?;
        // Dropping closes the pipe so git sees EOF.
    }

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| PatchlensError::Git(format!("failed to wait for git: {e}")))?;

    Ok(GitOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Run `git` in `dir` and return trimmed stdout, failing on non-zero exit.
pub(crate) async fn git(dir: &Path, args: &[&str]) -> Result<String, PatchlensError> {
    let output = git_capture(dir, args, None).await?;
    if !output.success() {
        return Err(PatchlensError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            output.stderr.trim()
        )));
    }
    Ok(output.stdout.trim().to_string())
}

/// Run `git` in `dir` and report only whether it succeeded.
pub(crate) async fn git_ok(dir: &Path, args: &[&str]) -> bool {
    matches!(git_capture(dir, args, None).await, Ok(out) if out.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn git_fails_outside_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let result = git(dir.path(), &["status", "--porcelain"]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn git_capture_reports_failure_without_erroring() {
        let dir = tempfile::tempdir().unwrap();
        let output = git_capture(dir.path(), &["status", "--porcelain"], None)
            .await
            .unwrap();
        assert!(!output.success());
        assert!(!output.stderr.is_empty());
    }
}
