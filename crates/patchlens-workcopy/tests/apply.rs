use std::path::Path;
use std::process::Command;

use patchlens_core::{ApplyOutcome, ApplyStrategy, WorkingCopy};
use patchlens_workcopy::{run_branch_name, PatchApplier};

fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn run(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn init_repo(dir: &Path) {
    run(dir, &["init"]);
    run(dir, &["config", "user.email", "test@example.com"]);
    run(dir, &["config", "user.name", "Test"]);
    std::fs::write(dir.join("greeting.txt"), "hello\nworld\n").unwrap();
    run(dir, &["add", "."]);
    run(dir, &["commit", "-m", "initial"]);
    run(dir, &["branch", "-M", "main"]);
}

fn workcopy(dir: &Path) -> WorkingCopy {
    WorkingCopy {
        path: dir.to_path_buf(),
        default_branch: "main".into(),
    }
}

const CLEAN_PATCH: &str = "\
--- a/greeting.txt
+++ b/greeting.txt
@@ -1,2 +1,2 @@
-hello
+hi
 world
";

const CONFLICTING_PATCH: &str = "\
--- a/greeting.txt
+++ b/greeting.txt
@@ -1,2 +1,2 @@
-completely different content
+replacement
 world
";

#[tokio::test]
async fn clean_patch_applies_with_first_strategy() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let workcopy = workcopy(dir.path());
    let report = PatchApplier::new(&workcopy).apply(CLEAN_PATCH).await;

    assert_eq!(report.outcome, ApplyOutcome::Applied(ApplyStrategy::ThreeWay));
    assert_eq!(report.branch, run_branch_name());

    let content = std::fs::read_to_string(dir.path().join("greeting.txt")).unwrap();
    assert_eq!(content, "hi\nworld\n");
}

#[tokio::test]
async fn conflicting_patch_fails_with_diagnostics_and_branch() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());

    let workcopy = workcopy(dir.path());
    let report = PatchApplier::new(&workcopy).apply(CONFLICTING_PATCH).await;

    let ApplyOutcome::Failed { diagnostics } = &report.outcome else {
        panic!("expected failure, got {:?}", report.outcome);
    };
    assert!(!diagnostics.trim().is_empty());

    // The branch was created before strategies ran and must survive the
    // failure.
    let output = Command::new("git")
        .args(["branch", "--list", report.branch.as_str()])
        .current_dir(dir.path())
        .output()
        .unwrap();
    let listed = String::from_utf8_lossy(&output.stdout);
    assert!(listed.contains(&report.branch), "branch list: {listed}");

    // No partial hunks left behind.
    let content = std::fs::read_to_string(dir.path().join("greeting.txt")).unwrap();
    assert_eq!(content, "hello\nworld\n");
}

#[tokio::test]
async fn uncommitted_changes_are_cleaned_before_applying() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    init_repo(dir.path());
    std::fs::write(dir.path().join("greeting.txt"), "local edits\n").unwrap();
    std::fs::write(dir.path().join("scratch.txt"), "untracked\n").unwrap();

    let workcopy = workcopy(dir.path());
    let report = PatchApplier::new(&workcopy).apply(CLEAN_PATCH).await;

    assert!(report.outcome.is_applied(), "got {:?}", report.outcome);
    let content = std::fs::read_to_string(dir.path().join("greeting.txt")).unwrap();
    assert_eq!(content, "hi\nworld\n");
}
