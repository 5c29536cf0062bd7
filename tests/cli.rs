use std::process::Command;

#[test]
fn rejects_unrecognized_reference() {
    let output = Command::new(env!("CARGO_BIN_EXE_patchlens"))
        .arg("https://example.com/not-a-change")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("change reference"), "stderr: {stderr}");
}

#[test]
fn rejects_non_url_input() {
    let output = Command::new(env!("CARGO_BIN_EXE_patchlens"))
        .arg("definitely not a url")
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn help_lists_the_degradation_toggles() {
    let output = Command::new(env!("CARGO_BIN_EXE_patchlens"))
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--no-checkout"));
    assert!(stdout.contains("--no-apply"));
    assert!(stdout.contains("--language"));
}
