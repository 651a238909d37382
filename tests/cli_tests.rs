use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn dap() -> Command {
    let mut cmd = Command::cargo_bin("dap").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn setup_pair() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("o.txt"), "a\nb\nc\n").unwrap();
    fs::write(dir.path().join("t.txt"), "a\nx\nc\n").unwrap();
    dir
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn accepting_patches_rewrites_the_file() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["o.txt", "t.txt"])
        .write_stdin("y\ny\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Review patches and apply them [y,n,q]?"))
        .stdout(predicate::str::contains("Apply patch [y,n,q]?"))
        .stdout(predicate::str::contains("@@ -1,3 +1,3 @@"))
        .stdout(predicate::str::contains("Applied: 1, Failed: 0"))
        .stdout(predicate::str::contains("Scanned:"));

    assert_eq!(read(&dir.path().join("o.txt")), "a\nx\nc\n");
}

#[test]
fn quitting_exits_with_cancel_status() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["o.txt", "t.txt"])
        .write_stdin("q\n")
        .assert()
        .code(130)
        .stdout(predicate::str::contains("Canceled by user"));

    assert_eq!(read(&dir.path().join("o.txt")), "a\nb\nc\n");
}

#[test]
fn invalid_answer_shows_usage() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["o.txt", "t.txt"])
        .write_stdin("maybe\nn\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("q - quit"));

    assert_eq!(read(&dir.path().join("o.txt")), "a\nb\nc\n");
}

#[test]
fn closed_stdin_fails() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["o.txt", "t.txt"])
        .write_stdin("")
        .assert()
        .code(1);

    assert_eq!(read(&dir.path().join("o.txt")), "a\nb\nc\n");
}

#[test]
fn dry_run_leaves_file_untouched() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["--dry-run", "-y", "o.txt", "t.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("AutoApplying"))
        .stdout(predicate::str::contains(
            "Dry-run enabled, skipping file writes: o.txt",
        ));

    assert_eq!(read(&dir.path().join("o.txt")), "a\nb\nc\n");
}

#[test]
fn auto_patch_needs_no_input() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["--auto-patch", "o.txt", "t.txt"])
        .assert()
        .success();

    assert_eq!(read(&dir.path().join("o.txt")), "a\nx\nc\n");
}

#[test]
fn report_only_lists_differing_files() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["-q", "o.txt", "t.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files o.txt and t.txt differ"))
        .stdout(predicate::str::contains("[y,n,q]").not());
}

#[test]
fn directories_are_compared_file_by_file() {
    let original = tempfile::tempdir().unwrap();
    let desired = tempfile::tempdir().unwrap();
    fs::create_dir_all(original.path().join("sub")).unwrap();
    fs::create_dir_all(desired.path().join("sub")).unwrap();
    fs::write(original.path().join("sub/f.txt"), "old\n").unwrap();
    fs::write(desired.path().join("sub/f.txt"), "new\n").unwrap();
    fs::write(original.path().join("same.txt"), "same\n").unwrap();
    fs::write(desired.path().join("same.txt"), "same\n").unwrap();

    dap()
        .args(["--whole-file"])
        .arg(original.path())
        .arg(desired.path())
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Loading files from:"))
        .stdout(predicate::str::contains("Apply patch [y,n,q]?").not());

    assert_eq!(read(&original.path().join("sub/f.txt")), "new\n");
}

#[test]
fn missing_path_exits_127() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["o.txt", "nope.txt"])
        .assert()
        .code(127)
        .stderr(predicate::str::contains("nope.txt"));
}

#[test]
fn file_and_directory_mix_is_a_usage_error() {
    let dir = setup_pair();
    dap()
        .current_dir(dir.path())
        .args(["o.txt", "."])
        .assert()
        .code(2);
}

#[test]
fn missing_argument_is_a_usage_error() {
    dap().arg("only-one").assert().code(2);
}

#[test]
fn bad_config_file_fails() {
    let dir = setup_pair();
    fs::write(dir.path().join(".dap.toml"), "context_lines = \"lots\"\n").unwrap();
    dap()
        .current_dir(dir.path())
        .args(["o.txt", "t.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn version_flag() {
    dap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("dap "));
}
