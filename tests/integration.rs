/// Integration test suite.
///
/// CLI tests invoke the compiled `report-mirror` binary via subprocess. The
/// `CARGO_BIN_EXE_report-mirror` environment variable is set by Cargo during
/// `cargo test` to point at the binary for the current profile.
///
/// Watch tests drive the library directly with stub generators so that report
/// content is known in advance; they poll the output directory because file
/// notifications arrive asynchronously.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use report_mirror::error::GeneratorError;
use report_mirror::output::{NoticeSink, RunSummary};
use report_mirror::{Mirror, MirrorError, ReportGenerator, Settings};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_report-mirror"))
}

/// Run a report-mirror command in `cwd` and assert it exits successfully.
/// Returns stdout as a String.
fn run_success(cwd: &Path, args: &[&str]) -> String {
    let out = Command::new(binary())
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("failed to invoke report-mirror binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        out.status.success(),
        "command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
        args,
        out.status,
        stdout,
        stderr
    );
    stdout
}

/// Run a report-mirror command in `cwd` and assert it exits with a non-zero status.
/// Returns (stdout, stderr) as Strings.
fn run_failure(cwd: &Path, args: &[&str]) -> (String, String) {
    let out = Command::new(binary())
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("failed to invoke report-mirror binary");
    let stdout = String::from_utf8_lossy(&out.stdout).to_string();
    let stderr = String::from_utf8_lossy(&out.stderr).to_string();
    assert!(
        !out.status.success(),
        "command {:?} expected to fail but exited successfully\nstdout: {}\nstderr: {}",
        args,
        stdout,
        stderr
    );
    (stdout, stderr)
}

/// Poll `cond` every 25ms for up to 10 seconds.
async fn eventually(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Report = fixed value for `sales.csv`, the content echoed otherwise.
/// Content starting with `!` is rejected.
struct Stub;

impl ReportGenerator for Stub {
    type Report = serde_json::Value;

    fn generate(&self, path: &Path, content: &[u8]) -> Result<serde_json::Value, GeneratorError> {
        if content.starts_with(b"!") {
            return Err(format!("rejected {}", path.display()).into());
        }
        if path.file_name().is_some_and(|n| n == "sales.csv") {
            return Ok(serde_json::json!({"rows": 12, "total": 450.0}));
        }
        Ok(serde_json::Value::String(
            String::from_utf8_lossy(content).into_owned(),
        ))
    }
}

fn settings(root: &Path) -> Settings {
    let mut settings = Settings::new(root.join("in"), root.join("out"));
    settings.report_workers = 4;
    settings.queue_capacity = 8;
    settings
}

// ---------------------------------------------------------------------------
// CLI: startup validation
// ---------------------------------------------------------------------------

/// test_input_is_regular_file — startup fails before watching when the input path is a file.
#[test]
fn test_input_is_regular_file() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("in"), "not a directory").unwrap();

    let (_stdout, stderr) = run_failure(
        tmp.path(),
        &["watch", "--input", "in", "--output", "out"],
    );
    assert!(
        stderr.contains("must not be a regular file"),
        "stderr should explain the invalid path\nstderr: {}",
        stderr
    );
    assert!(
        !tmp.path().join("out").exists(),
        "output directory should not be created after a failed input check"
    );
}

/// test_output_is_regular_file — same rule for the output path.
#[test]
fn test_output_is_regular_file() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("out"), "not a directory").unwrap();

    let (_stdout, stderr) =
        run_failure(tmp.path(), &["sync", "--input", "in", "--output", "out"]);
    assert!(stderr.contains("must not be a regular file"), "stderr: {}", stderr);
}

/// test_same_directory_rejected — input and output must differ.
#[test]
fn test_same_directory_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let (_stdout, stderr) =
        run_failure(tmp.path(), &["sync", "--input", "data", "--output", "./data"]);
    assert!(stderr.contains("must differ"), "stderr: {}", stderr);
}

/// test_missing_directories_reported — no paths anywhere is a configuration error.
#[test]
fn test_missing_directories_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let (_stdout, stderr) = run_failure(tmp.path(), &["sync"]);
    assert!(stderr.contains("input_dir"), "stderr: {}", stderr);
}

// ---------------------------------------------------------------------------
// CLI: one-shot sync
// ---------------------------------------------------------------------------

/// test_sync_creates_directories_and_reports — missing directories are created and
/// every existing input file gets a report with the built-in generator.
#[test]
fn test_sync_creates_directories_and_reports() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir(tmp.path().join("in")).unwrap();
    fs::write(tmp.path().join("in").join("notes.txt"), "one two\nthree\n").unwrap();

    let stdout = run_success(
        tmp.path(),
        &["sync", "--input", "in", "--output", "nested/out"],
    );

    let report = tmp.path().join("nested").join("out").join("notes.txt");
    assert!(stdout.contains("notes.txt written"), "stdout: {}", stdout);
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(parsed["file_name"], "notes.txt");
    assert_eq!(parsed["lines"], 2);
    assert_eq!(parsed["words"], 3);
}

/// test_sync_json_notices_and_prune — JSON notices, and --prune deletes orphan reports.
#[test]
fn test_sync_json_notices_and_prune() {
    let tmp = tempfile::tempdir().unwrap();
    fs::create_dir_all(tmp.path().join("in")).unwrap();
    fs::create_dir_all(tmp.path().join("out")).unwrap();
    fs::write(tmp.path().join("in").join("a.txt"), "a").unwrap();
    fs::write(tmp.path().join("out").join("gone.txt"), "{}").unwrap();

    let stdout = run_success(
        tmp.path(),
        &[
            "sync", "--input", "in", "--output", "out", "--prune", "--format", "json",
        ],
    );

    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).expect("each stdout line is JSON"))
        .collect();
    assert!(lines.iter().any(|v| v["action"] == "written"));
    assert!(lines.iter().any(|v| v["action"] == "deleted"));
    let summary = lines.last().unwrap();
    assert_eq!(summary["written"], 1);
    assert_eq!(summary["deleted"], 1);
    assert!(!tmp.path().join("out").join("gone.txt").exists());
}

/// test_sync_reads_config_file — directories come from ./report-mirror.toml.
#[test]
fn test_sync_reads_config_file() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(
        tmp.path().join("report-mirror.toml"),
        "input_dir = \"src-dir\"\noutput_dir = \"dst-dir\"\nexclude = [\"*.skip\"]\n",
    )
    .unwrap();
    fs::create_dir(tmp.path().join("src-dir")).unwrap();
    fs::write(tmp.path().join("src-dir").join("keep.txt"), "k").unwrap();
    fs::write(tmp.path().join("src-dir").join("drop.skip"), "d").unwrap();

    run_success(tmp.path(), &["sync"]);

    assert!(tmp.path().join("dst-dir").join("keep.txt").exists());
    assert!(!tmp.path().join("dst-dir").join("drop.skip").exists());
}

// ---------------------------------------------------------------------------
// Library: live watching
// ---------------------------------------------------------------------------

/// Create → report with exact canonical JSON; delete → report removed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_watch_mirrors_create_and_delete() {
    let tmp = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(settings(tmp.path()), Stub, NoticeSink::Silent).unwrap();
    let input = mirror.input().path().to_path_buf();
    let output = mirror.output().path().to_path_buf();
    let handle = mirror.start().unwrap();

    fs::write(input.join("sales.csv"), "id,total\n1,450.0\n").unwrap();
    let report = output.join("sales.csv");
    eventually("sales.csv report", || report.exists()).await;
    assert_eq!(
        fs::read_to_string(&report).unwrap(),
        r#"{"rows":12,"total":450.0}"#
    );

    // Let the follow-up modify notification for the same write settle first.
    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::remove_file(input.join("sales.csv")).unwrap();
    eventually("sales.csv report removal", || !report.exists()).await;

    let summary = handle.shutdown().await.unwrap();
    assert!(summary.written >= 1);
    assert_eq!(summary.deleted, 1);
}

/// Updates rewrite the report with the latest content.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_watch_update_rewrites_report() {
    let tmp = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(settings(tmp.path()), Stub, NoticeSink::Silent).unwrap();
    let input = mirror.input().path().to_path_buf();
    let report = mirror.output().path().join("note.txt");
    let handle = mirror.start().unwrap();

    fs::write(input.join("note.txt"), "first").unwrap();
    eventually("first report", || {
        fs::read_to_string(&report).is_ok_and(|s| s == "\"first\"")
    })
    .await;

    fs::write(input.join("note.txt"), "second").unwrap();
    eventually("second report", || {
        fs::read_to_string(&report).is_ok_and(|s| s == "\"second\"")
    })
    .await;

    handle.shutdown().await.unwrap();
}

/// A generation failure for one file neither blocks nor corrupts another.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_watch_failure_is_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(settings(tmp.path()), Stub, NoticeSink::Silent).unwrap();
    let input = mirror.input().path().to_path_buf();
    let output = mirror.output().path().to_path_buf();
    let handle = mirror.start().unwrap();

    fs::write(input.join("bad.txt"), "!nope").unwrap();
    fs::write(input.join("good.txt"), "fine").unwrap();

    let good = output.join("good.txt");
    eventually("good.txt report", || good.exists()).await;
    let summary = handle.shutdown().await.unwrap();

    assert_eq!(fs::read_to_string(&good).unwrap(), "\"fine\"");
    assert!(!output.join("bad.txt").exists());
    assert!(summary.report_failures >= 1);
}

/// Deleting a file that never had a report surfaces as a deletion failure.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_watch_delete_without_report_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(settings(tmp.path()), Stub, NoticeSink::Silent).unwrap();
    let input = mirror.input().path().to_path_buf();

    // Present before watching and never synced, so it has no report.
    fs::write(input.join("old.txt"), "old").unwrap();
    let handle = mirror.start().unwrap();

    // Give the OS watch a moment to settle before removing the file.
    tokio::time::sleep(Duration::from_millis(100)).await;
    fs::remove_file(input.join("old.txt")).unwrap();

    // A marker file proves events after the deletion are still processed.
    fs::write(input.join("marker.txt"), "m").unwrap();
    let marker = tmp.path().join("out").join("marker.txt");
    eventually("marker report", || marker.exists()).await;

    let summary = handle.shutdown().await.unwrap();
    assert_eq!(summary.deletion_failures, 1);
    assert_eq!(summary.deleted, 0);
}

/// Removing the input directory routes the deletion of its files, drains the
/// lanes, then ends the run with a lost watch.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_watch_lost_when_input_removed() {
    let tmp = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(settings(tmp.path()), Stub, NoticeSink::Silent).unwrap();
    let input = mirror.input().path().to_path_buf();
    let report = mirror.output().path().join("note.txt");
    let handle = mirror.start().unwrap();

    fs::write(input.join("note.txt"), "gone soon").unwrap();
    eventually("note.txt report", || report.exists()).await;

    // Let the follow-up modify notification for the same write settle first.
    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::remove_dir_all(&input).unwrap();
    let result = tokio::time::timeout(
        Duration::from_secs(10),
        handle.run_until(std::future::pending::<()>()),
    )
    .await
    .expect("run did not stop after the input directory was removed");

    let err = result.unwrap_err();
    assert!(matches!(err, MirrorError::WatchLost { .. }), "{err}");
    assert_eq!(err.path(), Some(input.as_path()));
    assert!(err.to_string().contains("lost watch"));
    assert!(!report.exists());
}

/// Shutting down a freshly started mirror drains nothing and succeeds.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_shutdown_idle() {
    let tmp = tempfile::tempdir().unwrap();
    let mirror = Mirror::new(settings(tmp.path()), Stub, NoticeSink::Silent).unwrap();
    let summary = mirror.start().unwrap().shutdown().await.unwrap();
    assert_eq!(summary, RunSummary::default());
}
