use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn tootur_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tootur");
    path
}

fn setup_test_env(extra_config: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(files_dir.join("notes")).unwrap();
    fs::write(
        files_dir.join("alpha.md"),
        "# Alpha Document\n\nThis is the alpha document about Rust programming.\n\nIt contains information about cargo and crates.",
    ).unwrap();
    fs::write(
        files_dir.join("beta.md"),
        "# Beta Document\n\nThis document discusses Python and machine learning.\n\nDeep learning frameworks like PyTorch are covered.",
    ).unwrap();
    fs::write(
        files_dir.join("notes/gamma.txt"),
        "Gamma plain text file.\n\nContains notes about deployment and infrastructure.\n\nKubernetes and Docker are mentioned here.",
    ).unwrap();
    fs::write(files_dir.join("image.png"), "not indexed").unwrap();

    let config_content = format!(
        r#"[db]
path = "{root}/data/tootur.sqlite"

[chunking]
max_length = 700
overlap = 80

[retrieval]
top_k = 5
threshold = 0.3

[sources]
root = "{root}/files"
{extra}
"#,
        root = root.display(),
        extra = extra_config,
    );

    let config_path = config_dir.join("tootur.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_tootur(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = tootur_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run tootur binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_creates_database() {
    let (tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_tootur(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
    assert!(tmp.path().join("data/tootur.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, _, success1) = run_tootur(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_tootur(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_index_dry_run_counts() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_tootur(&config_path, &["index", "--dry-run"]);
    assert!(success, "dry run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("(dry-run)"));
    assert!(stdout.contains("documents found: 3"));
    assert!(stdout.contains("estimated chunks: 3"));
}

#[test]
fn test_index_dry_run_respects_exclude_globs() {
    let (_tmp, config_path) = setup_test_env("exclude_globs = [\"notes/**\"]");

    let (stdout, _, success) = run_tootur(&config_path, &["index", "--dry-run"]);
    assert!(success);
    assert!(stdout.contains("documents found: 2"));
}

#[test]
fn test_index_requires_embeddings() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, stderr, success) = run_tootur(&config_path, &["index"]);
    assert!(!success);
    assert!(stderr.contains("requires embeddings"), "stderr={}", stderr);
}

#[test]
fn test_search_requires_embeddings() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, stderr, success) = run_tootur(&config_path, &["search", "rust"]);
    assert!(!success);
    assert!(stderr.contains("requires embeddings"), "stderr={}", stderr);
}

#[test]
fn test_empty_search_query_prints_no_results() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, _, success) = run_tootur(&config_path, &["search", "   "]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_stats_on_fresh_database() {
    let (_tmp, config_path) = setup_test_env("");

    run_tootur(&config_path, &["init"]);
    let (stdout, stderr, success) = run_tootur(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Chunks:      0"));
    assert!(stdout.contains("Indexed:     never"));
}

#[test]
fn test_invalid_config_rejected() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("bad.toml");
    fs::write(
        &config_path,
        "[db]\npath = \"x.sqlite\"\n[chunking]\nmax_length = 10\noverlap = 20\n",
    )
    .unwrap();

    let (_, stderr, success) = run_tootur(&config_path, &["stats"]);
    assert!(!success);
    assert!(stderr.contains("chunking"), "stderr={}", stderr);
}

#[test]
fn test_missing_config_file() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_tootur(&tmp.path().join("missing.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
