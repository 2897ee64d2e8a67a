//! PDF and text handling through the source scanner and the `index --dry-run` command.

use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

use tootur::config::SourcesConfig;
use tootur::extract::{extract_text, MIME_PDF};
use tootur::sources::scan_sources;

fn tootur_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("tootur");
    path
}

/// Minimal valid PDF containing the text "tootur test phrase".
/// Builds body then xref with correct byte offsets so pdf-extract can parse it.
fn minimal_pdf_with_phrase() -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    let content = b"BT /F1 12 Tf 100 700 Td (tootur test phrase) Tj ET";
    out.extend_from_slice(format!("4 0 obj << /Length {} >> stream\n", content.len()).as_bytes());
    out.extend_from_slice(content);
    out.extend_from_slice(b"\nendstream endobj\n");
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn sources_config(tmp: &TempDir) -> SourcesConfig {
    SourcesConfig {
        root: tmp.path().join("files"),
        include_globs: vec!["**/*.pdf".into(), "**/*.md".into(), "**/*.txt".into()],
        exclude_globs: Vec::new(),
        follow_symlinks: false,
    }
}

#[test]
fn pdf_text_is_extracted() {
    let text = extract_text(&minimal_pdf_with_phrase(), MIME_PDF).unwrap();
    assert!(squash(&text).contains("tooturtestphrase"), "got: {:?}", text);
}

#[test]
fn corrupt_pdf_is_skipped_not_fatal() {
    let tmp = TempDir::new().unwrap();
    let files = tmp.path().join("files");
    fs::create_dir_all(&files).unwrap();
    fs::write(files.join("bad.pdf"), b"not a valid pdf").unwrap();
    fs::write(files.join("good.md"), "# Good\n\nThis is good.\n").unwrap();
    fs::write(files.join("guide.pdf"), minimal_pdf_with_phrase()).unwrap();

    let docs = scan_sources(&sources_config(&tmp)).unwrap();
    let ids: Vec<_> = docs.iter().map(|d| d.source_id.as_str()).collect();
    assert_eq!(ids, vec!["good.md", "guide.pdf"]);
    assert!(squash(&docs[1].text).contains("tooturtestphrase"));
}

#[test]
fn dry_run_counts_pdf_documents() {
    let tmp = TempDir::new().unwrap();
    let files = tmp.path().join("files");
    fs::create_dir_all(&files).unwrap();
    fs::write(files.join("guide.pdf"), minimal_pdf_with_phrase()).unwrap();
    fs::write(files.join("bad.pdf"), b"not a valid pdf").unwrap();
    fs::write(files.join("notes.txt"), "plain notes").unwrap();

    let config_path = tmp.path().join("tootur.toml");
    fs::write(
        &config_path,
        format!(
            "[db]\npath = \"{root}/data/t.sqlite\"\n\n[sources]\nroot = \"{root}/files\"\n",
            root = tmp.path().display()
        ),
    )
    .unwrap();

    let output = Command::new(tootur_binary())
        .arg("--config")
        .arg(&config_path)
        .args(["index", "--dry-run"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("documents found: 2"), "stdout={}", stdout);
    assert!(stderr.contains("bad.pdf"), "expected a warning naming bad.pdf: {}", stderr);
}
