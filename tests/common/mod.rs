//! Shared test helpers for covmerge integration tests.
//!
//! All tests use temp directories, with no side effects on the real repo.
//! Library-level tests substitute [`TableOracle`] and [`RecordingRenderer`]
//! for git and `go tool cover`; CLI tests build a real git repository with
//! [`setup_git_repo`].

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Result;
use covmerge::{ReportRenderer, RunConfig};
use covmerge_core::{ContentOracle, OracleError};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Captures
// ---------------------------------------------------------------------------

/// Write a capture file named `name` into `dir`, returning its path as a
/// capture identifier.
pub fn write_capture(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("failed to write capture");
    path.to_string_lossy().into_owned()
}

/// A run configuration writing everything under `dir`, report disabled.
pub fn config_in(dir: &Path) -> RunConfig {
    RunConfig {
        output_profile: dir.join("cover.txt"),
        output_report: dir.join("cover.html"),
        repo_prefix: String::new(),
        snapshot_root: dir.join("snapshots"),
        render_report: false,
        augment_report: false,
        go: "go".to_owned(),
        gopath: None,
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Content oracle driven by a `(revision, file) -> version` table.
///
/// Two revisions hold the same content for a file when both have an entry
/// with the same version. `fetch` returns `"<file>@<version>\n"`.
#[derive(Default)]
pub struct TableOracle {
    versions: HashMap<(String, String), u32>,
    failing: HashSet<String>,
    pub fetched: RefCell<Vec<(String, String)>>,
}

impl TableOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `file` is at `version` in `revision`.
    pub fn with(mut self, revision: &str, file: &str, version: u32) -> Self {
        self.versions
            .insert((revision.to_owned(), file.to_owned()), version);
        self
    }

    /// Make every question about `file` fail.
    pub fn failing(mut self, file: &str) -> Self {
        self.failing.insert(file.to_owned());
        self
    }
}

impl ContentOracle for TableOracle {
    fn same_content(&self, rev_a: &str, rev_b: &str, path: &str) -> Result<bool, OracleError> {
        if self.failing.contains(path) {
            return Err(OracleError::Backend(format!("no answer for {path}")));
        }
        let a = self.versions.get(&(rev_a.to_owned(), path.to_owned()));
        let b = self.versions.get(&(rev_b.to_owned(), path.to_owned()));
        Ok(a.is_some() && a == b)
    }

    fn fetch(&self, revision: &str, path: &str) -> Result<Vec<u8>, OracleError> {
        self.fetched
            .borrow_mut()
            .push((revision.to_owned(), path.to_owned()));
        match self.versions.get(&(revision.to_owned(), path.to_owned())) {
            Some(v) => Ok(format!("{path}@{v}\n").into_bytes()),
            None => Err(OracleError::Unresolved {
                revision: revision.to_owned(),
                path: path.to_owned(),
                message: "not in table".to_owned(),
            }),
        }
    }
}

/// What a [`RecordingRenderer`] saw when it was called.
#[derive(Clone, Debug)]
pub struct RenderCall {
    pub profile: PathBuf,
    pub report: PathBuf,
    /// Merged profile text at render time.
    pub profile_text: String,
    /// Snapshot files present at render time.
    pub snapshots: Vec<PathBuf>,
}

/// Renderer that records its calls and writes a minimal report page.
pub struct RecordingRenderer {
    snapshot_root: PathBuf,
    fail: bool,
    pub calls: RefCell<Vec<RenderCall>>,
}

impl RecordingRenderer {
    pub fn new(snapshot_root: &Path) -> Self {
        Self {
            snapshot_root: snapshot_root.to_owned(),
            fail: false,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(snapshot_root: &Path) -> Self {
        Self {
            fail: true,
            ..Self::new(snapshot_root)
        }
    }
}

impl ReportRenderer for RecordingRenderer {
    fn render(&self, profile: &Path, report: &Path) -> Result<()> {
        self.calls.borrow_mut().push(RenderCall {
            profile: profile.to_owned(),
            report: report.to_owned(),
            profile_text: std::fs::read_to_string(profile)?,
            snapshots: list_files(&self.snapshot_root),
        });
        if self.fail {
            anyhow::bail!("renderer exploded");
        }
        std::fs::write(
            report,
            "<html><body><select id=\"files\"><option value=\"file0\">a.go</option></select><pre>x</pre></body></html>",
        )?;
        Ok(())
    }
}

/// Every regular file under `root`, sorted. Missing root → empty.
pub fn list_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_owned()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                out.push(path);
            }
        }
    }
    out.sort();
    out
}

// ---------------------------------------------------------------------------
// Git + CLI
// ---------------------------------------------------------------------------

/// Run a git command in `dir`. Panics on failure; returns trimmed stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {}: {e}", args.join(" ")));
    assert!(
        out.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

/// Create a fresh git repo in a temp directory.
pub fn setup_git_repo() -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["config", "user.email", "test@test.com"]);
    git(dir.path(), &["config", "user.name", "Test User"]);
    dir
}

/// Write `files` (relative path, content) and commit. Returns the
/// abbreviated commit hash.
pub fn commit_files(dir: &Path, files: &[(&str, &str)], message: &str) -> String {
    for (rel, content) in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
    }
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
    git(dir, &["rev-parse", "--short", "HEAD"])
}

/// Run covmerge with the given args in the given directory.
pub fn covmerge_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_covmerge"))
        .args(args)
        .current_dir(dir)
        .env_remove("COVMERGE_LOG")
        .output()
        .expect("failed to execute covmerge")
}

/// Run covmerge and assert it succeeds. Returns stdout as string.
pub fn covmerge_ok(dir: &Path, args: &[&str]) -> String {
    let out = covmerge_in(dir, args);
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "covmerge {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}

/// Run covmerge and assert it fails. Returns stderr as string.
pub fn covmerge_fails(dir: &Path, args: &[&str]) -> String {
    let out = covmerge_in(dir, args);
    assert!(
        !out.status.success(),
        "Expected covmerge {} to fail, but it succeeded.\nstdout: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stdout),
    );
    String::from_utf8_lossy(&out.stderr).to_string()
}
