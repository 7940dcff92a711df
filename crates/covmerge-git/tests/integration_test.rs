use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use covmerge_git::{GitError, GitOid, GitRepo, GixRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn git(dir: &Path, args: &[&str]) -> String {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        out.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).trim().to_owned()
}

fn commit_all(dir: &Path, message: &str) -> String {
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
    git(dir, &["rev-parse", "HEAD"])
}

/// Two commits: `shared.go` unchanged, `changed.go` rewritten, `added.go`
/// only present in the second commit.
fn setup_two_revisions() -> (TempDir, String, String) {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["config", "user.email", "test@test.com"]);
    git(dir.path(), &["config", "user.name", "Test User"]);

    let src = dir.path().join("go/src/example.com/app");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("shared.go"), "package app\n\nfunc Shared() {}\n").unwrap();
    std::fs::write(src.join("changed.go"), "package app\n\nfunc V1() {}\n").unwrap();
    let first = commit_all(dir.path(), "first");

    std::fs::write(src.join("changed.go"), "package app\n\nfunc V2() {}\n").unwrap();
    std::fs::write(src.join("added.go"), "package app\n").unwrap();
    let second = commit_all(dir.path(), "second");

    (dir, first, second)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn blob_at_matches_for_unchanged_file() {
    let (dir, first, second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    let path = "go/src/example.com/app/shared.go";
    assert_eq!(
        repo.blob_at(&first, path).unwrap(),
        repo.blob_at(&second, path).unwrap()
    );
}

#[test]
fn blob_at_differs_for_changed_file() {
    let (dir, first, second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    let path = "go/src/example.com/app/changed.go";
    assert_ne!(
        repo.blob_at(&first, path).unwrap(),
        repo.blob_at(&second, path).unwrap()
    );
}

#[test]
fn blob_at_missing_path_is_not_found() {
    let (dir, first, _second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    let err = repo
        .blob_at(&first, "go/src/example.com/app/added.go")
        .unwrap_err();
    assert!(matches!(err, GitError::NotFound { .. }), "got {err:?}");
}

#[test]
fn blob_at_rejects_empty_revision() {
    let (dir, _first, _second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    assert!(repo.blob_at("", "go/src/example.com/app/shared.go").is_err());
}

#[test]
fn blob_at_abbreviated_revision_resolves() {
    let (dir, first, _second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    let path = "go/src/example.com/app/shared.go";
    assert_eq!(
        repo.blob_at(&first[..7], path).unwrap(),
        repo.blob_at(&first, path).unwrap()
    );
}

#[test]
fn blob_at_unknown_revision_is_not_found() {
    let (dir, _first, _second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    let err = repo
        .blob_at("does-not-exist", "go/src/example.com/app/shared.go")
        .unwrap_err();
    assert!(matches!(err, GitError::NotFound { .. }), "got {err:?}");
}

#[test]
fn blob_at_directory_is_not_a_blob() {
    let (dir, first, _second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    let err = repo.blob_at(&first, "go/src/example.com/app").unwrap_err();
    assert!(matches!(err, GitError::InvalidOid { .. }), "got {err:?}");
}

#[test]
fn read_blob_returns_revision_content() {
    let (dir, first, second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    let path = "go/src/example.com/app/changed.go";
    let at = |rev: &str| repo.read_blob(repo.blob_at(rev, path).unwrap()).unwrap();
    assert_eq!(at(&first), b"package app\n\nfunc V1() {}\n");
    assert_eq!(at(&second), b"package app\n\nfunc V2() {}\n");
}

#[test]
fn read_blob_unknown_oid_is_not_found() {
    let (dir, _first, _second) = setup_two_revisions();
    let repo = GixRepo::open(dir.path()).unwrap();
    let err = repo.read_blob(GitOid::from_bytes([0x5a; 20])).unwrap_err();
    assert!(matches!(err, GitError::NotFound { .. }), "got {err:?}");
}

#[test]
fn open_discovers_from_subdirectory() {
    let (dir, first, _second) = setup_two_revisions();
    let repo = GixRepo::open(&dir.path().join("go/src")).unwrap();
    assert!(repo.blob_at(&first, "go/src/example.com/app/shared.go").is_ok());
}

#[test]
fn open_outside_repository_fails() {
    let dir = TempDir::new().unwrap();
    let err = GixRepo::open(dir.path()).unwrap_err();
    assert!(matches!(err, GitError::BackendError { .. }), "got {err:?}");
}
