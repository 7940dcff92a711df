//! Content-equality and content-fetch oracles.
//!
//! Reconciliation never reads source files itself. It asks a
//! [`ContentOracle`] whether a file is byte-identical between two revisions,
//! and asks it for the exact bytes when a renamed snapshot must be written.
//! [`RepoOracle`] answers from a git repository through
//! [`covmerge_git::GitRepo`]; tests substitute in-memory fakes.

use std::cell::RefCell;
use std::collections::HashMap;

use covmerge_git::{GitOid, GitRepo};

use crate::error::OracleError;

/// Answers questions about file content at revisions.
pub trait ContentOracle {
    /// Is `path` byte-identical between `rev_a` and `rev_b`?
    ///
    /// `path` is the profile's file name; mapping it to a repository path is
    /// the oracle's business.
    fn same_content(&self, rev_a: &str, rev_b: &str, path: &str) -> Result<bool, OracleError>;

    /// The exact content of `path` at `revision`.
    fn fetch(&self, revision: &str, path: &str) -> Result<Vec<u8>, OracleError>;
}

/// A [`ContentOracle`] backed by a git repository.
///
/// Profile file names are joined onto `repo_prefix` to form repository
/// paths. Blob ids are memoized per `(revision, path)`.
pub struct RepoOracle<R> {
    repo: R,
    repo_prefix: String,
    blobs: RefCell<HashMap<(String, String), Option<GitOid>>>,
}

impl<R: GitRepo> RepoOracle<R> {
    /// Wrap `repo`. `repo_prefix` may be empty.
    pub fn new(repo: R, repo_prefix: impl Into<String>) -> Self {
        Self {
            repo,
            repo_prefix: repo_prefix.into(),
            blobs: RefCell::new(HashMap::new()),
        }
    }

    /// The repository path a profile file name maps to.
    #[must_use]
    pub fn repo_path(&self, file_name: &str) -> String {
        let prefix = self.repo_prefix.trim_end_matches('/');
        let file_name = file_name.trim_start_matches('/');
        if prefix.is_empty() {
            file_name.to_owned()
        } else {
            format!("{prefix}/{file_name}")
        }
    }

    /// Blob id of `path` at `revision`, consulting the memo first.
    fn blob(&self, revision: &str, path: &str) -> Result<GitOid, OracleError> {
        let key = (revision.to_owned(), path.to_owned());
        if let Some(cached) = self.blobs.borrow().get(&key) {
            return cached.ok_or_else(|| unresolved(revision, path, "not found (cached)"));
        }
        let result = self.repo.blob_at(revision, path);
        self.blobs
            .borrow_mut()
            .insert(key, result.as_ref().ok().copied());
        result.map_err(|e| unresolved(revision, path, &e.to_string()))
    }
}

fn unresolved(revision: &str, path: &str, message: &str) -> OracleError {
    OracleError::Unresolved {
        revision: revision.to_owned(),
        path: path.to_owned(),
        message: message.to_owned(),
    }
}

impl<R: GitRepo> ContentOracle for RepoOracle<R> {
    fn same_content(&self, rev_a: &str, rev_b: &str, path: &str) -> Result<bool, OracleError> {
        let path = self.repo_path(path);
        let a = self.blob(rev_a, &path)?;
        let b = self.blob(rev_b, &path)?;
        Ok(a == b)
    }

    fn fetch(&self, revision: &str, path: &str) -> Result<Vec<u8>, OracleError> {
        let path = self.repo_path(path);
        let oid = self.blob(revision, &path)?;
        self.repo
            .read_blob(oid)
            .map_err(|e| OracleError::Backend(format!("{revision}:{path}: {e}")))
    }
}

impl<R> std::fmt::Debug for RepoOracle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepoOracle")
            .field("repo_prefix", &self.repo_prefix)
            .field("memoized", &self.blobs.borrow().len())
            .finish_non_exhaustive()
    }
}
