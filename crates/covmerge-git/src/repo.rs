//! The [`GitRepo`] trait: the read-only git surface covmerge needs.

use crate::error::GitError;
use crate::types::GitOid;

/// The git abstraction trait used by all covmerge crates.
///
/// Implementations may be backed by gix ([`GixRepo`](crate::GixRepo)) or a
/// test double.
///
/// # Object safety
///
/// This trait is object-safe: callers may use `&dyn GitRepo` or
/// `Box<dyn GitRepo>`.
pub trait GitRepo {
    /// Read the contents of a blob object.
    ///
    /// Replaces: `git cat-file blob <oid>`.
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError>;

    /// Resolve the blob that `path` points to in the tree of `revision`.
    ///
    /// `path` is relative to the repository root and uses `/` separators.
    /// Returns [`GitError::NotFound`] if the revision does not exist or the
    /// path is absent at that revision, and [`GitError::InvalidOid`] if the
    /// path names something other than a blob (a directory, a submodule).
    ///
    /// Replaces: `git rev-parse <revision>:<path>`.
    fn blob_at(&self, revision: &str, path: &str) -> Result<GitOid, GitError>;
}
