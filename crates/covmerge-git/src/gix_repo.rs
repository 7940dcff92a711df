//! The gix-backed implementation of [`GitRepo`].

use std::path::Path;

use crate::error::GitError;
use crate::repo::GitRepo;
use crate::types::GitOid;

/// A [`GitRepo`] implementation backed by [gix](https://github.com/GitoxideLabs/gitoxide).
///
/// Construct via [`GixRepo::open`].
pub struct GixRepo {
    pub(crate) repo: gix::Repository,
}

impl GixRepo {
    /// Open the git repository at or above `path`.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = gix::discover(path).map_err(|e| GitError::BackendError {
            message: format!("{}: {e}", path.display()),
        })?;
        tracing::debug!(path = %path.display(), git_dir = %repo.git_dir().display(), "opened git repository");
        Ok(Self { repo })
    }
}

impl std::fmt::Debug for GixRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GixRepo")
            .field("git_dir", &self.repo.git_dir())
            .finish()
    }
}

impl GitRepo for GixRepo {
    fn read_blob(&self, oid: GitOid) -> Result<Vec<u8>, GitError> {
        crate::objects_impl::read_blob(self, oid)
    }

    fn blob_at(&self, revision: &str, path: &str) -> Result<GitOid, GitError> {
        crate::objects_impl::blob_at(self, revision, path)
    }
}
