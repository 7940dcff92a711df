//! Final assembly: disambiguate contested files and fold every revision into
//! one set.
//!
//! A file name is contested when more than one reconciled revision still
//! holds a profile for it. Each contested profile is renamed to
//! `<file>.<revision>`, and the file's content at that revision is written to
//! the snapshot root under the same name so report rendering can show the
//! right source. Snapshots belong to a [`SnapshotGuard`] and vanish when it
//! is dropped.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::instrument;

use crate::capture::RevisionProfiles;
use crate::error::CoverError;
use crate::merge::ProfileSet;
use crate::oracle::ContentOracle;

// ---------------------------------------------------------------------------
// SnapshotGuard
// ---------------------------------------------------------------------------

/// Owns snapshot files written during assembly and removes them on drop.
#[derive(Debug, Default)]
pub struct SnapshotGuard {
    paths: Vec<PathBuf>,
}

impl SnapshotGuard {
    /// A guard owning nothing.
    #[must_use]
    pub const fn new() -> Self {
        Self { paths: Vec::new() }
    }

    /// Write `content` to `path`, creating parent directories, and take
    /// ownership of the file.
    pub fn write(&mut self, path: PathBuf, content: &[u8]) -> Result<(), CoverError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| CoverError::io(parent, e))?;
        }
        // Record before writing: a partial write must still be cleaned up.
        self.paths.push(path.clone());
        std::fs::write(&path, content).map_err(|e| CoverError::io(path, e))
    }

    /// Paths currently owned.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Number of owned files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if the guard owns nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Drop for SnapshotGuard {
    fn drop(&mut self) {
        for path in self.paths.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "removed snapshot"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to remove snapshot");
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// A contested profile that was given a revision suffix.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rename {
    /// File name as it appeared in the captures.
    pub file_name: String,
    /// Revision the variant belongs to.
    pub revision: String,
    /// Name written to the merged profile.
    pub renamed: String,
}

/// Result of [`assemble`].
#[derive(Debug)]
pub struct Assembly {
    /// The final merged set.
    pub profiles: ProfileSet,
    /// Snapshot files backing the renamed profiles. Keep alive until the
    /// report has been rendered.
    pub snapshots: SnapshotGuard,
    /// Every rename applied, in revision order.
    pub renames: Vec<Rename>,
}

/// Fold reconciled revisions into one set, renaming contested files.
///
/// On error, snapshots already written are removed before returning.
#[instrument(skip_all, fields(revisions = reconciled.len(), snapshot_root = %snapshot_root.display()))]
pub fn assemble(
    reconciled: Vec<RevisionProfiles>,
    oracle: &dyn ContentOracle,
    snapshot_root: &Path,
) -> Result<Assembly, CoverError> {
    let mut owners: HashMap<String, usize> = HashMap::new();
    for rev in &reconciled {
        for p in rev.profiles.profiles() {
            *owners.entry(p.file_name.clone()).or_default() += 1;
        }
    }

    let mut profiles = ProfileSet::new();
    let mut snapshots = SnapshotGuard::new();
    let mut renames = Vec::new();

    for rev in reconciled {
        for mut p in rev.profiles.into_profiles() {
            if owners.get(&p.file_name).copied().unwrap_or(0) > 1 {
                let renamed = format!("{}.{}", p.file_name, rev.revision);
                let snapshot = snapshot_path(snapshot_root, &renamed)?;
                let content = oracle
                    .fetch(&rev.revision, &p.file_name)
                    .map_err(|source| CoverError::SnapshotFetch {
                        revision: rev.revision.clone(),
                        path: p.file_name.clone(),
                        source,
                    })?;
                snapshots.write(snapshot, &content)?;
                tracing::debug!(file = %p.file_name, renamed = %renamed, "renamed contested file");
                renames.push(Rename {
                    file_name: std::mem::replace(&mut p.file_name, renamed.clone()),
                    revision: rev.revision.clone(),
                    renamed,
                });
            }
            profiles.add_profile(p)?;
        }
    }

    tracing::info!(
        files = profiles.len(),
        renamed = renames.len(),
        "assembled merged profile"
    );
    Ok(Assembly {
        profiles,
        snapshots,
        renames,
    })
}

/// `root/name`, provided `name` stays inside `root`.
fn snapshot_path(root: &Path, name: &str) -> Result<PathBuf, CoverError> {
    let rel = Path::new(name);
    if rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Err(CoverError::io(
            rel,
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("snapshot name escapes {}", root.display()),
            ),
        ));
    }
    Ok(root.join(rel))
}
