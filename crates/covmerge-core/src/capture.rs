//! Capture identifiers, revision grouping and intra-revision merge.
//!
//! A capture identifier encodes when and against which revision it was
//! taken in its last two dot-separated components:
//!
//! ```text
//! cover.txt.1723042827.e24dac6
//!           ^^^^^^^^^^ ^^^^^^^
//!           timestamp  revision
//! ```
//!
//! Captures are grouped by revision, ordered by timestamp inside a group,
//! and each group is merged into one [`ProfileSet`]. Groups are then ordered
//! by their earliest timestamp, which is the order reconciliation walks.

use std::path::{Path, PathBuf};

use tracing::instrument;

use crate::error::CoverError;
use crate::merge::ProfileSet;
use crate::model::Profile;
use crate::parse;

// ---------------------------------------------------------------------------
// CaptureId
// ---------------------------------------------------------------------------

/// A parsed capture identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureId {
    /// The identifier exactly as given (usually a path).
    pub identifier: String,
    /// Capture time; only used for ordering.
    pub timestamp: i64,
    /// Opaque revision token (e.g. an abbreviated commit hash).
    pub revision: String,
}

impl CaptureId {
    /// Parse the trailing `.<timestamp>.<revision>` of `identifier`.
    ///
    /// Only the final path component is inspected, so dots in directory
    /// names are ignored.
    pub fn parse(identifier: &str) -> Result<Self, CoverError> {
        let malformed = |reason: &str| CoverError::MalformedCaptureId {
            id: identifier.to_owned(),
            reason: reason.to_owned(),
        };
        let name = Path::new(identifier)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(identifier);

        let mut parts = name.rsplit('.');
        let revision = parts
            .next()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| malformed("missing trailing revision"))?;
        let timestamp = parts
            .next()
            .ok_or_else(|| malformed("expected <name>.<timestamp>.<revision>"))?;
        let timestamp = timestamp
            .parse::<i64>()
            .map_err(|_| malformed(&format!("timestamp '{timestamp}' is not an integer")))?;

        Ok(Self {
            identifier: identifier.to_owned(),
            timestamp,
            revision: revision.to_owned(),
        })
    }

    /// The identifier interpreted as a filesystem path.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.identifier)
    }
}

// ---------------------------------------------------------------------------
// CaptureSource
// ---------------------------------------------------------------------------

/// Where a capture's profiles come from.
pub trait CaptureSource {
    /// Read and parse the profiles of one capture.
    fn read_profiles(&self, capture: &CaptureId) -> Result<Vec<Profile>, CoverError>;
}

/// Reads each capture identifier as a path on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsCaptureSource;

impl CaptureSource for FsCaptureSource {
    fn read_profiles(&self, capture: &CaptureId) -> Result<Vec<Profile>, CoverError> {
        parse::parse_file(&capture.path())
    }
}

impl<F> CaptureSource for F
where
    F: Fn(&CaptureId) -> Result<Vec<Profile>, CoverError>,
{
    fn read_profiles(&self, capture: &CaptureId) -> Result<Vec<Profile>, CoverError> {
        self(capture)
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// All captures taken against one revision, oldest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevisionGroup {
    /// The shared revision token.
    pub revision: String,
    /// Earliest capture timestamp in the group.
    pub timestamp: i64,
    /// Captures in ascending timestamp order (ties keep input order).
    pub captures: Vec<CaptureId>,
}

/// One revision's merged profiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RevisionProfiles {
    /// Revision token.
    pub revision: String,
    /// Representative (earliest) timestamp.
    pub timestamp: i64,
    /// Number of captures merged.
    pub captures: usize,
    /// The merged profiles.
    pub profiles: ProfileSet,
}

/// Parse every identifier and group them by revision.
///
/// All identifiers are validated before anything is grouped, so a malformed
/// identifier fails the run before any capture is read. Groups come back in
/// ascending order of their earliest timestamp (ties broken by revision).
pub fn group_captures<I, S>(identifiers: I) -> Result<Vec<RevisionGroup>, CoverError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let ids = identifiers
        .into_iter()
        .map(|s| CaptureId::parse(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: Vec<RevisionGroup> = Vec::new();
    for id in ids {
        match groups.iter_mut().find(|g| g.revision == id.revision) {
            Some(group) => group.captures.push(id),
            None => groups.push(RevisionGroup {
                revision: id.revision.clone(),
                timestamp: id.timestamp,
                captures: vec![id],
            }),
        }
    }

    for group in &mut groups {
        group.captures.sort_by_key(|c| c.timestamp);
        group.timestamp = group.captures[0].timestamp;
    }
    groups.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.revision.cmp(&b.revision))
    });
    Ok(groups)
}

/// Merge one group's captures, oldest first, into a single set.
#[instrument(skip_all, fields(revision = %group.revision, captures = group.captures.len()))]
pub fn load_revision(group: &RevisionGroup, source: &dyn CaptureSource) -> Result<RevisionProfiles, CoverError> {
    let mut profiles = ProfileSet::new();
    for capture in &group.captures {
        let parsed = source.read_profiles(capture)?;
        tracing::debug!(capture = %capture.identifier, files = parsed.len(), "read capture");
        for p in parsed {
            profiles.add_profile(p)?;
        }
    }
    tracing::info!(files = profiles.len(), blocks = profiles.block_count(), "merged revision");
    Ok(RevisionProfiles {
        revision: group.revision.clone(),
        timestamp: group.timestamp,
        captures: group.captures.len(),
        profiles,
    })
}

/// [`load_revision`] for every group, preserving group order.
pub fn load_revisions(groups: &[RevisionGroup], source: &dyn CaptureSource) -> Result<Vec<RevisionProfiles>, CoverError> {
    groups.iter().map(|g| load_revision(g, source)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
