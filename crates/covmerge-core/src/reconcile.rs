//! Cross-revision reconciliation.
//!
//! Walks revisions oldest first. Each revision keeps every profile still
//! attributed to it; then every later revision hands over the profiles whose
//! file is byte-identical to this revision's copy. What a later revision
//! keeps is the trimmed set it carries into comparisons with even later
//! revisions, so a profile is folded at most once.
//!
//! ```text
//! revisions:   r1        r2        r3
//! f (same)     f ◄────── f ◄────── f        -> f attributed to r1
//! g (changed)  g         g' ◄───── g'       -> g@r1, g'@r2
//! ```
//!
//! An oracle failure counts as "different": keeping files apart is always
//! safe, wrongly coalescing them is not.

use tracing::instrument;

use crate::capture::RevisionProfiles;
use crate::error::CoverError;
use crate::merge::ProfileSet;
use crate::oracle::ContentOracle;

/// Fold identical files into the earliest revision that has them.
///
/// `revisions` must be in chronological order (as returned by
/// [`group_captures`](crate::capture::group_captures)). The result has the
/// same revisions in the same order, each holding only the profiles
/// attributed to it.
#[instrument(skip_all, fields(revisions = revisions.len()))]
pub fn reconcile(
    revisions: Vec<RevisionProfiles>,
    oracle: &dyn ContentOracle,
) -> Result<Vec<RevisionProfiles>, CoverError> {
    let mut working = revisions;
    let mut reconciled: Vec<RevisionProfiles> = Vec::with_capacity(working.len());

    for i in 0..working.len() {
        let current = std::mem::take(&mut working[i].profiles);
        let mut accumulated = ProfileSet::new();
        accumulated.extend_from(current)?;

        let (head, tail) = working.split_at_mut(i + 1);
        let earlier = &head[i];
        for later in tail {
            let candidates = std::mem::take(&mut later.profiles).into_profiles();
            let mut kept = ProfileSet::new();
            for p in candidates {
                let identical = match oracle.same_content(&earlier.revision, &later.revision, &p.file_name) {
                    Ok(same) => same,
                    Err(e) => {
                        tracing::warn!(
                            file = %p.file_name,
                            earlier = %earlier.revision,
                            later = %later.revision,
                            error = %e,
                            "content comparison failed; keeping coverage separate"
                        );
                        false
                    }
                };
                tracing::debug!(
                    file = %p.file_name,
                    earlier = %earlier.revision,
                    later = %later.revision,
                    identical,
                    "compared file across revisions"
                );
                if identical {
                    accumulated.add_profile(p)?;
                } else {
                    kept.add_profile(p)?;
                }
            }
            later.profiles = kept;
        }

        tracing::info!(
            revision = %working[i].revision,
            files = accumulated.len(),
            "reconciled revision"
        );
        reconciled.push(RevisionProfiles {
            revision: working[i].revision.clone(),
            timestamp: working[i].timestamp,
            captures: working[i].captures,
            profiles: accumulated,
        });
    }

    Ok(reconciled)
}
