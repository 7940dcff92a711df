//! Core merge logic for covmerge.
//!
//! Everything between "a list of capture identifiers" and "one merged
//! profile set" lives here; the binary crate only adds configuration, the
//! report renderer and the command line.
//!
//! # Crate layout
//!
//! - [`model`]: [`Profile`], [`Block`], [`CoverMode`].
//! - [`parse`] / [`dump`]: the `mode:` + block-line text format.
//! - [`merge`]: block merge engine and [`ProfileSet`].
//! - [`capture`]: capture identifiers, grouping, intra-revision merge.
//! - [`oracle`]: [`ContentOracle`] and its git-backed [`RepoOracle`].
//! - [`reconcile`]: cross-revision deduplication.
//! - [`assemble`]: renaming of contested files and snapshot lifetime.
//! - [`error`]: [`CoverError`] and [`OracleError`].

pub mod assemble;
pub mod capture;
pub mod dump;
pub mod error;
pub mod merge;
pub mod model;
pub mod oracle;
pub mod parse;
pub mod reconcile;

#[cfg(test)]
mod merge_props;

pub use assemble::{Assembly, Rename, SnapshotGuard, assemble};
pub use capture::{
    CaptureId, CaptureSource, FsCaptureSource, RevisionGroup, RevisionProfiles, group_captures,
    load_revision, load_revisions,
};
pub use dump::write_profiles;
pub use error::{CoverError, OracleError};
pub use merge::{ProfileSet, merge_block, merge_profiles};
pub use model::{Block, CoverMode, Position, Profile};
pub use oracle::{ContentOracle, RepoOracle};
pub use reconcile::reconcile;
