//! Error types for the merge pipeline.
//!
//! [`CoverError`] covers every fatal condition of a run: malformed input,
//! irreconcilable modes, inconsistent block overlaps, snapshot failures and
//! I/O. [`OracleError`] is the non-fatal counterpart returned by a
//! [`ContentOracle`](crate::oracle::ContentOracle); reconciliation downgrades
//! it to "not identical".

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{Block, CoverMode};

/// Fatal errors raised while parsing, merging or assembling profiles.
#[derive(Debug, Error)]
pub enum CoverError {
    /// A capture identifier lacks the trailing `.<timestamp>.<revision>` pair.
    #[error("malformed capture identifier '{id}': {reason}")]
    MalformedCaptureId {
        /// The identifier as given.
        id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A capture file could not be parsed.
    #[error("{source_name}:{line_no}: {reason}: {line:?}")]
    Parse {
        /// Where the text came from (path or `<input>`).
        source_name: String,
        /// 1-based line number.
        line_no: usize,
        /// The offending line.
        line: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Two profiles with different coverage modes met in one set.
    #[error("cannot merge profiles with different modes: {file} is '{incoming}', set is '{existing}'")]
    ModeMismatch {
        /// File name of the incoming profile.
        file: String,
        /// Mode already present in the set.
        existing: CoverMode,
        /// Mode of the incoming profile.
        incoming: CoverMode,
    },

    /// Counts cannot be combined under this mode.
    #[error("unsupported coverage mode '{mode}' in {file}")]
    UnsupportedMode {
        /// File whose blocks were being combined.
        file: String,
        /// The unrecognized mode.
        mode: CoverMode,
    },

    /// Same start position, different end position.
    #[error("overlapping merge in {file}: {existing} vs {incoming}")]
    OverlappingMerge {
        /// File name.
        file: String,
        /// Block already in the profile.
        existing: Block,
        /// Block being merged.
        incoming: Block,
    },

    /// The preceding block reaches past the incoming block's end.
    #[error("overlap before in {file}: {existing} vs {incoming}")]
    OverlapBefore {
        /// File name.
        file: String,
        /// The preceding block.
        existing: Block,
        /// Block being merged.
        incoming: Block,
    },

    /// The following block starts before the incoming block ends.
    #[error("overlap after in {file}: {existing} vs {incoming}")]
    OverlapAfter {
        /// File name.
        file: String,
        /// The following block.
        existing: Block,
        /// Block being merged.
        incoming: Block,
    },

    /// One capture repeats a span with a different statement count.
    #[error("inconsistent statement count in {file} at {span}: {previous} then {current}")]
    InconsistentStatements {
        /// File name.
        file: String,
        /// The repeated span, formatted as `l.c,l.c`.
        span: String,
        /// Statement count seen first.
        previous: u64,
        /// Statement count seen later.
        current: u64,
    },

    /// Fetching a source snapshot for a renamed profile failed.
    #[error("failed to fetch {path} at revision {revision}: {source}")]
    SnapshotFetch {
        /// Revision the content was requested at.
        revision: String,
        /// Repository path of the file.
        path: String,
        /// Underlying oracle failure.
        source: OracleError,
    },

    /// A file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The path being accessed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl CoverError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for the three block-overlap variants.
    #[must_use]
    pub const fn is_overlap(&self) -> bool {
        matches!(
            self,
            Self::OverlappingMerge { .. } | Self::OverlapBefore { .. } | Self::OverlapAfter { .. }
        )
    }
}

/// Failure reported by a content oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The revision or the path at that revision could not be resolved.
    #[error("cannot resolve {path} at {revision}: {message}")]
    Unresolved {
        /// Revision queried.
        revision: String,
        /// Repository path queried.
        path: String,
        /// Backend detail.
        message: String,
    },

    /// Any other backend failure.
    #[error("content oracle failed: {0}")]
    Backend(String),
}
