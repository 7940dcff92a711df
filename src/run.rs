//! The merge pipeline, end to end.
//!
//! ```text
//! identifiers ─► group ─► load (per revision) ─► reconcile ─► assemble
//!                                                               │
//!            summary ◄─ augment ◄─ render ◄─ write profile ◄────┘
//! ```
//!
//! Every collaborator that touches the outside world (capture files, the
//! repository, the report renderer) comes in as an argument, so tests can run
//! the whole pipeline against fakes.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use covmerge_core::{
    CaptureSource, ContentOracle, ProfileSet, Rename, assemble, group_captures, load_revisions,
    reconcile, write_profiles,
};
use serde::Serialize;
use tracing::instrument;

use crate::augment::augment_report;
use crate::config::RunConfig;
use crate::report::ReportRenderer;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// What a run did.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Revisions in chronological order.
    pub revisions: Vec<RevisionSummary>,
    /// Files in the merged profile.
    pub files: usize,
    /// Blocks in the merged profile.
    pub blocks: usize,
    /// Statements in the merged profile.
    pub statements: u64,
    /// Statements executed at least once.
    pub covered: u64,
    /// Contested files that were given a revision suffix.
    pub renames: Vec<Rename>,
    /// Where the merged profile was written.
    pub profile: PathBuf,
    /// Where the report was written, if rendered.
    pub report: Option<PathBuf>,
    /// Whether the report was augmented by this run.
    pub augmented: bool,
}

/// Per-revision counts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RevisionSummary {
    pub revision: String,
    pub timestamp: i64,
    /// Captures merged for this revision.
    pub captures: usize,
    /// Files captured against this revision.
    pub files_captured: usize,
    /// Files attributed to this revision after reconciliation.
    pub files_attributed: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Merge `captures` and write the results described by `config`.
///
/// Nothing is written unless every capture parses and merges cleanly. Source
/// snapshots written for renamed files are removed before returning, whether
/// the run succeeded or not.
#[instrument(skip_all, fields(captures = captures.len(), profile = %config.output_profile.display()))]
pub fn run<S: AsRef<str>>(
    config: &RunConfig,
    captures: &[S],
    source: &dyn CaptureSource,
    oracle: &dyn ContentOracle,
    renderer: Option<&dyn ReportRenderer>,
) -> Result<RunSummary> {
    let groups = group_captures(captures).context("invalid capture identifier")?;
    tracing::info!(revisions = groups.len(), "grouped captures");

    let loaded = load_revisions(&groups, source).context("failed to merge captures")?;
    let captured: Vec<usize> = loaded.iter().map(|r| r.profiles.len()).collect();

    let reconciled = reconcile(loaded, oracle).context("failed to reconcile revisions")?;
    let revisions: Vec<RevisionSummary> = reconciled
        .iter()
        .zip(captured)
        .map(|(r, files_captured)| RevisionSummary {
            revision: r.revision.clone(),
            timestamp: r.timestamp,
            captures: r.captures,
            files_captured,
            files_attributed: r.profiles.len(),
        })
        .collect();

    let assembly = assemble(reconciled, oracle, &config.snapshot_root)
        .context("failed to assemble merged profile")?;

    write_profile_atomic(&assembly.profiles, &config.output_profile)?;

    let mut report = None;
    let mut augmented = false;
    if config.render_report
        && let Some(renderer) = renderer
    {
        renderer.render(&config.output_profile, &config.output_report)?;
        if config.augment_report {
            augmented = augment_report(&config.output_report)?;
        }
        report = Some(config.output_report.clone());
    }

    let (statements, covered) = assembly.profiles.statements();
    let summary = RunSummary {
        revisions,
        files: assembly.profiles.len(),
        blocks: assembly.profiles.block_count(),
        statements,
        covered,
        renames: assembly.renames,
        profile: config.output_profile.clone(),
        report,
        augmented,
    };
    drop(assembly.snapshots);
    Ok(summary)
}

/// Serialize `set` to `path` via a temporary file in the same directory.
fn write_profile_atomic(set: &ProfileSet, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))?;

    let tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    let mut out = BufWriter::new(tmp);
    write_profiles(set, &mut out).with_context(|| format!("write {}", path.display()))?;
    out.flush().with_context(|| format!("write {}", path.display()))?;
    let tmp = out
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("write {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("fsync {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("rename temp file to {}", path.display()))?;

    tracing::info!(path = %path.display(), files = set.len(), "wrote merged profile");
    Ok(())
}
