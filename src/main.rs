use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use covmerge::config::{CONFIG_FILE, CovmergeConfig, Overrides};
use covmerge::format::OutputFormat;
use covmerge::report::{GoCoverRenderer, ReportRenderer};
use covmerge::telemetry;
use covmerge_core::{FsCaptureSource, RepoOracle};
use covmerge_git::GixRepo;

/// Merge Go coverage profiles captured against different revisions
///
/// Each capture file name ends in `.<timestamp>.<revision>`, e.g.
/// `cover.txt.1723042827.e24dac6`. Captures of the same revision are merged
/// block by block. Across revisions, a file's coverage is combined only when
/// the file is byte-identical in both revisions (checked in the git
/// repository); otherwise each variant is kept as `<file>.<revision>`.
///
/// EXAMPLE:
///
///   covmerge --outcover merged.txt --outhtml merged.html 'covdata/cover.txt.*'
///
/// LOGGING:
///
///   COVMERGE_LOG=info covmerge ...        # phase results
///   COVMERGE_LOG=debug covmerge ...       # per-file reconciliation decisions
///   COVMERGE_LOG_FORMAT=json covmerge ... # JSON logs on stderr
#[derive(Parser)]
#[command(name = "covmerge")]
#[command(version, about)]
struct Cli {
    /// Capture files (glob patterns are expanded)
    #[arg(required = true, value_name = "CAPTURE")]
    captures: Vec<String>,

    /// Merged profile output path [default: cover.txt]
    #[arg(long, value_name = "PATH")]
    outcover: Option<PathBuf>,

    /// HTML report output path [default: cover.html]
    #[arg(long, value_name = "PATH")]
    outhtml: Option<PathBuf>,

    /// Prefix joining profile file names to repository paths [default: go/src]
    #[arg(long, value_name = "PREFIX")]
    repo_prefix: Option<String>,

    /// Directory renamed source snapshots are written under [default: go/src]
    #[arg(long, value_name = "DIR")]
    snapshot_root: Option<PathBuf>,

    /// Skip rendering the HTML report
    #[arg(long)]
    no_report: bool,

    /// Skip the search box and line numbers in the HTML report
    #[arg(long)]
    no_augment: bool,

    /// Git repository the captures were taken from
    #[arg(long, value_name = "DIR", default_value = ".")]
    repo: PathBuf,

    /// Output format for the summary: text or json
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Configuration file
    #[arg(long, value_name = "PATH", default_value = CONFIG_FILE)]
    config: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init();

    let config = CovmergeConfig::load(&cli.config)?.resolve(Overrides {
        output_profile: cli.outcover,
        output_report: cli.outhtml,
        repo_prefix: cli.repo_prefix,
        snapshot_root: cli.snapshot_root,
        no_report: cli.no_report,
        no_augment: cli.no_augment,
    });
    tracing::debug!(?config, "resolved configuration");

    let captures = expand_captures(&cli.captures)?;

    let repo = GixRepo::open(&cli.repo)
        .with_context(|| format!("failed to open git repository at {}", cli.repo.display()))?;
    let oracle = RepoOracle::new(repo, config.repo_prefix.clone());
    let renderer = GoCoverRenderer::new(config.go.clone(), config.gopath.clone());
    let renderer = config
        .render_report
        .then_some(&renderer as &dyn ReportRenderer);

    let summary = covmerge::run(&config, &captures, &FsCaptureSource, &oracle, renderer)?;
    println!("{}", cli.format.render(&summary)?);
    Ok(())
}

/// Expand glob patterns; plain arguments pass through untouched.
fn expand_captures(args: &[String]) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        if !arg.contains(['*', '?', '[']) {
            out.push(arg.clone());
            continue;
        }
        let mut matches: Vec<PathBuf> = glob::glob(arg)
            .with_context(|| format!("invalid glob pattern '{arg}'"))?
            .collect::<Result<_, _>>()
            .with_context(|| format!("reading matches of '{arg}'"))?;
        if matches.is_empty() {
            bail!("no capture files match '{arg}'");
        }
        matches.sort();
        out.extend(matches.iter().map(|p| path_string(p)));
    }
    Ok(out)
}

fn path_string(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}
