//! covmerge configuration (`.covmerge.toml`).
//!
//! Defines the typed file configuration and the resolved [`RunConfig`] the
//! pipeline runs with. Command-line flags are layered on top through
//! [`Overrides`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".covmerge.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level covmerge configuration.
///
/// Missing fields use defaults. Missing file → all defaults (no error).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CovmergeConfig {
    /// Output destinations.
    #[serde(default)]
    pub output: OutputConfig,

    /// How profile file names map onto the repository.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report rendering.
    #[serde(default)]
    pub report: ReportConfig,
}

// ---------------------------------------------------------------------------
// OutputConfig
// ---------------------------------------------------------------------------

/// Where results are written.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Merged profile (default: `cover.txt`).
    #[serde(default = "default_profile")]
    pub profile: PathBuf,

    /// Rendered report (default: `cover.html`).
    #[serde(default = "default_report")]
    pub report: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            report: default_report(),
        }
    }
}

fn default_profile() -> PathBuf {
    PathBuf::from("cover.txt")
}

fn default_report() -> PathBuf {
    PathBuf::from("cover.html")
}

// ---------------------------------------------------------------------------
// SourceConfig
// ---------------------------------------------------------------------------

/// Source layout settings.
///
/// Go profiles name files by import path (`example.com/pkg/f.go`); inside a
/// GOPATH-style checkout those live under `go/src/`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Prefix joining profile file names to repository paths.
    #[serde(default = "default_go_src")]
    pub repo_prefix: String,

    /// Directory renamed source snapshots are written under.
    #[serde(default = "default_snapshot_root")]
    pub snapshot_root: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            repo_prefix: default_go_src(),
            snapshot_root: default_snapshot_root(),
        }
    }
}

fn default_go_src() -> String {
    "go/src".to_owned()
}

fn default_snapshot_root() -> PathBuf {
    PathBuf::from(default_go_src())
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

/// HTML report settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Render the report at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Inject the file search box and line numbers.
    #[serde(default = "default_true")]
    pub augment: bool,

    /// The `go` binary used to render.
    #[serde(default = "default_go")]
    pub go: String,

    /// `GOPATH` for the renderer. Relative paths resolve against the working
    /// directory. `None` inherits the environment.
    #[serde(default = "default_gopath")]
    pub gopath: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            augment: true,
            go: default_go(),
            gopath: default_gopath(),
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_go() -> String {
    "go".to_owned()
}

fn default_gopath() -> Option<PathBuf> {
    Some(PathBuf::from("go"))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Error loading a covmerge configuration file.
#[derive(Debug)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl CovmergeConfig {
    /// Load configuration from a TOML file.
    ///
    /// - If the file does not exist, returns all defaults (not an error).
    /// - If the file exists but contains invalid TOML or unknown fields,
    ///   returns a [`ConfigError`] with line-level detail.
    ///
    /// # Errors
    /// Returns `ConfigError` on I/O errors (other than not-found) or parse errors.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError {
                    path: Some(path.to_owned()),
                    message: format!("could not read file: {e}"),
                });
            }
        };
        Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML or unknown fields.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }

    /// Resolve into a [`RunConfig`], letting `overrides` win.
    #[must_use]
    pub fn resolve(self, overrides: Overrides) -> RunConfig {
        RunConfig {
            output_profile: overrides.output_profile.unwrap_or(self.output.profile),
            output_report: overrides.output_report.unwrap_or(self.output.report),
            repo_prefix: overrides.repo_prefix.unwrap_or(self.source.repo_prefix),
            snapshot_root: overrides.snapshot_root.unwrap_or(self.source.snapshot_root),
            render_report: self.report.enabled && !overrides.no_report,
            augment_report: self.report.augment && !overrides.no_augment,
            go: self.report.go,
            gopath: self.report.gopath,
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Values set on the command line, taking precedence over the file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Overrides {
    pub output_profile: Option<PathBuf>,
    pub output_report: Option<PathBuf>,
    pub repo_prefix: Option<String>,
    pub snapshot_root: Option<PathBuf>,
    pub no_report: bool,
    pub no_augment: bool,
}

/// Fully resolved settings for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Where the merged profile is written.
    pub output_profile: PathBuf,
    /// Where the HTML report is written.
    pub output_report: PathBuf,
    /// Prefix joining profile file names to repository paths.
    pub repo_prefix: String,
    /// Where renamed source snapshots are written.
    pub snapshot_root: PathBuf,
    /// Render the HTML report.
    pub render_report: bool,
    /// Augment the rendered report.
    pub augment_report: bool,
    /// `go` binary for rendering.
    pub go: String,
    /// `GOPATH` for rendering.
    pub gopath: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        CovmergeConfig::default().resolve(Overrides::default())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
