//! HTML report rendering.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Turns a merged profile into a human-readable report.
pub trait ReportRenderer {
    /// Render `profile` into `report`.
    fn render(&self, profile: &Path, report: &Path) -> Result<()>;
}

/// Renders with `go tool cover -html`.
///
/// Renamed profiles (`f.go.<rev>`) only render if their snapshots are
/// reachable through `GOPATH`, hence the override.
#[derive(Clone, Debug)]
pub struct GoCoverRenderer {
    go: String,
    gopath: Option<PathBuf>,
}

impl GoCoverRenderer {
    /// `go` is the binary to invoke; `gopath`, when set and non-empty, is
    /// exported as `GOPATH` (relative paths are made absolute).
    #[must_use]
    pub fn new(go: impl Into<String>, gopath: Option<PathBuf>) -> Self {
        Self {
            go: go.into(),
            gopath: gopath.filter(|p| !p.as_os_str().is_empty()),
        }
    }

    /// The `GOPATH` the child process will see, if overridden.
    pub fn effective_gopath(&self) -> Result<Option<PathBuf>> {
        let Some(gopath) = &self.gopath else {
            return Ok(None);
        };
        if gopath.is_absolute() {
            return Ok(Some(gopath.clone()));
        }
        let cwd = std::env::current_dir().context("resolving GOPATH against current directory")?;
        Ok(Some(cwd.join(gopath)))
    }

    fn command(&self, profile: &Path, report: &Path) -> Result<Command> {
        let mut cmd = Command::new(&self.go);
        cmd.arg("tool")
            .arg("cover")
            .arg(format!("-html={}", profile.display()))
            .arg("-o")
            .arg(report);
        if let Some(gopath) = self.effective_gopath()? {
            cmd.env("GOPATH", gopath);
        }
        Ok(cmd)
    }
}

impl ReportRenderer for GoCoverRenderer {
    fn render(&self, profile: &Path, report: &Path) -> Result<()> {
        let mut cmd = self.command(profile, report)?;
        tracing::debug!(command = ?cmd, "rendering report");
        let status = cmd
            .status()
            .with_context(|| format!("failed to run '{}'", self.go))?;
        if !status.success() {
            bail!(
                "'{} tool cover' failed ({status}) rendering {} from {}",
                self.go,
                report.display(),
                profile.display()
            );
        }
        tracing::info!(report = %report.display(), "rendered report");
        Ok(())
    }
}
