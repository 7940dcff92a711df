use anyhow::{Result, bail};
use std::str::FromStr;

use crate::run::RunSummary;

/// Output format for the run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One human-readable line
    #[default]
    Text,
    /// Pretty JSON - machine-parseable
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => bail!("Invalid format '{}'. Use: text or json", s),
        }
    }
}

impl OutputFormat {
    /// Render a run summary in this format
    pub fn render(self, summary: &RunSummary) -> Result<String> {
        match self {
            Self::Json => serde_json::to_string_pretty(summary)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {}", e)),
            Self::Text => Ok(match &summary.report {
                Some(report) => format!("generated {} and {}", summary.profile.display(), report.display()),
                None => format!("generated {}", summary.profile.display()),
            }),
        }
    }
}
