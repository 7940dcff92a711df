//! Post-processing of the rendered HTML report.
//!
//! `go tool cover -html` produces a page with a `<select id="files">` file
//! picker and one `<pre>` per source file. We add a search box that filters
//! the picker and a script that prefixes every source line with its number.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

/// Marker of a previous augmentation.
const SEARCH_BOX: &str = r#"<input\s+id="fileSearch"[^>]*>"#;

/// Anchor the additions are inserted in front of.
const FILE_PICKER: &str = r#"<select\s+id="files"\s*>"#;

const ADDITIONS: &str = r#"
<style>
  .line-number {
    display: inline-block;
    width: 3em;
    margin-right: 1em;
    text-align: right;
    color: #888;
    user-select: none;
  }
</style>
<script>
  const covmergeOptions = [];

  function covmergeCollectOptions() {
    const picker = document.getElementById('files');
    for (const option of picker.getElementsByTagName('option')) {
      covmergeOptions.push(option);
    }
  }

  function covmergeFilterFiles() {
    const needle = document.getElementById('fileSearch').value.trim().toUpperCase();
    for (const option of covmergeOptions) {
      const hit = needle === '' || option.innerText.toUpperCase().includes(needle);
      option.style.display = hit ? '' : 'none';
    }
  }

  function covmergeNumberLines() {
    for (const pre of document.querySelectorAll('pre')) {
      pre.innerHTML = pre.innerHTML
        .split('\n')
        .map((line, i) => '<span class="line-number">' + (i + 1) + '</span>' + line)
        .join('\n');
      pre.style.whiteSpace = 'pre';
    }
  }

  window.addEventListener('load', () => {
    covmergeCollectOptions();
    covmergeNumberLines();
  });
</script>
<input id="fileSearch" type="text" onkeyup="covmergeFilterFiles()" placeholder="Search files...">
"#;

/// Insert the search box and line numbering into `html`.
///
/// Returns `None` when the page is already augmented or has no file picker.
pub fn augment_html(html: &str) -> Result<Option<String>> {
    let search_box = Regex::new(SEARCH_BOX).context("compiling search box pattern")?;
    if search_box.is_match(html) {
        return Ok(None);
    }
    let picker = Regex::new(FILE_PICKER).context("compiling file picker pattern")?;
    let Some(anchor) = picker.find(html) else {
        return Ok(None);
    };

    let mut out = String::with_capacity(html.len() + ADDITIONS.len());
    out.push_str(&html[..anchor.start()]);
    out.push_str(ADDITIONS);
    out.push_str(&html[anchor.start()..]);
    Ok(Some(out))
}

/// Augment the report at `path` in place.
///
/// Returns `Ok(false)` without touching the file when there is nothing to do.
pub fn augment_report(path: &Path) -> Result<bool> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("reading report {}", path.display()))?;
    match augment_html(&html)? {
        Some(updated) => {
            std::fs::write(path, updated)
                .with_context(|| format!("writing report {}", path.display()))?;
            tracing::info!(path = %path.display(), "augmented report");
            Ok(true)
        }
        None => {
            tracing::info!(path = %path.display(), "report already augmented or has no file list");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<html><body><div id=\"nav\">\n<select id=\"files\">\n<option value=\"file0\">a.go (50.0%)</option>\n</select>\n</div><pre class=\"file\" id=\"file0\">package a\n</pre></body></html>";

    #[test]
    fn inserts_before_file_picker() {
        let out = augment_html(PAGE).unwrap().unwrap();
        let search = out.find("id=\"fileSearch\"").unwrap();
        let picker = out.find("<select id=\"files\">").unwrap();
        assert!(search < picker);
        assert!(out.contains("covmergeNumberLines"));
        assert!(out.ends_with("</pre></body></html>"));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let once = augment_html(PAGE).unwrap().unwrap();
        assert!(augment_html(&once).unwrap().is_none());
    }

    #[test]
    fn page_without_picker_is_untouched() {
        assert!(augment_html("<html><body>nothing</body></html>").unwrap().is_none());
    }

    #[test]
    fn augment_report_rewrites_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.html");
        std::fs::write(&path, PAGE).unwrap();

        assert!(augment_report(&path).unwrap());
        let first = std::fs::read_to_string(&path).unwrap();
        assert!(!augment_report(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), first);
        assert_eq!(first.matches("id=\"fileSearch\"").count(), 1);
    }

    #[test]
    fn missing_report_is_an_error() {
        let err = augment_report(Path::new("/nonexistent/cover.html")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/cover.html"));
    }
}
