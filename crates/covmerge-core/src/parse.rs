//! Parser for the line-oriented coverage capture format.
//!
//! ```text
//! mode: set
//! example.com/app/foo.go:1.1,3.2 2 1
//! example.com/app/foo.go:4.3,6.1 1 0
//! ```
//!
//! Fields after the file name are
//! `startLine.startCol,endLine.endCol numStmt count`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::CoverError;
use crate::merge::merge_block;
use crate::model::{Block, CoverMode, Position, Profile};

const MODE_PREFIX: &str = "mode: ";

/// Parse every profile in a capture file.
pub fn parse_file(path: &Path) -> Result<Vec<Profile>, CoverError> {
    let file = File::open(path).map_err(|e| CoverError::io(path, e))?;
    parse_profiles(BufReader::new(file), &path.display().to_string())
}

/// Parse profiles from `reader`. `source_name` only appears in errors.
///
/// The result is sorted by file name; each profile's blocks are sorted by
/// start position, and repeated spans within the capture are combined.
/// Blocks that overlap without repeating a span fail like a merge would.
pub fn parse_profiles(reader: impl BufRead, source_name: &str) -> Result<Vec<Profile>, CoverError> {
    let mut mode: Option<CoverMode> = None;
    let mut files: BTreeMap<String, Vec<Block>> = BTreeMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| CoverError::io(source_name, e))?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let parse_err = |reason: &str| CoverError::Parse {
            source_name: source_name.to_owned(),
            line_no,
            line: line.clone(),
            reason: reason.to_owned(),
        };

        if mode.is_none() {
            let value = line
                .strip_prefix(MODE_PREFIX)
                .filter(|m| !m.trim().is_empty())
                .ok_or_else(|| parse_err("bad mode line"))?;
            mode = Some(CoverMode::from(value.trim()));
            continue;
        }

        let (file_name, block) = parse_line(&line).map_err(parse_err)?;
        files.entry(file_name.to_owned()).or_default().push(block);
    }

    let Some(mode) = mode else {
        return Ok(Vec::new());
    };

    files
        .into_iter()
        .map(|(file_name, blocks)| build_profile(file_name, &mode, blocks))
        .collect()
}

/// Split one block line into its file name and [`Block`].
fn parse_line(line: &str) -> Result<(&str, Block), &'static str> {
    let (file_name, rest) = line.rsplit_once(':').ok_or("missing ':' after file name")?;
    if file_name.is_empty() {
        return Err("empty file name");
    }
    let mut fields = rest.split_whitespace();
    let span = fields.next().ok_or("missing block span")?;
    let num_stmt = fields
        .next()
        .ok_or("missing statement count")?
        .parse::<u64>()
        .map_err(|_| "invalid statement count")?;
    let count = fields
        .next()
        .ok_or("missing execution count")?
        .parse::<u64>()
        .map_err(|_| "invalid execution count")?;
    if fields.next().is_some() {
        return Err("trailing fields");
    }

    let (start, end) = span.split_once(',').ok_or("block span missing ','")?;
    let start = parse_position(start)?;
    let end = parse_position(end)?;
    if end < start {
        return Err("block ends before it starts");
    }
    Ok((
        file_name,
        Block {
            start,
            end,
            num_stmt,
            count,
        },
    ))
}

fn parse_position(s: &str) -> Result<Position, &'static str> {
    let (line, col) = s.split_once('.').ok_or("position missing '.'")?;
    let line = line.parse().map_err(|_| "invalid line number")?;
    let col = col.parse().map_err(|_| "invalid column number")?;
    Ok(Position::new(line, col))
}

/// Sort by start and merge the blocks one by one into a fresh profile.
///
/// Repeated spans combine by mode; any other overlap is rejected by
/// [`merge_block`].
fn build_profile(file_name: String, mode: &CoverMode, mut blocks: Vec<Block>) -> Result<Profile, CoverError> {
    blocks.sort_by_key(|b| b.start);
    let mut profile = Profile::new(file_name, mode.clone());
    let mut hint: usize = 0;
    for b in blocks {
        if let Some(last) = profile.blocks.last()
            && last.same_span(&b)
            && last.num_stmt != b.num_stmt
        {
            return Err(CoverError::InconsistentStatements {
                file: profile.file_name.clone(),
                span: format!("{},{}", b.start, b.end),
                previous: last.num_stmt,
                current: b.num_stmt,
            });
        }
        // Step back one so a repeated span still finds the block it repeats.
        hint = merge_block(&mut profile, b, hint.saturating_sub(1))?;
    }
    Ok(profile)
}
