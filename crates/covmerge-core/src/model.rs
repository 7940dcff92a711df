//! Coverage profile data model.
//!
//! A [`Profile`] is one source file's coverage: a mode plus a sequence of
//! [`Block`]s kept sorted by start position at all times. Blocks are
//! line/column intervals; nothing here knows anything about the language
//! the intervals were measured in.

use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// CoverMode
// ---------------------------------------------------------------------------

/// How execution counts of identical blocks combine.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CoverMode {
    /// Counts are 0/1 flags, combined with logical OR.
    Set,
    /// Counts are execution counts, combined by summing.
    Count,
    /// Like [`CoverMode::Count`], collected with atomic counters.
    Atomic,
    /// Any other mode string. Accepted when parsing, rejected when counts
    /// have to be combined.
    Other(String),
}

impl CoverMode {
    /// Combine an existing count with an incoming one.
    ///
    /// Returns `None` for [`CoverMode::Other`].
    #[must_use]
    pub fn combine(&self, existing: u64, incoming: u64) -> Option<u64> {
        match self {
            Self::Set => Some(existing | incoming),
            Self::Count | Self::Atomic => Some(existing.saturating_add(incoming)),
            Self::Other(_) => None,
        }
    }

    /// The mode as written on a `mode:` line.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Set => "set",
            Self::Count => "count",
            Self::Atomic => "atomic",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for CoverMode {
    fn from(s: &str) -> Self {
        match s {
            "set" => Self::Set,
            "count" => Self::Count,
            "atomic" => Self::Atomic,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl FromStr for CoverMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for CoverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Position / Block
// ---------------------------------------------------------------------------

/// A 1-based `(line, column)` position. Orders lexicographically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub col: u32,
}

impl Position {
    #[must_use]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.line, self.col)
    }
}

/// One coverable interval of a source file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Block {
    /// Start of the interval.
    pub start: Position,
    /// End of the interval (`start <= end`).
    pub end: Position,
    /// Number of statements the interval represents. A fact about the
    /// source, never accumulated.
    pub num_stmt: u64,
    /// Execution count (or 0/1 flag in `set` mode).
    pub count: u64,
}

impl Block {
    /// Build a block from `(line, col)` pairs.
    #[must_use]
    pub const fn new(start: (u32, u32), end: (u32, u32), num_stmt: u64, count: u64) -> Self {
        Self {
            start: Position::new(start.0, start.1),
            end: Position::new(end.0, end.1),
            num_stmt,
            count,
        }
    }

    /// Returns `true` if both blocks cover exactly the same interval.
    #[must_use]
    pub fn same_span(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{} {} {}",
            self.start, self.end, self.num_stmt, self.count
        )
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Coverage data for one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    /// Logical path of the source file; unique within a
    /// [`ProfileSet`](crate::merge::ProfileSet).
    pub file_name: String,
    /// Coverage mode shared by every profile merged with this one.
    pub mode: CoverMode,
    /// Sorted by `start`.
    pub(crate) blocks: Vec<Block>,
}

impl Profile {
    /// An empty profile.
    pub fn new(file_name: impl Into<String>, mode: CoverMode) -> Self {
        Self {
            file_name: file_name.into(),
            mode,
            blocks: Vec::new(),
        }
    }

    /// A profile holding `blocks`, sorted by start position.
    ///
    /// The sort is stable; callers that need overlap validation should merge
    /// blocks one by one through [`merge_block`](crate::merge::merge_block)
    /// instead.
    pub fn with_blocks(file_name: impl Into<String>, mode: CoverMode, mut blocks: Vec<Block>) -> Self {
        blocks.sort_by_key(|b| b.start);
        Self {
            file_name: file_name.into(),
            mode,
            blocks,
        }
    }

    /// The blocks, sorted by start position.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// `(total, covered)` statement counts.
    #[must_use]
    pub fn statements(&self) -> (u64, u64) {
        self.blocks.iter().fold((0, 0), |(total, covered), b| {
            let hit = if b.count > 0 { b.num_stmt } else { 0 };
            (total + b.num_stmt, covered + hit)
        })
    }

    /// Returns `true` if blocks are sorted by start position.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.blocks.windows(2).all(|w| w[0].start <= w[1].start)
    }
}
