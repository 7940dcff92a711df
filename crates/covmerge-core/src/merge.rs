//! Block merge engine and sorted profile sets.
//!
//! Captures taken against the same file revision must tile the source
//! identically: every block either matches an existing block exactly (same
//! start, same end) and has its count combined, or lands in a gap between
//! existing blocks. Anything else is an inconsistency and aborts the merge.
//!
//! # Complexity
//!
//! Incoming blocks arrive sorted, so each binary search starts where the
//! previous one ended. Merging N blocks into M costs O((N+M) log M) plus the
//! cost of the insertions.

use crate::error::CoverError;
use crate::model::{Block, CoverMode, Profile};

// ---------------------------------------------------------------------------
// Block merge
// ---------------------------------------------------------------------------

/// Merge a single block into `into`, searching from `search_start` onwards.
///
/// Returns the search hint for the next (later-starting) incoming block.
///
/// # Errors
///
/// - [`CoverError::OverlappingMerge`] when a block with the same start but a
///   different end exists.
/// - [`CoverError::UnsupportedMode`] when counts must be combined under an
///   unrecognized mode.
/// - [`CoverError::OverlapBefore`] / [`CoverError::OverlapAfter`] when the
///   block would be inserted next to a block it overlaps.
pub fn merge_block(into: &mut Profile, incoming: Block, search_start: usize) -> Result<usize, CoverError> {
    let from = search_start.min(into.blocks.len());
    let i = from + into.blocks[from..].partition_point(|b| b.start < incoming.start);

    if let Some(existing) = into.blocks.get_mut(i).filter(|b| b.start == incoming.start) {
        if existing.end != incoming.end {
            return Err(CoverError::OverlappingMerge {
                file: into.file_name.clone(),
                existing: *existing,
                incoming,
            });
        }
        existing.count = into
            .mode
            .combine(existing.count, incoming.count)
            .ok_or_else(|| CoverError::UnsupportedMode {
                file: into.file_name.clone(),
                mode: into.mode.clone(),
            })?;
        return Ok(i + 1);
    }

    if let Some(prev) = i.checked_sub(1).map(|p| into.blocks[p])
        && prev.end > incoming.end
    {
        return Err(CoverError::OverlapBefore {
            file: into.file_name.clone(),
            existing: prev,
            incoming,
        });
    }
    if let Some(next) = into.blocks.get(i)
        && next.start < incoming.end
    {
        return Err(CoverError::OverlapAfter {
            file: into.file_name.clone(),
            existing: *next,
            incoming,
        });
    }

    into.blocks.insert(i, incoming);
    Ok(i + 1)
}

/// Merge every block of `incoming` into `into`.
///
/// Both profiles must describe the same file with the same mode. On error
/// `into` may be partially merged; callers abort the run.
pub fn merge_profiles(into: &mut Profile, incoming: &Profile) -> Result<(), CoverError> {
    if into.mode != incoming.mode {
        return Err(CoverError::ModeMismatch {
            file: incoming.file_name.clone(),
            existing: into.mode.clone(),
            incoming: incoming.mode.clone(),
        });
    }
    let mut hint = 0;
    for block in &incoming.blocks {
        hint = merge_block(into, *block, hint)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ProfileSet
// ---------------------------------------------------------------------------

/// Profiles sorted by file name, at most one per name, all sharing one mode.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileSet {
    profiles: Vec<Profile>,
}

impl ProfileSet {
    /// An empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    /// Build a set by adding each profile in turn.
    pub fn from_profiles(profiles: impl IntoIterator<Item = Profile>) -> Result<Self, CoverError> {
        let mut set = Self::new();
        for p in profiles {
            set.add_profile(p)?;
        }
        Ok(set)
    }

    /// Insert `profile`, or merge it into the existing profile of the same
    /// file name.
    ///
    /// # Errors
    ///
    /// [`CoverError::ModeMismatch`] if `profile`'s mode differs from the
    /// set's mode, plus any error from [`merge_block`].
    pub fn add_profile(&mut self, profile: Profile) -> Result<(), CoverError> {
        if let Some(mode) = self.mode()
            && *mode != profile.mode
        {
            return Err(CoverError::ModeMismatch {
                file: profile.file_name,
                existing: mode.clone(),
                incoming: profile.mode,
            });
        }
        match self
            .profiles
            .binary_search_by(|p| p.file_name.as_str().cmp(&profile.file_name))
        {
            Ok(i) => merge_profiles(&mut self.profiles[i], &profile),
            Err(i) => {
                self.profiles.insert(i, profile);
                Ok(())
            }
        }
    }

    /// Add every profile of `other`.
    pub fn extend_from(&mut self, other: Self) -> Result<(), CoverError> {
        for p in other.profiles {
            self.add_profile(p)?;
        }
        Ok(())
    }

    /// The mode shared by all profiles, or `None` when empty.
    #[must_use]
    pub fn mode(&self) -> Option<&CoverMode> {
        self.profiles.first().map(|p| &p.mode)
    }

    /// Look up a profile by file name.
    #[must_use]
    pub fn get(&self, file_name: &str) -> Option<&Profile> {
        self.profiles
            .binary_search_by(|p| p.file_name.as_str().cmp(file_name))
            .ok()
            .map(|i| &self.profiles[i])
    }

    /// Returns `true` if a profile for `file_name` is present.
    #[must_use]
    pub fn contains(&self, file_name: &str) -> bool {
        self.get(file_name).is_some()
    }

    /// Profiles in file-name order.
    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Consume the set, yielding profiles in file-name order.
    #[must_use]
    pub fn into_profiles(self) -> Vec<Profile> {
        self.profiles
    }

    /// Number of profiles (files).
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns `true` if the set holds no profiles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Total number of blocks across all profiles.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.profiles.iter().map(|p| p.blocks.len()).sum()
    }

    /// `(total, covered)` statements across all profiles.
    #[must_use]
    pub fn statements(&self) -> (u64, u64) {
        self.profiles.iter().fold((0, 0), |(t, c), p| {
            let (pt, pc) = p.statements();
            (t + pt, c + pc)
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
