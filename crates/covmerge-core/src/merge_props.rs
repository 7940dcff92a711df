//! Property tests for the block merge engine.
//!
//! Captures are generated as random subsets of one shared tiling per file,
//! so any two captures are mutually consistent and every merge must succeed.

use proptest::prelude::*;

use crate::merge::ProfileSet;
use crate::model::{Block, CoverMode, Profile};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Non-overlapping blocks in ascending order, counts zeroed.
fn arb_tiling() -> impl Strategy<Value = Vec<Block>> {
    prop::collection::vec((0u32..3, 0u32..4, 1u32..20, 1u64..4), 1..12).prop_map(|segments| {
        let mut line = 1;
        segments
            .into_iter()
            .map(|(gap, len, col, stmts)| {
                let start = line + gap;
                let end = start + len;
                line = end + 1;
                Block::new((start, col), (end, col + 1), stmts, 0)
            })
            .collect()
    })
}

fn arb_files() -> impl Strategy<Value = Vec<(String, Vec<Block>)>> {
    prop::collection::btree_map("[a-z]{1,6}\\.go", arb_tiling(), 1..4)
        .prop_map(|m| m.into_iter().collect())
}

fn arb_mode() -> impl Strategy<Value = CoverMode> {
    prop_oneof![
        Just(CoverMode::Set),
        Just(CoverMode::Count),
        Just(CoverMode::Atomic),
    ]
}

fn arb_picks() -> impl Strategy<Value = Vec<(bool, u64)>> {
    prop::collection::vec((any::<bool>(), 0u64..5), 1..16)
}

/// One capture: each block of each file kept or dropped by `picks`.
fn capture(files: &[(String, Vec<Block>)], picks: &[(bool, u64)], mode: &CoverMode) -> Vec<Profile> {
    let mut k = 0;
    let mut out = Vec::new();
    for (name, tiling) in files {
        let mut blocks = Vec::new();
        for b in tiling {
            let (keep, count) = picks[k % picks.len()];
            k += 1;
            if keep {
                let count = if *mode == CoverMode::Set { count % 2 } else { count };
                blocks.push(Block { count, ..*b });
            }
        }
        if !blocks.is_empty() {
            out.push(Profile::with_blocks(name.clone(), mode.clone(), blocks));
        }
    }
    out
}

fn merged(captures: &[&[Profile]]) -> ProfileSet {
    let mut set = ProfileSet::new();
    for c in captures {
        for p in *c {
            set.add_profile(p.clone()).unwrap();
        }
    }
    set
}

fn strictly_tiled(p: &Profile) -> bool {
    p.is_sorted() && p.blocks().windows(2).all(|w| w[0].end <= w[1].start)
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn merging_with_itself_adds_no_blocks(
        files in arb_files(),
        picks in arb_picks(),
        mode in arb_mode(),
    ) {
        let a = capture(&files, &picks, &mode);
        let once = merged(&[&a]);
        let twice = merged(&[&a, &a]);

        prop_assert_eq!(once.len(), twice.len());
        for (p1, p2) in once.profiles().iter().zip(twice.profiles()) {
            prop_assert_eq!(&p1.file_name, &p2.file_name);
            prop_assert_eq!(p1.blocks().len(), p2.blocks().len());
            for (b1, b2) in p1.blocks().iter().zip(p2.blocks()) {
                prop_assert!(b1.same_span(b2));
                prop_assert_eq!(b1.num_stmt, b2.num_stmt);
                let expected = if mode == CoverMode::Set { b1.count } else { b1.count * 2 };
                prop_assert_eq!(b2.count, expected);
            }
        }
    }

    #[test]
    fn merge_order_does_not_matter(
        files in arb_files(),
        picks_a in arb_picks(),
        picks_b in arb_picks(),
        mode in arb_mode(),
    ) {
        let a = capture(&files, &picks_a, &mode);
        let b = capture(&files, &picks_b, &mode);
        prop_assert_eq!(merged(&[&a, &b]), merged(&[&b, &a]));
    }

    #[test]
    fn blocks_stay_sorted_after_any_merge_sequence(
        files in arb_files(),
        all_picks in prop::collection::vec(arb_picks(), 1..6),
        mode in arb_mode(),
    ) {
        let captures: Vec<Vec<Profile>> = all_picks
            .iter()
            .map(|picks| capture(&files, picks, &mode))
            .collect();
        let refs: Vec<&[Profile]> = captures.iter().map(Vec::as_slice).collect();
        let set = merged(&refs);

        let names: Vec<&str> = set.profiles().iter().map(|p| p.file_name.as_str()).collect();
        let mut sorted_names = names.clone();
        sorted_names.sort_unstable();
        prop_assert_eq!(names, sorted_names);
        for p in set.profiles() {
            prop_assert!(strictly_tiled(p), "{} not tiled: {:?}", p.file_name, p.blocks());
        }
    }
}
