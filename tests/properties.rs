use proptest::prelude::*;
use proptest::sample::Index;

use bracket_tree::{validate_structure, BracketTree, Length};

mod common;
use common::{assert_incremental_matches_scratch, leaves, replace};

/// Bracket-heavy documents; plain ASCII so any byte index is a char
/// boundary.
fn doc_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just('('),
            Just(')'),
            Just('['),
            Just(']'),
            Just('{'),
            Just('}'),
            Just('a'),
            Just(' '),
            Just('\n'),
        ],
        0..120,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn small_text() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![Just('('), Just(')'), Just('['), Just('x'), Just('\n')],
        0..16,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

proptest! {
    #[test]
    fn parses_are_structurally_valid(doc in doc_strategy()) {
        let tree = BracketTree::parse_text(&doc);
        let snapshot = tree.read();
        prop_assert_eq!(snapshot.root.length(), Length::of_str(&doc));
        prop_assert!(validate_structure(&snapshot.root));
    }

    #[test]
    fn depth_never_exceeds_open_brackets(doc in doc_strategy()) {
        let tree = BracketTree::parse_text(&doc);
        let opens = doc.chars().filter(|c| "([{".contains(*c)).count() as u32;
        for bracket in tree.brackets_in_range(Length::ZERO, tree.length()) {
            prop_assert!(bracket.depth < opens.max(1));
        }
    }

    #[test]
    fn single_edit_matches_scratch(
        doc in doc_strategy(),
        a in any::<Index>(),
        b in any::<Index>(),
        replacement in small_text(),
    ) {
        let i = a.index(doc.len() + 1);
        let j = b.index(doc.len() + 1);
        let (start, end) = if i <= j { (i, j) } else { (j, i) };
        let (new_text, edit) = replace(&doc, start..end, &replacement);
        assert_incremental_matches_scratch(&doc, &new_text, &[edit]);
    }

    #[test]
    fn disjoint_edit_pairs_match_scratch(
        doc in doc_strategy(),
        picks in proptest::array::uniform4(any::<Index>()),
        left in small_text(),
        right in small_text(),
    ) {
        let mut bounds: Vec<usize> =
            picks.iter().map(|pick| pick.index(doc.len() + 1)).collect();
        bounds.sort_unstable();
        let (a, b, c, d) = (bounds[0], bounds[1], bounds[2], bounds[3]);
        // Touching inserts at one offset have no defined order; require a gap.
        prop_assume!(b < c);

        // Apply right to left so earlier offsets stay valid, the way hosts
        // deliver batches.
        let (mid_text, second) = replace(&doc, c..d, &right);
        let (new_text, first) = replace(&mid_text, a..b, &left);
        assert_incremental_matches_scratch(&doc, &new_text, &[second, first]);
    }

    #[test]
    fn edit_chains_stay_equivalent(
        doc in doc_strategy(),
        steps in proptest::collection::vec(
            (any::<Index>(), any::<Index>(), small_text()),
            1..6,
        ),
    ) {
        // One tree follows the document through several rebuilds; every
        // intermediate state must match a from-scratch parse.
        let tree = BracketTree::parse_text(&doc);
        let mut text = doc;
        for (a, b, replacement) in steps {
            let i = a.index(text.len() + 1);
            let j = b.index(text.len() + 1);
            let (start, end) = if i <= j { (i, j) } else { (j, i) };
            let (new_text, edit) = replace(&text, start..end, &replacement);
            common::apply(&tree, &new_text, &[edit]);
            let scratch = BracketTree::parse_text(&new_text);
            prop_assert_eq!(
                leaves(&tree.read().root),
                leaves(&scratch.read().root)
            );
            prop_assert!(validate_structure(&tree.read().root));
            text = new_text;
        }
    }

    #[test]
    fn merging_any_list_level_is_lossless(doc in doc_strategy()) {
        let tree = BracketTree::parse_text(&doc);
        let snapshot = tree.read();
        if let bracket_tree::Node::List(list) = &*snapshot.root {
            if !list.items.is_empty() {
                let merged = bracket_tree::merge_lists(list.items.clone()).unwrap();
                prop_assert_eq!(leaves(&snapshot.root), leaves(&merged));
            }
        }
    }
}
