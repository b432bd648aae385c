use bracket_tree::{BracketTree, Length, Node};

mod common;

fn whole(tree: &BracketTree) -> (Length, Length) {
    (Length::ZERO, tree.length())
}

#[test]
fn single_pair() {
    let tree = BracketTree::parse_text("()");
    let snapshot = tree.read();
    assert_eq!(snapshot.length, Length::new(0, 2));

    match &*snapshot.root {
        Node::Pair(pair) => {
            assert_eq!(pair.category, 2);
            assert!(pair.child.is_none());
            assert!(pair.closing.is_some());
        }
        other => panic!("expected a pair at the root, got {other:?}"),
    }

    let (start, end) = whole(&tree);
    let brackets = tree.brackets_in_range(start, end);
    assert_eq!(brackets.len(), 2);
    assert_eq!(
        (brackets[0].start, brackets[0].end, brackets[0].depth),
        (Length::ZERO, Length::new(0, 1), 0)
    );
    assert_eq!(
        (brackets[1].start, brackets[1].end, brackets[1].depth),
        (Length::new(0, 1), Length::new(0, 2), 0)
    );
}

#[test]
fn nested_pair_of_other_category() {
    let tree = BracketTree::parse_text("[()]");
    let snapshot = tree.read();

    match &*snapshot.root {
        Node::Pair(outer) => {
            assert_eq!(outer.category, 1);
            match outer.child.as_deref() {
                Some(Node::Pair(inner)) => {
                    assert_eq!(inner.category, 2);
                    assert!(inner.closing.is_some());
                }
                other => panic!("expected an inner pair, got {other:?}"),
            }
        }
        other => panic!("expected a pair at the root, got {other:?}"),
    }

    let (start, end) = whole(&tree);
    let depths: Vec<u32> = tree
        .brackets_in_range(start, end)
        .iter()
        .map(|b| b.depth)
        .collect();
    assert_eq!(depths, [0, 1, 1, 0]);
}

#[test]
fn mismatched_closer_stays_inside_the_open_pair() {
    let tree = BracketTree::parse_text("(]");
    let snapshot = tree.read();
    assert_eq!(snapshot.root.length(), Length::new(0, 2));

    match &*snapshot.root {
        Node::Pair(pair) => {
            assert_eq!(pair.category, 2);
            assert!(pair.closing.is_none());
            assert!(matches!(
                pair.child.as_deref(),
                Some(Node::InvalidBracket { .. })
            ));
        }
        other => panic!("expected an unclosed pair at the root, got {other:?}"),
    }

    // The stray closer is not reported.
    let (start, end) = whole(&tree);
    let brackets = tree.brackets_in_range(start, end);
    assert_eq!(brackets.len(), 1);
    assert_eq!(brackets[0].depth, 0);
}

#[test]
fn three_category_nesting_reports_depths() {
    let tree = BracketTree::parse_text("{ [ ( ) ] }");
    let (start, end) = whole(&tree);
    let depths: Vec<u32> = tree
        .brackets_in_range(start, end)
        .iter()
        .map(|b| b.depth)
        .collect();
    assert_eq!(depths, [0, 1, 2, 2, 1, 0]);
}

#[test]
fn pairs_in_range_reports_matched_ranges() {
    let text = "{ [ ( ) ] }";
    let tree = BracketTree::parse_text(text);
    let (start, end) = whole(&tree);
    let pairs = tree.pairs_in_range(start, end);

    assert_eq!(pairs.len(), 3);
    assert_eq!(
        pairs.iter().map(|p| (p.category, p.depth)).collect::<Vec<_>>(),
        [(3, 0), (1, 1), (2, 2)]
    );
    for pair in &pairs {
        assert!(pair.closing.is_some());
    }
    // The outermost pair spans the whole document.
    assert_eq!(pairs[0].opening.0, Length::ZERO);
    assert_eq!(pairs[0].closing.unwrap().1, Length::of_str(text));
}

#[test]
fn empty_document() {
    let tree = BracketTree::parse_text("");
    let snapshot = tree.read();
    assert_eq!(snapshot.length, Length::ZERO);
    assert!(snapshot.root.is_empty_list());
    assert!(tree.brackets_in_range(Length::ZERO, Length::ZERO).is_empty());
}

#[test]
fn only_unmatched_closers() {
    let tree = BracketTree::parse_text(")]}");
    let snapshot = tree.read();
    let leaves = common::leaves(&snapshot.root);
    assert_eq!(leaves.len(), 3);
    for leaf in &leaves {
        assert!(
            matches!(leaf, bracket_tree::FlatNode::InvalidBracket(..)),
            "unexpected leaf {leaf:?}"
        );
    }
    let (start, end) = whole(&tree);
    assert!(tree.brackets_in_range(start, end).is_empty());
}

#[test]
fn deep_nesting_depths_mirror() {
    let n = 50u32;
    let text = "(".repeat(n as usize) + &")".repeat(n as usize);
    let tree = BracketTree::parse_text(&text);
    let (start, end) = whole(&tree);
    let depths: Vec<u32> = tree
        .brackets_in_range(start, end)
        .iter()
        .map(|b| b.depth)
        .collect();
    let expected: Vec<u32> = (0..n).chain((0..n).rev()).collect();
    assert_eq!(depths, expected);
}

#[test]
fn flat_sibling_runs_stay_balanced() {
    let count = 100usize;
    let text = "()".repeat(count);
    let tree = BracketTree::parse_text(&text);
    let root = &tree.read().root;
    assert!(bracket_tree::validate_structure(root));
    // (2,3) balance keeps the list height logarithmic in the sibling count.
    let bound = (count as f64).log2().ceil() as u8 + 1;
    assert!(root.list_height() <= bound, "height {}", root.list_height());
}

#[test]
fn query_window_prunes_outside_brackets() {
    let tree = BracketTree::parse_text("((()))");
    let brackets = tree.brackets_in_range(Length::new(0, 2), Length::new(0, 4));
    assert_eq!(brackets.len(), 2);
    assert_eq!(brackets[0].start, Length::new(0, 2));
    assert_eq!(brackets[1].end, Length::new(0, 4));
    assert!(brackets.iter().all(|b| b.depth == 2));
}

#[test]
fn multi_line_documents_report_line_aware_ranges() {
    let text = "{\n  ()\n}";
    let tree = BracketTree::parse_text(text);
    let (start, end) = whole(&tree);
    let brackets = tree.brackets_in_range(start, end);
    assert_eq!(brackets.len(), 4);
    assert_eq!(brackets[0].start, Length::ZERO);
    assert_eq!(brackets[1].start, Length::new(1, 2));
    assert_eq!(brackets[2].start, Length::new(1, 3));
    assert_eq!(brackets[3].start, Length::new(2, 0));
    assert_eq!(
        brackets.iter().map(|b| b.depth).collect::<Vec<_>>(),
        [0, 1, 1, 0]
    );
}

#[test]
fn merging_list_items_reconstructs_an_equivalent_list() {
    let tree = BracketTree::parse_text("()[]{}()[]{}()[]{}");
    let snapshot = tree.read();
    let Node::List(list) = &*snapshot.root else {
        panic!("expected a list root");
    };
    let merged = bracket_tree::merge_lists(list.items.clone()).unwrap();
    common::assert_equivalent(&snapshot.root, &merged);
}
