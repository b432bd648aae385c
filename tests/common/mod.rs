//! Shared helpers for the integration tests
#![allow(dead_code)] // each test binary uses a different subset

use bracket_tree::{
    flatten, BracketSet, BracketTree, FlatNode, Length, Node, TextEdit, TextTokenizer,
};

/// Splice `replacement` over `range` of `text`, returning the new text and
/// the corresponding edit in length coordinates.
pub fn replace(text: &str, range: std::ops::Range<usize>, replacement: &str) -> (String, TextEdit) {
    let edit = TextEdit::new(
        Length::of_str(&text[..range.start]),
        Length::of_str(&text[..range.end]),
        Length::of_str(replacement),
    );
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..range.start]);
    out.push_str(replacement);
    out.push_str(&text[range.end..]);
    (out, edit)
}

/// Rebuild `tree` incrementally for the text produced by `replace`.
pub fn apply(tree: &BracketTree, new_text: &str, edits: &[TextEdit]) {
    let mut tokenizer = TextTokenizer::new(new_text, BracketSet::default());
    tree.handle_edits(edits, &mut tokenizer);
}

pub fn leaves(root: &Node) -> Vec<FlatNode> {
    let mut out = Vec::new();
    flatten(root, &mut out);
    out
}

/// Assert two parses describe the same bracket structure, ignoring how the
/// (2,3) lists happen to group siblings.
pub fn assert_equivalent(a: &Node, b: &Node) {
    assert_eq!(leaves(a), leaves(b));
}

/// The incremental result for `edits` must match a from-scratch parse of the
/// new text.
pub fn assert_incremental_matches_scratch(old_text: &str, new_text: &str, edits: &[TextEdit]) {
    let tree = BracketTree::parse_text(old_text);
    apply(&tree, new_text, edits);
    let scratch = BracketTree::parse_text(new_text);
    assert_equivalent(&tree.read().root, &scratch.read().root);
    assert_eq!(tree.read().length, Length::of_str(new_text));
}
