//! Range queries over a bracket tree
//!
//! Nodes store no positions, so the walk threads the running offset down and
//! prunes whole subtrees by span arithmetic alone.

use crate::length::Length;
use crate::node::Node;

/// One bracket character inside a query window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BracketInfo {
    pub start: Length,
    pub end: Length,
    /// Number of enclosing pairs.
    pub depth: u32,
}

/// One pair whose span intersects a query window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PairInfo {
    pub category: i32,
    pub depth: u32,
    pub opening: (Length, Length),
    /// `None` while the pair is unclosed.
    pub closing: Option<(Length, Length)>,
}

#[inline]
fn outside(start: Length, end: Length, query_start: Length, query_end: Length) -> bool {
    end <= query_start || query_end <= start
}

/// Emit every `Bracket` leaf intersecting `[query_start, query_end)` in
/// document order. Brackets sit at their pair's depth; pair content one
/// deeper. Unmatched closers are not reported.
pub(crate) fn collect_brackets(
    node: &Node,
    node_start: Length,
    query_start: Length,
    query_end: Length,
    depth: u32,
    out: &mut Vec<BracketInfo>,
) {
    let node_end = node_start + node.length();
    if outside(node_start, node_end, query_start, query_end) {
        return;
    }
    match node {
        Node::Text(_) | Node::InvalidBracket { .. } => {}
        Node::Bracket(_) => out.push(BracketInfo {
            start: node_start,
            end: node_end,
            depth,
        }),
        Node::Pair(pair) => {
            let mut offset = node_start;
            collect_brackets(&pair.opening, offset, query_start, query_end, depth, out);
            offset += pair.opening.length();
            if let Some(child) = &pair.child {
                collect_brackets(child, offset, query_start, query_end, depth + 1, out);
                offset += child.length();
            }
            if let Some(closing) = &pair.closing {
                collect_brackets(closing, offset, query_start, query_end, depth, out);
            }
        }
        Node::List(list) => {
            let mut offset = node_start;
            for item in &list.items {
                if offset >= query_end {
                    break;
                }
                collect_brackets(item, offset, query_start, query_end, depth, out);
                offset += item.length();
            }
        }
    }
}

/// Emit every pair whose span intersects the window, outermost first at each
/// position.
pub(crate) fn collect_pairs(
    node: &Node,
    node_start: Length,
    query_start: Length,
    query_end: Length,
    depth: u32,
    out: &mut Vec<PairInfo>,
) {
    let node_end = node_start + node.length();
    if outside(node_start, node_end, query_start, query_end) {
        return;
    }
    match node {
        Node::Text(_) | Node::Bracket(_) | Node::InvalidBracket { .. } => {}
        Node::Pair(pair) => {
            let opening_end = node_start + pair.opening.length();
            let mut closing_start = opening_end;
            if let Some(child) = &pair.child {
                closing_start += child.length();
            }
            out.push(PairInfo {
                category: pair.category,
                depth,
                opening: (node_start, opening_end),
                closing: pair
                    .closing
                    .as_ref()
                    .map(|closing| (closing_start, closing_start + closing.length())),
            });
            if let Some(child) = &pair.child {
                collect_pairs(child, opening_end, query_start, query_end, depth + 1, out);
            }
        }
        Node::List(list) => {
            let mut offset = node_start;
            for item in &list.items {
                if offset >= query_end {
                    break;
                }
                collect_pairs(item, offset, query_start, query_end, depth, out);
                offset += item.length();
            }
        }
    }
}

/// Leaf sequence of a tree with list structure erased, for structural
/// comparison of two parses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlatNode {
    Text(Length),
    Bracket(Length),
    InvalidBracket(Length, i32),
    PairOpen(i32),
    PairClose(i32, bool),
}

/// Flatten a tree into its leaves, with pair boundaries marked so nesting
/// differences are visible.
pub fn flatten(node: &Node, out: &mut Vec<FlatNode>) {
    match node {
        Node::Text(length) => out.push(FlatNode::Text(*length)),
        Node::Bracket(length) => out.push(FlatNode::Bracket(*length)),
        Node::InvalidBracket { length, category } => {
            out.push(FlatNode::InvalidBracket(*length, *category))
        }
        Node::Pair(pair) => {
            out.push(FlatNode::PairOpen(pair.category));
            flatten(&pair.opening, out);
            if let Some(child) = &pair.child {
                flatten(child, out);
            }
            if let Some(closing) = &pair.closing {
                flatten(closing, out);
            }
            out.push(FlatNode::PairClose(pair.category, pair.closing.is_some()));
        }
        Node::List(list) => {
            for item in &list.items {
                flatten(item, out);
            }
        }
    }
}
