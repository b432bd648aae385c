//! Positioned cursor over a previous bracket tree
//!
//! During an incremental parse the reader answers one question: which is the
//! longest node of the old tree that starts exactly at a given (pre-edit)
//! offset and passes the caller's predicate. Query offsets only ever move
//! forward, so the reader keeps a descent path instead of restarting from
//! the root.

use std::sync::Arc;

use crate::length::Length;
use crate::node::Node;

pub struct NodeReader {
    /// Stack of candidate nodes, root first; the top is the next candidate.
    next_nodes: Vec<Arc<Node>>,
    /// Start offset of each stacked node.
    offsets: Vec<Length>,
    /// Child index taken at each ancestor still on the stack.
    idxs: Vec<usize>,
    last_offset: Length,
}

impl NodeReader {
    pub fn new(root: Arc<Node>) -> Self {
        NodeReader {
            next_nodes: vec![root],
            offsets: vec![Length::ZERO],
            idxs: Vec::new(),
            last_offset: Length::ZERO,
        }
    }

    /// Longest node starting exactly at `offset` for which `predicate`
    /// holds, or `None`. Offsets must be non-decreasing across calls.
    pub fn read_longest_node_at(
        &mut self,
        offset: Length,
        mut predicate: impl FnMut(&Node) -> bool,
    ) -> Option<Arc<Node>> {
        debug_assert!(
            self.last_offset <= offset,
            "reader offsets must be monotonic"
        );
        self.last_offset = offset;
        loop {
            let current = self.next_nodes.last()?.clone();
            let current_offset = *self.offsets.last().expect("stacks stay in step");

            if offset < current_offset {
                // Every remaining candidate starts further right.
                return None;
            }

            if current_offset < offset {
                if current_offset + current.length() <= offset {
                    // Node ends at or before the query: move to the next
                    // sibling (or an ancestor's sibling).
                    self.next_node_after_current();
                } else {
                    // The query lands inside: walk the children.
                    match next_child_idx(&current, None) {
                        Some(idx) => self.descend(&current, idx, current_offset),
                        None => self.next_node_after_current(),
                    }
                }
            } else {
                // Aligned exactly with the query offset.
                if predicate(&current) {
                    self.next_node_after_current();
                    return Some(current);
                }
                match next_child_idx(&current, None) {
                    // A child starts at the same offset; try the shorter
                    // candidate.
                    Some(idx) => self.descend(&current, idx, current_offset),
                    None => {
                        self.next_node_after_current();
                        return None;
                    }
                }
            }
        }
    }

    fn descend(&mut self, parent: &Arc<Node>, child_idx: usize, parent_offset: Length) {
        let child = parent
            .child_at(child_idx)
            .expect("next_child_idx returned an occupied slot")
            .clone();
        self.next_nodes.push(child);
        self.offsets.push(parent_offset);
        self.idxs.push(child_idx);
    }

    /// Pop the current node and surface the longest node that continues
    /// after it.
    fn next_node_after_current(&mut self) {
        loop {
            let finished_offset = self.offsets.pop();
            let finished = self.next_nodes.pop();
            if self.idxs.is_empty() {
                break;
            }
            let parent = self
                .next_nodes
                .last()
                .expect("parent on stack while idxs is non-empty")
                .clone();
            let taken = *self.idxs.last().expect("checked non-empty");
            match next_child_idx(&parent, Some(taken)) {
                Some(idx) => {
                    let sibling = parent
                        .child_at(idx)
                        .expect("next_child_idx returned an occupied slot")
                        .clone();
                    let offset = finished_offset.expect("popped with node")
                        + finished.expect("popped with offset").length();
                    self.next_nodes.push(sibling);
                    self.offsets.push(offset);
                    *self.idxs.last_mut().expect("checked non-empty") = idx;
                    break;
                }
                // Parent exhausted; pop it on the next turn of the loop.
                None => {
                    self.idxs.pop();
                }
            }
        }
    }
}

/// First occupied child slot after `after` (or from the start).
fn next_child_idx(node: &Node, after: Option<usize>) -> Option<usize> {
    let start = after.map_or(0, |idx| idx + 1);
    (start..node.child_count()).find(|&idx| node.child_at(idx).is_some())
}
