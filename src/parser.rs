//! Recursive-descent pair matcher with subtree reuse
//!
//! One pass over the token stream builds the whole tree. When a previous
//! tree and an edit batch are supplied, the parser asks the [`NodeReader`]
//! at every child position for the longest old node that starts at the
//! matching pre-edit offset, fits strictly inside the span untouched by
//! edits, and is still valid in the current context; a hit is re-parented
//! wholesale and the tokenizer jumps over it.

use std::sync::Arc;

use crate::edits::{OffsetMapper, TextEdit};
use crate::length::Length;
use crate::node::{merge_lists, validate_structure, Node};
use crate::reader::NodeReader;
use crate::token::{CategorySet, TokenKind, Tokenizer};

pub struct Parser<'a> {
    tokenizer: &'a mut dyn Tokenizer,
    reader: Option<NodeReader>,
    mapper: OffsetMapper,
    nodes_built: usize,
    nodes_reused: usize,
}

impl<'a> Parser<'a> {
    /// `previous` is the root of the last parse, indexed by pre-edit
    /// offsets; without it every token is read fresh.
    pub fn new(
        tokenizer: &'a mut dyn Tokenizer,
        edits: &[TextEdit],
        previous: Option<Arc<Node>>,
    ) -> Self {
        Parser {
            tokenizer,
            reader: previous.map(NodeReader::new),
            mapper: OffsetMapper::new(edits),
            nodes_built: 0,
            nodes_reused: 0,
        }
    }

    pub fn parse_document(mut self) -> Arc<Node> {
        let root = self
            .parse_list(CategorySet::EMPTY)
            .unwrap_or_else(Node::empty_list);
        debug_assert!(validate_structure(&root));
        debug_assert_eq!(
            root.length(),
            self.tokenizer.total(),
            "parse must consume the whole document"
        );
        log::debug!(
            "bracket tree rebuilt: {} nodes built, {} subtrees reused",
            self.nodes_built,
            self.nodes_reused
        );
        root
    }

    /// Collect children until end of input or a closer the current context
    /// expects, then balance them into one node.
    fn parse_list(&mut self, expected: CategorySet) -> Option<Arc<Node>> {
        let mut items = Vec::new();
        loop {
            let Some(token) = self.tokenizer.peek() else {
                break;
            };
            if token.kind == TokenKind::ClosingBracket && expected.contains(token.category) {
                break;
            }
            let child = self.parse_child(expected);
            if child.is_empty_list() {
                continue;
            }
            items.push(child);
        }
        merge_lists(items)
    }

    fn parse_child(&mut self, expected: CategorySet) -> Arc<Node> {
        if let Some(node) = self.try_reuse(expected) {
            return node;
        }

        let token = self.tokenizer.read().expect("peeked by parse_list");
        match token.kind {
            TokenKind::Text => {
                self.nodes_built += 1;
                Node::text(token.length)
            }
            // A closer nobody expects pairs with nothing.
            TokenKind::ClosingBracket => {
                self.nodes_built += 1;
                Node::invalid_bracket(token.length, token.category)
            }
            TokenKind::OpeningBracket => {
                let category = token.category;
                let opening = Node::bracket(token.length);
                let child = self.parse_list(expected.with(category));
                let closing = match self.tokenizer.peek() {
                    Some(next)
                        if next.kind == TokenKind::ClosingBracket
                            && next.category == category =>
                    {
                        self.tokenizer.read();
                        Some(Node::bracket(next.length))
                    }
                    _ => None,
                };
                self.nodes_built += 1;
                Node::pair(category, opening, child, closing)
            }
        }
    }

    /// Longest old node valid at the current position, if any. The node must
    /// end strictly before the next edited region: an edit may extend the
    /// token at its boundary, so nodes that touch it are re-read.
    fn try_reuse(&mut self, expected: CategorySet) -> Option<Arc<Node>> {
        let reader = self.reader.as_mut()?;
        let offset = self.tokenizer.offset();
        let max_reuse = self.mapper.distance_to_next_change(offset);
        if max_reuse == Some(Length::ZERO) {
            return None;
        }
        let old_offset = self.mapper.offset_before_change(offset);
        let node = reader.read_longest_node_at(old_offset, |candidate| {
            if let Some(limit) = max_reuse {
                if candidate.length() >= limit {
                    return false;
                }
            }
            candidate.can_be_reused(expected)
        })?;
        log::trace!(
            "reusing {:?} node at {:?}",
            candidate_kind(&node),
            offset
        );
        self.tokenizer.skip(node.length());
        self.nodes_reused += 1;
        Some(node)
    }
}

fn candidate_kind(node: &Node) -> &'static str {
    match node {
        Node::Text(_) => "text",
        Node::Bracket(_) => "bracket",
        Node::InvalidBracket { .. } => "invalid-bracket",
        Node::Pair(_) => "pair",
        Node::List(_) => "list",
    }
}
