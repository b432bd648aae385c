//! Incremental bracket-pair tree with lock-free snapshot reads
//!
//! Tokenizes a document into text runs and brackets, pairs matched brackets
//! into a balanced (2,3) tree, and answers range queries with nesting
//! depths. After an edit the tree is rebuilt against the previous snapshot,
//! reusing every subtree the edits did not touch.
//!
//! Readers take immutable `Arc` snapshots; each rebuild swaps in a fresh
//! root and bumps a monotonic version. Old and new snapshots share the
//! reused subtrees, so holding one across an edit stays cheap and safe.
//!
//! ```
//! use bracket_tree::{BracketTree, Length};
//!
//! let tree = BracketTree::parse_text("{ [ ( ) ] }");
//! let brackets = tree.brackets_in_range(Length::ZERO, tree.length());
//! let depths: Vec<u32> = brackets.iter().map(|b| b.depth).collect();
//! assert_eq!(depths, [0, 1, 2, 2, 1, 0]);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

mod edits;
mod length;
pub mod node;
mod parser;
mod query;
mod reader;
mod token;

pub use edits::TextEdit;
pub use length::{Length, Position};
pub use node::{merge_lists, validate_structure, Node};
pub use parser::Parser;
pub use query::{flatten, BracketInfo, FlatNode, PairInfo};
pub use reader::NodeReader;
pub use token::{
    BracketSet, CategorySet, TextTokenizer, Token, TokenKind, Tokenizer, TEXT_CATEGORY,
};

/// Immutable snapshot of one parse.
#[derive(Clone)]
pub struct Tree {
    pub root: Arc<Node>,
    /// Total document length at parse time; always equals `root.length()`.
    pub length: Length,
    pub version: u64,
}

impl Tree {
    /// All brackets intersecting `[start, end)`, in document order, with
    /// their nesting depth.
    pub fn brackets_in_range(&self, start: Length, end: Length) -> Vec<BracketInfo> {
        let mut out = Vec::new();
        query::collect_brackets(&self.root, Length::ZERO, start, end, 0, &mut out);
        out
    }

    /// All pairs whose span intersects `[start, end)`, in document order.
    pub fn pairs_in_range(&self, start: Length, end: Length) -> Vec<PairInfo> {
        let mut out = Vec::new();
        query::collect_pairs(&self.root, Length::ZERO, start, end, 0, &mut out);
        out
    }
}

/// Bracket structure of one document. Writers rebuild through
/// [`handle_edits`](BracketTree::handle_edits); readers get snapshots
/// without locking.
pub struct BracketTree {
    snapshot: ArcSwap<Tree>,
    version: AtomicU64,
}

impl BracketTree {
    /// Full parse of a fresh document.
    pub fn parse(tokenizer: &mut dyn Tokenizer) -> Self {
        let length = tokenizer.total();
        let root = Parser::new(tokenizer, &[], None).parse_document();
        BracketTree {
            snapshot: ArcSwap::from_pointee(Tree {
                root,
                length,
                version: 0,
            }),
            version: AtomicU64::new(0),
        }
    }

    /// Full parse of a string with the default bracket alphabet.
    pub fn parse_text(text: &str) -> Self {
        let mut tokenizer = TextTokenizer::new(text, BracketSet::default());
        Self::parse(&mut tokenizer)
    }

    /// Current snapshot.
    pub fn read(&self) -> Arc<Tree> {
        self.snapshot.load_full()
    }

    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Relaxed)
    }

    pub fn length(&self) -> Length {
        self.snapshot.load().length
    }

    /// Rebuild after `edits` transformed the document; `tokenizer` streams
    /// the post-edit text. The new snapshot is installed before returning.
    ///
    /// Token-classification changes (a string literal opening or closing)
    /// are delivered the same way: an edit covering the re-classified range.
    pub fn handle_edits(&self, edits: &[TextEdit], tokenizer: &mut dyn Tokenizer) {
        let previous = self.snapshot.load_full();
        let length = tokenizer.total();
        let root =
            Parser::new(tokenizer, edits, Some(previous.root.clone())).parse_document();
        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        self.snapshot.store(Arc::new(Tree {
            root,
            length,
            version,
        }));
    }

    /// See [`Tree::brackets_in_range`].
    pub fn brackets_in_range(&self, start: Length, end: Length) -> Vec<BracketInfo> {
        self.snapshot.load().brackets_in_range(start, end)
    }

    /// See [`Tree::pairs_in_range`].
    pub fn pairs_in_range(&self, start: Length, end: Length) -> Vec<PairInfo> {
        self.snapshot.load().pairs_in_range(start, end)
    }
}
