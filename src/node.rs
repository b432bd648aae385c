//! Bracket tree nodes and the (2,3) sibling tree
//!
//! Nodes are immutable and shared through `Arc`: a rebuild re-parents whole
//! subtrees of the previous snapshot into the new root, so both roots alias
//! the same allocations until the old one is dropped. Sibling sequences live
//! in `List` nodes forming a (2,3) tree, which keeps concatenation, append
//! and prepend logarithmic in document size.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::length::Length;
use crate::token::CategorySet;

/// One node of the bracket tree.
///
/// Offsets are never stored; every node knows only its own extent, so a
/// subtree keeps meaning after the text around it shifts.
#[derive(Debug)]
pub enum Node {
    /// Bracket-free content.
    Text(Length),
    /// A bracket that participates in a pair.
    Bracket(Length),
    /// A closing bracket with no matching opener.
    InvalidBracket { length: Length, category: i32 },
    /// A matched opening bracket with its enclosed content and, when present,
    /// its closer.
    Pair(PairNode),
    /// Balancing container for 2 or 3 siblings (the root may hold 0 to 3).
    List(ListNode),
}

#[derive(Debug)]
pub struct PairNode {
    pub length: Length,
    pub category: i32,
    /// Always a `Bracket` leaf.
    pub opening: Arc<Node>,
    pub child: Option<Arc<Node>>,
    /// `None` while the pair is unclosed.
    pub closing: Option<Arc<Node>>,
    /// Closer categories inside this subtree that found no opener here.
    pub missing: CategorySet,
}

#[derive(Debug)]
pub struct ListNode {
    pub length: Length,
    /// 1 + the items' height; 0 only for the empty root list.
    pub height: u8,
    pub items: Vec<Arc<Node>>,
    pub missing: CategorySet,
}

impl Node {
    // === Constructors ===

    #[inline]
    pub fn text(length: Length) -> Arc<Node> {
        Arc::new(Node::Text(length))
    }

    #[inline]
    pub fn bracket(length: Length) -> Arc<Node> {
        Arc::new(Node::Bracket(length))
    }

    #[inline]
    pub fn invalid_bracket(length: Length, category: i32) -> Arc<Node> {
        Arc::new(Node::InvalidBracket { length, category })
    }

    pub fn pair(
        category: i32,
        opening: Arc<Node>,
        child: Option<Arc<Node>>,
        closing: Option<Arc<Node>>,
    ) -> Arc<Node> {
        let mut length = opening.length();
        let mut missing = CategorySet::EMPTY;
        if let Some(child) = &child {
            length += child.length();
            missing = child.missing_categories();
        }
        if let Some(closing) = &closing {
            length += closing.length();
        }
        Arc::new(Node::Pair(PairNode {
            length,
            category,
            opening,
            child,
            closing,
            missing,
        }))
    }

    pub fn empty_list() -> Arc<Node> {
        Arc::new(Node::List(ListNode {
            length: Length::ZERO,
            height: 0,
            items: Vec::new(),
            missing: CategorySet::EMPTY,
        }))
    }

    /// List of two equal-height items.
    pub fn list2(a: Arc<Node>, b: Arc<Node>) -> Arc<Node> {
        debug_assert_eq!(a.list_height(), b.list_height());
        list_of(vec![a, b])
    }

    /// List of three equal-height items.
    pub fn list3(a: Arc<Node>, b: Arc<Node>, c: Arc<Node>) -> Arc<Node> {
        debug_assert_eq!(a.list_height(), b.list_height());
        debug_assert_eq!(b.list_height(), c.list_height());
        list_of(vec![a, b, c])
    }

    // === Accessors ===

    #[inline]
    pub fn length(&self) -> Length {
        match self {
            Node::Text(length) | Node::Bracket(length) => *length,
            Node::InvalidBracket { length, .. } => *length,
            Node::Pair(pair) => pair.length,
            Node::List(list) => list.length,
        }
    }

    /// Height in the (2,3) tree: 0 for leaves and pairs.
    #[inline]
    pub fn list_height(&self) -> u8 {
        match self {
            Node::List(list) => list.height,
            _ => 0,
        }
    }

    #[inline]
    pub fn is_empty_list(&self) -> bool {
        matches!(self, Node::List(list) if list.items.is_empty())
    }

    /// Closer categories in this subtree whose opener lies outside of it.
    #[inline]
    pub fn missing_categories(&self) -> CategorySet {
        match self {
            Node::Text(_) | Node::Bracket(_) => CategorySet::EMPTY,
            Node::InvalidBracket { category, .. } => CategorySet::EMPTY.with(*category),
            Node::Pair(pair) => pair.missing,
            Node::List(list) => list.missing,
        }
    }

    /// Number of child slots; slots may be empty (an unclosed pair).
    #[inline]
    pub fn child_count(&self) -> usize {
        match self {
            Node::Pair(_) => 3,
            Node::List(list) => list.items.len(),
            _ => 0,
        }
    }

    #[inline]
    pub fn child_at(&self, index: usize) -> Option<&Arc<Node>> {
        match self {
            Node::Pair(pair) => match index {
                0 => Some(&pair.opening),
                1 => pair.child.as_ref(),
                2 => pair.closing.as_ref(),
                _ => None,
            },
            Node::List(list) => list.items.get(index),
            _ => None,
        }
    }

    /// Whether this subtree from a previous parse is still valid when the
    /// surrounding context expects the closer categories in `expected`.
    ///
    /// Text always survives. A bare bracket never does (its pair might).
    /// A pair survives once closed, a list follows its rightmost non-list
    /// descendant. Either is rejected when it contains an unmatched closer
    /// the new context would now consume.
    pub fn can_be_reused(&self, expected: CategorySet) -> bool {
        match self {
            Node::Text(_) => true,
            Node::Bracket(_) | Node::InvalidBracket { .. } => false,
            Node::Pair(pair) => pair.closing.is_some() && !pair.missing.intersects(expected),
            Node::List(list) => {
                if list.missing.intersects(expected) {
                    return false;
                }
                let mut current = list;
                loop {
                    match current.items.last().map(|item| &**item) {
                        None => return true,
                        Some(Node::List(inner)) => current = inner,
                        Some(last) => return last.can_be_reused(expected),
                    }
                }
            }
        }
    }
}

/// Internal list constructor: length, height and missing set derived from
/// the items.
fn list_of(items: Vec<Arc<Node>>) -> Arc<Node> {
    debug_assert!(!items.is_empty());
    let height = items[0].list_height() + 1;
    let mut length = Length::ZERO;
    let mut missing = CategorySet::EMPTY;
    for item in &items {
        debug_assert_eq!(item.list_height() + 1, height);
        length += item.length();
        missing = missing.union(item.missing_categories());
    }
    Arc::new(Node::List(ListNode {
        length,
        height,
        items,
        missing,
    }))
}

// === (2,3) tree operations ===

/// Concatenate two sibling trees, preserving the height invariant.
pub fn concat(a: Arc<Node>, b: Arc<Node>) -> Arc<Node> {
    if a.is_empty_list() {
        return b;
    }
    if b.is_empty_list() {
        return a;
    }
    match a.list_height().cmp(&b.list_height()) {
        Ordering::Equal => Node::list2(a, b),
        Ordering::Greater => append(a, b),
        Ordering::Less => prepend(b, a),
    }
}

/// Balance a left-to-right sibling sequence into one (2,3) tree.
pub fn merge_lists(items: Vec<Arc<Node>>) -> Option<Arc<Node>> {
    match items.len() {
        0 => return None,
        1 => return items.into_iter().next(),
        _ => {}
    }
    let height = items[0].list_height();
    if items.iter().all(|item| item.list_height() == height) {
        return Some(merge_uniform(items));
    }

    // Mixed heights: keep two accumulators and fold each item into
    // whichever side leaves the smaller height imbalance, so concat work
    // stays near the short end. Ties merge the left pair.
    let mut iter = items.into_iter();
    let mut first = iter.next().expect("checked above");
    let mut second = iter.next().expect("checked above");
    for item in iter {
        if height_diff(&first, &second) <= height_diff(&second, &item) {
            first = concat(first, second);
            second = item;
        } else {
            second = concat(second, item);
        }
    }
    Some(concat(first, second))
}

/// All items share one height: group pairwise level by level, the last group
/// absorbing a trailing odd item as a 3-list.
fn merge_uniform(mut items: Vec<Arc<Node>>) -> Arc<Node> {
    debug_assert!(items.len() >= 2);
    let mut len = items.len();
    while len > 3 {
        let half = len >> 1;
        for i in 0..half {
            let j = i << 1;
            items[i] = if j + 3 == len {
                Node::list3(items[j].clone(), items[j + 1].clone(), items[j + 2].clone())
            } else {
                Node::list2(items[j].clone(), items[j + 1].clone())
            };
        }
        len = half;
    }
    if len == 3 {
        Node::list3(items[0].clone(), items[1].clone(), items[2].clone())
    } else {
        Node::list2(items[0].clone(), items[1].clone())
    }
}

#[inline]
fn height_diff(a: &Node, b: &Node) -> u8 {
    a.list_height().abs_diff(b.list_height())
}

fn as_list(node: &Node) -> &ListNode {
    match node {
        Node::List(list) => list,
        _ => unreachable!("positive height implies a list"),
    }
}

/// `list.height > node.height`: attach `node` after the last item,
/// copy-on-write along the right spine.
fn append(list: Arc<Node>, node: Arc<Node>) -> Arc<Node> {
    debug_assert!(list.list_height() > node.list_height());
    match append_rec(as_list(&list), node) {
        (merged, None) => merged,
        // The root split; both halves share its old height.
        (merged, Some(split)) => Node::list2(merged, split),
    }
}

/// Returns the rewritten list plus an overflow sibling (of the same height
/// as the list's items) when the insertion split a node.
fn append_rec(list: &ListNode, node: Arc<Node>) -> (Arc<Node>, Option<Arc<Node>>) {
    if node.list_height() + 1 == list.height {
        return push_last(list, node);
    }
    let last = list.items.last().expect("lists below the root hold 2..=3 items");
    let (new_last, overflow) = append_rec(as_list(last), node);
    let mut items = list.items.clone();
    *items.last_mut().expect("non-empty") = new_last;
    match overflow {
        None => (list_of(items), None),
        Some(split) => {
            if items.len() < 3 {
                items.push(split);
                (list_of(items), None)
            } else {
                let popped = items.pop().expect("three items");
                (list_of(items), Some(Node::list2(popped, split)))
            }
        }
    }
}

fn push_last(list: &ListNode, node: Arc<Node>) -> (Arc<Node>, Option<Arc<Node>>) {
    let mut items = list.items.clone();
    if items.len() < 3 {
        items.push(node);
        (list_of(items), None)
    } else {
        let popped = items.pop().expect("three items");
        (list_of(items), Some(Node::list2(popped, node)))
    }
}

/// Mirror of `append`: attach `node` before the first item.
fn prepend(list: Arc<Node>, node: Arc<Node>) -> Arc<Node> {
    debug_assert!(list.list_height() > node.list_height());
    match prepend_rec(as_list(&list), node) {
        (merged, None) => merged,
        (merged, Some(split)) => Node::list2(split, merged),
    }
}

fn prepend_rec(list: &ListNode, node: Arc<Node>) -> (Arc<Node>, Option<Arc<Node>>) {
    if node.list_height() + 1 == list.height {
        return push_first(list, node);
    }
    let first = list.items.first().expect("lists below the root hold 2..=3 items");
    let (new_first, overflow) = prepend_rec(as_list(first), node);
    let mut items = list.items.clone();
    items[0] = new_first;
    match overflow {
        None => (list_of(items), None),
        Some(split) => {
            if items.len() < 3 {
                items.insert(0, split);
                (list_of(items), None)
            } else {
                let popped = items.remove(0);
                (list_of(items), Some(Node::list2(split, popped)))
            }
        }
    }
}

fn push_first(list: &ListNode, node: Arc<Node>) -> (Arc<Node>, Option<Arc<Node>>) {
    let mut items = list.items.clone();
    if items.len() < 3 {
        items.insert(0, node);
        (list_of(items), None)
    } else {
        let popped = items.remove(0);
        (list_of(items), Some(Node::list2(node, popped)))
    }
}

// === Structure validation ===

/// Check the structural invariants of a subtree: cached lengths equal the
/// sum of children, list items share one height, interior lists hold 2 or 3
/// items, closed pairs agree on category with their opener.
pub fn validate_structure(root: &Node) -> bool {
    validate_inner(root, true)
}

fn validate_inner(node: &Node, is_root: bool) -> bool {
    match node {
        Node::Text(_) | Node::Bracket(_) | Node::InvalidBracket { .. } => true,
        Node::Pair(pair) => {
            let mut sum = pair.opening.length();
            if let Some(child) = &pair.child {
                sum += child.length();
            }
            if let Some(closing) = &pair.closing {
                sum += closing.length();
            }
            if sum != pair.length {
                eprintln!(
                    "pair length mismatch: stored {:?}, children sum {:?}",
                    pair.length, sum
                );
                return false;
            }
            if !matches!(&*pair.opening, Node::Bracket(_)) {
                eprintln!("pair opening is not a bracket leaf");
                return false;
            }
            if let Some(closing) = &pair.closing {
                if !matches!(&**closing, Node::Bracket(_)) {
                    eprintln!("pair closing is not a bracket leaf");
                    return false;
                }
            }
            pair.child.iter().all(|child| validate_inner(child, false))
        }
        Node::List(list) => {
            if is_root {
                if list.items.len() > 3 {
                    eprintln!("root list holds {} items", list.items.len());
                    return false;
                }
            } else if list.items.len() < 2 || list.items.len() > 3 {
                eprintln!("interior list holds {} items", list.items.len());
                return false;
            }
            let mut sum = Length::ZERO;
            for item in &list.items {
                if item.list_height() + 1 != list.height {
                    eprintln!(
                        "list height {} but item height {}",
                        list.height,
                        item.list_height()
                    );
                    return false;
                }
                sum += item.length();
            }
            if !list.items.is_empty() && sum != list.length {
                eprintln!(
                    "list length mismatch: stored {:?}, items sum {:?}",
                    list.length, sum
                );
                return false;
            }
            list.items.iter().all(|item| validate_inner(item, false))
        }
    }
}
