//! Token stream over document text
//!
//! The parser consumes a [`Tokenizer`]: a peekable stream of text runs and
//! bracket tokens, each carrying its [`Length`]. [`TextTokenizer`] is the
//! reference implementation over a `&str`; editors with their own buffers
//! implement the trait directly.

use crate::length::{length_of_bytes, Length};

/// `category` value carried by text tokens.
pub const TEXT_CATEGORY: i32 = -1;

/// Longest run of non-bracket characters coalesced into one `Text` token.
/// A bound on token size, not semantically observable.
const MAX_TEXT_RUN: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    OpeningBracket,
    ClosingBracket,
}

/// One lexical unit: a bracket character or a coalesced run of everything
/// else. Consumers treat `length` and `category` as opaque.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub length: Length,
    pub kind: TokenKind,
    pub category: i32,
}

impl Token {
    #[inline]
    pub fn text(length: Length) -> Self {
        Token {
            length,
            kind: TokenKind::Text,
            category: TEXT_CATEGORY,
        }
    }

    #[inline]
    pub fn opening(length: Length, category: i32) -> Self {
        Token {
            length,
            kind: TokenKind::OpeningBracket,
            category,
        }
    }

    #[inline]
    pub fn closing(length: Length, category: i32) -> Self {
        Token {
            length,
            kind: TokenKind::ClosingBracket,
            category,
        }
    }
}

/// Stream of tokens positioned inside a document.
///
/// `offset` advances by each returned token's length; `skip` jumps the stream
/// forward when the parser reuses a subtree instead of re-reading its tokens.
pub trait Tokenizer {
    /// Current position as displacement from document start.
    fn offset(&self) -> Length;

    /// Total document length.
    fn total(&self) -> Length;

    /// Next token without consuming it. Idempotent.
    fn peek(&mut self) -> Option<Token>;

    /// Next token, consumed.
    fn read(&mut self) -> Option<Token>;

    /// Advance by `length` without producing tokens. Invalidates any pending
    /// peek.
    fn skip(&mut self, length: Length);

    /// Remaining text, for debugging.
    fn text(&self) -> &str;
}

// === Categories ===

/// Set of bracket categories, packed into a bitmask. Categories must be in
/// `0..64`; the default alphabet uses 1..=3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CategorySet(u64);

impl CategorySet {
    pub const EMPTY: CategorySet = CategorySet(0);

    #[inline]
    fn bit(category: i32) -> u64 {
        debug_assert!(
            (0..64).contains(&category),
            "bracket category {category} out of bitmask range"
        );
        1 << category
    }

    #[inline]
    pub fn contains(self, category: i32) -> bool {
        self.0 & Self::bit(category) != 0
    }

    #[inline]
    pub fn with(self, category: i32) -> Self {
        CategorySet(self.0 | Self::bit(category))
    }

    #[inline]
    pub fn union(self, other: CategorySet) -> Self {
        CategorySet(self.0 | other.0)
    }

    #[inline]
    pub fn intersects(self, other: CategorySet) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

// === Bracket alphabet ===

/// Which ASCII bytes open and close which category.
///
/// Encoded as a 128-entry table: `0` not a bracket, `+c` opener of category
/// `c`, `-c` closer of category `c`.
#[derive(Clone)]
pub struct BracketSet {
    table: [i8; 128],
}

impl BracketSet {
    /// Build an alphabet from `(opener, closer)` byte pairs. Pair `i` gets
    /// category `i + 1`.
    pub fn new(pairs: &[(u8, u8)]) -> Self {
        assert!(pairs.len() < 64, "too many bracket pairs for one bitmask");
        let mut table = [0i8; 128];
        for (i, &(open, close)) in pairs.iter().enumerate() {
            assert!(
                open.is_ascii() && close.is_ascii(),
                "bracket characters must be ASCII"
            );
            let category = (i + 1) as i8;
            table[open as usize] = category;
            table[close as usize] = -category;
        }
        BracketSet { table }
    }

    #[inline]
    fn classify(&self, byte: u8) -> i8 {
        if byte < 128 {
            self.table[byte as usize]
        } else {
            0
        }
    }
}

impl Default for BracketSet {
    /// `[]` category 1, `()` category 2, `{}` category 3.
    fn default() -> Self {
        BracketSet::new(&[(b'[', b']'), (b'(', b')'), (b'{', b'}')])
    }
}

// === Reference tokenizer ===

/// Tokenizer over a `&str`.
///
/// An optional classifier suppresses bracket tokens at byte positions the
/// host lexer marks as string or comment content; those bytes join the
/// surrounding text run instead.
pub struct TextTokenizer<'a> {
    text: &'a str,
    brackets: BracketSet,
    classifier: Option<Box<dyn Fn(usize) -> bool + 'a>>,
    /// Byte position into `text`, kept in step with `offset`.
    pos: usize,
    offset: Length,
    total: Length,
    /// Token computed by `peek` plus its byte width.
    pending: Option<(Token, usize)>,
}

impl<'a> TextTokenizer<'a> {
    pub fn new(text: &'a str, brackets: BracketSet) -> Self {
        TextTokenizer {
            text,
            brackets,
            classifier: None,
            pos: 0,
            offset: Length::ZERO,
            total: Length::of_str(text),
            pending: None,
        }
    }

    /// `classifier(byte_index)` returns whether a bracket character at that
    /// position counts as a bracket.
    pub fn with_classifier(
        text: &'a str,
        brackets: BracketSet,
        classifier: impl Fn(usize) -> bool + 'a,
    ) -> Self {
        let mut tokenizer = Self::new(text, brackets);
        tokenizer.classifier = Some(Box::new(classifier));
        tokenizer
    }

    #[inline]
    fn classify_at(&self, index: usize) -> i8 {
        let class = self.brackets.classify(self.text.as_bytes()[index]);
        if class != 0 {
            if let Some(classifier) = &self.classifier {
                if !classifier(index) {
                    return 0;
                }
            }
        }
        class
    }

    /// Next token plus its byte width, without advancing.
    fn next_token(&self) -> Option<(Token, usize)> {
        let bytes = self.text.as_bytes();
        if self.pos >= bytes.len() {
            return None;
        }
        let class = self.classify_at(self.pos);
        if class != 0 {
            let length = Length::new(0, 1);
            let token = if class > 0 {
                Token::opening(length, class as i32)
            } else {
                Token::closing(length, -class as i32)
            };
            return Some((token, 1));
        }

        let start = self.pos;
        let hard_end = bytes.len().min(start + MAX_TEXT_RUN);
        let mut end = start + 1;
        while end < hard_end && self.classify_at(end) == 0 {
            end += 1;
        }
        if end == hard_end && end < bytes.len() {
            // The cap may land inside a UTF-8 sequence; back off to a
            // character boundary.
            while end > start && (bytes[end] & 0xC0) == 0x80 {
                end -= 1;
            }
            if end == start {
                end = hard_end;
            }
        }
        Some((Token::text(length_of_bytes(&bytes[start..end])), end - start))
    }
}

impl Tokenizer for TextTokenizer<'_> {
    #[inline]
    fn offset(&self) -> Length {
        self.offset
    }

    #[inline]
    fn total(&self) -> Length {
        self.total
    }

    fn peek(&mut self) -> Option<Token> {
        if self.pending.is_none() {
            self.pending = self.next_token();
        }
        self.pending.map(|(token, _)| token)
    }

    fn read(&mut self) -> Option<Token> {
        let (token, byte_len) = match self.pending.take() {
            Some(pending) => pending,
            None => self.next_token()?,
        };
        self.pos += byte_len;
        self.offset += token.length;
        Some(token)
    }

    fn skip(&mut self, length: Length) {
        self.pending = None;
        self.offset += length;
        if length.lines() == 0 {
            self.pos += length.columns() as usize;
        } else {
            // Walk to the start of the target line, then add its columns.
            let bytes = &self.text.as_bytes()[self.pos..];
            let mut line_start = 0;
            let mut seen = 0;
            for i in memchr::memchr_iter(b'\n', bytes) {
                seen += 1;
                if seen == length.lines() {
                    line_start = i + 1;
                    break;
                }
            }
            debug_assert_eq!(seen, length.lines(), "skip past end of text");
            self.pos += line_start + length.columns() as usize;
        }
        debug_assert!(self.pos <= self.text.len());
    }

    fn text(&self) -> &str {
        &self.text[self.pos..]
    }
}
