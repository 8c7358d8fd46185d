//! Compact prefix tables for classifying tokens one byte at a time.
//!
//! A table is a flat array of [`TrieEntry`] slots. Each entry holds the literal
//! run of characters that follow a branch point (`prefix`, whose first byte is
//! the branching character), the id of the parent branch (`check`), its own
//! branch id (`next`, or [`LEAF`]), the base slot of its children (`offset`)
//! and the code of the token that ends with it (`terminal`, 0 for none).
//!
//! The child for character `c` lives at `offset + class(c)`; the `check` field
//! rejects slots that belong to another branch. Walking never allocates and the
//! whole progress is two integers in [`TrieWalkState`], so a token may be split
//! across any number of reads.

pub mod builder;
mod tables;

pub use builder::{PackedTrie, TrieBuilder};
pub use tables::{
    CONNECTION, ConnectionToken, EXPECT, ExpectToken, HEADER_NAMES, REQUEST_LINE, RequestToken, TRANSFER_ENCODING,
    TransferCoding,
};

/// `next` value of entries without children.
pub const LEAF: u8 = u8::MAX;

/// Character classing used to index child slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Request line tokens: letters of either case share a class, everything else is class 26.
    RequestLine,
    /// Lower-cased header names and values: `a`–`z`, then `-`, then everything else.
    Token,
}

impl CharClass {
    #[inline]
    pub const fn of(self, c: u8) -> usize {
        match self {
            CharClass::RequestLine => match c {
                b'A'..=b'Z' => (c - b'A') as usize,
                b'a'..=b'z' => (c - b'a') as usize,
                _ => 26,
            },
            CharClass::Token => match c {
                b'a'..=b'z' => (c - b'a') as usize,
                b'-' => 26,
                _ => 27,
            },
        }
    }

    /// Number of distinct classes.
    pub const fn width(self) -> usize {
        match self {
            CharClass::RequestLine => 27,
            CharClass::Token => 28,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieEntry<'a> {
    pub prefix: &'a [u8],
    pub check: u8,
    pub next: u8,
    pub offset: u8,
    pub terminal: u8,
}

impl<'a> TrieEntry<'a> {
    pub const EMPTY: Self = Self { prefix: b"", check: 0, next: LEAF, offset: 0, terminal: 0 };

    pub const fn new(prefix: &'a [u8], check: u8, next: u8, offset: u8, terminal: u8) -> Self {
        Self { prefix, check, next, offset, terminal }
    }

    pub const fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }
}

/// A virtual branch a walk starts from. One table may hold several roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieRoot {
    pub next: u8,
    pub offset: u8,
}

impl TrieRoot {
    pub const fn new(next: u8, offset: u8) -> Self {
        Self { next, offset }
    }
}

/// Resumable progress of a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieWalkState {
    slot: u32,
    prefix_offset: u32,
}

impl TrieWalkState {
    const AT_ROOT: u32 = u32::MAX;

    pub const fn new() -> Self {
        Self { slot: Self::AT_ROOT, prefix_offset: 0 }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether no character has been accepted yet.
    pub const fn at_root(&self) -> bool {
        self.slot == Self::AT_ROOT
    }
}

impl Default for TrieWalkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of feeding one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// The terminator completed a known token.
    Matched(u8),
    /// The character was accepted, feed the next one.
    Continue,
    /// No token of the table can match any more.
    NoMatch,
}

/// Feeds `c` to a walk over `entries`. A `c` of 0 terminates the token.
///
/// A terminator at an entry without a terminal code is a no-match, as is any
/// character after a walk has already failed; callers stop feeding on
/// [`Walk::NoMatch`].
pub fn walk(entries: &[TrieEntry<'_>], class: CharClass, root: TrieRoot, state: &mut TrieWalkState, c: u8) -> Walk {
    let (parent_next, base) = if state.at_root() {
        if c == 0 {
            return Walk::NoMatch;
        }
        (root.next, root.offset)
    } else {
        let Some(entry) = entries.get(state.slot as usize) else {
            return Walk::NoMatch;
        };

        if let Some(&expected) = entry.prefix.get(state.prefix_offset as usize) {
            if c == expected && c != 0 {
                state.prefix_offset += 1;
                return Walk::Continue;
            }
            return Walk::NoMatch;
        }

        if c == 0 {
            return match entry.terminal {
                0 => Walk::NoMatch,
                code => Walk::Matched(code),
            };
        }

        if entry.next == LEAF {
            return Walk::NoMatch;
        }
        (entry.next, entry.offset)
    };

    let slot = usize::from(base) + class.of(c);
    match entries.get(slot) {
        Some(child) if child.prefix.first() == Some(&c) && child.check == parent_next => {
            state.slot = slot as u32;
            state.prefix_offset = 1;
            Walk::Continue
        }
        _ => Walk::NoMatch,
    }
}

/// A static table together with its character classing and roots.
#[derive(Debug, Clone, Copy)]
pub struct TrieTable {
    pub entries: &'static [TrieEntry<'static>],
    pub class: CharClass,
    pub roots: &'static [TrieRoot],
}

impl TrieTable {
    /// The first (usually only) root.
    pub fn root(&self) -> TrieRoot {
        self.roots.first().copied().unwrap_or(TrieRoot::new(0, 0))
    }

    #[inline]
    pub fn walk(&self, root: TrieRoot, state: &mut TrieWalkState, c: u8) -> Walk {
        walk(self.entries, self.class, root, state, c)
    }

    /// Walks a complete token from the first root.
    pub fn lookup(&self, token: &[u8]) -> Option<u8> {
        lookup(self.entries, self.class, self.root(), token)
    }
}

/// Walks `token` followed by the terminator and returns the matched code.
pub fn lookup(entries: &[TrieEntry<'_>], class: CharClass, root: TrieRoot, token: &[u8]) -> Option<u8> {
    let mut state = TrieWalkState::new();
    for &c in token.iter().chain(std::iter::once(&0)) {
        match walk(entries, class, root, &mut state, c) {
            Walk::Matched(code) => return Some(code),
            Walk::Continue => {}
            Walk::NoMatch => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestHeader;

    #[test]
    fn every_header_name_matches_its_code() {
        for code in 1..=36 {
            let header = RequestHeader::from_code(code).unwrap();
            let lowered = header.name().to_ascii_lowercase();
            assert_eq!(HEADER_NAMES.lookup(lowered.as_bytes()), Some(code), "{header}");
        }
    }

    #[test]
    fn header_prefixes_and_extensions_fail() {
        assert_eq!(HEADER_NAMES.lookup(b"accept"), Some(RequestHeader::Accept as u8));
        assert_eq!(HEADER_NAMES.lookup(b"accept-"), None);
        assert_eq!(HEADER_NAMES.lookup(b"content-"), None);
        assert_eq!(HEADER_NAMES.lookup(b"hosts"), None);
        assert_eq!(HEADER_NAMES.lookup(b"x-forwarded-for"), None);
        assert_eq!(HEADER_NAMES.lookup(b""), None);
        // names are lower-cased before they reach the table
        assert_eq!(HEADER_NAMES.lookup(b"Host"), None);
    }

    #[test]
    fn request_line_roots_are_separate() {
        let [methods, protocol] = [REQUEST_LINE.roots[0], REQUEST_LINE.roots[1]];
        let methods_of = |token: &[u8]| lookup(REQUEST_LINE.entries, REQUEST_LINE.class, methods, token);
        let protocol_of = |token: &[u8]| lookup(REQUEST_LINE.entries, REQUEST_LINE.class, protocol, token);

        for (token, code) in [
            (&b"GET"[..], RequestToken::Get),
            (b"HEAD", RequestToken::Head),
            (b"POST", RequestToken::Post),
            (b"PUT", RequestToken::Put),
            (b"PATCH", RequestToken::Patch),
            (b"OPTIONS", RequestToken::Options),
            (b"DELETE", RequestToken::Delete),
            (b"TRACE", RequestToken::Trace),
            (b"CONNECT", RequestToken::Connect),
        ] {
            assert_eq!(methods_of(token), Some(code as u8));
            assert_eq!(protocol_of(token), None);
        }

        assert_eq!(protocol_of(b"HTTP"), Some(RequestToken::Http as u8));
        assert_eq!(methods_of(b"HTTP"), None);
        assert_eq!(methods_of(b"get"), None);
        assert_eq!(methods_of(b"GSET"), None);
        assert_eq!(methods_of(b"P"), None);
    }

    #[test]
    fn value_tables() {
        assert_eq!(CONNECTION.lookup(b"close"), Some(ConnectionToken::Close as u8));
        assert_eq!(CONNECTION.lookup(b"keep-alive"), Some(ConnectionToken::KeepAlive as u8));
        assert_eq!(CONNECTION.lookup(b"upgrade"), Some(ConnectionToken::Upgrade as u8));
        assert_eq!(CONNECTION.lookup(b"keep"), None);

        for (token, coding) in [
            (&b"chunked"[..], TransferCoding::Chunked),
            (b"compress", TransferCoding::Compress),
            (b"deflate", TransferCoding::Deflate),
            (b"gzip", TransferCoding::Gzip),
            (b"identity", TransferCoding::Identity),
        ] {
            assert_eq!(TRANSFER_ENCODING.lookup(token), Some(coding as u8));
        }
        assert_eq!(TRANSFER_ENCODING.lookup(b"c"), None);

        assert_eq!(EXPECT.lookup(b"100-continue"), Some(ExpectToken::Continue as u8));
        assert_eq!(EXPECT.lookup(b"100-continues"), None);
    }

    #[test]
    fn terminator_inside_a_token_is_no_match() {
        let cases: [(&TrieTable, TrieRoot, &[u8]); 5] = [
            (&REQUEST_LINE, REQUEST_LINE.roots[0], b"GE"),
            (&REQUEST_LINE, REQUEST_LINE.roots[0], b"P"),
            (&REQUEST_LINE, REQUEST_LINE.roots[1], b"HTT"),
            (&HEADER_NAMES, HEADER_NAMES.root(), b"conn"),
            (&CONNECTION, CONNECTION.root(), b"keep-"),
        ];

        for (table, root, prefix) in cases {
            let mut state = TrieWalkState::new();
            for &c in prefix {
                assert_eq!(table.walk(root, &mut state, c), Walk::Continue, "{}", prefix.escape_ascii());
            }
            assert_eq!(table.walk(root, &mut state, 0), Walk::NoMatch, "{}", prefix.escape_ascii());
        }
    }

    #[test]
    fn walk_resumes_from_saved_state() {
        let root = HEADER_NAMES.root();
        let mut state = TrieWalkState::new();
        for &c in b"content-" {
            assert_eq!(HEADER_NAMES.walk(root, &mut state, c), Walk::Continue);
        }
        let saved = state;
        for &c in b"type" {
            assert_eq!(HEADER_NAMES.walk(root, &mut state, c), Walk::Continue);
        }
        assert_eq!(HEADER_NAMES.walk(root, &mut state, 0), Walk::Matched(RequestHeader::ContentType as u8));

        let mut state = saved;
        assert_eq!(HEADER_NAMES.walk(root, &mut state, b'x'), Walk::NoMatch);
    }
}
