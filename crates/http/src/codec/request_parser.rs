//! Incremental HTTP/1.x request head parser.
//!
//! The parser consumes bytes straight from the connection's [`RingBuffer`]
//! and never needs the whole head at once: when the buffer runs dry it keeps
//! its state and returns [`ParseStatus::NeedMore`], and the next call resumes
//! with the next byte. Every byte it looks at is consumed, so on return the
//! read cursor sits exactly after the last processed byte, and after a
//! complete head it points at the first payload byte.
//!
//! Tokens (method, protocol, header names, `Connection`, `Transfer-Encoding`
//! and `Expect` values) are classified with the packed tries in
//! [`crate::trie`]. The decoded path and query and the values of the headers
//! selected by the [`HeaderMask`] are copied into the [`ScratchStore`]; the
//! request itself only keeps offsets and flags.
//!
//! A parser built with [`RequestParser::trailers`] starts at the beginning of
//! a header line and reads the trailer section of a chunked body.

use crate::buffer::{RingBuffer, ScratchFull, ScratchStore};
use crate::protocol::{HeaderMask, ParseError, Request, RequestFlags, RequestHeader};
use crate::trie::{
    CONNECTION, ConnectionToken, EXPECT, ExpectToken, HEADER_NAMES, REQUEST_LINE, RequestToken, TRANSFER_ENCODING,
    TransferCoding, TrieTable, TrieWalkState, Walk,
};
use http::{Method, Version};
use tracing::trace;

/// Outcome of [`RequestParser::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// The head is complete; the read cursor is at the first payload byte.
    Complete,
    /// All available input was consumed; call again once more bytes arrived.
    NeedMore,
    /// The peer closed the connection before sending any byte of a request.
    PeerClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UriPart {
    Path,
    Query,
}

/// Header values that are tokenised instead of copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueTable {
    Connection,
    TransferEncoding,
    Expect,
}

impl ValueTable {
    fn table(self) -> &'static TrieTable {
        match self {
            ValueTable::Connection => &CONNECTION,
            ValueTable::TransferEncoding => &TRANSFER_ENCODING,
            ValueTable::Expect => &EXPECT,
        }
    }
}

/// Where the value following `ValueLead` goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueTarget {
    Collect,
    Tokens(ValueTable),
    ContentLength,
}

/// What the previous header line was, for continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Collected,
    Tokens(ValueTable),
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Method,
    MethodSpace,
    Uri(UriPart),
    Escape1(UriPart),
    Escape2(UriPart, u8),
    PathSpace,
    Protocol,
    VersionMajor,
    VersionMinor,
    Cr,
    NewLine,
    HeaderName,
    ValueLead(ValueTarget),
    Value,
    Token(ValueTable),
    TokenSkip(ValueTable),
    TokenGap(ValueTable),
    ContentLength,
    ContentLengthTail,
    SkipLine,
    Done,
    Closed,
    Failed(ParseError),
}

/// Whether the byte was consumed or has to be fed to the new state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Consumed,
    Again,
}

#[derive(Debug, Clone)]
pub struct RequestParser {
    state: State,
    mask: HeaderMask,
    trailers: bool,
    walk: TrieWalkState,
    line: LineKind,
    newlines: u8,
    major: u16,
    minor: u16,
    length: u64,
    length_digits: u32,
}

impl RequestParser {
    /// A parser for a request head capturing the headers selected by `mask`.
    pub fn new(mask: HeaderMask) -> Self {
        Self {
            state: State::Initial,
            mask,
            trailers: false,
            walk: TrieWalkState::new(),
            line: LineKind::Skipped,
            newlines: 0,
            major: 0,
            minor: 0,
            length: 0,
            length_digits: 0,
        }
    }

    /// A parser for the trailer section that follows the last chunk.
    ///
    /// Trailers are plain header lines: `Connection`, `Transfer-Encoding`,
    /// `Expect` and `Content-Length` are captured like any other header.
    pub fn trailers(mask: HeaderMask) -> Self {
        Self { state: State::NewLine, trailers: true, newlines: 1, ..Self::new(mask) }
    }

    pub fn is_complete(&self) -> bool {
        self.state == State::Done
    }

    /// Consumes input until the head is complete, the input runs dry, or an
    /// error is found. Errors are sticky: later calls return the same error.
    pub fn parse(
        &mut self,
        request: &mut Request,
        input: &mut RingBuffer,
        scratch: &mut ScratchStore,
    ) -> Result<ParseStatus, ParseError> {
        loop {
            match self.state {
                State::Done => return Ok(ParseStatus::Complete),
                State::Closed => return Ok(ParseStatus::PeerClosed),
                State::Failed(e) => return Err(e),
                _ => {}
            }

            let c = match input.pop() {
                Some(c) => Some(c),
                None if input.is_eof() => None,
                None => return Ok(ParseStatus::NeedMore),
            };

            loop {
                match self.step(c, request, scratch) {
                    Ok(Flow::Consumed) => break,
                    Ok(Flow::Again) => {}
                    Err(e) => {
                        trace!(cause = %e, state = ?self.state, "request head rejected");
                        self.state = State::Failed(e);
                        return Err(e);
                    }
                }
            }

            if self.newlines > 1 {
                trace!(method = ?request.method, version = ?request.version, "request head parsed");
                self.state = State::Done;
            }
        }
    }

    fn step(&mut self, c: Option<u8>, request: &mut Request, scratch: &mut ScratchStore) -> Result<Flow, ParseError> {
        use State::*;

        let Some(c) = c else {
            return self.step_eof(request, scratch);
        };

        match self.state {
            Initial => {
                if c != b'\r' && c != b'\n' {
                    self.walk.reset();
                    return self.shift_again(Method);
                }
            }

            Method => {
                let methods = REQUEST_LINE.roots[0];
                match REQUEST_LINE.walk(methods, &mut self.walk, walk_byte(c, b' ')) {
                    Walk::Continue => {}
                    Walk::Matched(code) => {
                        request.method = Some(method_of(code)?);
                        self.state = MethodSpace;
                    }
                    Walk::NoMatch => return Err(ParseError::bad_request("unknown method")),
                }
            }

            MethodSpace => {
                if c != b' ' {
                    request.path = scratch.text_offset();
                    return self.shift_again(Uri(UriPart::Path));
                }
            }

            Uri(part) => match c {
                b'%' => self.state = Escape1(part),
                b'?' if part == UriPart::Path => {
                    scratch.put_char(0).map_err(|ScratchFull| ParseError::UriTooLong)?;
                    request.query = scratch.text_offset();
                    self.state = Uri(UriPart::Query);
                }
                b' ' => {
                    scratch.put_char(0).map_err(|ScratchFull| ParseError::UriTooLong)?;
                    self.state = PathSpace;
                }
                c if accepts(part, c) => scratch.put_char(c).map_err(|ScratchFull| ParseError::UriTooLong)?,
                _ => return Err(ParseError::bad_request("invalid character in request target")),
            },

            Escape1(part) => {
                let high = hex_value(c).ok_or(ParseError::bad_request("invalid percent escape"))?;
                self.state = Escape2(part, high);
            }

            Escape2(part, high) => {
                let low = hex_value(c).ok_or(ParseError::bad_request("invalid percent escape"))?;
                let decoded = high << 4 | low;
                if decoded == 0 {
                    return Err(ParseError::bad_request("escaped NUL in request target"));
                }
                scratch.put_char(decoded).map_err(|ScratchFull| ParseError::UriTooLong)?;
                self.state = Uri(part);
            }

            PathSpace => {
                if c != b' ' {
                    self.walk.reset();
                    return self.shift_again(Protocol);
                }
            }

            Protocol => {
                let protocol = REQUEST_LINE.roots[1];
                match REQUEST_LINE.walk(protocol, &mut self.walk, walk_byte(c, b'/')) {
                    Walk::Continue => {}
                    Walk::Matched(_) => {
                        self.major = 0;
                        self.minor = 0;
                        self.state = VersionMajor;
                    }
                    Walk::NoMatch => return Err(ParseError::VersionNotSupported),
                }
            }

            VersionMajor => match c {
                b'0'..=b'9' => self.major = self.major.saturating_mul(10).saturating_add(u16::from(c - b'0')),
                b'.' => self.state = VersionMinor,
                _ => return Err(ParseError::bad_request("malformed http version")),
            },

            VersionMinor => match c {
                b'0'..=b'9' => self.minor = self.minor.saturating_mul(10).saturating_add(u16::from(c - b'0')),
                _ => {
                    request.version = Some(match (self.major, self.minor) {
                        (0, 9) => Version::HTTP_09,
                        (1, 0) => Version::HTTP_10,
                        (1, 1) => Version::HTTP_11,
                        _ => return Err(ParseError::VersionNotSupported),
                    });
                    return self.end_of_line(c);
                }
            },

            Cr => {
                if c != b'\n' {
                    return Err(ParseError::bad_request("CR without LF"));
                }
                self.newlines += 1;
                self.state = NewLine;
            }

            NewLine => match c {
                b'\r' => self.state = Cr,
                b'\n' => self.newlines += 1,
                b' ' | b'\t' => {
                    self.newlines = 0;
                    return Ok(self.continuation(scratch));
                }
                _ => {
                    self.newlines = 0;
                    self.walk.reset();
                    return self.shift_again(HeaderName);
                }
            },

            HeaderName => {
                let c = c.to_ascii_lowercase();
                match HEADER_NAMES.walk(HEADER_NAMES.root(), &mut self.walk, walk_byte(c, b':')) {
                    Walk::Continue => {}
                    Walk::Matched(code) => {
                        let header = RequestHeader::from_code(code).ok_or(ParseError::internal("unexpected header code"))?;
                        self.begin_value(header, scratch)?;
                    }
                    Walk::NoMatch => {
                        self.line = LineKind::Skipped;
                        return self.shift_again(SkipLine);
                    }
                }
            }

            ValueLead(target) => {
                if c != b' ' && c != b'\t' {
                    let next = match target {
                        ValueTarget::Collect => Value,
                        ValueTarget::Tokens(table) => {
                            self.walk.reset();
                            TokenGap(table)
                        }
                        ValueTarget::ContentLength => ContentLength,
                    };
                    return self.shift_again(next);
                }
            }

            Value => match c {
                b'\r' | b'\n' => {
                    scratch.put_char(0).map_err(|ScratchFull| ParseError::EntityTooLarge)?;
                    return self.end_of_line(c);
                }
                b' ' | b'\t' => {
                    scratch.put_char(b' ').map_err(|ScratchFull| ParseError::EntityTooLarge)?;
                    self.state = ValueLead(ValueTarget::Collect);
                }
                _ => scratch.put_char(c).map_err(|ScratchFull| ParseError::EntityTooLarge)?,
            },

            TokenGap(table) => match c {
                b',' | b' ' | b'\t' => {}
                b'\r' | b'\n' => return self.end_of_line(c),
                _ => {
                    self.walk.reset();
                    return self.shift_again(Token(table));
                }
            },

            Token(table) => {
                if is_token_separator(c) {
                    let code = match table.table().walk(table.table().root(), &mut self.walk, 0) {
                        Walk::Matched(code) => Some(code),
                        Walk::Continue | Walk::NoMatch => None,
                    };
                    self.apply_token(table, code, request);
                    return self.shift_again(TokenGap(table));
                }
                let c = walk_byte(c.to_ascii_lowercase(), b',');
                if table.table().walk(table.table().root(), &mut self.walk, c) == Walk::NoMatch {
                    self.state = TokenSkip(table);
                }
            }

            TokenSkip(table) => {
                if is_token_separator(c) {
                    self.apply_token(table, None, request);
                    return self.shift_again(TokenGap(table));
                }
            }

            ContentLength => match c {
                b'0'..=b'9' => {
                    self.length = self
                        .length
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(u64::from(c - b'0')))
                        .ok_or(ParseError::bad_request("content-length overflow"))?;
                    self.length_digits += 1;
                }
                b' ' | b'\t' => self.state = ContentLengthTail,
                b'\r' | b'\n' => {
                    self.finish_content_length(request)?;
                    return self.end_of_line(c);
                }
                _ => return Err(ParseError::bad_request("invalid content-length")),
            },

            ContentLengthTail => match c {
                b' ' | b'\t' => {}
                b'\r' | b'\n' => {
                    self.finish_content_length(request)?;
                    return self.end_of_line(c);
                }
                _ => return Err(ParseError::bad_request("invalid content-length")),
            },

            SkipLine => {
                if c == b'\r' || c == b'\n' {
                    return self.end_of_line(c);
                }
            }

            Done | Closed | Failed(_) => return Err(ParseError::internal("parser resumed after completion")),
        }

        Ok(Flow::Consumed)
    }

    /// End of input. Inside the header section the head is complete; before
    /// the first byte the peer simply closed; anywhere else the request is cut short.
    fn step_eof(&mut self, request: &mut Request, scratch: &mut ScratchStore) -> Result<Flow, ParseError> {
        use State::*;

        match self.state {
            Initial => {
                self.state = Closed;
                return Ok(Flow::Consumed);
            }
            Method | MethodSpace | Uri(_) | Escape1(_) | Escape2(..) | PathSpace | Protocol | VersionMajor
            | VersionMinor => return Err(ParseError::UnexpectedEof),
            Value => scratch.put_char(0).map_err(|ScratchFull| ParseError::EntityTooLarge)?,
            Token(table) => {
                let code = match table.table().walk(table.table().root(), &mut self.walk, 0) {
                    Walk::Matched(code) => Some(code),
                    Walk::Continue | Walk::NoMatch => None,
                };
                self.apply_token(table, code, request);
            }
            TokenSkip(table) => self.apply_token(table, None, request),
            ContentLength | ContentLengthTail => self.finish_content_length(request)?,
            _ => {}
        }

        self.state = Done;
        Ok(Flow::Consumed)
    }

    fn shift_again(&mut self, state: State) -> Result<Flow, ParseError> {
        self.state = state;
        Ok(Flow::Again)
    }

    /// Handles the CR or LF that ends the request line or a header line.
    fn end_of_line(&mut self, c: u8) -> Result<Flow, ParseError> {
        match c {
            b'\r' => self.state = State::Cr,
            b'\n' => {
                self.newlines += 1;
                self.state = State::NewLine;
            }
            _ => return Err(ParseError::bad_request("expected end of line")),
        }
        Ok(Flow::Consumed)
    }

    /// A line starting with whitespace continues the previous header.
    fn continuation(&mut self, scratch: &mut ScratchStore) -> Flow {
        self.state = match self.line {
            LineKind::Collected if scratch.replace_char(-1, b' ') => State::ValueLead(ValueTarget::Collect),
            LineKind::Tokens(table) => State::TokenGap(table),
            LineKind::Collected | LineKind::Skipped => State::SkipLine,
        };
        Flow::Consumed
    }

    fn begin_value(&mut self, header: RequestHeader, scratch: &mut ScratchStore) -> Result<(), ParseError> {
        let dedicated = match header {
            _ if self.trailers => None,
            RequestHeader::Connection => Some(ValueTarget::Tokens(ValueTable::Connection)),
            RequestHeader::TransferEncoding => Some(ValueTarget::Tokens(ValueTable::TransferEncoding)),
            RequestHeader::Expect => Some(ValueTarget::Tokens(ValueTable::Expect)),
            RequestHeader::ContentLength => Some(ValueTarget::ContentLength),
            _ => None,
        };

        match dedicated {
            Some(target) => {
                self.line = match target {
                    ValueTarget::Tokens(table) => LineKind::Tokens(table),
                    ValueTarget::Collect | ValueTarget::ContentLength => LineKind::Skipped,
                };
                if target == ValueTarget::ContentLength {
                    self.length = 0;
                    self.length_digits = 0;
                }
                self.state = State::ValueLead(target);
            }
            None if self.mask.contains(header) => {
                let offset = i32::try_from(scratch.text_offset().get()).map_err(|_| ParseError::EntityTooLarge)?;
                scratch.put_int(i32::from(header.code())).map_err(|ScratchFull| ParseError::EntityTooLarge)?;
                scratch.put_int(offset).map_err(|ScratchFull| ParseError::EntityTooLarge)?;
                self.line = LineKind::Collected;
                self.state = State::ValueLead(ValueTarget::Collect);
            }
            None => {
                self.line = LineKind::Skipped;
                self.state = State::SkipLine;
            }
        }
        Ok(())
    }

    fn apply_token(&mut self, table: ValueTable, code: Option<u8>, request: &mut Request) {
        match table {
            ValueTable::Connection => match code.and_then(ConnectionToken::from_code) {
                Some(ConnectionToken::Close) => request.flags |= RequestFlags::CONNECTION_CLOSE,
                Some(ConnectionToken::KeepAlive) => request.flags |= RequestFlags::CONNECTION_KEEP_ALIVE,
                Some(ConnectionToken::Upgrade) | None => {}
            },
            // only the final coding decides whether the body is chunked
            ValueTable::TransferEncoding => {
                let chunked = code.and_then(TransferCoding::from_code) == Some(TransferCoding::Chunked);
                request.flags.set(RequestFlags::TRANSFER_CHUNKED, chunked);
            }
            ValueTable::Expect => {
                if code.and_then(ExpectToken::from_code) == Some(ExpectToken::Continue) {
                    request.flags |= RequestFlags::EXPECT_CONTINUE;
                }
            }
        }
    }

    fn finish_content_length(&mut self, request: &mut Request) -> Result<(), ParseError> {
        if self.length_digits == 0 {
            return Err(ParseError::bad_request("empty content-length"));
        }
        if request.flags.contains(RequestFlags::CONTENT_LENGTH) && request.content_length != self.length {
            return Err(ParseError::bad_request("conflicting content-length"));
        }
        request.flags |= RequestFlags::CONTENT_LENGTH;
        request.content_length = self.length;
        Ok(())
    }
}

fn method_of(code: u8) -> Result<Method, ParseError> {
    Ok(match RequestToken::from_code(code) {
        Some(RequestToken::Get) => Method::GET,
        Some(RequestToken::Head) => Method::HEAD,
        Some(RequestToken::Post) => Method::POST,
        Some(RequestToken::Put) => Method::PUT,
        Some(RequestToken::Options) => Method::OPTIONS,
        Some(RequestToken::Delete) => Method::DELETE,
        Some(RequestToken::Trace) => Method::TRACE,
        Some(RequestToken::Connect) => Method::CONNECT,
        Some(RequestToken::Patch) => Method::PATCH,
        Some(RequestToken::Http) | None => return Err(ParseError::internal("unexpected method code")),
    })
}

/// Maps the token terminator to the walk terminator and keeps a literal NUL from posing as one.
fn walk_byte(c: u8, terminator: u8) -> u8 {
    match c {
        _ if c == terminator => 0,
        0 => u8::MAX,
        c => c,
    }
}

fn is_token_separator(c: u8) -> bool {
    matches!(c, b',' | b' ' | b'\t' | b'\r' | b'\n')
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

// RFC 2396, appendix A
fn is_unreserved(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')')
}

fn is_pchar(c: u8) -> bool {
    is_unreserved(c) || matches!(c, b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b',')
}

fn is_uric(c: u8) -> bool {
    is_unreserved(c) || matches!(c, b';' | b'/' | b'?' | b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b',')
}

fn accepts(part: UriPart, c: u8) -> bool {
    match part {
        UriPart::Path => is_pchar(c) || c == b'/' || c == b';',
        UriPart::Query => is_uric(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use proptest::prelude::*;

    struct Parsed {
        status: Result<ParseStatus, ParseError>,
        request: Request,
        input: RingBuffer,
        scratch: ScratchStore,
    }

    impl Parsed {
        fn header(&self, header: RequestHeader) -> Option<&str> {
            self.scratch.header(header).map(|v| std::str::from_utf8(v).unwrap())
        }

        fn path(&self) -> &[u8] {
            self.request.path(&self.scratch)
        }
    }

    fn parse_with(text: &[u8], mask: HeaderMask, eof: bool) -> Parsed {
        let mut input = RingBuffer::with_capacity(1024);
        input.write_bytes(text).unwrap();
        if eof {
            input.set_eof();
        }
        let mut scratch = ScratchStore::with_capacity(512);
        let mut request = Request::default();
        let status = RequestParser::new(mask).parse(&mut request, &mut input, &mut scratch);
        Parsed { status, request, input, scratch }
    }

    fn parse(text: &str) -> Parsed {
        parse_with(text.as_bytes(), HeaderMask::ALL, false)
    }

    #[test]
    fn parses_full_request() {
        let text = "GET /test/uri?with&query-string HTTP/1.1\r\n\
                    Host: localhost\r\n\
                    Content-Length: 27\r\n\
                    Connection: Keep-Alive\r\n\
                    \r\n\
                    payload";
        let parsed = parse(text);

        assert_eq!(parsed.status, Ok(ParseStatus::Complete));
        assert_eq!(parsed.request.method(), Some(&Method::GET));
        assert_eq!(parsed.request.version(), Some(Version::HTTP_11));
        assert_eq!(parsed.path(), b"/test/uri");
        assert_eq!(parsed.request.query(&parsed.scratch), Some(&b"with&query-string"[..]));
        assert_eq!(parsed.header(RequestHeader::Host), Some("localhost"));
        assert_eq!(parsed.request.content_length(), Some(27));
        assert!(parsed.request.flags().contains(RequestFlags::CONNECTION_KEEP_ALIVE));
        assert_eq!(parsed.input.gather().0, b"payload");
        assert_eq!(parsed.input.read_cursor(), (text.len() - "payload".len()) as u64);
    }

    #[test]
    fn from_curl_with_bare_newlines() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        123"##};
        let parsed = parse(str);

        assert_eq!(parsed.status, Ok(ParseStatus::Complete));
        assert_eq!(parsed.path(), b"/index.html");
        assert_eq!(parsed.request.query(&parsed.scratch), None);

        let headers: Vec<_> = parsed.scratch.headers().map(|(h, v)| (h, v.to_vec())).collect();
        assert_eq!(
            headers,
            vec![
                (RequestHeader::Host, b"127.0.0.1:8080".to_vec()),
                (RequestHeader::UserAgent, b"curl/7.79.1".to_vec()),
                (RequestHeader::Accept, b"*/*".to_vec()),
            ]
        );
        assert_eq!(parsed.input.gather().0, b"123");
    }

    #[test]
    fn decodes_percent_escapes() {
        let parsed = parse("GET /test%2Furi?with&query%20string HTTP/1.1\r\n\r\n");
        assert_eq!(parsed.status, Ok(ParseStatus::Complete));
        assert_eq!(parsed.path(), b"/test/uri");
        assert_eq!(parsed.request.query(&parsed.scratch), Some(&b"with&query string"[..]));

        assert_eq!(parse("GET /a%zz HTTP/1.1\r\n\r\n").status.unwrap_err().status().as_u16(), 400);
        assert_eq!(parse("GET /a%00 HTTP/1.1\r\n\r\n").status.unwrap_err().status().as_u16(), 400);
    }

    #[test]
    fn skips_leading_blank_lines_and_extra_spaces() {
        let parsed = parse("\r\n\r\nPOST   /submit   HTTP/1.0\r\n\r\n");
        assert_eq!(parsed.status, Ok(ParseStatus::Complete));
        assert_eq!(parsed.request.method(), Some(&Method::POST));
        assert_eq!(parsed.request.version(), Some(Version::HTTP_10));
        assert_eq!(parsed.path(), b"/submit");
    }

    #[test]
    fn rejects_unknown_method_and_protocol() {
        assert_eq!(parse("GSET / HTTP/1.1\r\n\r\n").status, Err(ParseError::bad_request("unknown method")));
        assert_eq!(parse("get / HTTP/1.1\r\n\r\n").status.unwrap_err().status().as_u16(), 400);
        assert_eq!(parse("GET / SPDY/1.1\r\n\r\n").status, Err(ParseError::VersionNotSupported));
        assert_eq!(parse("GET / HTTP/2.0\r\n\r\n").status, Err(ParseError::VersionNotSupported));
        assert_eq!(parse("GET / HTTP/1.2\r\n\r\n").status, Err(ParseError::VersionNotSupported));
        assert_eq!(parse("GET /a\"b HTTP/1.1\r\n\r\n").status.unwrap_err().status().as_u16(), 400);
    }

    #[test]
    fn accepts_http_09() {
        let parsed = parse("GET / HTTP/0.9\r\n\r\n");
        assert_eq!(parsed.request.version(), Some(Version::HTTP_09));
        assert!(!parsed.request.keep_alive());
    }

    #[test]
    fn errors_are_sticky() {
        let mut input = RingBuffer::with_capacity(64);
        input.write_bytes(b"FOO / HTTP/1.1\r\n").unwrap();
        let mut scratch = ScratchStore::with_capacity(64);
        let mut request = Request::default();
        let mut parser = RequestParser::new(HeaderMask::ALL);

        let first = parser.parse(&mut request, &mut input, &mut scratch);
        assert!(first.is_err());
        assert_eq!(parser.parse(&mut request, &mut input, &mut scratch), first);
    }

    #[test]
    fn folds_continuation_lines() {
        let parsed = parse("GET / HTTP/1.1\r\nUser-Agent: first\r\n   second\r\n\tthird  part\r\n\r\n");
        assert_eq!(parsed.status, Ok(ParseStatus::Complete));
        assert_eq!(parsed.header(RequestHeader::UserAgent), Some("first second third part"));
    }

    #[test]
    fn collapses_whitespace_runs() {
        let parsed = parse("GET / HTTP/1.1\r\nAccept:    text/html, \t  text/plain\r\n\r\n");
        assert_eq!(parsed.header(RequestHeader::Accept), Some("text/html, text/plain"));
    }

    #[test]
    fn unknown_and_unmasked_headers_are_skipped() {
        let mask = HeaderMask::NONE.with(RequestHeader::Cookie);
        let text = "GET / HTTP/1.1\r\nX-Custom: 1\r\nHost: h\r\nCookie: a=b\r\nNoColon\r\n\r\n";
        let parsed = parse_with(text.as_bytes(), mask, false);

        assert_eq!(parsed.status, Ok(ParseStatus::Complete));
        let headers: Vec<_> = parsed.scratch.headers().map(|(h, _)| h).collect();
        assert_eq!(headers, vec![RequestHeader::Cookie]);
        assert_eq!(parsed.header(RequestHeader::Cookie), Some("a=b"));
    }

    #[test]
    fn header_names_ignore_case() {
        let parsed = parse("GET / HTTP/1.1\r\nhOsT: example.com\r\nCONTENT-TYPE: text/plain\r\n\r\n");
        assert_eq!(parsed.header(RequestHeader::Host), Some("example.com"));
        assert_eq!(parsed.header(RequestHeader::ContentType), Some("text/plain"));
    }

    #[test]
    fn connection_token_lists() {
        let parsed = parse("GET / HTTP/1.1\r\nConnection: Upgrade, close\r\n\r\n");
        assert!(parsed.request.flags().contains(RequestFlags::CONNECTION_CLOSE));
        assert!(!parsed.request.keep_alive());

        let parsed = parse("GET / HTTP/1.0\r\nConnection: foo,  keep-alive\r\n\r\n");
        assert!(parsed.request.flags().contains(RequestFlags::CONNECTION_KEEP_ALIVE));
        assert!(parsed.request.keep_alive());

        let parsed = parse("GET / HTTP/1.0\r\nConnection: keep-alive-not\r\n\r\n");
        assert!(!parsed.request.keep_alive());
    }

    #[test]
    fn chunked_only_when_last_coding() {
        let parsed = parse("POST / HTTP/1.1\r\nTransfer-Encoding: gzip, chunked\r\n\r\n");
        assert!(parsed.request.is_chunked());

        let parsed = parse("POST / HTTP/1.1\r\nTransfer-Encoding: chunked, gzip\r\n\r\n");
        assert!(!parsed.request.is_chunked());

        let parsed = parse("POST / HTTP/1.1\r\nTransfer-Encoding: CHUNKED\r\n\r\n");
        assert!(parsed.request.is_chunked());

        let parsed = parse("POST / HTTP/1.1\r\nTransfer-Encoding: gzip,\r\n chunked\r\n\r\n");
        assert!(parsed.request.is_chunked());
    }

    #[test]
    fn expect_continue() {
        let parsed = parse("PUT /f HTTP/1.1\r\nExpect: 100-continue\r\nContent-Length: 3\r\n\r\n");
        assert!(parsed.request.expects_continue());
        assert_eq!(parsed.request.content_length(), Some(3));

        let parsed = parse("PUT /f HTTP/1.1\r\nExpect: 100-continues\r\n\r\n");
        assert!(!parsed.request.expects_continue());
    }

    #[test]
    fn content_length_validation() {
        assert_eq!(parse("POST / HTTP/1.1\r\nContent-Length: 12 \r\n\r\n").request.content_length(), Some(12));
        assert_eq!(parse("POST / HTTP/1.1\r\nContent-Length: 5\r\nContent-Length: 5\r\n\r\n").request.content_length(), Some(5));

        for bad in [
            "POST / HTTP/1.1\r\nContent-Length: 1x\r\n\r\n",
            "POST / HTTP/1.1\r\nContent-Length:\r\n\r\n",
            "POST / HTTP/1.1\r\nContent-Length: -1\r\n\r\n",
            "POST / HTTP/1.1\r\nContent-Length: 99999999999999999999999\r\n\r\n",
            "POST / HTTP/1.1\r\nContent-Length: 5\r\nContent-Length: 6\r\n\r\n",
        ] {
            assert_eq!(parse(bad).status.unwrap_err().status().as_u16(), 400, "{bad:?}");
        }
    }

    #[test]
    fn scratch_exhaustion_maps_to_status() {
        let long_path = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(600));
        assert_eq!(parse(&long_path).status, Err(ParseError::UriTooLong));

        let long_header = format!("GET / HTTP/1.1\r\nCookie: {}\r\n\r\n", "c".repeat(600));
        assert_eq!(parse(&long_header).status, Err(ParseError::EntityTooLarge));
    }

    #[test]
    fn waits_for_more_input() {
        let parsed = parse("GET /index.html HTTP/1.1\r\nHost: loc");
        assert_eq!(parsed.status, Ok(ParseStatus::NeedMore));
        assert!(parsed.input.is_empty());
    }

    #[test]
    fn end_of_input() {
        let closed = parse_with(b"\r\n", HeaderMask::ALL, true);
        assert_eq!(closed.status, Ok(ParseStatus::PeerClosed));

        let truncated = parse_with(b"GET /inde", HeaderMask::ALL, true);
        assert_eq!(truncated.status, Err(ParseError::UnexpectedEof));

        let headers_cut = parse_with(b"GET / HTTP/1.0\r\nHost: x", HeaderMask::ALL, true);
        assert_eq!(headers_cut.status, Ok(ParseStatus::Complete));
        assert_eq!(headers_cut.header(RequestHeader::Host), Some("x"));
    }

    #[test]
    fn trailer_section() {
        let mut input = RingBuffer::with_capacity(128);
        input.write_bytes(b"Content-Length: 7\r\nX-Checksum: abc\r\nCookie: t=1\r\n\r\nNEXT").unwrap();
        let mut scratch = ScratchStore::with_capacity(128);
        let mut request = Request::default();
        let mut parser = RequestParser::trailers(HeaderMask::ALL);

        assert_eq!(parser.parse(&mut request, &mut input, &mut scratch), Ok(ParseStatus::Complete));
        assert_eq!(request.content_length(), None);
        assert_eq!(scratch.header(RequestHeader::ContentLength), Some(&b"7"[..]));
        assert_eq!(scratch.header(RequestHeader::Cookie), Some(&b"t=1"[..]));
        assert_eq!(input.gather().0, b"NEXT");

        let mut input = RingBuffer::with_capacity(16);
        input.write_bytes(b"\r\nrest").unwrap();
        let mut parser = RequestParser::trailers(HeaderMask::ALL);
        assert_eq!(parser.parse(&mut request, &mut input, &mut scratch), Ok(ParseStatus::Complete));
        assert_eq!(input.gather().0, b"rest");
    }

    const SAMPLE: &str = "POST /upload/a%20b?x=1&y=%41 HTTP/1.1\r\n\
                          Host: example.com\r\n\
                          User-Agent: test\r\n  folded\r\n\
                          Transfer-Encoding: gzip, chunked\r\n\
                          Connection: keep-alive\r\n\
                          X-Ignored: yes\r\n\
                          Accept: */*\r\n\
                          \r\n";

    fn snapshot(parser_input: &[&[u8]]) -> (Request, Vec<(RequestHeader, Vec<u8>)>, Vec<u8>, Vec<u8>) {
        let mut input = RingBuffer::with_capacity(256);
        let mut scratch = ScratchStore::with_capacity(256);
        let mut request = Request::default();
        let mut parser = RequestParser::new(HeaderMask::ALL);

        let mut status = Ok(ParseStatus::NeedMore);
        for piece in parser_input {
            input.write_bytes(piece).unwrap();
            status = parser.parse(&mut request, &mut input, &mut scratch);
            if status != Ok(ParseStatus::NeedMore) {
                break;
            }
            assert!(input.is_empty());
        }
        assert_eq!(status, Ok(ParseStatus::Complete));

        let headers = scratch.headers().map(|(h, v)| (h, v.to_vec())).collect();
        let path = request.path(&scratch).to_vec();
        let query = request.query(&scratch).unwrap_or_default().to_vec();
        (request, headers, path, query)
    }

    #[test]
    fn every_two_way_split_matches_whole() {
        let whole = snapshot(&[SAMPLE.as_bytes()]);
        assert_eq!(whole.2, b"/upload/a b");
        assert_eq!(whole.3, b"x=1&y=A");
        assert!(whole.0.is_chunked());
        assert_eq!(whole.1.len(), 3);
        assert_eq!(whole.1[1], (RequestHeader::UserAgent, b"test folded".to_vec()));

        let bytes = SAMPLE.as_bytes();
        for split in 1..bytes.len() {
            let (head, tail) = bytes.split_at(split);
            assert_eq!(snapshot(&[head, tail]), whole, "split at {split}");
        }
    }

    proptest! {
        #[test]
        fn arbitrary_splits_match_whole(cuts in proptest::collection::btree_set(1usize..SAMPLE.len(), 0..12)) {
            let bytes = SAMPLE.as_bytes();
            let mut pieces = Vec::new();
            let mut start = 0;
            for cut in cuts {
                pieces.push(&bytes[start..cut]);
                start = cut;
            }
            pieces.push(&bytes[start..]);

            prop_assert_eq!(snapshot(&pieces), snapshot(&[bytes]));
        }
    }
}
