//! The parsed request line and the framing-relevant header flags.
//!
//! Strings (path, query, captured header values) are not owned by the request;
//! they live in the [`ScratchStore`] the parser wrote them to and are reached
//! through [`TextOffset`] handles.

use crate::buffer::{ScratchStore, TextOffset};
use bitflags::bitflags;
use http::{Method, Version};

bitflags! {
    /// Flags derived from the dedicated request headers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct RequestFlags: u8 {
        /// `Connection: close`
        const CONNECTION_CLOSE = 1;
        /// `Connection: keep-alive`
        const CONNECTION_KEEP_ALIVE = 1 << 1;
        /// `Expect: 100-continue`
        const EXPECT_CONTINUE = 1 << 2;
        /// the last `Transfer-Encoding` coding is `chunked`
        const TRANSFER_CHUNKED = 1 << 3;
        /// a `Content-Length` header was present
        const CONTENT_LENGTH = 1 << 4;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub(crate) method: Option<Method>,
    pub(crate) version: Option<Version>,
    pub(crate) path: TextOffset,
    pub(crate) query: TextOffset,
    pub(crate) flags: RequestFlags,
    pub(crate) content_length: u64,
}

impl Request {
    /// The request method, absent until the request line was parsed.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn version(&self) -> Option<Version> {
        self.version
    }

    pub fn path_offset(&self) -> TextOffset {
        self.path
    }

    pub fn query_offset(&self) -> TextOffset {
        self.query
    }

    /// The percent-decoded path.
    pub fn path<'s>(&self, scratch: &'s ScratchStore) -> &'s [u8] {
        scratch.text(self.path)
    }

    /// The percent-decoded query, without the `?`. `None` if the target had no `?`.
    pub fn query<'s>(&self, scratch: &'s ScratchStore) -> Option<&'s [u8]> {
        (!self.query.is_absent()).then(|| scratch.text(self.query))
    }

    pub fn flags(&self) -> RequestFlags {
        self.flags
    }

    /// The `Content-Length` value, if the header was sent.
    pub fn content_length(&self) -> Option<u64> {
        self.flags.contains(RequestFlags::CONTENT_LENGTH).then_some(self.content_length)
    }

    pub fn is_chunked(&self) -> bool {
        self.flags.contains(RequestFlags::TRANSFER_CHUNKED)
    }

    pub fn expects_continue(&self) -> bool {
        self.flags.contains(RequestFlags::EXPECT_CONTINUE)
    }

    pub fn is_head(&self) -> bool {
        self.method == Some(Method::HEAD)
    }

    /// Whether the client asked to keep the connection open.
    ///
    /// HTTP/1.1 connections persist unless `Connection: close` was sent; older
    /// versions persist only with `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        match self.version {
            Some(Version::HTTP_11) => !self.flags.contains(RequestFlags::CONNECTION_CLOSE),
            _ => self.flags.contains(RequestFlags::CONNECTION_KEEP_ALIVE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(version: Version, flags: RequestFlags) -> Request {
        Request { method: Some(Method::GET), version: Some(version), flags, ..Request::default() }
    }

    #[test]
    fn keep_alive_decision_table() {
        assert!(request(Version::HTTP_11, RequestFlags::empty()).keep_alive());
        assert!(!request(Version::HTTP_11, RequestFlags::CONNECTION_CLOSE).keep_alive());
        assert!(!request(Version::HTTP_10, RequestFlags::empty()).keep_alive());
        assert!(request(Version::HTTP_10, RequestFlags::CONNECTION_KEEP_ALIVE).keep_alive());
        assert!(!request(Version::HTTP_09, RequestFlags::empty()).keep_alive());
        assert!(!Request::default().keep_alive());
    }

    #[test]
    fn content_length_needs_the_flag() {
        let mut req = request(Version::HTTP_11, RequestFlags::empty());
        req.content_length = 12;
        assert_eq!(req.content_length(), None);
        req.flags |= RequestFlags::CONTENT_LENGTH;
        assert_eq!(req.content_length(), Some(12));
    }
}
