//! Packed tables for the tokens the request parser recognises.
//!
//! Generated with `trie-build`; see [`TrieBuilder`](super::TrieBuilder). The
//! unit tests in `builder.rs` rebuild every table and compare slot by slot.

use super::{CharClass, LEAF, TrieEntry, TrieRoot, TrieTable};
use crate::protocol::RequestHeader;

macro_rules! token_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $code:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $code,)+
        }

        impl $name {
            pub const TOKENS: &'static [(&'static str, $name)] = &[$(($text, $name::$variant),)+];

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }
    };
}

token_codes! {
    /// Methods and the protocol name of the request line.
    pub enum RequestToken {
        Get = 1 => "GET",
        Head = 2 => "HEAD",
        Post = 3 => "POST",
        Put = 4 => "PUT",
        Options = 5 => "OPTIONS",
        Delete = 6 => "DELETE",
        Trace = 7 => "TRACE",
        Connect = 8 => "CONNECT",
        Patch = 9 => "PATCH",
        Http = 10 => "HTTP",
    }
}

token_codes! {
    /// `Connection` header values.
    pub enum ConnectionToken {
        Close = 1 => "close",
        KeepAlive = 2 => "keep-alive",
        Upgrade = 3 => "upgrade",
    }
}

token_codes! {
    /// `Transfer-Encoding` and `TE` codings.
    pub enum TransferCoding {
        Chunked = 1 => "chunked",
        Compress = 2 => "compress",
        Deflate = 3 => "deflate",
        Gzip = 4 => "gzip",
        Identity = 5 => "identity",
    }
}

token_codes! {
    /// `Expect` header values.
    pub enum ExpectToken {
        Continue = 1 => "100-continue",
    }
}


/// Methods (first root, terminated by a space) and `HTTP` (second root, terminated by `/`).
pub const REQUEST_LINE: TrieTable = TrieTable {
    entries: &REQUEST_LINE_ENTRIES,
    class: CharClass::RequestLine,
    roots: &[TrieRoot::new(0, 2), TrieRoot::new(1, 0)],
};

const REQUEST_LINE_ENTRIES: [TrieEntry<'static>; 22] = {
    let mut t = [TrieEntry::EMPTY; 22];
    t[0] = TrieEntry::new(b"ATCH", 2, LEAF, 0, RequestToken::Patch as u8);
    t[4] = TrieEntry::new(b"CONNECT", 0, LEAF, 0, RequestToken::Connect as u8);
    t[5] = TrieEntry::new(b"DELETE", 0, LEAF, 0, RequestToken::Delete as u8);
    t[7] = TrieEntry::new(b"HTTP", 1, LEAF, 0, RequestToken::Http as u8);
    t[8] = TrieEntry::new(b"GET", 0, LEAF, 0, RequestToken::Get as u8);
    t[9] = TrieEntry::new(b"HEAD", 0, LEAF, 0, RequestToken::Head as u8);
    t[14] = TrieEntry::new(b"OST", 2, LEAF, 0, RequestToken::Post as u8);
    t[16] = TrieEntry::new(b"OPTIONS", 0, LEAF, 0, RequestToken::Options as u8);
    t[17] = TrieEntry::new(b"P", 0, 2, 0, 0);
    t[20] = TrieEntry::new(b"UT", 2, LEAF, 0, RequestToken::Put as u8);
    t[21] = TrieEntry::new(b"TRACE", 0, LEAF, 0, RequestToken::Trace as u8);
    t
};

/// Lower-cased request header names.
pub const HEADER_NAMES: TrieTable =
    TrieTable { entries: &HEADER_NAMES_ENTRIES, class: CharClass::Token, roots: &[TrieRoot::new(0, 0)] };

const HEADER_NAMES_ENTRIES: [TrieEntry<'static>; 54] = {
    let mut t = [TrieEntry::EMPTY; 54];
    t[0] = TrieEntry::new(b"a", 0, 1, 4, 0);
    t[2] = TrieEntry::new(b"c", 0, 2, 9, 0);
    t[3] = TrieEntry::new(b"date", 0, LEAF, 0, RequestHeader::Date as u8);
    t[4] = TrieEntry::new(b"expect", 0, LEAF, 0, RequestHeader::Expect as u8);
    t[5] = TrieEntry::new(b"from", 0, LEAF, 0, RequestHeader::From as u8);
    t[6] = TrieEntry::new(b"ccept", 1, 8, 10, RequestHeader::Accept as u8);
    t[7] = TrieEntry::new(b"host", 0, LEAF, 0, RequestHeader::Host as u8);
    t[8] = TrieEntry::new(b"if-", 0, 3, 13, 0);
    t[9] = TrieEntry::new(b"ache-control", 2, LEAF, 0, RequestHeader::CacheControl as u8);
    t[12] = TrieEntry::new(b"max-forwards", 0, LEAF, 0, RequestHeader::MaxForwards as u8);
    t[13] = TrieEntry::new(b"agma", 4, LEAF, 0, RequestHeader::Pragma as u8);
    t[14] = TrieEntry::new(b"origin", 0, LEAF, 0, RequestHeader::Origin as u8);
    t[15] = TrieEntry::new(b"pr", 0, 4, 13, 0);
    t[16] = TrieEntry::new(b"e", 6, LEAF, 0, RequestHeader::Te as u8);
    t[17] = TrieEntry::new(b"r", 0, 5, 28, 0);
    t[19] = TrieEntry::new(b"t", 0, 6, 12, 0);
    t[20] = TrieEntry::new(b"u", 0, 7, 16, 0);
    t[21] = TrieEntry::new(b"via", 0, LEAF, 0, RequestHeader::Via as u8);
    t[22] = TrieEntry::new(b"warning", 0, LEAF, 0, RequestHeader::Warning as u8);
    t[23] = TrieEntry::new(b"o", 2, 9, 37, 0);
    t[24] = TrieEntry::new(b"uthorization", 1, LEAF, 0, RequestHeader::Authorization as u8);
    t[25] = TrieEntry::new(b"m", 3, 10, 35, 0);
    t[26] = TrieEntry::new(b"none-match", 3, LEAF, 0, RequestHeader::IfNoneMatch as u8);
    t[27] = TrieEntry::new(b"oxy-authorization", 4, LEAF, 0, RequestHeader::ProxyAuthorization as u8);
    t[28] = TrieEntry::new(b"ange", 5, LEAF, 0, RequestHeader::Range as u8);
    t[29] = TrieEntry::new(b"ra", 6, 11, 33, 0);
    t[30] = TrieEntry::new(b"range", 3, LEAF, 0, RequestHeader::IfRange as u8);
    t[31] = TrieEntry::new(b"pgrade", 7, LEAF, 0, RequestHeader::Upgrade as u8);
    t[32] = TrieEntry::new(b"eferer", 5, LEAF, 0, RequestHeader::Referer as u8);
    t[33] = TrieEntry::new(b"unmodified-since", 3, LEAF, 0, RequestHeader::IfUnmodifiedSince as u8);
    t[34] = TrieEntry::new(b"ser-agent", 7, LEAF, 0, RequestHeader::UserAgent as u8);
    t[35] = TrieEntry::new(b"atch", 10, LEAF, 0, RequestHeader::IfMatch as u8);
    t[36] = TrieEntry::new(b"-", 8, 12, 36, 0);
    t[37] = TrieEntry::new(b"encoding", 14, LEAF, 0, RequestHeader::ContentEncoding as u8);
    t[38] = TrieEntry::new(b"charset", 12, LEAF, 0, RequestHeader::AcceptCharset as u8);
    t[39] = TrieEntry::new(b"anguage", 15, LEAF, 0, RequestHeader::ContentLanguage as u8);
    t[40] = TrieEntry::new(b"encoding", 12, LEAF, 0, RequestHeader::AcceptEncoding as u8);
    t[41] = TrieEntry::new(b"iler", 11, LEAF, 0, RequestHeader::Trailer as u8);
    t[42] = TrieEntry::new(b"nection", 13, LEAF, 0, RequestHeader::Connection as u8);
    t[43] = TrieEntry::new(b"ength", 15, LEAF, 0, RequestHeader::ContentLength as u8);
    t[44] = TrieEntry::new(b"l", 14, 15, 39, 0);
    t[45] = TrieEntry::new(b"md5", 14, LEAF, 0, RequestHeader::ContentMd5 as u8);
    t[46] = TrieEntry::new(b"nsfer-encoding", 11, LEAF, 0, RequestHeader::TransferEncoding as u8);
    t[47] = TrieEntry::new(b"language", 12, LEAF, 0, RequestHeader::AcceptLanguage as u8);
    t[48] = TrieEntry::new(b"tent-", 13, 14, 33, 0);
    t[49] = TrieEntry::new(b"odified-since", 10, LEAF, 0, RequestHeader::IfModifiedSince as u8);
    t[50] = TrieEntry::new(b"n", 9, 13, 29, 0);
    t[51] = TrieEntry::new(b"okie", 9, LEAF, 0, RequestHeader::Cookie as u8);
    t[52] = TrieEntry::new(b"type", 14, LEAF, 0, RequestHeader::ContentType as u8);
    t[53] = TrieEntry::new(b"ocation", 15, LEAF, 0, RequestHeader::ContentLocation as u8);
    t
};

pub const CONNECTION: TrieTable = TrieTable { entries: &CONNECTION_ENTRIES, class: CharClass::Token, roots: &[TrieRoot::new(0, 0)] };

const CONNECTION_ENTRIES: [TrieEntry<'static>; 21] = {
    let mut t = [TrieEntry::EMPTY; 21];
    t[2] = TrieEntry::new(b"close", 0, LEAF, 0, ConnectionToken::Close as u8);
    t[10] = TrieEntry::new(b"keep-alive", 0, LEAF, 0, ConnectionToken::KeepAlive as u8);
    t[20] = TrieEntry::new(b"upgrade", 0, LEAF, 0, ConnectionToken::Upgrade as u8);
    t
};

pub const TRANSFER_ENCODING: TrieTable =
    TrieTable { entries: &TRANSFER_ENCODING_ENTRIES, class: CharClass::Token, roots: &[TrieRoot::new(0, 0)] };

const TRANSFER_ENCODING_ENTRIES: [TrieEntry<'static>; 15] = {
    let mut t = [TrieEntry::EMPTY; 15];
    t[2] = TrieEntry::new(b"c", 0, 1, 0, 0);
    t[3] = TrieEntry::new(b"deflate", 0, LEAF, 0, TransferCoding::Deflate as u8);
    t[6] = TrieEntry::new(b"gzip", 0, LEAF, 0, TransferCoding::Gzip as u8);
    t[7] = TrieEntry::new(b"hunked", 1, LEAF, 0, TransferCoding::Chunked as u8);
    t[8] = TrieEntry::new(b"identity", 0, LEAF, 0, TransferCoding::Identity as u8);
    t[14] = TrieEntry::new(b"ompress", 1, LEAF, 0, TransferCoding::Compress as u8);
    t
};

pub const EXPECT: TrieTable = TrieTable { entries: &EXPECT_ENTRIES, class: CharClass::Token, roots: &[TrieRoot::new(0, 0)] };

const EXPECT_ENTRIES: [TrieEntry<'static>; 28] = {
    let mut t = [TrieEntry::EMPTY; 28];
    t[27] = TrieEntry::new(b"100-continue", 0, LEAF, 0, ExpectToken::Continue as u8);
    t
};
