//! Header codes recognised by the engine.
//!
//! Each enum lists its variants in case-insensitive alphabetical order of the
//! canonical names, with `Unknown` (printed as `X-Unknown-Header`) at code 0.
//! The numeric code of a [`RequestHeader`] is also the terminal value in the
//! header name trie and the bit number in a [`HeaderMask`].

use std::cmp::Ordering;
use std::fmt;

macro_rules! header_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $code:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum $name {
            $($variant = $code,)+
        }

        impl $name {
            const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// The canonical spelling used on the wire.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            pub const fn code(self) -> u8 {
                self as u8
            }

            pub fn from_code(code: u8) -> Option<Self> {
                Self::ALL.get(usize::from(code)).copied()
            }

            /// Case-insensitive lookup of a header name; unrecognised names map to `Unknown`.
            pub fn from_name(name: &[u8]) -> Self {
                Self::ALL[1..]
                    .binary_search_by(|candidate| cmp_ignore_case(candidate.name().as_bytes(), name))
                    .map_or($name::Unknown, |index| Self::ALL[index + 1])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

fn cmp_ignore_case(left: &[u8], right: &[u8]) -> Ordering {
    left.iter().map(u8::to_ascii_lowercase).cmp(right.iter().map(u8::to_ascii_lowercase))
}

header_codes! {
    /// Request headers the parser can recognise.
    pub enum RequestHeader {
        Unknown = 0 => "X-Unknown-Header",
        Accept = 1 => "Accept",
        AcceptCharset = 2 => "Accept-Charset",
        AcceptEncoding = 3 => "Accept-Encoding",
        AcceptLanguage = 4 => "Accept-Language",
        Authorization = 5 => "Authorization",
        CacheControl = 6 => "Cache-Control",
        Connection = 7 => "Connection",
        ContentEncoding = 8 => "Content-Encoding",
        ContentLanguage = 9 => "Content-Language",
        ContentLength = 10 => "Content-Length",
        ContentLocation = 11 => "Content-Location",
        ContentMd5 = 12 => "Content-MD5",
        ContentType = 13 => "Content-Type",
        Cookie = 14 => "Cookie",
        Date = 15 => "Date",
        Expect = 16 => "Expect",
        From = 17 => "From",
        Host = 18 => "Host",
        IfMatch = 19 => "If-Match",
        IfModifiedSince = 20 => "If-Modified-Since",
        IfNoneMatch = 21 => "If-None-Match",
        IfRange = 22 => "If-Range",
        IfUnmodifiedSince = 23 => "If-Unmodified-Since",
        MaxForwards = 24 => "Max-Forwards",
        Origin = 25 => "Origin",
        Pragma = 26 => "Pragma",
        ProxyAuthorization = 27 => "Proxy-Authorization",
        Range = 28 => "Range",
        Referer = 29 => "Referer",
        Te = 30 => "TE",
        Trailer = 31 => "Trailer",
        TransferEncoding = 32 => "Transfer-Encoding",
        Upgrade = 33 => "Upgrade",
        UserAgent = 34 => "User-Agent",
        Via = 35 => "Via",
        Warning = 36 => "Warning",
    }
}

header_codes! {
    /// Response headers an application can emit through a
    /// [`HeadWriter`](crate::connection::HeadWriter).
    pub enum ResponseHeader {
        Unknown = 0 => "X-Unknown-Header",
        AcceptRanges = 1 => "Accept-Ranges",
        Age = 2 => "Age",
        Allow = 3 => "Allow",
        CacheControl = 4 => "Cache-Control",
        Connection = 5 => "Connection",
        ContentDisposition = 6 => "Content-Disposition",
        ContentEncoding = 7 => "Content-Encoding",
        ContentLanguage = 8 => "Content-Language",
        ContentLength = 9 => "Content-Length",
        ContentLocation = 10 => "Content-Location",
        ContentMd5 = 11 => "Content-MD5",
        ContentRange = 12 => "Content-Range",
        ContentType = 13 => "Content-Type",
        Date = 14 => "Date",
        ETag = 15 => "ETag",
        Expires = 16 => "Expires",
        LastModified = 17 => "Last-Modified",
        Link = 18 => "Link",
        Location = 19 => "Location",
        P3p = 20 => "P3P",
        Pragma = 21 => "Pragma",
        ProxyAuthenticate = 22 => "Proxy-Authenticate",
        Refresh = 23 => "Refresh",
        RetryAfter = 24 => "Retry-After",
        Server = 25 => "Server",
        SetCookie = 26 => "Set-Cookie",
        StrictTransportSecurity = 27 => "Strict-Transport-Security",
        Trailer = 28 => "Trailer",
        TransferEncoding = 29 => "Transfer-Encoding",
        Vary = 30 => "Vary",
        Via = 31 => "Via",
        Warning = 32 => "Warning",
        WwwAuthenticate = 33 => "WWW-Authenticate",
    }
}

/// Selects which request headers the parser copies into the scratch store.
///
/// Bit `n` selects the header with code `n`. Bit 0 belongs to unknown headers,
/// which are never captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeaderMask(u64);

impl HeaderMask {
    pub const ALL: HeaderMask = HeaderMask(u64::MAX);
    pub const NONE: HeaderMask = HeaderMask(0);

    #[must_use]
    pub const fn with(self, header: RequestHeader) -> Self {
        Self(self.0 | 1 << header as u8)
    }

    #[must_use]
    pub const fn without(self, header: RequestHeader) -> Self {
        Self(self.0 & !(1 << header as u8))
    }

    pub const fn contains(self, header: RequestHeader) -> bool {
        !matches!(header, RequestHeader::Unknown) && self.0 & (1 << header as u8) != 0
    }

    pub const fn bits(self) -> u64 {
        self.0
    }
}

impl Default for HeaderMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<RequestHeader> for HeaderMask {
    fn from_iter<I: IntoIterator<Item = RequestHeader>>(iter: I) -> Self {
        iter.into_iter().fold(HeaderMask::NONE, HeaderMask::with)
    }
}
