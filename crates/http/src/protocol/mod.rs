//! Protocol types shared by the parser, the codecs and the session.
//!
//! - **Requests**: [`Request`] and its [`RequestFlags`]
//! - **Header codes**: [`RequestHeader`], [`ResponseHeader`] and the
//!   [`HeaderMask`] that selects which request headers are captured
//! - **Status text** ([`status`]): reason phrases, version text and the generic
//!   HTML body
//! - **Errors**: [`HttpError`], [`ParseError`] and [`SendError`]

mod request;
pub use request::Request;
pub use request::RequestFlags;

mod headers;
pub use headers::HeaderMask;
pub use headers::RequestHeader;
pub use headers::ResponseHeader;

pub mod status;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;
