use crate::buffer::BufferFull;
use http::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// A request that cannot be served. Every variant maps to the status code the
/// session answers with, see [`ParseError::status`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("bad request: {reason}")]
    BadRequest { reason: &'static str },

    #[error("request target exceeds the scratch store")]
    UriTooLong,

    #[error("request header section exceeds the scratch store")]
    EntityTooLarge,

    #[error("unsupported protocol or http version")]
    VersionNotSupported,

    #[error("internal parser error: {reason}")]
    Internal { reason: &'static str },

    #[error("connection closed in the middle of a request")]
    UnexpectedEof,
}

impl ParseError {
    pub fn bad_request(reason: &'static str) -> Self {
        Self::BadRequest { reason }
    }

    pub fn internal(reason: &'static str) -> Self {
        Self::Internal { reason }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::BadRequest { .. } | ParseError::UnexpectedEof => StatusCode::BAD_REQUEST,
            ParseError::UriTooLong => StatusCode::URI_TOO_LONG,
            ParseError::EntityTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ParseError::VersionNotSupported => StatusCode::HTTP_VERSION_NOT_SUPPORTED,
            ParseError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("response head needs {needed} bytes but the output buffer has {free} free")]
    HeaderTooLarge { needed: usize, free: usize },

    #[error("invalid header value: {reason}")]
    InvalidHeader { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

impl From<BufferFull> for SendError {
    fn from(BufferFull { needed, free }: BufferFull) -> Self {
        Self::HeaderTooLarge { needed, free }
    }
}
