//! The interface between a session and the code deciding the responses.
//!
//! A session calls into its [`Application`] at fixed points of each request:
//!
//! 1. [`Application::head`] once the request head is parsed; it may add
//!    response headers and returns the status. Returning `100 Continue`
//!    asks for the body.
//! 2. [`Application::payload`] only after `100 Continue`; it reads the body
//!    and returns the final status.
//! 3. [`Application::response`] writes the body, unless the request is
//!    `HEAD` or the status is 204, 205 or 304.
//! 4. [`Application::error`] instead of all of the above when the request
//!    could not be parsed.

use crate::buffer::ScratchStore;
use crate::connection::{BodyReader, BodyWriter, HeadWriter};
use crate::protocol::{Request, SendError};
use async_trait::async_trait;
use http::StatusCode;
use thiserror::Error;

#[async_trait]
pub trait Application: Send + Sync {
    async fn head(&self, request: &Request, head: &mut HeadWriter<'_>, scratch: &ScratchStore) -> StatusCode;

    async fn payload(&self, request: &Request, head: &mut HeadWriter<'_>, body: &mut BodyReader<'_>) -> StatusCode;

    /// Writes the response body for `status`.
    ///
    /// An error other than [`ResponseError::Send`] with nothing written makes
    /// the session send the generic HTML page for `status` instead.
    async fn response(
        &self,
        request: &Request,
        body: &mut BodyWriter<'_>,
        scratch: &ScratchStore,
        status: StatusCode,
    ) -> Result<(), ResponseError>;

    /// Notification about a request answered with an error status by the session itself.
    async fn error(&self, request: &Request, status: StatusCode) {
        let _ = (request, status);
    }
}

/// Why an application could not produce a response body.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("response aborted: {reason}")]
    Aborted { reason: String },

    #[error("response send error: {source}")]
    Send {
        #[from]
        source: SendError,
    },
}

impl ResponseError {
    pub fn aborted<S: ToString>(str: S) -> Self {
        Self::Aborted { reason: str.to_string() }
    }
}
