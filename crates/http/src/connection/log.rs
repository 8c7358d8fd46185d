//! Per-request log records.

use crate::buffer::ScratchStore;
use crate::protocol::Request;
use http::StatusCode;
use std::fmt::Debug;
use tracing::info;

/// What the session knows about a request once its response has been sent.
#[derive(Debug, Clone, Copy)]
pub struct ServedRequest<'a> {
    pub request: &'a Request,
    pub scratch: &'a ScratchStore,
    pub status: StatusCode,
    /// body bytes handed to the response writer, framing excluded
    pub body_bytes: u64,
    pub keep_alive: bool,
}

/// Receives one record per served request.
pub trait LogSink: Send + Sync + Debug {
    fn served(&self, entry: &ServedRequest<'_>);
}

/// Emits each record as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn served(&self, entry: &ServedRequest<'_>) {
        let path = String::from_utf8_lossy(entry.request.path(entry.scratch));
        info!(
            method = ?entry.request.method(),
            path = %path,
            status = %entry.status,
            bytes = entry.body_bytes,
            keep_alive = entry.keep_alive,
            "request served"
        );
    }
}
