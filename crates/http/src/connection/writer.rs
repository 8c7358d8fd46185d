use crate::buffer::RingBuffer;
use crate::codec::ChunkWriter;
use crate::protocol::{ResponseHeader, SendError};
use std::time::SystemTime;
use tokio::io::AsyncWrite;

/// Collects the response header section in the output buffer.
///
/// The status line is not written here: the session sends it ahead of the
/// buffered headers once the application has decided the status.
#[derive(Debug)]
pub struct HeadWriter<'a> {
    out: &'a mut RingBuffer,
    written: u64,
}

impl<'a> HeadWriter<'a> {
    pub(crate) fn new(out: &'a mut RingBuffer) -> Self {
        Self { out, written: 0 }
    }

    /// Appends `"<Name>: <value>\r\n"`.
    ///
    /// Fails without writing anything if the value contains a line break or
    /// the line does not fit the output buffer.
    pub fn header(&mut self, header: ResponseHeader, value: &str) -> Result<(), SendError> {
        if value.bytes().any(|b| b == b'\r' || b == b'\n') {
            return Err(SendError::invalid_header(format!("{header} value contains a line break")));
        }

        let name = header.name().as_bytes();
        let needed = name.len() + 2 + value.len() + 2;
        let free = self.out.free();
        if needed > free {
            return Err(SendError::HeaderTooLarge { needed, free });
        }

        self.out.write_bytes(name)?;
        self.out.write_bytes(b": ")?;
        self.out.write_bytes(value.as_bytes())?;
        self.out.write_bytes(b"\r\n")?;
        self.written |= 1 << header.code();
        Ok(())
    }

    /// Appends a header carrying an HTTP date such as `Sun, 06 Nov 1994 08:49:37 GMT`.
    pub fn timestamp(&mut self, header: ResponseHeader, time: SystemTime) -> Result<(), SendError> {
        self.header(header, &httpdate::fmt_http_date(time))
    }

    /// Whether `header` was written.
    pub fn contains(&self, header: ResponseHeader) -> bool {
        self.written & (1 << header.code()) != 0
    }

    /// Bytes of header section buffered so far.
    pub fn len(&self) -> usize {
        self.out.used()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    pub(crate) fn end_headers(&mut self) -> Result<(), SendError> {
        self.out.write_bytes(b"\r\n")?;
        Ok(())
    }
}

/// Writes the response body, framing it as the session decided.
pub struct BodyWriter<'a> {
    writer: &'a mut (dyn AsyncWrite + Unpin + Send),
    out: &'a mut RingBuffer,
    chunks: &'a mut ChunkWriter,
}

impl<'a> BodyWriter<'a> {
    pub(crate) fn new(
        writer: &'a mut (dyn AsyncWrite + Unpin + Send),
        out: &'a mut RingBuffer,
        chunks: &'a mut ChunkWriter,
    ) -> Self {
        Self { writer, out, chunks }
    }

    /// Buffers or sends `data`; returns the number of bytes accepted, which
    /// is all of them unless the connection fails.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize, SendError> {
        self.chunks.write(&mut *self.out, &mut *self.writer, data).await.map_err(SendError::io)
    }

    /// Sends everything buffered so far.
    pub async fn flush(&mut self) -> Result<(), SendError> {
        self.chunks.flush(&mut *self.out, &mut *self.writer).await.map_err(SendError::io)
    }

    /// Body bytes written so far.
    pub fn written(&self) -> u64 {
        self.chunks.body_bytes()
    }

    pub fn is_chunked(&self) -> bool {
        self.chunks.is_chunked()
    }
}

impl std::fmt::Debug for BodyWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyWriter").field("out", &self.out).field("chunks", &self.chunks).finish_non_exhaustive()
    }
}
