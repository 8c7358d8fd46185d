use crate::buffer::{RingBuffer, ScratchStore};
use crate::codec::{Decoded, PayloadDecoder};
use crate::protocol::{HttpError, ParseError};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{trace, warn};

const DISCARD_CHUNK: usize = 512;

/// Decoder state of one request body, kept by the session across the
/// application's reads and the final discard.
#[derive(Debug)]
pub(crate) struct InboundBody {
    decoder: PayloadDecoder,
    failed: bool,
}

impl InboundBody {
    pub(crate) fn new(decoder: PayloadDecoder) -> Self {
        Self { decoder, failed: false }
    }

    pub(crate) fn is_failed(&self) -> bool {
        self.failed
    }
}

/// Streams the request body to the application.
///
/// Each time the buffered input is exhausted exactly one read is issued on
/// the connection. Trailers of a chunked body land in the scratch store.
pub struct BodyReader<'a> {
    reader: &'a mut (dyn AsyncRead + Unpin + Send),
    input: &'a mut RingBuffer,
    scratch: &'a mut ScratchStore,
    body: &'a mut InboundBody,
}

impl<'a> BodyReader<'a> {
    pub(crate) fn new(
        reader: &'a mut (dyn AsyncRead + Unpin + Send),
        input: &'a mut RingBuffer,
        scratch: &'a mut ScratchStore,
        body: &'a mut InboundBody,
    ) -> Self {
        Self { reader, input, scratch, body }
    }

    /// Reads body bytes into `buf`, returning 0 at the end of the body.
    ///
    /// A malformed body or a connection closed before the body ended is an
    /// error, and so is every later call.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, HttpError> {
        if self.body.failed {
            return Err(ParseError::bad_request("request body unavailable after an earlier error").into());
        }
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            match self.body.decoder.decode(self.input, self.scratch, buf) {
                Ok(Decoded::Data(n)) => return Ok(n),
                Ok(Decoded::Eof) => return Ok(0),
                Ok(Decoded::NeedMore) => {
                    if let Err(e) = fill(&mut *self.reader, self.input).await {
                        self.body.failed = true;
                        warn!(cause = %e, "failed to read request body");
                        return Err(e.into());
                    }
                }
                Err(e) => {
                    self.body.failed = true;
                    warn!(cause = %e, "invalid request body");
                    return Err(e.into());
                }
            }
        }
    }

    /// Reads and drops the rest of the body.
    pub async fn discard(&mut self) -> Result<u64, HttpError> {
        let mut sink = [0u8; DISCARD_CHUNK];
        let mut discarded = 0u64;
        loop {
            match self.read(&mut sink).await? {
                0 => break,
                n => discarded += n as u64,
            }
        }
        if discarded > 0 {
            trace!(discarded, "discarded unread request body");
        }
        Ok(discarded)
    }

    /// Whether the whole body has been read.
    pub fn is_eof(&self) -> bool {
        self.body.decoder.is_eof()
    }

    pub fn is_chunked(&self) -> bool {
        self.body.decoder.is_chunked()
    }

    /// The request's scratch store; after a chunked body it also holds the trailers.
    pub fn scratch(&self) -> &ScratchStore {
        self.scratch
    }
}

impl std::fmt::Debug for BodyReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyReader").field("input", &self.input).field("body", &self.body).finish_non_exhaustive()
    }
}

/// Performs one read into the free space of `input`, marking end of input on 0.
pub(crate) async fn fill<R>(reader: &mut R, input: &mut RingBuffer) -> io::Result<usize>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let spare = input.spare_mut();
    if spare.is_empty() {
        return Ok(0);
    }
    let n = reader.read(spare).await?;
    if n == 0 {
        input.set_eof();
    } else {
        input.grow_write_cursor(n);
    }
    trace!(read = n, buffered = input.used(), "filled input buffer");
    Ok(n)
}
