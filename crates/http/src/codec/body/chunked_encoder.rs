//! Response body framing over the output [`RingBuffer`].
//!
//! Small fragments are folded into the output buffer. A fragment that does
//! not fit goes out together with everything buffered in one vectored write,
//! framed as a single chunk when the response is chunked. The head of the
//! response (status line and header section) travels ahead of the first
//! chunk unframed.

use crate::buffer::RingBuffer;
use bytes::Buf;
use std::fmt::Write;
use std::io::{self, IoSlice};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::trace;

const CRLF: &[u8] = b"\r\n";
const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkWriter {
    chunked: bool,
    finished: bool,
    /// sent ahead of everything else on the next write
    preamble: Vec<u8>,
    /// bytes at the front of the output buffer that are not body
    unframed: usize,
    body_bytes: u64,
}

impl ChunkWriter {
    pub fn new(chunked: bool) -> Self {
        Self::with_head(chunked, Vec::new(), 0)
    }

    /// A writer whose output buffer already holds `unframed` bytes of
    /// response head, to be preceded on the wire by `preamble`.
    pub fn with_head(chunked: bool, preamble: Vec<u8>, unframed: usize) -> Self {
        Self { chunked, finished: false, preamble, unframed, body_bytes: 0 }
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Body bytes accepted so far, excluding framing.
    pub fn body_bytes(&self) -> u64 {
        self.body_bytes
    }

    /// Buffers `data`, or sends it right away with everything buffered when
    /// it does not fit. Returns `data.len()` unless writing fails.
    pub async fn write<W>(&mut self, out: &mut RingBuffer, writer: &mut W, data: &[u8]) -> io::Result<usize>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if data.is_empty() {
            return Ok(0);
        }
        self.body_bytes += data.len() as u64;

        if let Ok(n) = out.write_bytes(data) {
            return Ok(n);
        }
        self.send(out, writer, data, &[]).await?;
        Ok(data.len())
    }

    /// Sends everything buffered.
    pub async fn flush<W>(&mut self, out: &mut RingBuffer, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.send(out, writer, &[], &[]).await?;
        writer.flush().await
    }

    /// Sends everything buffered followed by the last chunk. Later calls do nothing.
    pub async fn finish<W>(&mut self, out: &mut RingBuffer, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let tail = if self.chunked { LAST_CHUNK } else { &[] };
        self.send(out, writer, &[], tail).await?;
        writer.flush().await
    }

    async fn send<W>(&mut self, out: &mut RingBuffer, writer: &mut W, fragment: &[u8], tail: &[u8]) -> io::Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let buffered = out.remaining();
        {
            let mut spans = [IoSlice::new(&[]); 2];
            out.chunks_vectored(&mut spans);
            let (head, body) = split_spans(&spans[0], &spans[1], self.unframed.min(buffered));
            let body_len = body[0].len() + body[1].len() + fragment.len();
            let framed = self.chunked && body_len > 0;

            let mut size = helper::SizeLine::default();
            if framed {
                write!(size, "{body_len:X}\r\n").map_err(|_| io::Error::other("chunk size line overflow"))?;
            }
            let size_end = if framed { CRLF } else { &[] };

            let mut slices = [
                IoSlice::new(&self.preamble),
                IoSlice::new(head[0]),
                IoSlice::new(head[1]),
                IoSlice::new(size.as_bytes()),
                IoSlice::new(body[0]),
                IoSlice::new(body[1]),
                IoSlice::new(fragment),
                IoSlice::new(size_end),
                IoSlice::new(tail),
            ];
            let total = write_all_vectored(writer, &mut slices).await?;
            if total > 0 {
                trace!(total, body = body_len, chunked = framed, "sent response bytes");
            }
        }

        out.advance(buffered);
        self.unframed = 0;
        self.preamble.clear();
        Ok(())
    }
}

/// Splits the two buffered spans at `at` into the spans before and after it.
fn split_spans<'a>(first: &'a [u8], second: &'a [u8], at: usize) -> ([&'a [u8]; 2], [&'a [u8]; 2]) {
    if at <= first.len() {
        let (a, b) = first.split_at(at);
        ([a, &[]], [b, second])
    } else {
        let (a, b) = second.split_at(at - first.len());
        ([first, a], [&[], b])
    }
}

/// Writes every slice, retrying partial writes from the unwritten remainder.
async fn write_all_vectored<W>(writer: &mut W, slices: &mut [IoSlice<'_>]) -> io::Result<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let total: usize = slices.iter().map(|s| s.len()).sum();
    let mut remaining = total;
    let mut slices = slices;
    IoSlice::advance_slices(&mut slices, 0);

    while remaining > 0 {
        let n = writer.write_vectored(slices).await?;
        if n == 0 {
            return Err(io::ErrorKind::WriteZero.into());
        }
        remaining -= n;
        IoSlice::advance_slices(&mut slices, n);
    }
    Ok(total)
}

mod helper {
    use std::fmt;

    /// A chunk size line: at most 16 hex digits and CRLF.
    #[derive(Debug, Default)]
    pub struct SizeLine {
        buf: [u8; 18],
        len: usize,
    }

    impl SizeLine {
        pub fn as_bytes(&self) -> &[u8] {
            &self.buf[..self.len]
        }
    }

    impl fmt::Write for SizeLine {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            let end = self.len + s.len();
            self.buf.get_mut(self.len..end).ok_or(fmt::Error)?.copy_from_slice(s.as_bytes());
            self.len = end;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ScratchStore;
    use crate::codec::body::{ChunkedDecoder, Decoded};
    use crate::protocol::HeaderMask;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Accepts at most `limit` bytes per write.
    struct Trickle {
        written: Vec<u8>,
        limit: usize,
        writes: usize,
    }

    impl AsyncWrite for Trickle {
        fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            let n = buf.len().min(self.limit);
            self.written.extend_from_slice(&buf[..n]);
            self.writes += 1;
            Poll::Ready(Ok(n))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    fn decode_all(wire: &[u8]) -> Vec<u8> {
        let mut src = RingBuffer::with_capacity(1024);
        src.write_bytes(wire).unwrap();
        src.set_eof();
        let mut scratch = ScratchStore::with_capacity(64);
        let mut decoder = ChunkedDecoder::new(HeaderMask::ALL);
        let mut body = Vec::new();
        let mut buf = [0u8; 32];
        loop {
            match decoder.decode(&mut src, &mut scratch, &mut buf).unwrap() {
                Decoded::Data(n) => body.extend_from_slice(&buf[..n]),
                Decoded::Eof => break,
                Decoded::NeedMore => panic!("incomplete chunked stream"),
            }
        }
        assert!(src.is_empty());
        body
    }

    #[tokio::test]
    async fn small_writes_are_buffered_into_one_chunk() {
        let mut out = RingBuffer::with_capacity(64);
        let mut wire = Vec::new();
        let mut chunks = ChunkWriter::new(true);

        chunks.write(&mut out, &mut wire, b"hello ").await.unwrap();
        chunks.write(&mut out, &mut wire, b"world").await.unwrap();
        assert!(wire.is_empty());

        chunks.finish(&mut out, &mut wire).await.unwrap();
        assert_eq!(wire, b"B\r\nhello world\r\n0\r\n\r\n");
        assert_eq!(chunks.body_bytes(), 11);

        chunks.finish(&mut out, &mut wire).await.unwrap();
        assert_eq!(wire.len(), 21);
    }

    #[tokio::test]
    async fn oversized_fragment_goes_out_with_buffered_bytes() {
        let mut out = RingBuffer::with_capacity(8);
        let mut wire = Vec::new();
        let mut chunks = ChunkWriter::new(true);

        chunks.write(&mut out, &mut wire, b"abc").await.unwrap();
        chunks.write(&mut out, &mut wire, b"0123456789").await.unwrap();
        assert_eq!(wire, b"D\r\nabc0123456789\r\n");
        assert!(out.is_empty());

        chunks.finish(&mut out, &mut wire).await.unwrap();
        assert_eq!(decode_all(&wire), b"abc0123456789");
    }

    #[tokio::test]
    async fn head_is_not_framed() {
        let mut out = RingBuffer::with_capacity(64);
        out.write_bytes(b"Server: x\r\n\r\n").unwrap();
        let mut wire = Vec::new();
        let mut chunks = ChunkWriter::with_head(true, b"HTTP/1.1 200 OK\r\n".to_vec(), out.used());

        chunks.write(&mut out, &mut wire, b"body").await.unwrap();
        chunks.finish(&mut out, &mut wire).await.unwrap();
        assert_eq!(wire, b"HTTP/1.1 200 OK\r\nServer: x\r\n\r\n4\r\nbody\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn empty_flush_writes_nothing() {
        let mut out = RingBuffer::with_capacity(16);
        let mut wire = Trickle { written: Vec::new(), limit: 4, writes: 0 };
        let mut chunks = ChunkWriter::new(true);

        chunks.flush(&mut out, &mut wire).await.unwrap();
        assert_eq!(wire.writes, 0);
    }

    #[tokio::test]
    async fn raw_body_passes_through() {
        let mut out = RingBuffer::with_capacity(4);
        let mut wire = Vec::new();
        let mut chunks = ChunkWriter::new(false);

        chunks.write(&mut out, &mut wire, b"ab").await.unwrap();
        chunks.write(&mut out, &mut wire, b"cdefg").await.unwrap();
        chunks.finish(&mut out, &mut wire).await.unwrap();
        assert_eq!(wire, b"abcdefg");
    }

    #[tokio::test]
    async fn partial_writes_resume_from_remainder() {
        let mut out = RingBuffer::with_capacity(16);
        out.write_bytes(b"Head: 1\r\n\r\n").unwrap();
        let mut wire = Trickle { written: Vec::new(), limit: 3, writes: 0 };
        let mut chunks = ChunkWriter::with_head(true, b"HTTP/1.1 200 OK\r\n".to_vec(), out.used());

        let body: Vec<u8> = (0..100u8).map(|i| b'a' + i % 26).collect();
        for piece in body.chunks(9) {
            chunks.write(&mut out, &mut wire, piece).await.unwrap();
        }
        chunks.finish(&mut out, &mut wire).await.unwrap();

        let head = b"HTTP/1.1 200 OK\r\nHead: 1\r\n\r\n";
        assert!(wire.written.starts_with(head));
        assert_eq!(decode_all(&wire.written[head.len()..]), body);
        assert!(wire.writes > 30);
    }

    #[test]
    fn size_line_is_upper_hex_with_crlf() {
        for (len, line) in [(0usize, &b"0\r\n"[..]), (255, b"FF\r\n"), (0x1a2b, b"1A2B\r\n")] {
            let mut size = helper::SizeLine::default();
            write!(size, "{len:X}\r\n").unwrap();
            assert_eq!(size.as_bytes(), line);
        }

        let mut size = helper::SizeLine::default();
        write!(size, "{:X}\r\n", u64::MAX).unwrap();
        assert_eq!(size.as_bytes(), b"FFFFFFFFFFFFFFFF\r\n");
        assert!(write!(size, "0").is_err());
    }

    #[tokio::test]
    async fn wrapped_buffer_goes_out_in_order() {
        let mut out = RingBuffer::with_capacity(8);
        out.write_bytes(b"xxxxxx").unwrap();
        out.advance(6);
        let mut wire = Vec::new();
        let mut chunks = ChunkWriter::new(true);

        chunks.write(&mut out, &mut wire, b"wrapped").await.unwrap();
        assert_eq!(out.gather(), (&b"wr"[..], &b"apped"[..]));
        chunks.finish(&mut out, &mut wire).await.unwrap();
        assert_eq!(wire, b"7\r\nwrapped\r\n0\r\n\r\n");
        assert!(out.is_empty());
    }
}
