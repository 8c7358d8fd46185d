use async_trait::async_trait;
use criterion::{Criterion, criterion_group, criterion_main};
use http::StatusCode;
use minute_http::buffer::{RingBuffer, ScratchStore};
use minute_http::codec::{Decoded, ParseStatus, PayloadDecoder, RequestParser};
use minute_http::connection::{BodyReader, BodyWriter, HeadWriter, HttpSession};
use minute_http::handler::{Application, ResponseError};
use minute_http::protocol::{HeaderMask, Request, RequestHeader, ResponseHeader};
use std::hint::black_box;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const SIMPLE: &[u8] = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";

const BROWSER: &[u8] = b"GET /static/app.js?v=1.2.3&lang=en%2Dus HTTP/1.1\r\n\
Host: www.example.org\r\n\
User-Agent: Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0\r\n\
Accept: text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8\r\n\
Accept-Language: en-US,en;q=0.5\r\n\
Accept-Encoding: gzip, deflate, br\r\n\
Referer: https://www.example.org/index.html\r\n\
Cookie: session=0123456789abcdef; theme=dark\r\n\
Connection: keep-alive\r\n\
Cache-Control: max-age=0\r\n\r\n";

// Mock IO for benchmarking
struct MockIO {
    read_data: Vec<u8>,
    read_pos: usize,
    written: usize,
}

impl MockIO {
    fn new(read_data: Vec<u8>) -> Self {
        Self { read_data, read_pos: 0, written: 0 }
    }
}

impl AsyncRead for MockIO {
    fn poll_read(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        let remaining = &self.read_data[self.read_pos..];
        let amt = std::cmp::min(remaining.len(), buf.remaining());
        buf.put_slice(&remaining[..amt]);
        self.read_pos += amt;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockIO {
    fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize, io::Error>> {
        self.written += buf.len();
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}

struct HelloWorld;

#[async_trait]
impl Application for HelloWorld {
    async fn head(&self, _request: &Request, head: &mut HeadWriter<'_>, _scratch: &ScratchStore) -> StatusCode {
        let _ = head.header(ResponseHeader::ContentLength, "12");
        StatusCode::OK
    }

    async fn payload(&self, _request: &Request, _head: &mut HeadWriter<'_>, _body: &mut BodyReader<'_>) -> StatusCode {
        StatusCode::OK
    }

    async fn response(
        &self,
        _request: &Request,
        body: &mut BodyWriter<'_>,
        _scratch: &ScratchStore,
        _status: StatusCode,
    ) -> Result<(), ResponseError> {
        body.write(b"Hello World!").await?;
        Ok(())
    }
}

fn parse_once(raw: &[u8], mask: HeaderMask, input: &mut RingBuffer, scratch: &mut ScratchStore) -> Request {
    input.clear();
    scratch.clear();
    input.write_bytes(raw).unwrap();
    let mut request = Request::default();
    let mut parser = RequestParser::new(mask);
    assert_eq!(parser.parse(&mut request, input, scratch), Ok(ParseStatus::Complete));
    request
}

fn bench_request_parser(c: &mut Criterion) {
    let mut input = RingBuffer::with_capacity(1024);
    let mut scratch = ScratchStore::with_capacity(4096);

    c.bench_function("parse_simple_request", |b| {
        b.iter(|| black_box(parse_once(black_box(SIMPLE), HeaderMask::ALL, &mut input, &mut scratch)));
    });

    c.bench_function("parse_browser_request", |b| {
        b.iter(|| black_box(parse_once(black_box(BROWSER), HeaderMask::ALL, &mut input, &mut scratch)));
    });

    let host_only = HeaderMask::NONE.with(RequestHeader::Host);
    c.bench_function("parse_browser_request_host_only", |b| {
        b.iter(|| black_box(parse_once(black_box(BROWSER), host_only, &mut input, &mut scratch)));
    });
}

fn bench_chunked_decoder(c: &mut Criterion) {
    let mut wire = Vec::new();
    for _ in 0..16 {
        wire.extend_from_slice(b"40\r\n");
        wire.extend_from_slice(&[b'x'; 64]);
        wire.extend_from_slice(b"\r\n");
    }
    wire.extend_from_slice(b"0\r\n\r\n");

    let mut src = RingBuffer::with_capacity(2048);
    let mut scratch = ScratchStore::with_capacity(256);
    let mut dst = [0u8; 256];

    c.bench_function("decode_chunked_body", |b| {
        b.iter(|| {
            src.clear();
            src.write_bytes(&wire).unwrap();
            let mut decoder = PayloadDecoder::chunked(HeaderMask::ALL);
            let mut total = 0;
            while let Decoded::Data(n) = decoder.decode(&mut src, &mut scratch, &mut dst).unwrap() {
                total += n;
            }
            black_box(total)
        });
    });
}

fn bench_http_session(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let app = Arc::new(HelloWorld);
    let pipelined = SIMPLE.repeat(8);

    c.bench_function("process_simple_request", |b| {
        b.to_async(&runtime).iter(|| {
            let app = Arc::clone(&app);
            async move {
                let mut writer = MockIO::new(Vec::new());
                let session = HttpSession::new(MockIO::new(SIMPLE.to_vec()), &mut writer);
                session.process(app).await.unwrap();
                black_box(writer.written)
            }
        });
    });

    c.bench_function("process_pipelined_requests", |b| {
        b.to_async(&runtime).iter(|| {
            let app = Arc::clone(&app);
            let input = pipelined.clone();
            async move {
                let mut writer = MockIO::new(Vec::new());
                let session = HttpSession::new(MockIO::new(input), &mut writer);
                session.process(app).await.unwrap();
                black_box(writer.written)
            }
        });
    });
}

criterion_group!(benches, bench_request_parser, bench_chunked_decoder, bench_http_session);
criterion_main!(benches);
