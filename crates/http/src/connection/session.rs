use crate::buffer::{RingBuffer, ScratchStore};
use crate::codec::{ChunkWriter, ParseStatus, PayloadDecoder, RequestParser};
use crate::config::SessionConfig;
use crate::connection::body_reader::{InboundBody, fill};
use crate::connection::{BodyReader, BodyWriter, HeadWriter, ServedRequest};
use crate::handler::{Application, ResponseError};
use crate::protocol::status::{is_bodiless, standard_body, status_line};
use crate::protocol::{HttpError, ParseError, Request, ResponseHeader, SendError};
use http::{StatusCode, Version};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// What became of the connection after [`HttpSession::serve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientStatus {
    /// The peer closed the connection before sending a request.
    NoRequest,
    /// A request was answered and the connection stays open for the next one.
    Open,
    /// A request was answered and the connection must be closed.
    Closed,
}

/// Drives one HTTP/1.x connection.
///
/// The session owns the input and output buffers and the scratch store for
/// the lifetime of the connection. Requests are answered one after the other
/// in arrival order; bytes of a pipelined request that arrived together with
/// the previous one stay in the input buffer.
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
#[derive(Debug)]
pub struct HttpSession<R, W> {
    reader: R,
    writer: W,
    input: RingBuffer,
    output: RingBuffer,
    scratch: ScratchStore,
    config: SessionConfig,
}

impl<R, W> HttpSession<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self::with_config(reader, writer, SessionConfig::default())
    }

    pub fn with_config(reader: R, writer: W, config: SessionConfig) -> Self {
        Self {
            reader,
            writer,
            input: RingBuffer::with_capacity(config.input_capacity()),
            output: RingBuffer::with_capacity(config.output_capacity()),
            scratch: ScratchStore::with_capacity(config.scratch_capacity()),
            config,
        }
    }

    /// Serves requests until the connection closes.
    ///
    /// Returns an error for a rejected request (after the error response was
    /// sent), a request cut short by the peer, or a failed read or write.
    pub async fn process<A>(mut self, app: Arc<A>) -> Result<(), HttpError>
    where
        A: Application + ?Sized,
    {
        loop {
            match self.serve(app.as_ref()).await {
                Ok(ClientStatus::Open) => {}
                Ok(ClientStatus::Closed) => {
                    debug!("response requires closing the connection");
                    break;
                }
                Ok(ClientStatus::NoRequest) => {
                    info!("cant read more request, break this connection down");
                    break;
                }
                Err(e) => {
                    self.shutdown().await;
                    return Err(e);
                }
            }
        }
        self.shutdown().await;
        Ok(())
    }

    /// Reads, answers and finishes a single request.
    pub async fn serve<A>(&mut self, app: &A) -> Result<ClientStatus, HttpError>
    where
        A: Application + ?Sized,
    {
        self.output.clear();
        self.scratch.clear();

        let mut request = Request::default();
        let mut parser = RequestParser::new(self.config.header_mask());
        loop {
            match parser.parse(&mut request, &mut self.input, &mut self.scratch) {
                Ok(ParseStatus::Complete) => break,
                Ok(ParseStatus::NeedMore) => {
                    fill(&mut self.reader, &mut self.input).await?;
                }
                Ok(ParseStatus::PeerClosed) => return Ok(ClientStatus::NoRequest),
                Err(e) => {
                    self.reject(app, &request, e).await?;
                    return Err(e.into());
                }
            }
        }

        debug!(method = ?request.method(), version = ?request.version(), "received request head");
        self.respond(app, &request).await
    }

    async fn respond<A>(&mut self, app: &A, request: &Request) -> Result<ClientStatus, HttpError>
    where
        A: Application + ?Sized,
    {
        let version = request.version();
        let mask = self.config.header_mask();
        let mut body = InboundBody::new(PayloadDecoder::for_request(request, mask));

        let mut head = HeadWriter::new(&mut self.output);
        let mut status = app.head(request, &mut head, &self.scratch).await;
        if status == StatusCode::CONTINUE {
            if request.expects_continue() {
                let mut line = String::new();
                status_line(&mut line, version, StatusCode::CONTINUE);
                line.push_str("\r\n");
                self.writer.write_all(line.as_bytes()).await.map_err(SendError::io)?;
                self.writer.flush().await.map_err(SendError::io)?;
                info!("receive expect request header, sent continue response");
            }
            let mut reader = BodyReader::new(&mut self.reader, &mut self.input, &mut self.scratch, &mut body);
            status = app.payload(request, &mut head, &mut reader).await;
        }

        if !head.contains(ResponseHeader::Server) {
            head.header(ResponseHeader::Server, self.config.server())?;
        }
        if !head.contains(ResponseHeader::Date) {
            head.timestamp(ResponseHeader::Date, SystemTime::now())?;
        }

        let bodiless = request.is_head() || is_bodiless(status);
        let framing = Framing::decide(version, request.keep_alive(), bodiless, head.contains(ResponseHeader::ContentLength));
        if framing.keep_alive && version != Some(Version::HTTP_11) {
            head.header(ResponseHeader::Connection, "keep-alive")?;
        }
        if !framing.keep_alive && version == Some(Version::HTTP_11) {
            head.header(ResponseHeader::Connection, "close")?;
        }
        if framing.chunked {
            head.header(ResponseHeader::TransferEncoding, "chunked")?;
        }
        head.end_headers()?;

        let mut line = String::new();
        status_line(&mut line, version, status);
        let mut chunks = ChunkWriter::with_head(framing.chunked, line.into_bytes(), self.output.used());

        if !bodiless {
            let mut writer = BodyWriter::new(&mut self.writer, &mut self.output, &mut chunks);
            match app.response(request, &mut writer, &self.scratch, status).await {
                Ok(()) => {}
                Err(ResponseError::Send { source }) => return Err(source.into()),
                Err(e) => {
                    warn!(cause = %e, status = %status, "handle response error");
                    if writer.written() == 0 {
                        writer.write(standard_body(status).as_bytes()).await?;
                    }
                }
            }
        }
        chunks.finish(&mut self.output, &mut self.writer).await.map_err(SendError::io)?;

        self.config.log_sink().served(&ServedRequest {
            request,
            scratch: &self.scratch,
            status,
            body_bytes: chunks.body_bytes(),
            keep_alive: framing.keep_alive,
        });

        if !framing.keep_alive {
            return Ok(ClientStatus::Closed);
        }

        let mut reader = BodyReader::new(&mut self.reader, &mut self.input, &mut self.scratch, &mut body);
        if let Err(e) = reader.discard().await {
            debug!(cause = %e, "unread request body could not be drained");
            return Ok(ClientStatus::Closed);
        }
        Ok(ClientStatus::Open)
    }

    /// Answers a request the parser refused. A request cut short by the peer
    /// gets no response; the application is notified either way.
    async fn reject<A>(&mut self, app: &A, request: &Request, error: ParseError) -> Result<(), HttpError>
    where
        A: Application + ?Sized,
    {
        let status = error.status();
        warn!(cause = %error, status = %status, "can't receive next request");

        if error != ParseError::UnexpectedEof {
            self.output.clear();
            let mut head = HeadWriter::new(&mut self.output);
            head.header(ResponseHeader::Server, self.config.server())?;
            head.timestamp(ResponseHeader::Date, SystemTime::now())?;
            head.header(ResponseHeader::ContentType, mime::TEXT_HTML.as_ref())?;
            if request.version() == Some(Version::HTTP_11) {
                head.header(ResponseHeader::Connection, "close")?;
            }
            head.end_headers()?;

            let mut line = String::new();
            status_line(&mut line, request.version(), status);
            let mut chunks = ChunkWriter::with_head(false, line.into_bytes(), self.output.used());
            chunks
                .write(&mut self.output, &mut self.writer, standard_body(status).as_bytes())
                .await
                .map_err(SendError::io)?;
            chunks.finish(&mut self.output, &mut self.writer).await.map_err(SendError::io)?;
        }

        app.error(request, status).await;
        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(cause = %e, "failed to shut down the connection");
        }
    }
}

/// How the response body is delimited and whether the connection survives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Framing {
    keep_alive: bool,
    chunked: bool,
}

impl Framing {
    /// A kept connection needs a delimited body: the application's
    /// `Content-Length`, no body at all, or chunks on HTTP/1.1. Otherwise the
    /// body runs to the end of the connection.
    fn decide(version: Option<Version>, keep_alive: bool, bodiless: bool, has_length: bool) -> Self {
        if !keep_alive {
            Framing { keep_alive: false, chunked: false }
        } else if bodiless || has_length {
            Framing { keep_alive: true, chunked: false }
        } else if version == Some(Version::HTTP_11) {
            Framing { keep_alive: true, chunked: true }
        } else {
            // chunked framing is unavailable before HTTP/1.1
            Framing { keep_alive: false, chunked: false }
        }
    }
}
