//! `minuted [ADDRESS]`: serves a few demo routes over HTTP/1.x.
//!
//! - `GET /` answers `Hello World!`
//! - `GET /echo?text` answers with the decoded query
//! - `POST` to any path reads the body, asking for it with `100 Continue`
//! - anything else is a 404 page

use async_trait::async_trait;
use http::{Method, StatusCode};
use minute_http::buffer::ScratchStore;
use minute_http::config::SessionConfig;
use minute_http::connection::{BodyReader, BodyWriter, ClientStatus, HeadWriter, HttpSession};
use minute_http::handler::{Application, ResponseError};
use minute_http::protocol::{Request, RequestHeader, ResponseHeader};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const HELLO: &str = "Hello World!\r\n";

#[derive(Debug)]
struct Demo;

#[async_trait]
impl Application for Demo {
    async fn head(&self, request: &Request, head: &mut HeadWriter<'_>, scratch: &ScratchStore) -> StatusCode {
        let path = request.path(scratch);
        let host = scratch.header(RequestHeader::Host).map(String::from_utf8_lossy);
        debug!(path = %String::from_utf8_lossy(path), host = ?host, "routing request");

        if request.method() == Some(&Method::POST) {
            return StatusCode::CONTINUE;
        }
        if head.header(ResponseHeader::ContentType, "text/plain; charset=utf-8").is_err() {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
        match path {
            b"/" => match head.header(ResponseHeader::ContentLength, &HELLO.len().to_string()) {
                Ok(()) => StatusCode::OK,
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            b"/echo" => StatusCode::OK,
            _ => StatusCode::NOT_FOUND,
        }
    }

    async fn payload(&self, _request: &Request, head: &mut HeadWriter<'_>, body: &mut BodyReader<'_>) -> StatusCode {
        match body.discard().await {
            Ok(received) => {
                info!(received, chunked = body.is_chunked(), "request body received");
                match head.header(ResponseHeader::ContentType, "text/plain; charset=utf-8") {
                    Ok(()) => StatusCode::OK,
                    Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
            Err(e) => {
                warn!(cause = %e, "failed to read request body");
                StatusCode::BAD_REQUEST
            }
        }
    }

    async fn response(
        &self,
        request: &Request,
        body: &mut BodyWriter<'_>,
        scratch: &ScratchStore,
        status: StatusCode,
    ) -> Result<(), ResponseError> {
        if status != StatusCode::OK {
            return Err(ResponseError::aborted(format!("no content for status {status}")));
        }
        if request.method() == Some(&Method::POST) {
            body.write(b"received\r\n").await?;
            return Ok(());
        }
        match request.path(scratch) {
            b"/echo" => {
                body.write(request.query(scratch).unwrap_or_default()).await?;
                body.write(b"\r\n").await?;
            }
            _ => {
                body.write(HELLO.as_bytes()).await?;
            }
        }
        Ok(())
    }

    async fn error(&self, _request: &Request, status: StatusCode) {
        debug!(status = %status, "request rejected");
    }
}

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return;
    }

    let address = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let config = match SessionConfig::builder().server(format!("minuted/{}", env!("CARGO_PKG_VERSION"))).build() {
        Ok(config) => config,
        Err(e) => {
            error!(cause = %e, "invalid session config");
            return;
        }
    };

    info!(address = %address, "start listening");
    let tcp_listener = match TcpListener::bind(&address).await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    let app = Arc::new(Demo);
    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        let app = Arc::clone(&app);
        let config = config.clone();
        tokio::spawn(async move {
            let (reader, writer) = tcp_stream.into_split();
            let mut session = HttpSession::with_config(reader, writer, config);
            loop {
                match timeout(IDLE_TIMEOUT, session.serve(app.as_ref())).await {
                    Ok(Ok(ClientStatus::Open)) => {}
                    Ok(Ok(ClientStatus::Closed | ClientStatus::NoRequest)) => {
                        info!(remote = %remote_addr, "finished process, connection shutdown");
                        break;
                    }
                    Ok(Err(e)) => {
                        error!(remote = %remote_addr, cause = %e, "service has error, connection shutdown");
                        break;
                    }
                    Err(_elapsed) => {
                        info!(remote = %remote_addr, "connection timed out");
                        break;
                    }
                }
            }
        });
    }
}
