//! Per-session settings.
//!
//! A [`SessionConfig`] is built once and shared by every connection:
//!
//! ```
//! use minute_http::config::SessionConfig;
//! use minute_http::protocol::{HeaderMask, RequestHeader};
//!
//! let config = SessionConfig::builder()
//!     .input_capacity(16 * 1024)
//!     .header_mask(HeaderMask::NONE.with(RequestHeader::Host).with(RequestHeader::Cookie))
//!     .server("example/1.0")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.input_capacity(), 16 * 1024);
//! ```

use crate::connection::{LogSink, TracingLogSink};
use crate::ensure;
use crate::protocol::HeaderMask;
use http::HeaderValue;
use std::sync::Arc;
use thiserror::Error;

const DEFAULT_INPUT_CAPACITY: usize = 8 * 1024;
const DEFAULT_OUTPUT_CAPACITY: usize = 8 * 1024;
const DEFAULT_SCRATCH_CAPACITY: usize = 4 * 1024;
const MIN_SCRATCH_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    input_capacity: usize,
    output_capacity: usize,
    scratch_capacity: usize,
    header_mask: HeaderMask,
    server: Arc<str>,
    log_sink: Arc<dyn LogSink>,
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    /// Capacity of the input ring; a request head may be larger, it is parsed as it streams.
    pub fn input_capacity(&self) -> usize {
        self.input_capacity
    }

    /// Capacity of the output ring, which must hold the whole response head.
    pub fn output_capacity(&self) -> usize {
        self.output_capacity
    }

    /// Capacity of the scratch store holding path, query and captured headers.
    pub fn scratch_capacity(&self) -> usize {
        self.scratch_capacity
    }

    pub fn header_mask(&self) -> HeaderMask {
        self.header_mask
    }

    /// Value of the `Server` header added to every response.
    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn log_sink(&self) -> &dyn LogSink {
        self.log_sink.as_ref()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            input_capacity: DEFAULT_INPUT_CAPACITY,
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            header_mask: HeaderMask::ALL,
            server: default_server().into(),
            log_sink: Arc::new(TracingLogSink),
        }
    }
}

fn default_server() -> String {
    format!("minute-http/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug)]
pub struct SessionConfigBuilder {
    input_capacity: usize,
    output_capacity: usize,
    scratch_capacity: usize,
    header_mask: HeaderMask,
    server: String,
    log_sink: Option<Arc<dyn LogSink>>,
}

impl SessionConfigBuilder {
    fn new() -> Self {
        Self {
            input_capacity: DEFAULT_INPUT_CAPACITY,
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            header_mask: HeaderMask::ALL,
            server: default_server(),
            log_sink: None,
        }
    }

    #[must_use]
    pub fn input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity;
        self
    }

    #[must_use]
    pub fn output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity;
        self
    }

    #[must_use]
    pub fn scratch_capacity(mut self, capacity: usize) -> Self {
        self.scratch_capacity = capacity;
        self
    }

    #[must_use]
    pub fn header_mask(mut self, mask: HeaderMask) -> Self {
        self.header_mask = mask;
        self
    }

    #[must_use]
    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    #[must_use]
    pub fn log_sink(mut self, log_sink: impl LogSink + 'static) -> Self {
        self.log_sink = Some(Arc::new(log_sink));
        self
    }

    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        ensure!(self.input_capacity.is_power_of_two(), ConfigError::not_power_of_two("input", self.input_capacity));
        ensure!(self.output_capacity.is_power_of_two(), ConfigError::not_power_of_two("output", self.output_capacity));
        ensure!(
            self.scratch_capacity >= MIN_SCRATCH_CAPACITY && i32::try_from(self.scratch_capacity).is_ok(),
            ConfigError::ScratchCapacity { capacity: self.scratch_capacity }
        );
        ensure!(
            !self.server.is_empty() && HeaderValue::from_str(&self.server).is_ok(),
            ConfigError::InvalidServer { server: self.server }
        );

        Ok(SessionConfig {
            input_capacity: self.input_capacity,
            output_capacity: self.output_capacity,
            scratch_capacity: self.scratch_capacity,
            header_mask: self.header_mask,
            server: self.server.into(),
            log_sink: self.log_sink.unwrap_or_else(|| Arc::new(TracingLogSink)),
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{buffer} buffer capacity {capacity} is not a power of two")]
    NotPowerOfTwo { buffer: &'static str, capacity: usize },

    #[error("scratch capacity {capacity} must be at least {MIN_SCRATCH_CAPACITY} and fit an i32")]
    ScratchCapacity { capacity: usize },

    #[error("server token {server:?} is not a valid header value")]
    InvalidServer { server: String },
}

impl ConfigError {
    pub fn not_power_of_two(buffer: &'static str, capacity: usize) -> Self {
        Self::NotPowerOfTwo { buffer, capacity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RequestHeader;

    #[test]
    fn defaults() {
        let config = SessionConfig::builder().build().unwrap();
        assert_eq!(config.input_capacity(), 8192);
        assert_eq!(config.output_capacity(), 8192);
        assert_eq!(config.scratch_capacity(), 4096);
        assert_eq!(config.header_mask(), HeaderMask::ALL);
        assert!(config.server().starts_with("minute-http/"));
        assert_eq!(SessionConfig::default().server(), config.server());
    }

    #[test]
    fn rejects_bad_capacities() {
        assert_eq!(
            SessionConfig::builder().input_capacity(1000).build().unwrap_err(),
            ConfigError::not_power_of_two("input", 1000)
        );
        assert_eq!(
            SessionConfig::builder().output_capacity(0).build().unwrap_err(),
            ConfigError::not_power_of_two("output", 0)
        );
        assert_eq!(
            SessionConfig::builder().scratch_capacity(16).build().unwrap_err(),
            ConfigError::ScratchCapacity { capacity: 16 }
        );
    }

    #[test]
    fn rejects_bad_server_token() {
        let err = SessionConfig::builder().server("bad\r\nvalue").build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidServer { .. }));
    }

    #[test]
    fn custom_values() {
        let mask = HeaderMask::NONE.with(RequestHeader::Host);
        let config = SessionConfig::builder()
            .input_capacity(1024)
            .output_capacity(2048)
            .scratch_capacity(100)
            .header_mask(mask)
            .server("demo")
            .build()
            .unwrap();
        assert_eq!(config.input_capacity(), 1024);
        assert_eq!(config.output_capacity(), 2048);
        assert_eq!(config.scratch_capacity(), 100);
        assert_eq!(config.header_mask(), mask);
        assert_eq!(config.server(), "demo");
    }
}
