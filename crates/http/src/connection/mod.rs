//! Connection handling.
//!
//! # Components
//!
//! - [`HttpSession`]: drives one connection, request after request:
//!   - parses the request head, reading only when the buffered input runs dry
//!   - decides keep-alive and the framing of both bodies
//!   - answers `Expect: 100-continue`
//!   - calls the [`Application`](crate::handler::Application) and frames its response
//!   - drains unread request bodies so pipelined requests line up
//! - [`HeadWriter`], [`BodyReader`], [`BodyWriter`]: the views of the
//!   connection handed to the application
//! - [`LogSink`]: receives a record for every served request

mod body_reader;
mod log;
mod session;
mod writer;

pub use body_reader::BodyReader;
pub use log::{LogSink, ServedRequest, TracingLogSink};
pub use session::{ClientStatus, HttpSession};
pub use writer::{BodyWriter, HeadWriter};
