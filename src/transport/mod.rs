//! Transport layer for modem communication.
//!
//! The modem speaks a line-oriented text protocol over a serial link. The
//! link is split on open: the write half implements [`LineSink`] and is
//! owned by the session, the read half feeds the run loop.

pub mod serial;

use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

/// Sink half of a line-oriented duplex link.
pub trait LineSink: Send {
    /// Writes one protocol line, terminated, and flushes it.
    fn send_line(&mut self, line: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

pub use serial::{BAUD_RATE, SerialConfig, SerialReader, SerialSink, open};
