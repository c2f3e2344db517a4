//! Serial transport implementation.
//!
//! Opens the modem's tty at the fixed protocol baud rate and splits it so
//! that reading (the run loop) and writing (the session) can proceed
//! independently.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncWriteExt, BufReader, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::error::{Error, Result};
use crate::transport::LineSink;

/// The Hiber modem's fixed baud rate.
pub const BAUD_RATE: u32 = 19_200;

/// Configuration for the serial link.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Serial port path (e.g. "/dev/ttyO2").
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
}

impl SerialConfig {
    /// Creates a configuration for the given port at the protocol baud rate.
    #[must_use]
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: BAUD_RATE,
        }
    }

    /// Overrides the baud rate.
    #[must_use]
    pub const fn baud_rate(mut self, rate: u32) -> Self {
        self.baud_rate = rate;
        self
    }
}

/// Buffered read half of the serial link, owned by the run loop.
pub type SerialReader = BufReader<ReadHalf<SerialStream>>;

/// Write half of the serial link, owned by the session.
pub struct SerialSink {
    writer: WriteHalf<SerialStream>,
}

/// Opens the serial link and splits it into its two halves.
pub fn open(config: &SerialConfig) -> Result<(SerialReader, SerialSink)> {
    tracing::info!("opening serial port {} at {} bps", config.port, config.baud_rate);

    let stream = tokio_serial::new(&config.port, config.baud_rate)
        .open_native_async()
        .map_err(Error::Serial)?;

    let (reader, writer) = tokio::io::split(stream);
    Ok((BufReader::new(reader), SerialSink { writer }))
}

impl LineSink for SerialSink {
    fn send_line(&mut self, line: &str) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let msg = format!("{line}\r\n");
        Box::pin(async move {
            self.writer.write_all(msg.as_bytes()).await.map_err(Error::Io)?;
            self.writer.flush().await.map_err(Error::Io)?;
            Ok(())
        })
    }
}
