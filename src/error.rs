//! Error types for the hiber library.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for hiber operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// GPIO line access failed.
    #[error("GPIO {pin} error: {source}")]
    Gpio {
        pin: u32,
        #[source]
        source: std::io::Error,
    },

    /// No GPIO controller was found next to the serial device.
    #[error("no GPIO controller found for tty {tty}")]
    GpioBaseNotFound { tty: String },

    /// Settings file could not be parsed.
    #[error("settings file {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The settings change channel was closed.
    #[error("settings channel closed")]
    SettingsClosed,
}

/// Result type alias for hiber operations.
pub type Result<T> = std::result::Result<T, Error>;
