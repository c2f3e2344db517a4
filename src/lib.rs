//! # hiber
//!
//! Supervisory driver for Hiber satellite modems.
//!
//! The modem is reachable over a line-oriented serial command protocol and
//! three auxiliary GPIO lines (reset, wake, watchdog). This library keeps
//! the modem's duty cycle synchronized with a host-issued command queue,
//! surfaces modem telemetry (firmware, model, next pass, next alarm) to a
//! monitoring layer, and guarantees the modem is rebooted if it stops
//! responding.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hiber::config::Settings;
//! use hiber::gpio::{self, SysfsLine};
//! use hiber::session::Session;
//! use hiber::telemetry::FactDispatcher;
//! use hiber::transport::{self, SerialConfig};
//! use hiber::driver;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), hiber::Error> {
//!     let base = gpio::find_gpio_base("ttyO2")?;
//!     let mut reset = SysfsLine::output(base + gpio::RESET_OFFSET)?;
//!     let wake = SysfsLine::output(base + gpio::WAKEUP_OFFSET)?;
//!
//!     let (reader, sink) = transport::open(&SerialConfig::new("/dev/ttyO2"))?;
//!     let session = Session::new(sink, Box::new(wake), FactDispatcher::new(16));
//!
//!     driver::bootstrap(&session, &mut reset, Settings::default().payload_over_debug).await?;
//!     driver::run(&session, reader).await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - Command strings and response line classification
//! - [`transport`] - Serial link, split into session-owned writer and
//!   run-loop-owned reader
//! - [`gpio`] - The digital control lines (sysfs GPIO)
//! - [`session`] - Command queue, ready arbitration, wake-line rule
//! - [`driver`] - Bootstrap sequence and the run loop
//! - [`watchdog`] - Heartbeat / forced-reboot supervision
//! - [`telemetry`] - Fact broadcasting to the monitoring layer
//! - [`config`] - Persisted settings and change notification

pub mod config;
pub mod driver;
pub mod error;
pub mod gpio;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod watchdog;

// Re-exports for convenience
pub use config::Settings;
pub use error::{Error, Result};
pub use gpio::{DigitalLine, SysfsLine};
pub use protocol::{Command, Response};
pub use session::Session;
pub use telemetry::{Fact, FactDispatcher, Subscription};
pub use transport::{LineSink, SerialConfig, SerialSink};
pub use watchdog::Watchdog;
