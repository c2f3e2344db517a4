//! The session run loop.
//!
//! A single task owns the serial read half: it polls the session before
//! every read, blocks on the next line with no timeout (the modem has no
//! push channel), classifies it and feeds the session. Any transport
//! failure, including the port closing, is fatal for the process; restart
//! is left to the external supervisor.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::{Error, Result};
use crate::gpio::DigitalLine;
use crate::protocol::{Command, bootstrap_commands};
use crate::session::Session;
use crate::transport::LineSink;

/// Boots the modem: reset pulse, bootstrap queries, toggle application.
pub async fn bootstrap<T: LineSink>(
    session: &Session<T>,
    reset: &mut dyn DigitalLine,
    payload_over_debug: bool,
) -> Result<()> {
    session.reset_pulse(reset).await?;
    session.enqueue(bootstrap_commands()).await?;
    session
        .enqueue([Command::toggle_payload_over_debug(payload_over_debug)])
        .await
}

/// Runs the steady-state loop until a transport error.
pub async fn run<T, R>(session: &Session<T>, reader: R) -> Result<()>
where
    T: LineSink,
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    loop {
        session.poll_next().await?;

        let Some(line) = lines.next_line().await? else {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "serial port closed",
            )));
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        session.handle_line(line).await;
    }
}

/// Re-queries the schedule facts; invoked periodically by the daemon.
pub async fn refresh_schedule<T: LineSink>(session: &Session<T>) -> Result<()> {
    session
        .enqueue([Command::next_alarm(), Command::next_pass()])
        .await
}
