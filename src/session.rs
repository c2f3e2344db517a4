//! Modem session: the command queue, ready/not-ready arbitration and the
//! wake-line rule.
//!
//! All shared state lives behind one lock, including the serial writer and
//! the wake line. `enqueue` (called from timers and the settings listener)
//! and the run loop's dequeue both take it, so at most one command is ever
//! in flight and the queue is never observed half-updated. The blocking
//! line read happens outside the lock, in [`crate::driver::run`].

use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::gpio::DigitalLine;
use crate::protocol::{CODE_OK_MIN, CODE_SLEEPING, Command, Response, classify};
use crate::telemetry::{Fact, FactDispatcher};
use crate::transport::LineSink;

/// Time the RESET line is held low during the boot pulse.
const RESET_SETTLE: Duration = Duration::from_millis(100);

struct State<T> {
    sink: T,
    wake: Box<dyn DigitalLine>,
    queue: VecDeque<Command>,
    in_flight: Option<Command>,
    ready: bool,
    last_wake: SystemTime,
    next_pass: Option<u64>,
}

impl<T: LineSink> State<T> {
    /// Sends a command, marking it in flight. `ready` drops until a
    /// terminal response is classified.
    async fn send(&mut self, cmd: Command) -> Result<()> {
        debug!("> {cmd}");
        self.ready = false;
        self.in_flight = Some(cmd.clone());
        self.sink.send_line(cmd.as_str()).await
    }

    fn assert_wake(&mut self) -> Result<()> {
        if !self.wake.get() {
            self.wake.set(true)?;
        }
        Ok(())
    }
}

/// One modem session, alive for the process lifetime.
pub struct Session<T> {
    state: Mutex<State<T>>,
    facts: FactDispatcher,
}

impl<T: LineSink> Session<T> {
    /// Creates a session bound to a serial sink and the WAKEUP line.
    pub fn new(sink: T, wake: Box<dyn DigitalLine>, facts: FactDispatcher) -> Self {
        Self {
            state: Mutex::new(State {
                sink,
                wake,
                queue: VecDeque::new(),
                in_flight: None,
                ready: false,
                last_wake: UNIX_EPOCH,
                next_pass: None,
            }),
            facts,
        }
    }

    /// Performs the hardware wake/reset pulse that precedes a session.
    pub async fn reset_pulse(&self, reset: &mut dyn DigitalLine) -> Result<()> {
        let mut st = self.state.lock().await;
        st.wake.set(false)?;
        reset.set(false)?;
        tokio::time::sleep(RESET_SETTLE).await;
        st.wake.set(true)?;
        Ok(())
    }

    /// Appends commands to the queue and asserts the wake line.
    ///
    /// When the modem is idle and nothing is queued, the first command is
    /// sent immediately. Never blocks beyond the underlying serial write.
    pub async fn enqueue(&self, commands: impl IntoIterator<Item = Command>) -> Result<()> {
        let mut commands = commands.into_iter();
        let mut st = self.state.lock().await;

        if st.ready && st.queue.is_empty() {
            if let Some(first) = commands.next() {
                st.send(first).await?;
            }
        }
        st.queue.extend(commands);

        st.assert_wake()
    }

    /// Advances the queue once; called by the run loop before each read.
    ///
    /// When the modem is idle: sends the queue head, or lowers the wake
    /// line and releases the modem into sleep when nothing is left. The
    /// sleep command is not tracked in flight and leaves `ready` untouched;
    /// the modem simply stops answering once it descends.
    pub async fn poll_next(&self) -> Result<()> {
        let mut st = self.state.lock().await;
        if !st.ready {
            return Ok(());
        }

        if let Some(cmd) = st.queue.pop_front() {
            st.send(cmd).await
        } else {
            st.wake.set(false)?;
            let sleep = Command::go_to_sleep();
            debug!("> {sleep}");
            st.sink.send_line(sleep.as_str()).await
        }
    }

    /// Classifies one non-empty received line and updates session state.
    ///
    /// Every line consumes the in-flight marker; whether `ready` rises
    /// again depends on the classification.
    pub async fn handle_line(&self, line: &str) {
        debug!("< {line}");
        let mut st = self.state.lock().await;
        let cmd = st.in_flight.take();

        match classify(line) {
            Response::Ready => {
                debug!("modem awake");
                st.last_wake = SystemTime::now();
                st.ready = true;
            }
            Response::Result { code, values } => {
                self.handle_result(&mut st, cmd, code, &values);
            }
            Response::BadResultCode { raw } => {
                error!("expected numeric result code: {raw}");
                st.ready = true;
            }
            Response::Unrecognized { raw } => {
                warn!("unknown response: {raw}");
                st.ready = true;
            }
        }
    }

    fn handle_result(&self, st: &mut State<T>, cmd: Option<Command>, code: u16, values: &[String]) {
        if code == CODE_SLEEPING {
            // The command has not truly completed; stay not-ready.
            debug!("modem sleeping");
            return;
        }

        let Some(cmd) = cmd else {
            warn!("unexpected response: API({code})");
            st.ready = true;
            return;
        };

        if code < CODE_OK_MIN {
            // Protocol-level failure; advance anyway so the queue is not
            // stalled behind a command the modem rejected.
            error!("{cmd}: error {code}");
            st.ready = true;
            return;
        }

        st.ready = true;
        self.dispatch(st, &cmd, values);
    }

    /// Routes a successful result to its handler, keyed on the command name.
    fn dispatch(&self, st: &mut State<T>, cmd: &Command, values: &[String]) {
        match cmd.token() {
            "get_firmware_version" => {
                if let Some(fw) = field(cmd, values, 1) {
                    self.facts.publish(Fact::Firmware(fw.to_owned()));
                }
            }
            "get_modem_info" => {
                if let Some(model) = field(cmd, values, 2) {
                    self.facts.publish(Fact::Model(model.to_owned()));
                }
                if let Some(number) = field(cmd, values, 5) {
                    self.facts.publish(Fact::ModemNumber(number.to_owned()));
                }
            }
            "get_datetime" => {
                if let Some(t) = field(cmd, values, 1) {
                    info!("modem time: {t}");
                }
            }
            "get_location" => {
                if let (Some(lat), Some(lon)) = (field(cmd, values, 1), field(cmd, values, 2)) {
                    info!("modem location: {lat} {lon}");
                }
            }
            "get_next_alarm" => {
                let alarm =
                    field(cmd, values, 2).and_then(|v| absolute_from_offset(unix_now(), v));
                self.facts.publish(Fact::NextAlarm(alarm));
            }
            "get_next_pass" => {
                let pass = field(cmd, values, 1).and_then(|v| absolute_from_offset(unix_now(), v));
                st.next_pass = pass;
                self.facts.publish(Fact::NextPass(pass));
            }
            // Acknowledged; nothing further to do.
            _ => {}
        }
    }

    /// Instant of the last ready banner; the Unix epoch before the first.
    pub async fn last_wake(&self) -> SystemTime {
        self.state.lock().await.last_wake
    }

    /// Absolute time of the next satellite pass, when one is scheduled.
    pub async fn next_pass(&self) -> Option<u64> {
        self.state.lock().await.next_pass
    }

    /// True when the modem is idle and a command may be sent immediately.
    pub async fn is_ready(&self) -> bool {
        self.state.lock().await.ready
    }

    /// Number of queued commands, excluding any in flight.
    pub async fn pending(&self) -> usize {
        self.state.lock().await.queue.len()
    }

    /// The dispatcher facts are published through.
    #[must_use]
    pub const fn facts(&self) -> &FactDispatcher {
        &self.facts
    }
}

/// Returns the 1-indexed response field, logging when it is missing.
fn field<'a>(cmd: &Command, values: &'a [String], number: usize) -> Option<&'a str> {
    let v = values.get(number - 1).map(String::as_str);
    if v.is_none() {
        warn!("{cmd}: response is missing field {number}");
    }
    v
}

/// Seconds since the Unix epoch.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Converts a relative-seconds offset reported by the modem into an
/// absolute Unix time. Negative and non-numeric offsets mean "unset".
fn absolute_from_offset(now: u64, offset: &str) -> Option<u64> {
    let offset: i64 = offset.parse().ok()?;
    u64::try_from(offset).ok().map(|o| now.saturating_add(o))
}
