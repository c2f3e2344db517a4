//! Watchdog supervision of the modem.
//!
//! Runs on its own timer, independent of the run loop. While the modem has
//! produced a ready banner recently the WATCHDOG line is toggled as a
//! heartbeat; once it has been silent past the window the RESET line is
//! asserted and left high, forcing a hardware reboot. The next banner
//! after the reboot resumes the heartbeat.

use std::time::Duration;

use tracing::warn;

use crate::error::Result;
use crate::gpio::DigitalLine;

/// Period between watchdog inspections.
pub const WATCHDOG_PERIOD: Duration = Duration::from_secs(5);

/// A modem silent for this long is forced to reboot.
pub const WAKE_TIMEOUT: Duration = Duration::from_secs(120);

/// Drives the RESET and WATCHDOG lines from the session's last-wake time.
pub struct Watchdog<R, W> {
    reset: R,
    heartbeat: W,
}

impl<R: DigitalLine, W: DigitalLine> Watchdog<R, W> {
    /// Creates a supervisor over the two hardware lines.
    pub const fn new(reset: R, heartbeat: W) -> Self {
        Self { reset, heartbeat }
    }

    /// One supervision step, given the time since the last ready banner.
    pub fn tick(&mut self, since_wake: Duration) -> Result<()> {
        if since_wake < WAKE_TIMEOUT {
            let level = self.heartbeat.get();
            self.heartbeat.set(!level)
        } else {
            warn!(
                "no ready banner for {}s, forcing modem reset",
                since_wake.as_secs()
            );
            self.reset.set(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex as StdMutex};

    use super::*;

    #[derive(Clone, Default)]
    struct MockLine {
        level: Arc<AtomicBool>,
        history: Arc<StdMutex<Vec<bool>>>,
    }

    impl DigitalLine for MockLine {
        fn get(&self) -> bool {
            self.level.load(Ordering::SeqCst)
        }

        fn set(&mut self, level: bool) -> Result<()> {
            self.level.store(level, Ordering::SeqCst);
            self.history.lock().unwrap().push(level);
            Ok(())
        }
    }

    #[test]
    fn test_recent_wake_toggles_heartbeat() {
        let reset = MockLine::default();
        let heartbeat = MockLine::default();
        let mut wd = Watchdog::new(reset.clone(), heartbeat.clone());

        wd.tick(Duration::from_secs(119)).unwrap();
        assert!(heartbeat.get());
        wd.tick(Duration::from_secs(119)).unwrap();
        assert!(!heartbeat.get());

        assert!(!reset.get());
        assert_eq!(*heartbeat.history.lock().unwrap(), vec![true, false]);
    }

    #[test]
    fn test_stale_wake_asserts_reset() {
        let reset = MockLine::default();
        let heartbeat = MockLine::default();
        let mut wd = Watchdog::new(reset.clone(), heartbeat.clone());

        wd.tick(Duration::from_secs(121)).unwrap();

        assert!(reset.get());
        assert!(heartbeat.history.lock().unwrap().is_empty());
    }

    #[test]
    fn test_window_boundary_escalates() {
        let reset = MockLine::default();
        let mut wd = Watchdog::new(reset.clone(), MockLine::default());

        wd.tick(WAKE_TIMEOUT).unwrap();
        assert!(reset.get());
    }

    #[test]
    fn test_reset_is_not_reversed_by_later_ticks() {
        let reset = MockLine::default();
        let heartbeat = MockLine::default();
        let mut wd = Watchdog::new(reset.clone(), heartbeat.clone());

        wd.tick(Duration::from_secs(300)).unwrap();
        assert!(reset.get());

        // The modem came back: heartbeat resumes, RESET stays where the
        // escalation left it.
        wd.tick(Duration::from_secs(1)).unwrap();
        assert!(reset.get());
        assert!(heartbeat.get());
    }
}
