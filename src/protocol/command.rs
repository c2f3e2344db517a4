//! Command strings for the Hiber modem dialect.
//!
//! Commands are opaque protocol strings of the form `name(args)`. The modem
//! answers each with a single `API(code[: values])` line once it is awake.

use std::fmt;

/// A single modem command, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(String);

impl Command {
    /// Creates a command from a raw protocol string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw wire form, without line terminator.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the command name: the text before the first `(`.
    ///
    /// Response handling is keyed on this token.
    #[must_use]
    pub fn token(&self) -> &str {
        self.0.split('(').next().unwrap_or(&self.0)
    }

    /// Queries the modem firmware version.
    #[must_use]
    pub fn firmware_version() -> Self {
        Self::new("get_firmware_version()")
    }

    /// Queries model and modem number.
    #[must_use]
    pub fn modem_info() -> Self {
        Self::new("get_modem_info()")
    }

    /// Queries the modem clock.
    #[must_use]
    pub fn datetime() -> Self {
        Self::new("get_datetime()")
    }

    /// Queries the last known location fix.
    #[must_use]
    pub fn location() -> Self {
        Self::new("get_location()")
    }

    /// Enables or disables the GPS receiver.
    #[must_use]
    pub fn gps_mode(enabled: bool) -> Self {
        Self::new(format!("set_gps_mode({})", u8::from(enabled)))
    }

    /// Queries the next wake-up alarm as a relative offset.
    #[must_use]
    pub fn next_alarm() -> Self {
        Self::new("get_next_alarm()")
    }

    /// Queries the next satellite contact pass as a relative offset.
    #[must_use]
    pub fn next_pass() -> Self {
        Self::new("get_next_pass()")
    }

    /// Routes payload traffic over the debug interface when enabled.
    #[must_use]
    pub fn toggle_payload_over_debug(enabled: bool) -> Self {
        Self::new(format!("toggle_payload_over_debug({})", u8::from(enabled)))
    }

    /// Releases the modem into low-power sleep.
    #[must_use]
    pub fn go_to_sleep() -> Self {
        Self::new("go_to_sleep()")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The fixed command sequence issued after a modem reset.
#[must_use]
pub fn bootstrap_commands() -> Vec<Command> {
    vec![
        Command::firmware_version(),
        Command::modem_info(),
        Command::datetime(),
        Command::location(),
        Command::gps_mode(false),
        Command::next_alarm(),
        Command::next_pass(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_forms() {
        assert_eq!(Command::firmware_version().as_str(), "get_firmware_version()");
        assert_eq!(Command::gps_mode(false).as_str(), "set_gps_mode(0)");
        assert_eq!(Command::gps_mode(true).as_str(), "set_gps_mode(1)");
        assert_eq!(
            Command::toggle_payload_over_debug(true).as_str(),
            "toggle_payload_over_debug(1)"
        );
        assert_eq!(Command::go_to_sleep().as_str(), "go_to_sleep()");
    }

    #[test]
    fn test_token() {
        assert_eq!(Command::firmware_version().token(), "get_firmware_version");
        assert_eq!(Command::gps_mode(false).token(), "set_gps_mode");
        assert_eq!(Command::new("bare").token(), "bare");
    }

    #[test]
    fn test_bootstrap_order() {
        let cmds = bootstrap_commands();
        assert_eq!(cmds.len(), 7);
        assert_eq!(cmds[0], Command::firmware_version());
        assert_eq!(cmds[6], Command::next_pass());
    }
}
