//! Persisted daemon settings.
//!
//! The daemon reads its settings from a TOML file at startup and exposes a
//! watch channel as the change-notification boundary: whoever delivers
//! settings changes sends a new `Settings` value, and the session listener
//! re-issues the payload-over-debug toggle to the modem.

use std::path::Path;

use serde::Deserialize;
use tokio::sync::watch;

use crate::error::{Error, Result};

/// Daemon settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Route payload traffic over the debug interface.
    pub payload_over_debug: bool,
}

impl Settings {
    /// Loads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|source| Error::Settings {
            path: path.to_owned(),
            source,
        })
    }
}

/// Creates the settings change-notification pair.
#[must_use]
pub fn channel(initial: Settings) -> (watch::Sender<Settings>, watch::Receiver<Settings>) {
    watch::channel(initial)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load() {
        let file = write_file("payload_over_debug = true\n");
        let settings = Settings::load(file.path()).unwrap();
        assert!(settings.payload_over_debug);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let file = write_file("");
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let file = write_file("payload_over_debug = \"maybe\"\n");
        assert!(matches!(
            Settings::load(file.path()),
            Err(Error::Settings { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(matches!(
            Settings::load(Path::new("/nonexistent/hiber.toml")),
            Err(Error::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_change_notification() {
        let (tx, mut rx) = channel(Settings::default());
        assert!(!rx.borrow().payload_over_debug);

        tx.send(Settings {
            payload_over_debug: true,
        })
        .unwrap();

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().payload_over_debug);
    }
}
