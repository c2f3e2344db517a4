//! Hardware control lines exposed through sysfs GPIO.
//!
//! The modem is wired to three digital lines on the GPIO controller that
//! sits next to its serial port: RESET, WAKEUP and WATCHDOG. The controller
//! base number is discovered from the tty device at startup; the line
//! numbers are the base plus a fixed per-board offset.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// RESET line offset from the controller base.
pub const RESET_OFFSET: u32 = 4;

/// WAKEUP line offset from the controller base.
pub const WAKEUP_OFFSET: u32 = 5;

/// WATCHDOG line offset from the controller base.
pub const WATCHDOG_OFFSET: u32 = 6;

/// A hardware signal exposed as a read/settable bit.
pub trait DigitalLine: Send {
    /// Returns the last level driven on (or read from) the line.
    fn get(&self) -> bool;

    /// Drives the line to the given level.
    fn set(&mut self, level: bool) -> Result<()>;
}

/// A GPIO line driven through `/sys/class/gpio`.
///
/// The line is exported and configured as an output on open; the level is
/// cached so [`DigitalLine::get`] does not touch the filesystem.
#[derive(Debug)]
pub struct SysfsLine {
    pin: u32,
    value_path: PathBuf,
    value: bool,
}

impl SysfsLine {
    /// Opens GPIO `pin` as an output line.
    pub fn output(pin: u32) -> Result<Self> {
        Self::output_at(Path::new("/sys/class/gpio"), pin)
    }

    fn output_at(root: &Path, pin: u32) -> Result<Self> {
        let wrap = |source: io::Error| Error::Gpio { pin, source };

        let dir = root.join(format!("gpio{pin}"));
        if !dir.exists() {
            write_attr(&root.join("export"), &pin.to_string()).map_err(wrap)?;
        }
        write_attr(&dir.join("direction"), "out").map_err(wrap)?;

        let value_path = dir.join("value");
        let value = read_attr(&value_path).map_err(wrap)? == "1";

        Ok(Self {
            pin,
            value_path,
            value,
        })
    }
}

impl DigitalLine for SysfsLine {
    fn get(&self) -> bool {
        self.value
    }

    fn set(&mut self, level: bool) -> Result<()> {
        write_attr(&self.value_path, if level { "1" } else { "0" }).map_err(|source| {
            Error::Gpio {
                pin: self.pin,
                source,
            }
        })?;
        self.value = level;
        Ok(())
    }
}

/// Finds the base number of the GPIO controller adjacent to a tty device.
///
/// Resolution failure is fatal at startup: without a controller there is no
/// way to wake or reset the modem.
pub fn find_gpio_base(tty: &str) -> Result<u32> {
    find_gpio_base_in(Path::new("/sys/class"), tty)
}

fn find_gpio_base_in(sys_class: &Path, tty: &str) -> Result<u32> {
    let not_found = || Error::GpioBaseNotFound { tty: tty.to_owned() };

    let gpio_dir = sys_class.join("tty").join(tty).join("device/../gpio");
    let chip = fs::read_dir(gpio_dir)
        .map_err(|_| not_found())?
        .next()
        .and_then(std::result::Result::ok)
        .ok_or_else(not_found)?;

    let base = read_attr(&sys_class.join("gpio").join(chip.file_name()).join("base"))
        .map_err(|_| not_found())?;
    base.parse().map_err(|_| not_found())
}

fn read_attr(path: &Path) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_owned())
}

fn write_attr(path: &Path, val: &str) -> io::Result<()> {
    fs::write(path, val)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_chip(root: &Path, pin: u32, value: &str) {
        let dir = root.join(format!("gpio{pin}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("direction"), "in\n").unwrap();
        fs::write(dir.join("value"), value).unwrap();
        fs::write(root.join("export"), "").unwrap();
    }

    #[test]
    fn test_open_configures_output_and_reads_level() {
        let root = tempfile::tempdir().unwrap();
        fake_chip(root.path(), 101, "1\n");

        let line = SysfsLine::output_at(root.path(), 101).unwrap();
        assert!(line.get());
        assert_eq!(
            fs::read_to_string(root.path().join("gpio101/direction")).unwrap(),
            "out"
        );
    }

    #[test]
    fn test_set_writes_value_and_caches() {
        let root = tempfile::tempdir().unwrap();
        fake_chip(root.path(), 101, "0\n");

        let mut line = SysfsLine::output_at(root.path(), 101).unwrap();
        assert!(!line.get());

        line.set(true).unwrap();
        assert!(line.get());
        assert_eq!(
            fs::read_to_string(root.path().join("gpio101/value")).unwrap(),
            "1"
        );

        line.set(false).unwrap();
        assert!(!line.get());
        assert_eq!(
            fs::read_to_string(root.path().join("gpio101/value")).unwrap(),
            "0"
        );
    }

    #[test]
    fn test_open_missing_controller_fails() {
        let root = tempfile::tempdir().unwrap();
        // Exporting cannot conjure up the line directory, so configuring
        // the direction fails.
        assert!(matches!(
            SysfsLine::output_at(root.path(), 7),
            Err(Error::Gpio { pin: 7, .. })
        ));
    }

    #[test]
    fn test_find_gpio_base() {
        let root = tempfile::tempdir().unwrap();
        let tty = root.path().join("tty/ttyO2");
        fs::create_dir_all(tty.join("device")).unwrap();
        fs::create_dir_all(tty.join("gpio/gpiochip96")).unwrap();
        fs::create_dir_all(root.path().join("gpio/gpiochip96")).unwrap();
        fs::write(root.path().join("gpio/gpiochip96/base"), "96\n").unwrap();

        assert_eq!(find_gpio_base_in(root.path(), "ttyO2").unwrap(), 96);
    }

    #[test]
    fn test_find_gpio_base_missing_tty() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            find_gpio_base_in(root.path(), "ttyO9"),
            Err(Error::GpioBaseNotFound { .. })
        ));
    }
}
