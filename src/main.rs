//! hiberd: supervisory daemon for a Hiber satellite modem.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant, SystemTime};

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use hiber::config::{self, Settings};
use hiber::error::{Error, Result};
use hiber::gpio::{self, DigitalLine, SysfsLine};
use hiber::protocol::Command;
use hiber::session::Session;
use hiber::telemetry::FactDispatcher;
use hiber::transport::{self, LineSink, SerialConfig};
use hiber::watchdog::{WATCHDOG_PERIOD, Watchdog};
use hiber::{Subscription, driver};

const NAME: &str = env!("CARGO_PKG_NAME");
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// How often the schedule facts are refreshed.
const REFRESH_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(name = "hiberd", about = "Supervisory driver for Hiber satellite modems", version)]
struct Cli {
    /// Serial device the modem is attached to (e.g. /dev/ttyO2).
    #[arg(short, long)]
    serial: Option<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Path to the settings file.
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(if cli.debug { "debug" } else { "info" })
            }),
        )
        .init();

    let Some(serial) = cli.serial else {
        error!("no serial port specified, see --help");
        return ExitCode::FAILURE;
    };

    let start = Instant::now();
    let status = match run(&serial, cli.settings.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}, quitting");
            ExitCode::FAILURE
        }
    };
    info!("end, run time {:.0?}", start.elapsed());
    status
}

async fn run(serial: &str, settings_path: Option<&std::path::Path>) -> Result<()> {
    let tty = serial.rsplit('/').next().unwrap_or(serial);
    let gpio_base = gpio::find_gpio_base(tty)?;

    let settings = match settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    info!(
        "starting {NAME} {VERSION} on {serial} at {} bps, GPIO base {gpio_base}",
        transport::BAUD_RATE
    );

    let mut reset = SysfsLine::output(gpio_base + gpio::RESET_OFFSET)?;
    let wake = SysfsLine::output(gpio_base + gpio::WAKEUP_OFFSET)?;
    let heartbeat = SysfsLine::output(gpio_base + gpio::WATCHDOG_OFFSET)?;

    let (reader, sink) = transport::open(&SerialConfig::new(serial))?;

    let facts = FactDispatcher::new(16);
    tokio::spawn(publish_facts(facts.subscribe()));

    let session = Session::new(sink, Box::new(wake), facts);
    driver::bootstrap(&session, &mut reset, settings.payload_over_debug).await?;

    // The sender half is the interface handed to whatever delivers settings
    // changes; it stays alive for the process lifetime.
    let (_settings_tx, mut settings_rx) = config::channel(settings);

    let mut watchdog = Watchdog::new(reset, heartbeat);

    tokio::select! {
        r = driver::run(&session, reader) => r,
        r = watchdog_loop(&mut watchdog, &session) => r,
        r = refresh_loop(&session) => r,
        r = settings_loop(&session, &mut settings_rx) => r,
    }
}

/// Forwards published facts to the monitoring layer (the process log).
async fn publish_facts(mut facts: Subscription) {
    while let Some(fact) = facts.recv().await {
        info!("{fact}");
    }
}

async fn watchdog_loop<R, W, T>(watchdog: &mut Watchdog<R, W>, session: &Session<T>) -> Result<()>
where
    R: DigitalLine,
    W: DigitalLine,
    T: LineSink,
{
    let mut tick = tokio::time::interval(WATCHDOG_PERIOD);
    tick.tick().await; // the first tick completes immediately

    loop {
        tick.tick().await;
        let since_wake = SystemTime::now()
            .duration_since(session.last_wake().await)
            .unwrap_or_default();
        watchdog.tick(since_wake)?;
    }
}

async fn refresh_loop<T: LineSink>(session: &Session<T>) -> Result<()> {
    let mut tick = tokio::time::interval(REFRESH_PERIOD);
    tick.tick().await;

    loop {
        tick.tick().await;
        driver::refresh_schedule(session).await?;
    }
}

async fn settings_loop<T: LineSink>(
    session: &Session<T>,
    settings: &mut watch::Receiver<Settings>,
) -> Result<()> {
    loop {
        settings
            .changed()
            .await
            .map_err(|_| Error::SettingsClosed)?;
        let enabled = settings.borrow_and_update().payload_over_debug;
        session
            .enqueue([Command::toggle_payload_over_debug(enabled)])
            .await?;
    }
}
