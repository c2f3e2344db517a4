//! Telemetry facts published by the session.
//!
//! Parsed modem facts are broadcast to whoever subscribes; the daemon
//! forwards them to the monitoring layer. Timestamps are absolute Unix
//! seconds, with `None` meaning the modem reported no scheduled event.

use std::fmt;

use tokio::sync::broadcast;

/// A modem fact for the monitoring layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fact {
    /// Firmware version string.
    Firmware(String),
    /// Modem model string.
    Model(String),
    /// Modem serial number.
    ModemNumber(String),
    /// Absolute time of the next wake-up alarm, or unset.
    NextAlarm(Option<u64>),
    /// Absolute time of the next satellite contact pass, or unset.
    NextPass(Option<u64>),
}

impl Fact {
    /// Returns the publication key for this fact.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Firmware(_) => "Firmware",
            Self::Model(_) => "Model",
            Self::ModemNumber(_) => "ModemNumber",
            Self::NextAlarm(_) => "NextAlarm",
            Self::NextPass(_) => "NextPass",
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firmware(v) | Self::Model(v) | Self::ModemNumber(v) => {
                write!(f, "{}={v}", self.key())
            }
            Self::NextAlarm(t) | Self::NextPass(t) => match t {
                Some(t) => write!(f, "{}={t}", self.key()),
                None => write!(f, "{}=unset", self.key()),
            },
        }
    }
}

/// Broadcasts facts to subscribers.
#[derive(Debug, Clone)]
pub struct FactDispatcher {
    sender: broadcast::Sender<Fact>,
}

impl FactDispatcher {
    /// Creates a dispatcher with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes a fact to all subscribers.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, fact: Fact) {
        let _ = self.sender.send(fact);
    }

    /// Subscribes to published facts.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }
}

/// A subscription to published facts.
pub struct Subscription {
    receiver: broadcast::Receiver<Fact>,
}

impl Subscription {
    /// Receives the next fact, or `None` once the dispatcher is gone.
    ///
    /// A lagging subscriber skips to the oldest retained fact.
    pub async fn recv(&mut self) -> Option<Fact> {
        loop {
            match self.receiver.recv().await {
                Ok(fact) => return Some(fact),
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Receives an already-published fact without waiting, for tests.
    pub fn try_recv(&mut self) -> Option<Fact> {
        self.receiver.try_recv().ok()
    }
}
