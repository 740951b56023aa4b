//! # LogSubscriber: notification logger
//!
//! A minimal subscriber that writes every notification through `tracing`.
//! Useful for demos and for wiring a producer up before real consumers exist.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO meteocast::broadcast::log: notification source="Beijing" kind=TEMPERATURE_CHANGED value=25.0
//! INFO meteocast::broadcast::log: notification source="Beijing" kind=WEATHER_CHANGED condition=Mild
//! WARN meteocast::broadcast::log: extreme weather source="Beijing" alert="EXTREME WEATHER ALERT at Beijing: ..."
//! ```

use tracing::Level;

use crate::error::BoxError;
use crate::event::{EventKind, EventPayload, EventSource};

use super::subscriber::Subscriber;

macro_rules! log_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            Level::ERROR => tracing::error!($($arg)+),
            Level::WARN => tracing::warn!($($arg)+),
            Level::INFO => tracing::info!($($arg)+),
            Level::DEBUG => tracing::debug!($($arg)+),
            _ => tracing::trace!($($arg)+),
        }
    };
}

/// Logs every notification it receives.
#[derive(Debug, Clone)]
pub struct LogSubscriber {
    name: String,
    level: Level,
}

impl Default for LogSubscriber {
    fn default() -> Self {
        Self::new("log")
    }
}

impl LogSubscriber {
    /// Logger at `INFO`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::INFO,
        }
    }

    /// Change the level used for ordinary notifications. Alerts always log at `WARN`.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl Subscriber for LogSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn receive(&self, source: &EventSource, kind: EventKind, payload: &EventPayload) -> Result<(), BoxError> {
        let src = source.name.as_str();
        match payload {
            EventPayload::Scalar(value) => {
                log_at!(self.level, source = src, %kind, value, "notification");
            }
            EventPayload::Condition(condition) => {
                log_at!(self.level, source = src, %kind, %condition, "notification");
            }
            EventPayload::Measurements(sample) => {
                log_at!(self.level, source = src, %kind, %sample, "notification");
            }
            EventPayload::Alert(alert) => {
                tracing::warn!(source = src, alert = %alert.message, "extreme weather");
            }
        }
        Ok(())
    }
}
