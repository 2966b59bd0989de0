//! When the watch loop runs passes.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::{OffsetDateTime, Time, UtcOffset};

use crate::config::ConfigError;

/// Watch-loop settings as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSettings {
    /// Seconds between pass starts while the market is open.
    pub interval_secs: u64,
    /// Seconds between checks while the market is closed.
    pub closed_poll_secs: u64,
    /// Seconds to wait after a failed pass.
    pub error_backoff_secs: u64,
    /// Local opening time, `HH:MM`.
    pub market_open: String,
    /// Local closing time, `HH:MM`.
    pub market_close: String,
    /// Exchange offset from UTC, `+HH:MM`.
    pub utc_offset: String,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval_secs: 6,
            closed_poll_secs: 300,
            error_backoff_secs: 60,
            market_open: String::from("09:15"),
            market_close: String::from("15:30"),
            utc_offset: String::from("+05:30"),
        }
    }
}

/// Validated watch timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSchedule {
    interval: Duration,
    closed_poll: Duration,
    error_backoff: Duration,
    open: Time,
    close: Time,
    offset: UtcOffset,
}

impl WatchSchedule {
    pub fn from_settings(settings: &WatchSettings) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("watch.interval_secs", settings.interval_secs),
            ("watch.closed_poll_secs", settings.closed_poll_secs),
            ("watch.error_backoff_secs", settings.error_backoff_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: String::from("must be greater than zero"),
                });
            }
        }

        let open = parse_clock("watch.market_open", &settings.market_open)?;
        let close = parse_clock("watch.market_close", &settings.market_close)?;
        if open >= close {
            return Err(ConfigError::Invalid {
                field: "watch.market_close",
                reason: format!(
                    "market closes ({}) before it opens ({})",
                    settings.market_close, settings.market_open
                ),
            });
        }

        let offset = UtcOffset::parse(
            settings.utc_offset.trim(),
            format_description!("[offset_hour sign:mandatory]:[offset_minute]"),
        )
        .map_err(|_| ConfigError::Invalid {
            field: "watch.utc_offset",
            reason: format!("expected +HH:MM, got '{}'", settings.utc_offset),
        })?;

        Ok(Self {
            interval: Duration::from_secs(settings.interval_secs),
            closed_poll: Duration::from_secs(settings.closed_poll_secs),
            error_backoff: Duration::from_secs(settings.error_backoff_secs),
            open,
            close,
            offset,
        })
    }

    /// Whether `now` falls inside the market window, both ends inclusive.
    pub fn is_open(&self, now: OffsetDateTime) -> bool {
        let local = now.to_offset(self.offset).time();
        self.open <= local && local <= self.close
    }

    /// Delay before the next check after a successful iteration that took
    /// `elapsed`.
    pub fn next_delay(&self, now: OffsetDateTime, elapsed: Duration) -> Duration {
        if self.is_open(now) {
            self.interval
                .saturating_sub(elapsed)
                .max(Duration::from_secs(1))
        } else {
            self.closed_poll
        }
    }

    pub fn error_delay(&self) -> Duration {
        self.error_backoff
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for WatchSchedule {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(6),
            closed_poll: Duration::from_secs(300),
            error_backoff: Duration::from_secs(60),
            open: time::macros::time!(9:15),
            close: time::macros::time!(15:30),
            offset: time::macros::offset!(+5:30),
        }
    }
}

fn parse_clock(field: &'static str, value: &str) -> Result<Time, ConfigError> {
    Time::parse(
        value.trim(),
        format_description!("[hour padding:none]:[minute]"),
    )
    .map_err(|_| ConfigError::Invalid {
        field,
        reason: format!("expected HH:MM, got '{value}'"),
    })
}
