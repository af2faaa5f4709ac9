//! Application clock: the single source of "today" and "now".
//!
//! RULE: Generation and derived stats never call `Utc::now()` directly.
//! They take the instant from an `AppClock`, so a fixed clock makes a
//! whole session reproducible.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AppClock {
    /// Wall-clock time.
    System,
    /// Frozen at the given instant (tests, `--today`).
    Fixed { at: DateTime<Utc> },
}

impl AppClock {
    /// A clock frozen at midday UTC on `date`.
    pub fn fixed_on(date: NaiveDate) -> Self {
        let at = date
            .and_hms_opt(12, 0, 0)
            .unwrap_or_default()
            .and_utc();
        Self::Fixed { at }
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System     => Utc::now(),
            Self::Fixed { at } => *at,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

impl Default for AppClock {
    fn default() -> Self {
        Self::System
    }
}
