use chrono::TimeDelta;

use crate::*;

/// Remaining wait until the next cookie, split for display.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Countdown {
    remaining: TimeDelta,
}

impl Countdown {
    /// The longest possible wait between two unlocks.
    pub const FULL_CYCLE_HOURS: f64 = 24.0;

    pub fn new(remaining: TimeDelta) -> Self {
        Self {
            remaining: remaining.max(TimeDelta::zero()),
        }
    }

    pub fn remaining(&self) -> TimeDelta {
        self.remaining
    }

    pub fn total_hours(&self) -> i64 {
        self.remaining.num_hours()
    }

    pub fn minutes(&self) -> i64 {
        self.remaining.num_minutes() % 60
    }

    pub fn seconds(&self) -> i64 {
        self.remaining.num_seconds() % 60
    }

    /// `HH:MM:SS`, or `MM:SS` in the last hour.
    pub fn clock_text(&self) -> String {
        if self.total_hours() >= 1 {
            format!(
                "{:02}:{:02}:{:02}",
                self.total_hours(),
                self.minutes(),
                self.seconds()
            )
        } else {
            format!("{:02}:{:02}", self.minutes(), self.seconds())
        }
    }

    /// How much of a full day's wait has elapsed, from 0 to 1.
    pub fn fill_fraction(&self) -> f64 {
        let hours = self.remaining.num_milliseconds() as f64 / 3_600_000.0;
        1.0 - (hours / Self::FULL_CYCLE_HOURS).clamp(0.0, 1.0)
    }

    pub fn overlay_text(&self, localizer: &Localizer) -> String {
        let table = Localizer::MESSAGES;
        if self.total_hours() >= 1 {
            localizer.format(table, "countdown_hours", &[&self.total_hours(), &self.minutes()])
        } else if self.remaining.num_minutes() >= 1 {
            localizer.format(table, "countdown_minutes", &[&self.minutes(), &self.seconds()])
        } else {
            localizer.format(table, "countdown_seconds", &[&self.seconds()])
        }
    }
}

impl From<TimeDelta> for Countdown {
    fn from(remaining: TimeDelta) -> Self {
        Self::new(remaining)
    }
}
