//! Simulation Time Types
//!
//! Simulated time is a monotonic count of seconds since the world epoch.
//! Day zero starts at midnight.
//!
//! # Example
//!
//! ```
//! use herd_types::{SimTime, TimeOfDay};
//!
//! let t = SimTime::from_day_hms(2, 14, 30, 0);
//! assert_eq!(t.hour(), 14);
//! assert_eq!(t.time_of_day(), TimeOfDay::Afternoon);
//! assert_eq!(t.to_string(), "day_2.14:30:00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of seconds in a simulated minute.
pub const SECONDS_PER_MINUTE: u64 = 60;

/// Number of seconds in a simulated hour.
pub const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;

/// Number of hours in a simulated day.
pub const HOURS_PER_DAY: u64 = 24;

/// Number of seconds in a simulated day.
pub const SECONDS_PER_DAY: u64 = HOURS_PER_DAY * SECONDS_PER_HOUR;

/// Coarse period of the day, used for activity windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Night,
    Dawn,
    Morning,
    Afternoon,
    Dusk,
}

impl TimeOfDay {
    /// Maps an hour (0-23) to its period.
    pub fn from_hour(hour: u64) -> Self {
        match hour {
            5..=6 => TimeOfDay::Dawn,
            7..=11 => TimeOfDay::Morning,
            12..=17 => TimeOfDay::Afternoon,
            18..=19 => TimeOfDay::Dusk,
            _ => TimeOfDay::Night,
        }
    }

    pub fn is_twilight(self) -> bool {
        matches!(self, TimeOfDay::Dawn | TimeOfDay::Dusk)
    }

    pub fn is_daylight(self) -> bool {
        matches!(self, TimeOfDay::Morning | TimeOfDay::Afternoon)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeOfDay::Night => write!(f, "night"),
            TimeOfDay::Dawn => write!(f, "dawn"),
            TimeOfDay::Morning => write!(f, "morning"),
            TimeOfDay::Afternoon => write!(f, "afternoon"),
            TimeOfDay::Dusk => write!(f, "dusk"),
        }
    }
}

/// A point in simulated time, in seconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(pub u64);

impl SimTime {
    /// The world epoch (day 0, midnight).
    pub const EPOCH: SimTime = SimTime(0);

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Builds a time from a day number and a wall-clock time.
    pub fn from_day_hms(day: u64, hour: u64, minute: u64, second: u64) -> Self {
        Self(day * SECONDS_PER_DAY + hour * SECONDS_PER_HOUR + minute * SECONDS_PER_MINUTE + second)
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    /// Returns this time advanced by the given number of seconds.
    pub fn plus_secs(self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed since an earlier time (zero if `earlier` is later).
    pub fn secs_since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// Day number since the epoch.
    pub fn day(self) -> u64 {
        self.0 / SECONDS_PER_DAY
    }

    /// Hour of the day (0-23).
    pub fn hour(self) -> u64 {
        (self.0 % SECONDS_PER_DAY) / SECONDS_PER_HOUR
    }

    /// Minute of the hour (0-59).
    pub fn minute(self) -> u64 {
        (self.0 % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE
    }

    /// Second of the minute (0-59).
    pub fn second(self) -> u64 {
        self.0 % SECONDS_PER_MINUTE
    }

    pub fn time_of_day(self) -> TimeOfDay {
        TimeOfDay::from_hour(self.hour())
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "day_{}.{:02}:{:02}:{:02}",
            self.day(),
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_components() {
        let t = SimTime::from_day_hms(3, 21, 5, 9);
        assert_eq!(t.day(), 3);
        assert_eq!(t.hour(), 21);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.second(), 9);
    }

    #[test]
    fn test_time_display() {
        assert_eq!(SimTime::EPOCH.to_string(), "day_0.00:00:00");
        assert_eq!(SimTime::from_day_hms(1, 6, 0, 30).to_string(), "day_1.06:00:30");
    }

    #[test]
    fn test_time_of_day_boundaries() {
        assert_eq!(TimeOfDay::from_hour(0), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(4), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(5), TimeOfDay::Dawn);
        assert_eq!(TimeOfDay::from_hour(7), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(12), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(18), TimeOfDay::Dusk);
        assert_eq!(TimeOfDay::from_hour(20), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
    }

    #[test]
    fn test_secs_since_saturates() {
        let early = SimTime::from_secs(100);
        let late = SimTime::from_secs(160);
        assert_eq!(late.secs_since(early), 60);
        assert_eq!(early.secs_since(late), 0);
        assert_eq!(early.plus_secs(60), late);
    }

    #[test]
    fn test_time_serializes_as_seconds() {
        let t = SimTime::from_secs(43_200);
        assert_eq!(serde_json::to_string(&t).unwrap(), "43200");
        let parsed: SimTime = serde_json::from_str("43200").unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn test_twelve_hours_in_seconds() {
        assert_eq!(12 * SECONDS_PER_HOUR, 43_200);
    }
}
