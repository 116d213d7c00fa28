//! Day and hour windows

use std::{fmt, str::FromStr};

use jiff::{Zoned, civil::Weekday};
use thiserror::Error;

/// Errors raised while parsing discount windows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    /// The hours string is not `HH:MM-HH:MM`.
    #[error("malformed hours window {0:?}, expected HH:MM-HH:MM")]
    MalformedHours(String),

    /// The window closes before it opens.
    #[error("hours window {0:?} ends before it starts")]
    InvertedHours(String),

    /// Not an English weekday name.
    #[error("unknown weekday {0:?}")]
    UnknownWeekday(String),
}

/// Inclusive minute-of-day window, e.g. `09:00-18:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoursWindow {
    start_minutes: u16,
    end_minutes: u16,
}

impl HoursWindow {
    /// First minute of the day covered by the window.
    pub fn start_minutes(&self) -> u16 {
        self.start_minutes
    }

    /// Last minute of the day covered by the window.
    pub fn end_minutes(&self) -> u16 {
        self.end_minutes
    }

    /// Whether the window starts no later than it ends.
    pub fn is_ordered(&self) -> bool {
        self.start_minutes <= self.end_minutes
    }

    /// Whether the local time of `at` falls inside the window, both ends included.
    pub fn contains(&self, at: &Zoned) -> bool {
        let minute = minute_of_day(at);

        self.start_minutes <= minute && minute <= self.end_minutes
    }
}

impl FromStr for HoursWindow {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || WindowError::MalformedHours(s.to_string());

        let (start, end) = s.trim().split_once('-').ok_or_else(malformed)?;

        Ok(Self {
            start_minutes: parse_clock(start).ok_or_else(malformed)?,
            end_minutes: parse_clock(end).ok_or_else(malformed)?,
        })
    }
}

impl fmt::Display for HoursWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_minutes / 60,
            self.start_minutes % 60,
            self.end_minutes / 60,
            self.end_minutes % 60
        )
    }
}

/// Parse a strict two-digit `HH:MM` clock reading into minutes since midnight.
///
/// `jiff::civil::Time` parsing also accepts seconds and fractions, which stored windows must
/// not carry.
fn parse_clock(clock: &str) -> Option<u16> {
    let (hours, minutes) = clock.split_once(':')?;

    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }

    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: u16 = hours.parse().ok()?;
    let minutes: u16 = minutes.parse().ok()?;

    (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
}

fn minute_of_day(at: &Zoned) -> u16 {
    let hour = u16::try_from(at.hour()).unwrap_or_default();
    let minute = u16::try_from(at.minute()).unwrap_or_default();

    hour * 60 + minute
}

/// Parse an English weekday name, ignoring case and surrounding whitespace.
///
/// # Errors
///
/// Returns [`WindowError::UnknownWeekday`] for anything but the seven full English names.
pub fn parse_weekday(name: &str) -> Result<Weekday, WindowError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "monday" => Ok(Weekday::Monday),
        "tuesday" => Ok(Weekday::Tuesday),
        "wednesday" => Ok(Weekday::Wednesday),
        "thursday" => Ok(Weekday::Thursday),
        "friday" => Ok(Weekday::Friday),
        "saturday" => Ok(Weekday::Saturday),
        "sunday" => Ok(Weekday::Sunday),
        _ => Err(WindowError::UnknownWeekday(name.to_string())),
    }
}
