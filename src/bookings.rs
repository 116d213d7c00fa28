//! Bookings
//!
//! Reservation intervals and the booking/payment status machines.

use std::{fmt, str::FromStr};

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building booking values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    /// The interval ends at or before its start.
    #[error("booking must end after it starts ({start} >= {end})")]
    EmptyInterval {
        /// Requested start
        start: Timestamp,
        /// Requested end
        end: Timestamp,
    },

    /// Unrecognised status label.
    #[error("unknown status: {0}")]
    UnknownStatus(String),
}

/// Half-open reservation interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    start: Timestamp,
    end: Timestamp,
}

impl Interval {
    /// Create an interval, rejecting empty or inverted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::EmptyInterval`] when `end <= start`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, BookingError> {
        if end <= start {
            return Err(BookingError::EmptyInterval { start, end });
        }

        Ok(Self { start, end })
    }

    /// Inclusive start of the interval.
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Exclusive end of the interval.
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Length of the interval.
    pub fn duration(&self) -> SignedDuration {
        self.start.duration_until(self.end)
    }

    /// Whether two intervals share any instant.
    ///
    /// Touching intervals (one ends exactly when the other starts) do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Whether the interval has fully elapsed at `now`.
    pub fn has_ended(&self, now: Timestamp) -> bool {
        self.end <= now
    }
}

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Reserved and not yet elapsed or cancelled.
    Active,

    /// Elapsed, either by the sweeper or an explicit update.
    Completed,

    /// Cancelled by its owner or staff.
    Cancelled,
}

impl BookingStatus {
    /// Storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled bookings never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, BookingStatus::Active)
    }

    /// Only `ACTIVE -> COMPLETED` and `ACTIVE -> CANCELLED` are allowed.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(BookingStatus::Active),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            _ => Err(BookingError::UnknownStatus(s.to_string())),
        }
    }
}

/// Payment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Paid in full.
    Completed,

    /// Fully or partially refunded.
    Refunded,
}

impl PaymentStatus {
    /// Storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(PaymentStatus::Completed),
            "refunded" => Ok(PaymentStatus::Refunded),
            _ => Err(BookingError::UnknownStatus(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn at(hour: i8) -> TestResult<Timestamp> {
        Ok(jiff::civil::date(2025, 3, 10)
            .at(hour, 0, 0, 0)
            .to_zoned(jiff::tz::TimeZone::UTC)?
            .timestamp())
    }

    #[test]
    fn interval_rejects_empty_range() -> TestResult {
        let nine = at(9)?;

        assert!(matches!(
            Interval::new(nine, nine),
            Err(BookingError::EmptyInterval { .. })
        ));

        assert!(Interval::new(at(10)?, nine).is_err());

        Ok(())
    }

    #[test]
    fn overlapping_intervals_conflict() -> TestResult {
        let day = Interval::new(at(9)?, at(18)?)?;
        let lunch = Interval::new(at(12)?, at(13)?)?;

        assert!(day.overlaps(&lunch));
        assert!(lunch.overlaps(&day));

        Ok(())
    }

    #[test]
    fn touching_intervals_do_not_conflict() -> TestResult {
        let day = Interval::new(at(9)?, at(18)?)?;
        let evening = Interval::new(at(18)?, at(19)?)?;

        assert!(!day.overlaps(&evening));
        assert!(!evening.overlaps(&day));

        Ok(())
    }

    #[test]
    fn interval_duration_and_elapsed() -> TestResult {
        let slot = Interval::new(at(9)?, at(12)?)?;

        assert_eq!(slot.duration(), SignedDuration::from_hours(3));
        assert!(!slot.has_ended(at(11)?));
        assert!(slot.has_ended(at(12)?));

        Ok(())
    }

    #[test]
    fn only_active_bookings_transition() {
        use BookingStatus::{Active, Cancelled, Completed};

        assert!(Active.can_transition_to(Completed));
        assert!(Active.can_transition_to(Cancelled));
        assert!(!Active.can_transition_to(Active));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Completed));
        assert!(Completed.is_terminal() && Cancelled.is_terminal());
    }

    #[test]
    fn statuses_round_trip_through_labels() -> TestResult {
        assert_eq!("ACTIVE".parse::<BookingStatus>()?, BookingStatus::Active);
        assert_eq!("refunded".parse::<PaymentStatus>()?, PaymentStatus::Refunded);
        assert!("pending".parse::<BookingStatus>().is_err());

        Ok(())
    }
}
