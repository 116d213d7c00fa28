//! Workstations
//!
//! Workstation kinds and the base price a booking of a given length should cost.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{bookings::Interval, money::round2};

/// Price used for rooms without a usable hourly price.
pub const ROOM_FALLBACK_PRICE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Price used for desks without a usable period price.
pub const DESK_FALLBACK_PRICE: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Workstation parsing errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkstationError {
    /// Unrecognised workstation kind.
    #[error("unknown workstation kind: {0}")]
    UnknownKind(String),

    /// Unrecognised booking duration.
    #[error("unknown booking duration: {0}")]
    UnknownDuration(String),
}

/// Kind of bookable workstation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkstationKind {
    /// Plain desk
    Desk,

    /// Desk with a computer
    ComputerDesk,

    /// Small meeting room
    MeetingRoom,

    /// Conference room
    ConferenceRoom,
}

impl WorkstationKind {
    /// Rooms are priced per hour, desks per day, week or month.
    pub fn is_room(self) -> bool {
        matches!(
            self,
            WorkstationKind::MeetingRoom | WorkstationKind::ConferenceRoom
        )
    }

    /// Storage label.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkstationKind::Desk => "desk",
            WorkstationKind::ComputerDesk => "computer_desk",
            WorkstationKind::MeetingRoom => "meeting_room",
            WorkstationKind::ConferenceRoom => "conference_room",
        }
    }

    fn fallback_price(self) -> Decimal {
        if self.is_room() {
            ROOM_FALLBACK_PRICE
        } else {
            DESK_FALLBACK_PRICE
        }
    }
}

impl fmt::Display for WorkstationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkstationKind {
    type Err = WorkstationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desk" => Ok(WorkstationKind::Desk),
            "computer_desk" => Ok(WorkstationKind::ComputerDesk),
            "meeting_room" => Ok(WorkstationKind::MeetingRoom),
            "conference_room" => Ok(WorkstationKind::ConferenceRoom),
            _ => Err(WorkstationError::UnknownKind(s.to_string())),
        }
    }
}

/// Billing period requested for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingDuration {
    /// Per hour
    Hour,

    /// Per day
    Day,

    /// Per week
    Week,

    /// Per month (30 days)
    Month,
}

impl BookingDuration {
    /// Length of one billing period in seconds.
    ///
    /// Desks have no hourly price, so an hourly request is billed by the day.
    fn desk_period_seconds(self) -> i64 {
        match self {
            BookingDuration::Hour | BookingDuration::Day => SECONDS_PER_DAY,
            BookingDuration::Week => 7 * SECONDS_PER_DAY,
            BookingDuration::Month => 30 * SECONDS_PER_DAY,
        }
    }
}

impl FromStr for BookingDuration {
    type Err = WorkstationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" => Ok(BookingDuration::Hour),
            "day" | "daily" => Ok(BookingDuration::Day),
            "week" | "weekly" => Ok(BookingDuration::Week),
            "month" | "monthly" => Ok(BookingDuration::Month),
            _ => Err(WorkstationError::UnknownDuration(s.to_string())),
        }
    }
}

/// Configured prices of a workstation. Rooms carry an hourly price, desks the period prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkstationPricing {
    /// Rooms only
    #[serde(default)]
    pub price_per_hour: Option<Decimal>,

    /// Desks only
    #[serde(default)]
    pub price_per_day: Option<Decimal>,

    /// Desks only
    #[serde(default)]
    pub price_per_week: Option<Decimal>,

    /// Desks only
    #[serde(default)]
    pub price_per_month: Option<Decimal>,
}

impl WorkstationPricing {
    /// Unit price for one billing period, falling back to the kind's default when the
    /// configured price is missing or not positive.
    pub fn unit_price(&self, kind: WorkstationKind, duration: BookingDuration) -> Decimal {
        let configured = if kind.is_room() {
            self.price_per_hour
        } else {
            match duration {
                BookingDuration::Hour | BookingDuration::Day => self.price_per_day,
                BookingDuration::Week => self.price_per_week,
                BookingDuration::Month => self.price_per_month,
            }
        };

        configured
            .filter(|price| *price > Decimal::ZERO)
            .unwrap_or_else(|| kind.fallback_price())
    }

    /// Price the whole `interval` should cost.
    ///
    /// Rooms cost the hourly price times the exact number of hours. Desks cost the period price
    /// times the number of started periods.
    pub fn expected_base_price(
        &self,
        kind: WorkstationKind,
        duration: BookingDuration,
        interval: &Interval,
    ) -> Decimal {
        let unit = self.unit_price(kind, duration);
        let seconds = interval.duration().as_secs();

        if kind.is_room() {
            return round2(unit * Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR));
        }

        let period = duration.desk_period_seconds();
        let periods = (seconds + period - 1) / period;

        round2(unit * Decimal::from(periods))
    }
}
