//! Refunds
//!
//! Lead-time based refund policy applied when a booking is cancelled.

use std::{fmt, str::FromStr};

use decimal_percentage::Percentage;
use jiff::{SignedDuration, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::round2;

const HOUR: SignedDuration = SignedDuration::from_hours(1);
const DAY: SignedDuration = SignedDuration::from_hours(24);

/// Refund tiers, as fractions of the paid price.
const FULL: Decimal = Decimal::ONE;
const HALF: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
const QUARTER: Decimal = Decimal::from_parts(25, 0, 0, false, 2);

/// Who initiated a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelledBy {
    /// The booking owner.
    User,

    /// Staff acting on the booking, always refunded in full.
    Manager,
}

impl CancelledBy {
    /// Read a label case-insensitively; anything other than `manager` counts as the user.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("manager") {
            CancelledBy::Manager
        } else {
            CancelledBy::User
        }
    }
}

impl fmt::Display for CancelledBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelledBy::User => f.write_str("USER"),
            CancelledBy::Manager => f.write_str("MANAGER"),
        }
    }
}

impl FromStr for CancelledBy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_label(s))
    }
}

/// Booking granularity, derived from its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    /// Up to 12 hours.
    Hourly,

    /// Up to one day.
    Daily,

    /// Up to seven days.
    Weekly,

    /// Longer than a week.
    Monthly,
}

impl BookingType {
    /// Classify a booking by its duration.
    pub fn classify(duration: SignedDuration) -> Self {
        if duration <= HOUR * 12 {
            BookingType::Hourly
        } else if duration <= DAY {
            BookingType::Daily
        } else if duration <= DAY * 7 {
            BookingType::Weekly
        } else {
            BookingType::Monthly
        }
    }

    /// Fraction of the price refunded when cancelling `lead` ahead of the start.
    fn refund_fraction(self, lead: SignedDuration) -> Decimal {
        match self {
            BookingType::Hourly if lead > HOUR * 2 => FULL,
            BookingType::Hourly if lead > HOUR => HALF,
            BookingType::Daily if lead > DAY => FULL,
            BookingType::Daily if lead > HOUR * 12 => HALF,
            BookingType::Weekly if lead > DAY * 5 => FULL,
            BookingType::Weekly if lead > DAY * 3 => HALF,
            BookingType::Weekly if lead > DAY => QUARTER,
            BookingType::Monthly if lead > DAY * 14 => FULL,
            BookingType::Monthly if lead > DAY * 7 => HALF,
            _ => Decimal::ZERO,
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookingType::Hourly => "hourly",
            BookingType::Daily => "daily",
            BookingType::Weekly => "weekly",
            BookingType::Monthly => "monthly",
        })
    }
}

/// Why a refund came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundReason {
    /// The booking window could not be read.
    InvalidDate,

    /// Nothing was paid.
    NoPayment,

    /// Staff cancellations are always refunded in full.
    CancelledByManager,

    /// Cancelled early enough for a full refund.
    FullRefund,

    /// Cancelled inside a partial refund tier.
    PartialRefund,

    /// Cancelled too late for any refund.
    NoRefund,
}

impl fmt::Display for RefundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefundReason::InvalidDate => "Invalid date",
            RefundReason::NoPayment => "No payment",
            RefundReason::CancelledByManager => "Cancelled by manager",
            RefundReason::FullRefund => "Cancelled in the full refund window",
            RefundReason::PartialRefund => "Cancelled in a partial refund window",
            RefundReason::NoRefund => "Cancelled too close to the start for a refund",
        })
    }
}

/// The part of a booking the refund policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundableBooking {
    /// Reservation start
    pub start_time: Timestamp,

    /// Reservation end
    pub end_time: Timestamp,

    /// Final price of the attached payment, if any
    pub final_price: Option<Decimal>,
}

/// Computed refund.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundQuote {
    /// Amount to give back, rounded to cents
    pub refund_amount: Decimal,

    /// Refunded fraction of the price (`1` is a full refund)
    pub refund_percentage: Decimal,

    /// Whether the whole price is returned
    pub is_full_refund: bool,

    /// Reason code
    pub reason: RefundReason,

    /// Granularity used for the policy lookup
    pub booking_type: Option<BookingType>,

    /// Hours between the cancellation and the start; negative once started
    pub hours_until_start: Option<f64>,
}

impl RefundQuote {
    /// A refund of nothing.
    pub fn none(reason: RefundReason) -> Self {
        Self {
            refund_amount: Decimal::ZERO,
            refund_percentage: Decimal::ZERO,
            is_full_refund: false,
            reason,
            booking_type: None,
            hours_until_start: None,
        }
    }
}

/// Work out the refund for cancelling `booking` at `cancellation_time`.
pub fn calculate_refund(
    booking: &RefundableBooking,
    cancellation_time: Timestamp,
    cancelled_by: CancelledBy,
) -> RefundQuote {
    if booking.end_time <= booking.start_time {
        return RefundQuote::none(RefundReason::InvalidDate);
    }

    let booking_type =
        BookingType::classify(booking.start_time.duration_until(booking.end_time));

    let lead = cancellation_time.duration_until(booking.start_time);
    let hours_until_start = lead.as_secs_f64() / HOUR.as_secs_f64();

    let price = booking.final_price.unwrap_or(Decimal::ZERO);

    if price <= Decimal::ZERO {
        return RefundQuote {
            booking_type: Some(booking_type),
            hours_until_start: Some(hours_until_start),
            ..RefundQuote::none(RefundReason::NoPayment)
        };
    }

    let (fraction, reason) = match cancelled_by {
        CancelledBy::Manager => (FULL, RefundReason::CancelledByManager),
        CancelledBy::User => {
            let fraction = booking_type.refund_fraction(lead);

            let reason = if fraction == FULL {
                RefundReason::FullRefund
            } else if fraction > Decimal::ZERO {
                RefundReason::PartialRefund
            } else {
                RefundReason::NoRefund
            };

            (fraction, reason)
        }
    };

    let refund_amount = round2(Percentage::from(fraction) * price).min(price);

    RefundQuote {
        refund_amount,
        refund_percentage: fraction,
        is_full_refund: fraction == FULL,
        reason,
        booking_type: Some(booking_type),
        hours_until_start: Some(hours_until_start),
    }
}

/// Same as [`calculate_refund`] for textual RFC 3339 instants and a textual canceller.
///
/// Unreadable instants yield a zero refund with [`RefundReason::InvalidDate`].
pub fn calculate_refund_at(
    start_time: &str,
    end_time: &str,
    final_price: Option<Decimal>,
    cancellation_time: &str,
    cancelled_by: &str,
) -> RefundQuote {
    let parsed = (
        start_time.trim().parse::<Timestamp>(),
        end_time.trim().parse::<Timestamp>(),
        cancellation_time.trim().parse::<Timestamp>(),
    );

    let (Ok(start_time), Ok(end_time), Ok(cancellation_time)) = parsed else {
        return RefundQuote::none(RefundReason::InvalidDate);
    };

    calculate_refund(
        &RefundableBooking {
            start_time,
            end_time,
            final_price,
        },
        cancellation_time,
        CancelledBy::from_label(cancelled_by),
    )
}

/// Whether the owner would get any money back cancelling at `at`.
pub fn is_refund_possible(booking: &RefundableBooking, at: Timestamp) -> bool {
    calculate_refund(booking, at, CancelledBy::User).refund_amount > Decimal::ZERO
}
