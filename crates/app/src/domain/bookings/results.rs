//! Booking operation results.

use cowork::{
    discounts::DiscountedPrice,
    refunds::{CancelledBy, RefundQuote},
    workstations::BookingDuration,
};
use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{
    bookings::records::{BookingRecord, BookingUuid, PaymentRecord},
    users::{Role, UserRecord, UserUuid},
    workstations::{WorkstationRecord, WorkstationUuid},
};

/// The authenticated caller, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub uuid: UserUuid,
    pub role: Role,
}

impl Caller {
    /// Whether the caller may act on a booking owned by `owner`.
    pub fn may_manage(&self, owner: UserUuid) -> bool {
        self.uuid == owner || self.role.is_staff()
    }

    /// Staff cancellations are refunded as manager cancellations.
    pub fn cancelled_by(&self) -> CancelledBy {
        if self.role.is_staff() {
            CancelledBy::Manager
        } else {
            CancelledBy::User
        }
    }
}

impl From<&UserRecord> for Caller {
    fn from(user: &UserRecord) -> Self {
        Self {
            uuid: user.uuid,
            role: user.role,
        }
    }
}

/// The booking a request collides with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConflictingBooking {
    pub uuid: BookingUuid,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
}

impl From<&BookingRecord> for ConflictingBooking {
    fn from(booking: &BookingRecord) -> Self {
        Self {
            uuid: booking.uuid,
            start_time: booking.start_time,
            end_time: booking.end_time,
        }
    }
}

/// Structured conflict returned instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictResult {
    pub message: String,

    /// Absent only when the storage constraint caught a booking that has since gone away.
    pub conflicting_booking: Option<ConflictingBooking>,
}

impl ConflictResult {
    pub(crate) fn new(conflicting_booking: Option<ConflictingBooking>) -> Self {
        Self {
            message: "Workstation is already booked for the requested time".to_string(),
            conflicting_booking,
        }
    }
}

/// A stored booking together with its payment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedBooking {
    pub booking: BookingRecord,
    pub payment: PaymentRecord,
}

/// Outcome of a booking attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BookingOutcome {
    Created(CreatedBooking),
    Conflict(ConflictResult),
}

/// Availability of a workstation for an interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub is_available: bool,
    pub workstation: WorkstationRecord,
    pub conflicting_booking: Option<ConflictingBooking>,
}

/// Price quote for booking a workstation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub workstation_uuid: WorkstationUuid,
    pub booking_duration: BookingDuration,
    pub base_price: Decimal,
    pub currency: String,
    #[serde(flatten)]
    pub discount: DiscountedPrice,
}

impl PriceQuote {
    /// Price after discounts.
    pub fn final_price(&self) -> Decimal {
        self.discount.final_price
    }
}

/// Outcome of a cancellation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cancellation {
    pub message: String,
    pub cancelled_by: CancelledBy,
    pub refund: RefundQuote,
}
