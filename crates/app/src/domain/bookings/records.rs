//! Booking Records

use cowork::bookings::{BookingError, BookingStatus, Interval, PaymentStatus};
use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    domain::{
        users::UserUuid,
        workstations::{CenterUuid, WorkstationUuid},
    },
    uuids::TypedUuid,
};

/// Booking UUID
pub type BookingUuid = TypedUuid<BookingRecord>;

/// Payment UUID
pub type PaymentUuid = TypedUuid<PaymentRecord>;

/// Booking Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingRecord {
    pub uuid: BookingUuid,
    pub user_uuid: UserUuid,
    pub workstation_uuid: WorkstationUuid,
    pub coworking_center_uuid: CenterUuid,
    pub payment_uuid: Option<PaymentUuid>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub status: BookingStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BookingRecord {
    /// The reserved interval.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored end is not after the start.
    pub fn interval(&self) -> Result<Interval, BookingError> {
        Interval::new(self.start_time, self.end_time)
    }
}

/// Payment Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecord {
    pub uuid: PaymentUuid,
    pub base_price: Decimal,
    pub discount_percentage: Decimal,
    pub final_price: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub refund_amount: Option<Decimal>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
