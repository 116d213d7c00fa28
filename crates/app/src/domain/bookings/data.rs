//! Bookings Data

use cowork::{
    bookings::{Interval, PaymentStatus},
    workstations::BookingDuration,
};
use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::{
    bookings::records::{BookingUuid, PaymentUuid},
    users::UserUuid,
    workstations::{CenterUuid, WorkstationUuid},
};

/// Booking request as submitted by a caller, prices included.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookingRequest {
    pub uuid: BookingUuid,
    pub workstation_uuid: WorkstationUuid,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub booking_duration: BookingDuration,
    pub base_price: Decimal,
    pub discount_percentage: Decimal,
    pub final_price: Decimal,
    pub currency: String,
}

/// New Payment Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub uuid: PaymentUuid,
    pub base_price: Decimal,
    pub discount_percentage: Decimal,
    pub final_price: Decimal,
    pub currency: String,
}

/// New Booking Data
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub uuid: BookingUuid,
    pub user_uuid: UserUuid,
    pub workstation_uuid: WorkstationUuid,
    pub coworking_center_uuid: CenterUuid,
    pub interval: Interval,
}

/// Payment Update Data
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentUpdate {
    pub payment_uuid: PaymentUuid,
    pub status: PaymentStatus,
    pub refund_amount: Option<Decimal>,
}

/// Booking listing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFilter {
    User(UserUuid),
    Center(CenterUuid),
    Workstation(WorkstationUuid),
    All,
}
