//! Test Helpers

use cowork::{bookings::Interval, discounts::Discount, workstations::BookingDuration};
use jiff::Timestamp;
use rust_decimal::Decimal;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::domain::{
    bookings::{data::BookingRequest, records::BookingUuid},
    workstations::WorkstationRecord,
};

/// An always-applicable discount.
pub(crate) fn discount(name: &str, percentage: i64, priority: i32) -> Discount {
    Discount {
        uuid: Uuid::now_v7(),
        name: name.to_string(),
        description: None,
        percentage: Decimal::from(percentage),
        max_discount_amount: None,
        usage_limit: None,
        start_date: None,
        end_date: None,
        applicable_days: SmallVec::new(),
        applicable_hours: None,
        is_active: true,
        priority,
    }
}

pub(crate) fn at(raw: &str) -> Timestamp {
    raw.parse().expect("valid RFC 3339 timestamp")
}

pub(crate) fn interval(start: &str, end: &str) -> Interval {
    Interval::new(at(start), at(end)).expect("start before end")
}

/// An hourly booking request priced at `price` with no discount.
pub(crate) fn hourly_request(
    workstation: &WorkstationRecord,
    start: &str,
    end: &str,
    price: i64,
) -> BookingRequest {
    BookingRequest {
        uuid: BookingUuid::new(),
        workstation_uuid: workstation.uuid,
        start_time: at(start),
        end_time: at(end),
        booking_duration: BookingDuration::Hour,
        base_price: Decimal::from(price),
        discount_percentage: Decimal::ZERO,
        final_price: Decimal::from(price),
        currency: "RUB".to_string(),
    }
}
