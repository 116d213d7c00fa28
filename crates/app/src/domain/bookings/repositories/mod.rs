//! Booking Repositories

mod bookings;
mod payments;

pub(crate) use bookings::PgBookingsRepository;
pub(crate) use payments::PgPaymentsRepository;
