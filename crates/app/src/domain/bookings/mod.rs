//! Bookings
//!
//! Reservation lifecycle: availability, creation under a per-workstation lock, cancellation with
//! refunds, status updates, price quotes and listings.

pub mod data;
pub mod errors;
pub mod records;
mod repositories;
pub mod results;
pub mod service;
pub mod store;

pub use errors::{BookingsServiceError, StoreError, ValidationError};
pub use service::*;
pub use store::{BookingStore, MockBookingStore, PgBookingStore};
