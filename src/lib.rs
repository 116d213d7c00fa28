//! Cowork
//!
//! Pricing, availability and refund rules for coworking space bookings: stacking time and day
//! bounded discounts, pricing workstations, detecting overlapping reservations and working out
//! what a cancellation gives back.

pub mod bookings;
pub mod discounts;
pub mod fixtures;
pub mod money;
pub mod quote;
pub mod refunds;
pub mod workstations;
