//! Users
//!
//! Users are managed elsewhere; bookings only read their identity and role.

pub mod records;
pub(crate) mod repository;

pub use records::{Role, UserRecord, UserUuid};
