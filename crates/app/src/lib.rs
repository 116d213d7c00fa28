//! Cowork application layer: typed records, `PostgreSQL` persistence, the bookings and discounts
//! services, the expiry sweeper and the configuration shared by the `cowork-app` binary.

pub mod config;
pub mod database;
pub mod domain;
pub mod logging;
pub mod shutdown;
pub mod sweeper;
pub mod uuids;

#[cfg(test)]
mod test;
