//! Workstations

pub mod records;
pub(crate) mod repository;

pub use records::{CenterUuid, WorkstationRecord, WorkstationUuid};
