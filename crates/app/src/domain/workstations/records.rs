//! Workstation Records

use cowork::workstations::{WorkstationKind, WorkstationPricing};
use jiff::Timestamp;
use serde::Serialize;

use crate::uuids::TypedUuid;

/// Workstation UUID
pub type WorkstationUuid = TypedUuid<WorkstationRecord>;

/// Coworking center marker; centers are managed outside this crate.
#[derive(Debug)]
pub struct CoworkingCenter;

/// Coworking center UUID
pub type CenterUuid = TypedUuid<CoworkingCenter>;

/// Workstation Record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkstationRecord {
    pub uuid: WorkstationUuid,
    pub coworking_center_uuid: CenterUuid,
    pub name: String,
    pub kind: WorkstationKind,
    #[serde(flatten)]
    pub pricing: WorkstationPricing,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
