//! Workstations Repository

use cowork::workstations::WorkstationPricing;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    decode_label,
    workstations::records::{CenterUuid, WorkstationRecord, WorkstationUuid},
};

const GET_WORKSTATION_SQL: &str = include_str!("sql/get_workstation.sql");
const LOCK_WORKSTATION_SQL: &str = include_str!("sql/lock_workstation.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgWorkstationsRepository;

impl PgWorkstationsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_workstation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workstation: WorkstationUuid,
    ) -> Result<WorkstationRecord, sqlx::Error> {
        query_as::<Postgres, WorkstationRecord>(GET_WORKSTATION_SQL)
            .bind(workstation.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Take the row lock that serialises booking inserts for one workstation.
    pub(crate) async fn lock_workstation(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workstation: WorkstationUuid,
    ) -> Result<(), sqlx::Error> {
        query(LOCK_WORKSTATION_SQL)
            .bind(workstation.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for WorkstationRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: WorkstationUuid::from_uuid(row.try_get("uuid")?),
            coworking_center_uuid: CenterUuid::from_uuid(row.try_get("coworking_center_uuid")?),
            name: row.try_get("name")?,
            kind: decode_label(row, "kind")?,
            pricing: WorkstationPricing {
                price_per_hour: row.try_get("price_per_hour")?,
                price_per_day: row.try_get("price_per_day")?,
                price_per_week: row.try_get("price_per_week")?,
                price_per_month: row.try_get("price_per_month")?,
            },
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
