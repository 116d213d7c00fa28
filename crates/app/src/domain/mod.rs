//! Cowork Domain Concerns

use std::str::FromStr;

use sqlx::{Row, postgres::PgRow};

pub mod bookings;
pub mod discounts;
pub mod users;
pub mod workstations;

/// Decode a text column through the type's `FromStr` label parser.
pub(crate) fn decode_label<T>(row: &PgRow, column: &str) -> sqlx::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.try_get(column)?;

    raw.parse().map_err(|error| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(error),
    })
}
