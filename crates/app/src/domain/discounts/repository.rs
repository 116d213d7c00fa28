//! Discounts Repository

use cowork::discounts::Discount;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use smallvec::SmallVec;
use sqlx::{Postgres, Row, Transaction, postgres::PgRow, query};

const LIST_ACTIVE_DISCOUNTS_SQL: &str = include_str!("sql/list_active_discounts.sql");
const CREATE_DISCOUNT_SQL: &str = include_str!("sql/create_discount.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDiscountsRepository;

impl PgDiscountsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Active discounts, highest priority first.
    pub(crate) async fn list_active_discounts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<Discount>, sqlx::Error> {
        query(LIST_ACTIVE_DISCOUNTS_SQL)
            .try_map(|row: PgRow| discount_from_row(&row))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_discount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        discount: &Discount,
    ) -> Result<Discount, sqlx::Error> {
        query(CREATE_DISCOUNT_SQL)
            .bind(discount.uuid)
            .bind(&discount.name)
            .bind(&discount.description)
            .bind(discount.percentage)
            .bind(discount.max_discount_amount)
            .bind(discount.usage_limit)
            .bind(discount.start_date.map(SqlxTimestamp::from))
            .bind(discount.end_date.map(SqlxTimestamp::from))
            .bind(discount.applicable_days.to_vec())
            .bind(&discount.applicable_hours)
            .bind(discount.is_active)
            .bind(discount.priority)
            .try_map(|row: PgRow| discount_from_row(&row))
            .fetch_one(&mut **tx)
            .await
    }
}

/// Weekday names are kept as stored; unreadable ones only disable that discount when pricing.
fn discount_from_row(row: &PgRow) -> sqlx::Result<Discount> {
    let applicable_days: Vec<String> = row.try_get("applicable_days")?;

    Ok(Discount {
        uuid: row.try_get("uuid")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        percentage: row.try_get("percentage")?,
        max_discount_amount: row.try_get("max_discount_amount")?,
        usage_limit: row.try_get("usage_limit")?,
        start_date: row
            .try_get::<Option<SqlxTimestamp>, _>("start_date")?
            .map(SqlxTimestamp::to_jiff),
        end_date: row
            .try_get::<Option<SqlxTimestamp>, _>("end_date")?
            .map(SqlxTimestamp::to_jiff),
        applicable_days: SmallVec::from_vec(applicable_days),
        applicable_hours: row.try_get("applicable_hours")?,
        is_active: row.try_get("is_active")?,
        priority: row.try_get("priority")?,
    })
}
