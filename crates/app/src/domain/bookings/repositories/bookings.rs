//! Bookings Repository

use cowork::bookings::{BookingStatus, Interval};
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::domain::{
    bookings::{
        data::{BookingFilter, NewBooking},
        records::{BookingRecord, BookingUuid, PaymentUuid},
    },
    decode_label,
    users::UserUuid,
    workstations::{CenterUuid, WorkstationUuid},
};

const GET_BOOKING_SQL: &str = include_str!("../sql/get_booking.sql");
const FIND_OVERLAPPING_ACTIVE_BOOKING_SQL: &str =
    include_str!("../sql/find_overlapping_active_booking.sql");
const CREATE_BOOKING_SQL: &str = include_str!("../sql/create_booking.sql");
const UPDATE_BOOKING_STATUS_SQL: &str = include_str!("../sql/update_booking_status.sql");
const COMPLETE_EXPIRED_BOOKINGS_SQL: &str = include_str!("../sql/complete_expired_bookings.sql");
const LIST_BOOKINGS_SQL: &str = include_str!("../sql/list_bookings.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgBookingsRepository;

impl PgBookingsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
    ) -> Result<BookingRecord, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(GET_BOOKING_SQL)
            .bind(booking.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Earliest active booking on the workstation sharing an instant with `interval`.
    pub(crate) async fn find_overlapping_active_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        workstation: WorkstationUuid,
        interval: Interval,
        exclude: Option<BookingUuid>,
    ) -> Result<Option<BookingRecord>, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(FIND_OVERLAPPING_ACTIVE_BOOKING_SQL)
            .bind(workstation.into_uuid())
            .bind(SqlxTimestamp::from(interval.start()))
            .bind(SqlxTimestamp::from(interval.end()))
            .bind(exclude.map(BookingUuid::into_uuid))
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: &NewBooking,
        payment: PaymentUuid,
    ) -> Result<BookingRecord, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(CREATE_BOOKING_SQL)
            .bind(booking.uuid.into_uuid())
            .bind(booking.user_uuid.into_uuid())
            .bind(booking.workstation_uuid.into_uuid())
            .bind(booking.coworking_center_uuid.into_uuid())
            .bind(payment.into_uuid())
            .bind(SqlxTimestamp::from(booking.interval.start()))
            .bind(SqlxTimestamp::from(booking.interval.end()))
            .fetch_one(&mut **tx)
            .await
    }

    /// Moves an active booking to `status`. Returns `None` if the booking is missing or no
    /// longer active.
    pub(crate) async fn update_booking_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
        status: BookingStatus,
    ) -> Result<Option<BookingRecord>, sqlx::Error> {
        query_as::<Postgres, BookingRecord>(UPDATE_BOOKING_STATUS_SQL)
            .bind(booking.into_uuid())
            .bind(status.as_str())
            .fetch_optional(&mut **tx)
            .await
    }

    /// Marks every active booking that ended before `now` as completed.
    pub(crate) async fn complete_expired_bookings(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        now: Timestamp,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(COMPLETE_EXPIRED_BOOKINGS_SQL)
            .bind(SqlxTimestamp::from(now))
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn list_bookings(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        filter: BookingFilter,
    ) -> Result<Vec<BookingRecord>, sqlx::Error> {
        let (user, center, workstation): (Option<Uuid>, Option<Uuid>, Option<Uuid>) = match filter {
            BookingFilter::User(user) => (Some(user.into_uuid()), None, None),
            BookingFilter::Center(center) => (None, Some(center.into_uuid()), None),
            BookingFilter::Workstation(workstation) => (None, None, Some(workstation.into_uuid())),
            BookingFilter::All => (None, None, None),
        };

        query_as::<Postgres, BookingRecord>(LIST_BOOKINGS_SQL)
            .bind(user)
            .bind(center)
            .bind(workstation)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for BookingRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: BookingUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            workstation_uuid: WorkstationUuid::from_uuid(row.try_get("workstation_uuid")?),
            coworking_center_uuid: CenterUuid::from_uuid(row.try_get("coworking_center_uuid")?),
            payment_uuid: row
                .try_get::<Option<Uuid>, _>("payment_uuid")?
                .map(PaymentUuid::from_uuid),
            start_time: row.try_get::<SqlxTimestamp, _>("start_time")?.to_jiff(),
            end_time: row.try_get::<SqlxTimestamp, _>("end_time")?.to_jiff(),
            status: decode_label(row, "status")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
