//! Booking Store
//!
//! Persistence seam for the bookings service. Every method returns [`StoreError`], so services
//! can be exercised against [`MockBookingStore`] without a database.

use async_trait::async_trait;
use cowork::{
    bookings::{BookingStatus, Interval},
    discounts::Discount,
};
use jiff::Timestamp;
use mockall::automock;
use sqlx::{Postgres, Transaction};

use crate::{
    database::Db,
    domain::{
        bookings::{
            data::{BookingFilter, NewBooking, NewPayment, PaymentUpdate},
            errors::StoreError,
            records::{BookingRecord, BookingUuid, PaymentRecord, PaymentUuid},
            repositories::{PgBookingsRepository, PgPaymentsRepository},
            results::CreatedBooking,
        },
        discounts::repository::PgDiscountsRepository,
        users::{UserRecord, UserUuid, repository::PgUsersRepository},
        workstations::{WorkstationRecord, WorkstationUuid, repository::PgWorkstationsRepository},
    },
};

#[automock]
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_workstation(
        &self,
        workstation: WorkstationUuid,
    ) -> Result<WorkstationRecord, StoreError>;

    async fn get_booking(&self, booking: BookingUuid) -> Result<BookingRecord, StoreError>;

    async fn get_payment(&self, payment: PaymentUuid) -> Result<PaymentRecord, StoreError>;

    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, StoreError>;

    /// Active discounts, highest priority first.
    async fn list_active_discounts(&self) -> Result<Vec<Discount>, StoreError>;

    /// Earliest active booking on `workstation` overlapping `interval`, ignoring `exclude`.
    async fn find_overlapping_active_booking(
        &self,
        workstation: WorkstationUuid,
        interval: Interval,
        exclude: Option<BookingUuid>,
    ) -> Result<Option<BookingRecord>, StoreError>;

    /// Stores a booking and its payment atomically.
    ///
    /// Returns [`StoreError::Overlap`] if an active booking on the same workstation overlaps
    /// the new one by the time the write happens.
    async fn create_booking(
        &self,
        payment: NewPayment,
        booking: NewBooking,
    ) -> Result<CreatedBooking, StoreError>;

    /// Moves an active booking to `status`.
    ///
    /// Returns [`StoreError::NotActive`] with the current status if the booking left ACTIVE
    /// before the write.
    async fn update_booking_status(
        &self,
        booking: BookingUuid,
        status: BookingStatus,
    ) -> Result<BookingRecord, StoreError>;

    /// Cancels an active booking and applies the payment update, if any, in one unit.
    ///
    /// Returns [`StoreError::NotActive`] and writes nothing if the booking left ACTIVE first.
    async fn cancel_booking(
        &self,
        booking: BookingUuid,
        payment: Option<PaymentUpdate>,
    ) -> Result<BookingRecord, StoreError>;

    /// Completes every active booking that ended before `now`, returning how many changed.
    async fn complete_expired_bookings(&self, now: Timestamp) -> Result<u64, StoreError>;

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<BookingRecord>, StoreError>;
}

/// `PostgreSQL` backed [`BookingStore`].
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    db: Db,
    bookings: PgBookingsRepository,
    payments: PgPaymentsRepository,
    workstations: PgWorkstationsRepository,
    users: PgUsersRepository,
    discounts: PgDiscountsRepository,
}

impl PgBookingStore {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            bookings: PgBookingsRepository::new(),
            payments: PgPaymentsRepository::new(),
            workstations: PgWorkstationsRepository::new(),
            users: PgUsersRepository::new(),
            discounts: PgDiscountsRepository::new(),
        }
    }

    async fn transition_active_booking(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        booking: BookingUuid,
        status: BookingStatus,
    ) -> Result<BookingRecord, StoreError> {
        if let Some(record) = self.bookings.update_booking_status(tx, booking, status).await? {
            return Ok(record);
        }

        let current = self.bookings.get_booking(tx, booking).await?;

        Err(StoreError::NotActive(current.status))
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn get_workstation(
        &self,
        workstation: WorkstationUuid,
    ) -> Result<WorkstationRecord, StoreError> {
        let mut tx = self.db.begin().await?;

        let record = self.workstations.get_workstation(&mut tx, workstation).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_booking(&self, booking: BookingUuid) -> Result<BookingRecord, StoreError> {
        let mut tx = self.db.begin().await?;

        let record = self.bookings.get_booking(&mut tx, booking).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_payment(&self, payment: PaymentUuid) -> Result<PaymentRecord, StoreError> {
        let mut tx = self.db.begin().await?;

        let record = self.payments.get_payment(&mut tx, payment).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn get_user(&self, user: UserUuid) -> Result<UserRecord, StoreError> {
        let mut tx = self.db.begin().await?;

        let record = self.users.get_user(&mut tx, user).await?;

        tx.commit().await?;

        Ok(record)
    }

    async fn list_active_discounts(&self) -> Result<Vec<Discount>, StoreError> {
        let mut tx = self.db.begin().await?;

        let discounts = self.discounts.list_active_discounts(&mut tx).await?;

        tx.commit().await?;

        Ok(discounts)
    }

    async fn find_overlapping_active_booking(
        &self,
        workstation: WorkstationUuid,
        interval: Interval,
        exclude: Option<BookingUuid>,
    ) -> Result<Option<BookingRecord>, StoreError> {
        let mut tx = self.db.begin().await?;

        let conflict = self
            .bookings
            .find_overlapping_active_booking(&mut tx, workstation, interval, exclude)
            .await?;

        tx.commit().await?;

        Ok(conflict)
    }

    #[tracing::instrument(
        name = "bookings.store.create_booking",
        skip(self, payment, booking),
        fields(booking_uuid = %booking.uuid, workstation_uuid = %booking.workstation_uuid),
        err
    )]
    async fn create_booking(
        &self,
        payment: NewPayment,
        booking: NewBooking,
    ) -> Result<CreatedBooking, StoreError> {
        let mut tx = self.db.begin().await?;

        // Serialises concurrent inserts for the same workstation until commit.
        self.workstations
            .lock_workstation(&mut tx, booking.workstation_uuid)
            .await?;

        let conflict = self
            .bookings
            .find_overlapping_active_booking(
                &mut tx,
                booking.workstation_uuid,
                booking.interval,
                None,
            )
            .await?;

        if conflict.is_some() {
            return Err(StoreError::Overlap);
        }

        let payment = self.payments.create_payment(&mut tx, &payment).await?;

        let booking = self
            .bookings
            .create_booking(&mut tx, &booking, payment.uuid)
            .await?;

        tx.commit().await?;

        Ok(CreatedBooking { booking, payment })
    }

    async fn update_booking_status(
        &self,
        booking: BookingUuid,
        status: BookingStatus,
    ) -> Result<BookingRecord, StoreError> {
        let mut tx = self.db.begin().await?;

        let record = self.transition_active_booking(&mut tx, booking, status).await?;

        tx.commit().await?;

        Ok(record)
    }

    #[tracing::instrument(
        name = "bookings.store.cancel_booking",
        skip(self, payment),
        fields(booking_uuid = %booking),
        err
    )]
    async fn cancel_booking(
        &self,
        booking: BookingUuid,
        payment: Option<PaymentUpdate>,
    ) -> Result<BookingRecord, StoreError> {
        let mut tx = self.db.begin().await?;

        let record = self
            .transition_active_booking(&mut tx, booking, BookingStatus::Cancelled)
            .await?;

        if let Some(update) = payment {
            self.payments.update_payment(&mut tx, &update).await?;
        }

        tx.commit().await?;

        Ok(record)
    }

    async fn complete_expired_bookings(&self, now: Timestamp) -> Result<u64, StoreError> {
        let mut tx = self.db.begin().await?;

        let completed = self.bookings.complete_expired_bookings(&mut tx, now).await?;

        tx.commit().await?;

        Ok(completed)
    }

    async fn list_bookings(&self, filter: BookingFilter) -> Result<Vec<BookingRecord>, StoreError> {
        let mut tx = self.db.begin().await?;

        let bookings = self.bookings.list_bookings(&mut tx, filter).await?;

        tx.commit().await?;

        Ok(bookings)
    }
}
