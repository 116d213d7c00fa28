//! Bookings Service

use async_trait::async_trait;
use cowork::{
    bookings::{BookingStatus, Interval, PaymentStatus},
    discounts::compute_discounted_price,
    money::parse_currency,
    refunds::{RefundQuote, RefundableBooking, calculate_refund},
    workstations::BookingDuration,
};
use jiff::{Timestamp, tz::TimeZone};
use mockall::automock;
use rust_decimal::Decimal;
use rusty_money::iso::{self, Currency};
use tracing::{Span, info, warn};

use crate::{
    database::Db,
    domain::{
        bookings::{
            data::{BookingFilter, BookingRequest, NewBooking, NewPayment, PaymentUpdate},
            errors::{BookingsServiceError, StoreError, ValidationError},
            records::{BookingRecord, BookingUuid, PaymentUuid},
            results::{
                Availability, BookingOutcome, Cancellation, Caller, ConflictResult,
                ConflictingBooking, PriceQuote,
            },
            store::{BookingStore, PgBookingStore},
        },
        users::UserUuid,
        workstations::{CenterUuid, WorkstationUuid},
    },
};

/// How quotes are priced.
#[derive(Debug, Clone)]
pub struct PricingSettings {
    /// Zone in which discount days and hours are evaluated.
    pub time_zone: TimeZone,

    /// Currency quotes are issued in.
    pub currency: &'static Currency,

    /// Upper bound on stacked discounts, if any.
    pub max_applied_discounts: Option<usize>,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            time_zone: TimeZone::UTC,
            currency: iso::RUB,
            max_applied_discounts: None,
        }
    }
}

/// [`BookingsService`] over any [`BookingStore`].
#[derive(Debug, Clone)]
pub struct StoreBookingsService<S> {
    store: S,
    settings: PricingSettings,
}

/// Bookings service backed by `PostgreSQL`.
pub type PgBookingsService = StoreBookingsService<PgBookingStore>;

impl<S: BookingStore> StoreBookingsService<S> {
    #[must_use]
    pub fn new(store: S, settings: PricingSettings) -> Self {
        Self { store, settings }
    }

    async fn resolve_caller(&self, user: UserUuid) -> Result<Caller, BookingsServiceError> {
        let record = self.store.get_user(user).await?;

        Ok(Caller::from(&record))
    }

    /// Checks shared by cancelling and previewing a cancellation, in the order callers see them.
    async fn authorize_cancellation(
        &self,
        booking: BookingUuid,
        caller: UserUuid,
        now: Timestamp,
    ) -> Result<(BookingRecord, Caller), BookingsServiceError> {
        let booking = self.store.get_booking(booking).await?;

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingsServiceError::AlreadyCancelled);
        }

        let caller = self.resolve_caller(caller).await?;

        if !caller.may_manage(booking.user_uuid) {
            return Err(BookingsServiceError::AccessDenied);
        }

        if booking.interval()?.has_ended(now) {
            return Err(BookingsServiceError::BookingElapsed);
        }

        if !booking.status.can_transition_to(BookingStatus::Cancelled) {
            return Err(BookingsServiceError::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Cancelled,
            });
        }

        Ok((booking, caller))
    }

    /// Refund owed for cancelling `booking` now. An unreadable payment refunds nothing.
    async fn refund_for(
        &self,
        booking: &BookingRecord,
        caller: Caller,
        now: Timestamp,
    ) -> (RefundQuote, Option<PaymentUuid>) {
        let payment = match booking.payment_uuid {
            Some(payment_uuid) => match self.store.get_payment(payment_uuid).await {
                Ok(payment) => Some(payment),
                Err(error) => {
                    warn!(
                        booking_uuid = %booking.uuid,
                        payment_uuid = %payment_uuid,
                        %error,
                        "failed to load payment, refunding nothing"
                    );

                    None
                }
            },
            None => None,
        };

        let refund = calculate_refund(
            &RefundableBooking {
                start_time: booking.start_time,
                end_time: booking.end_time,
                final_price: payment.as_ref().map(|payment| payment.final_price),
            },
            now,
            caller.cancelled_by(),
        );

        (refund, payment.map(|payment| payment.uuid))
    }

    async fn conflict_for(
        &self,
        workstation: WorkstationUuid,
        interval: Interval,
    ) -> Result<ConflictResult, BookingsServiceError> {
        let existing = self
            .store
            .find_overlapping_active_booking(workstation, interval, None)
            .await?;

        Ok(ConflictResult::new(
            existing.as_ref().map(ConflictingBooking::from),
        ))
    }
}

impl PgBookingsService {
    #[must_use]
    pub fn postgres(db: Db, settings: PricingSettings) -> Self {
        Self::new(PgBookingStore::new(db), settings)
    }
}

fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeAmount { field, value });
    }

    Ok(())
}

/// Maps a booking that left ACTIVE between the read and the write onto the rejected transition.
fn stale_transition(error: StoreError, to: BookingStatus) -> BookingsServiceError {
    match error {
        StoreError::NotActive(from) => BookingsServiceError::InvalidTransition { from, to },
        other => other.into(),
    }
}

fn validate_request(request: &BookingRequest) -> Result<Interval, ValidationError> {
    let interval = Interval::new(request.start_time, request.end_time)?;

    parse_currency(&request.currency)?;

    ensure_non_negative("base_price", request.base_price)?;
    ensure_non_negative("discount_percentage", request.discount_percentage)?;
    ensure_non_negative("final_price", request.final_price)?;

    Ok(interval)
}

#[async_trait]
impl<S: BookingStore> BookingsService for StoreBookingsService<S> {
    #[tracing::instrument(
        name = "bookings.service.create_booking",
        skip(self, request),
        fields(
            caller_uuid = %caller,
            booking_uuid = %request.uuid,
            workstation_uuid = %request.workstation_uuid,
            conflict = tracing::field::Empty
        ),
        err
    )]
    async fn create_booking(
        &self,
        caller: UserUuid,
        request: BookingRequest,
    ) -> Result<BookingOutcome, BookingsServiceError> {
        let interval = validate_request(&request)?;

        let caller = self.resolve_caller(caller).await?;
        let workstation = self.store.get_workstation(request.workstation_uuid).await?;

        let span = Span::current();

        // Unlocked fast path that names the conflicting booking; the store re-checks under the
        // workstation lock.
        if let Some(existing) = self
            .store
            .find_overlapping_active_booking(workstation.uuid, interval, None)
            .await?
        {
            span.record("conflict", tracing::field::display(existing.uuid));

            return Ok(BookingOutcome::Conflict(ConflictResult::new(Some(
                ConflictingBooking::from(&existing),
            ))));
        }

        let expected = workstation.pricing.expected_base_price(
            workstation.kind,
            request.booking_duration,
            &interval,
        );

        if expected != request.base_price {
            warn!(
                expected = %expected,
                supplied = %request.base_price,
                kind = %workstation.kind,
                "supplied base price differs from the workstation price"
            );
        }

        let payment = NewPayment {
            uuid: PaymentUuid::new(),
            base_price: request.base_price,
            discount_percentage: request.discount_percentage,
            final_price: request.final_price,
            currency: request.currency.trim().to_ascii_uppercase(),
        };

        let booking = NewBooking {
            uuid: request.uuid,
            user_uuid: caller.uuid,
            workstation_uuid: workstation.uuid,
            coworking_center_uuid: workstation.coworking_center_uuid,
            interval,
        };

        match self.store.create_booking(payment, booking).await {
            Ok(created) => {
                info!(
                    booking_uuid = %created.booking.uuid,
                    payment_uuid = %created.payment.uuid,
                    final_price = %created.payment.final_price,
                    "created booking"
                );

                Ok(BookingOutcome::Created(created))
            }
            Err(StoreError::Overlap) => {
                let conflict = self.conflict_for(workstation.uuid, interval).await?;

                span.record("conflict", "storage");

                Ok(BookingOutcome::Conflict(conflict))
            }
            Err(error) => Err(error.into()),
        }
    }

    #[tracing::instrument(
        name = "bookings.service.update_booking_status",
        skip(self),
        fields(booking_uuid = %booking, caller_uuid = %caller, status = %status),
        err
    )]
    async fn update_booking_status(
        &self,
        booking: BookingUuid,
        caller: UserUuid,
        status: BookingStatus,
    ) -> Result<BookingRecord, BookingsServiceError> {
        let current = self.store.get_booking(booking).await?;

        if current.user_uuid != caller {
            return Err(BookingsServiceError::AccessDenied);
        }

        if !current.status.can_transition_to(status) {
            return Err(BookingsServiceError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let updated = match status {
            // Payment is marked refunded with no amount; refund rules belong to cancel_booking.
            BookingStatus::Cancelled => {
                let payment = current.payment_uuid.map(|payment_uuid| PaymentUpdate {
                    payment_uuid,
                    status: PaymentStatus::Refunded,
                    refund_amount: None,
                });

                self.store.cancel_booking(current.uuid, payment).await
            }
            _ => self.store.update_booking_status(current.uuid, status).await,
        }
        .map_err(|error| stale_transition(error, status))?;

        info!(booking_uuid = %updated.uuid, status = %updated.status, "updated booking status");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "bookings.service.cancel_booking",
        skip(self),
        fields(
            booking_uuid = %booking,
            caller_uuid = %caller,
            refund_amount = tracing::field::Empty
        ),
        err
    )]
    async fn cancel_booking(
        &self,
        booking: BookingUuid,
        caller: UserUuid,
        now: Timestamp,
    ) -> Result<Cancellation, BookingsServiceError> {
        let (booking, caller) = self.authorize_cancellation(booking, caller, now).await?;

        let (refund, payment_uuid) = self.refund_for(&booking, caller, now).await;

        Span::current().record(
            "refund_amount",
            tracing::field::display(refund.refund_amount),
        );

        let payment = payment_uuid
            .filter(|_| refund.refund_amount > Decimal::ZERO)
            .map(|payment_uuid| PaymentUpdate {
                payment_uuid,
                status: PaymentStatus::Refunded,
                refund_amount: Some(refund.refund_amount),
            });

        self.store
            .cancel_booking(booking.uuid, payment)
            .await
            .map_err(|error| match error {
                StoreError::NotActive(BookingStatus::Cancelled) => {
                    BookingsServiceError::AlreadyCancelled
                }
                other => stale_transition(other, BookingStatus::Cancelled),
            })?;

        info!(
            booking_uuid = %booking.uuid,
            refund_amount = %refund.refund_amount,
            reason = %refund.reason,
            "cancelled booking"
        );

        Ok(Cancellation {
            message: "Booking cancelled".to_string(),
            cancelled_by: caller.cancelled_by(),
            refund,
        })
    }

    async fn preview_refund(
        &self,
        booking: BookingUuid,
        caller: UserUuid,
        now: Timestamp,
    ) -> Result<RefundQuote, BookingsServiceError> {
        let (booking, caller) = self.authorize_cancellation(booking, caller, now).await?;

        let (refund, _) = self.refund_for(&booking, caller, now).await;

        Ok(refund)
    }

    async fn check_availability(
        &self,
        workstation: WorkstationUuid,
        start_time: Timestamp,
        end_time: Timestamp,
        exclude: Option<BookingUuid>,
    ) -> Result<Availability, BookingsServiceError> {
        let interval = Interval::new(start_time, end_time)?;

        let workstation = self.store.get_workstation(workstation).await?;

        let conflict = self
            .store
            .find_overlapping_active_booking(workstation.uuid, interval, exclude)
            .await?;

        Ok(Availability {
            is_available: conflict.is_none(),
            workstation,
            conflicting_booking: conflict.as_ref().map(ConflictingBooking::from),
        })
    }

    #[tracing::instrument(
        name = "bookings.service.quote_price",
        skip(self),
        fields(workstation_uuid = %workstation),
        err
    )]
    async fn quote_price(
        &self,
        workstation: WorkstationUuid,
        duration: BookingDuration,
        as_of: Timestamp,
    ) -> Result<PriceQuote, BookingsServiceError> {
        let workstation = self.store.get_workstation(workstation).await?;

        let base_price = workstation.pricing.unit_price(workstation.kind, duration);

        let discounts = self.store.list_active_discounts().await?;

        let discount = compute_discounted_price(
            base_price,
            &discounts,
            &as_of.to_zoned(self.settings.time_zone.clone()),
            self.settings.max_applied_discounts,
        );

        Ok(PriceQuote {
            workstation_uuid: workstation.uuid,
            booking_duration: duration,
            base_price,
            currency: self.settings.currency.iso_alpha_code.to_string(),
            discount,
        })
    }

    async fn list_user_bookings(
        &self,
        caller: UserUuid,
    ) -> Result<Vec<BookingRecord>, BookingsServiceError> {
        Ok(self.store.list_bookings(BookingFilter::User(caller)).await?)
    }

    async fn list_center_bookings(
        &self,
        center: CenterUuid,
    ) -> Result<Vec<BookingRecord>, BookingsServiceError> {
        Ok(self.store.list_bookings(BookingFilter::Center(center)).await?)
    }

    async fn list_workstation_bookings(
        &self,
        workstation: WorkstationUuid,
    ) -> Result<Vec<BookingRecord>, BookingsServiceError> {
        Ok(self
            .store
            .list_bookings(BookingFilter::Workstation(workstation))
            .await?)
    }

    async fn list_all_bookings(
        &self,
        caller: UserUuid,
    ) -> Result<Vec<BookingRecord>, BookingsServiceError> {
        let caller = self.resolve_caller(caller).await?;

        if !caller.role.is_staff() {
            return Err(BookingsServiceError::AccessDenied);
        }

        Ok(self.store.list_bookings(BookingFilter::All).await?)
    }
}

#[automock]
#[async_trait]
pub trait BookingsService: Send + Sync {
    /// Books a workstation, or reports the active booking in the way.
    ///
    /// Supplied prices are stored as given; a base price that disagrees with the workstation's
    /// own pricing is only logged.
    async fn create_booking(
        &self,
        caller: UserUuid,
        request: BookingRequest,
    ) -> Result<BookingOutcome, BookingsServiceError>;

    /// Moves an active booking to `status` on behalf of its owner.
    async fn update_booking_status(
        &self,
        booking: BookingUuid,
        caller: UserUuid,
        status: BookingStatus,
    ) -> Result<BookingRecord, BookingsServiceError>;

    /// Cancels a booking and refunds the payment according to the refund policy.
    async fn cancel_booking(
        &self,
        booking: BookingUuid,
        caller: UserUuid,
        now: Timestamp,
    ) -> Result<Cancellation, BookingsServiceError>;

    /// The refund [`cancel_booking`](Self::cancel_booking) would give, without cancelling.
    async fn preview_refund(
        &self,
        booking: BookingUuid,
        caller: UserUuid,
        now: Timestamp,
    ) -> Result<RefundQuote, BookingsServiceError>;

    async fn check_availability(
        &self,
        workstation: WorkstationUuid,
        start_time: Timestamp,
        end_time: Timestamp,
        exclude: Option<BookingUuid>,
    ) -> Result<Availability, BookingsServiceError>;

    /// Prices one billing period of a workstation with the discounts active at `as_of`.
    async fn quote_price(
        &self,
        workstation: WorkstationUuid,
        duration: BookingDuration,
        as_of: Timestamp,
    ) -> Result<PriceQuote, BookingsServiceError>;

    async fn list_user_bookings(
        &self,
        caller: UserUuid,
    ) -> Result<Vec<BookingRecord>, BookingsServiceError>;

    async fn list_center_bookings(
        &self,
        center: CenterUuid,
    ) -> Result<Vec<BookingRecord>, BookingsServiceError>;

    async fn list_workstation_bookings(
        &self,
        workstation: WorkstationUuid,
    ) -> Result<Vec<BookingRecord>, BookingsServiceError>;

    /// Every booking; staff only.
    async fn list_all_bookings(
        &self,
        caller: UserUuid,
    ) -> Result<Vec<BookingRecord>, BookingsServiceError>;
}

#[cfg(test)]
mod tests {
    use cowork::{
        discounts::Discount,
        refunds::{CancelledBy, RefundReason},
        workstations::{WorkstationKind, WorkstationPricing},
    };
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        domain::{
            bookings::{records::PaymentRecord, results::CreatedBooking, store::MockBookingStore},
            users::{Role, UserRecord},
            workstations::WorkstationRecord,
        },
        test::helpers::{at, discount, hourly_request},
    };

    use super::*;

    fn user(role: Role) -> UserRecord {
        UserRecord {
            uuid: UserUuid::new(),
            name: format!("{role} user"),
            role,
            created_at: at("2025-01-01T00:00:00Z"),
            updated_at: at("2025-01-01T00:00:00Z"),
        }
    }

    fn meeting_room(price_per_hour: Option<Decimal>) -> WorkstationRecord {
        WorkstationRecord {
            uuid: WorkstationUuid::new(),
            coworking_center_uuid: CenterUuid::new(),
            name: "Room 1".to_string(),
            kind: WorkstationKind::MeetingRoom,
            pricing: WorkstationPricing {
                price_per_hour,
                ..WorkstationPricing::default()
            },
            created_at: at("2025-01-01T00:00:00Z"),
            updated_at: at("2025-01-01T00:00:00Z"),
        }
    }

    fn booking(
        owner: &UserRecord,
        workstation: &WorkstationRecord,
        start: &str,
        end: &str,
        payment: Option<PaymentUuid>,
    ) -> BookingRecord {
        BookingRecord {
            uuid: BookingUuid::new(),
            user_uuid: owner.uuid,
            workstation_uuid: workstation.uuid,
            coworking_center_uuid: workstation.coworking_center_uuid,
            payment_uuid: payment,
            start_time: at(start),
            end_time: at(end),
            status: BookingStatus::Active,
            created_at: at("2025-03-01T00:00:00Z"),
            updated_at: at("2025-03-01T00:00:00Z"),
        }
    }

    fn payment(final_price: i64) -> PaymentRecord {
        PaymentRecord {
            uuid: PaymentUuid::new(),
            base_price: Decimal::from(final_price),
            discount_percentage: Decimal::ZERO,
            final_price: Decimal::from(final_price),
            currency: "RUB".to_string(),
            status: PaymentStatus::Completed,
            refund_amount: None,
            created_at: at("2025-03-01T00:00:00Z"),
            updated_at: at("2025-03-01T00:00:00Z"),
        }
    }

    fn weekday_morning_discounts() -> Vec<Discount> {
        let mut early_bird = discount("Early bird", 20, 10);
        early_bird.applicable_days = smallvec![
            "monday".to_string(),
            "tuesday".to_string(),
            "wednesday".to_string(),
            "thursday".to_string(),
            "friday".to_string()
        ];
        early_bird.applicable_hours = Some("07:00-10:00".to_string());

        let mut weekday = discount("Weekday", 10, 5);
        weekday.applicable_days = early_bird.applicable_days.clone();

        vec![weekday, early_bird]
    }

    fn expect_user(store: &mut MockBookingStore, record: &UserRecord) {
        let record = record.clone();

        store
            .expect_get_user()
            .withf({
                let uuid = record.uuid;
                move |user| *user == uuid
            })
            .returning(move |_| Ok(record.clone()));
    }

    fn expect_workstation(store: &mut MockBookingStore, record: &WorkstationRecord) {
        let record = record.clone();

        store
            .expect_get_workstation()
            .returning(move |_| Ok(record.clone()));
    }

    fn expect_booking(store: &mut MockBookingStore, record: &BookingRecord) {
        let record = record.clone();

        store
            .expect_get_booking()
            .returning(move |_| Ok(record.clone()));
    }

    /// Answers overlap queries from `existing` the way the database would.
    fn expect_overlaps(store: &mut MockBookingStore, existing: Vec<BookingRecord>) {
        store
            .expect_find_overlapping_active_booking()
            .returning(move |workstation, interval, exclude| {
                Ok(existing
                    .iter()
                    .filter(|booking| booking.workstation_uuid == workstation)
                    .filter(|booking| booking.status == BookingStatus::Active)
                    .filter(|booking| Some(booking.uuid) != exclude)
                    .filter(|booking| {
                        booking
                            .interval()
                            .is_ok_and(|existing| existing.overlaps(&interval))
                    })
                    .min_by_key(|booking| booking.start_time)
                    .cloned())
            });
    }

    fn expect_created(store: &mut MockBookingStore) {
        store
            .expect_create_booking()
            .times(1)
            .returning(|payment, booking| {
                Ok(CreatedBooking {
                    booking: BookingRecord {
                        uuid: booking.uuid,
                        user_uuid: booking.user_uuid,
                        workstation_uuid: booking.workstation_uuid,
                        coworking_center_uuid: booking.coworking_center_uuid,
                        payment_uuid: Some(payment.uuid),
                        start_time: booking.interval.start(),
                        end_time: booking.interval.end(),
                        status: BookingStatus::Active,
                        created_at: booking.interval.start(),
                        updated_at: booking.interval.start(),
                    },
                    payment: PaymentRecord {
                        uuid: payment.uuid,
                        base_price: payment.base_price,
                        discount_percentage: payment.discount_percentage,
                        final_price: payment.final_price,
                        currency: payment.currency,
                        status: PaymentStatus::Completed,
                        refund_amount: None,
                        created_at: booking.interval.start(),
                        updated_at: booking.interval.start(),
                    },
                })
            });
    }

    fn service(store: MockBookingStore) -> StoreBookingsService<MockBookingStore> {
        StoreBookingsService::new(store, PricingSettings::default())
    }

    #[tokio::test]
    async fn overlapping_request_returns_conflict_without_writing() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(Some(Decimal::from(1000)));
        let existing = booking(
            &member,
            &room,
            "2025-03-10T09:00:00Z",
            "2025-03-10T18:00:00Z",
            None,
        );

        let mut store = MockBookingStore::new();
        expect_user(&mut store, &member);
        expect_workstation(&mut store, &room);
        expect_overlaps(&mut store, vec![existing.clone()]);
        store.expect_create_booking().never();

        let outcome = service(store)
            .create_booking(
                member.uuid,
                hourly_request(&room, "2025-03-10T17:00:00Z", "2025-03-10T19:00:00Z", 1000),
            )
            .await?;

        let BookingOutcome::Conflict(conflict) = outcome else {
            panic!("expected Conflict, got {outcome:?}");
        };

        assert_eq!(
            conflict.conflicting_booking,
            Some(ConflictingBooking::from(&existing))
        );

        Ok(())
    }

    #[tokio::test]
    async fn booking_starting_when_another_ends_is_created() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(Some(Decimal::from(1000)));
        let existing = booking(
            &member,
            &room,
            "2025-03-10T09:00:00Z",
            "2025-03-10T18:00:00Z",
            None,
        );

        let mut store = MockBookingStore::new();
        expect_user(&mut store, &member);
        expect_workstation(&mut store, &room);
        expect_overlaps(&mut store, vec![existing]);
        expect_created(&mut store);

        let outcome = service(store)
            .create_booking(
                member.uuid,
                hourly_request(&room, "2025-03-10T18:00:00Z", "2025-03-10T19:00:00Z", 1000),
            )
            .await?;

        assert!(
            matches!(
                outcome,
                BookingOutcome::Created(ref created)
                    if created.booking.status == BookingStatus::Active
            ),
            "expected Created, got {outcome:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn storage_overlap_is_reported_as_conflict() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(Some(Decimal::from(1000)));
        let winner = booking(
            &member,
            &room,
            "2025-03-10T09:00:00Z",
            "2025-03-10T10:00:00Z",
            None,
        );

        let mut store = MockBookingStore::new();
        expect_user(&mut store, &member);
        expect_workstation(&mut store, &room);

        // The concurrent booking only becomes visible after the insert loses the race.
        let mut seq = mockall::Sequence::new();
        store
            .expect_find_overlapping_active_booking()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(None));
        store
            .expect_create_booking()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(StoreError::Overlap));
        store
            .expect_find_overlapping_active_booking()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move |_, _, _| Ok(Some(winner.clone())));

        let outcome = service(store)
            .create_booking(
                member.uuid,
                hourly_request(&room, "2025-03-10T09:30:00Z", "2025-03-10T10:30:00Z", 1000),
            )
            .await?;

        assert!(
            matches!(
                outcome,
                BookingOutcome::Conflict(ConflictResult {
                    conflicting_booking: Some(_),
                    ..
                })
            ),
            "expected Conflict, got {outcome:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected_before_storage() {
        let member = user(Role::User);
        let room = meeting_room(None);

        let service = service(MockBookingStore::new());

        let inverted = hourly_request(
            &room,
            "2025-03-10T10:00:00Z",
            "2025-03-10T09:00:00Z",
            1000,
        );
        let result = service.create_booking(member.uuid, inverted).await;

        assert!(
            matches!(
                result,
                Err(BookingsServiceError::Validation(ValidationError::Interval(_)))
            ),
            "expected Interval validation error, got {result:?}"
        );

        let mut doubloons = hourly_request(
            &room,
            "2025-03-10T09:00:00Z",
            "2025-03-10T10:00:00Z",
            1000,
        );
        doubloons.currency = "XXX".to_string();
        let result = service.create_booking(member.uuid, doubloons).await;

        assert!(
            matches!(
                result,
                Err(BookingsServiceError::Validation(ValidationError::Currency(_)))
            ),
            "expected Currency validation error, got {result:?}"
        );

        let mut negative = hourly_request(
            &room,
            "2025-03-10T09:00:00Z",
            "2025-03-10T10:00:00Z",
            1000,
        );
        negative.final_price = Decimal::from(-1);
        let result = service.create_booking(member.uuid, negative).await;

        assert!(
            matches!(
                result,
                Err(BookingsServiceError::Validation(
                    ValidationError::NegativeAmount {
                        field: "final_price",
                        ..
                    }
                ))
            ),
            "expected NegativeAmount, got {result:?}"
        );
    }

    #[tokio::test]
    async fn quoted_final_price_is_what_gets_charged() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(Some(Decimal::from(1000)));

        let mut store = MockBookingStore::new();
        expect_user(&mut store, &member);
        expect_workstation(&mut store, &room);
        expect_overlaps(&mut store, Vec::new());

        let discounts = weekday_morning_discounts();
        store
            .expect_list_active_discounts()
            .returning(move || Ok(discounts.clone()));

        store
            .expect_create_booking()
            .withf(|payment, _| {
                payment.final_price == Decimal::from(720)
                    && payment.discount_percentage == Decimal::from(28)
            })
            .times(1)
            .returning(|_, _| Err(StoreError::InvalidData));

        let service = service(store);

        let quote = service
            .quote_price(room.uuid, BookingDuration::Hour, at("2025-03-10T08:30:00Z"))
            .await?;

        assert_eq!(quote.base_price, Decimal::from(1000));
        assert_eq!(quote.final_price(), Decimal::from(720));
        assert_eq!(quote.currency, "RUB");

        let mut booking = hourly_request(
            &room,
            "2025-03-10T09:00:00Z",
            "2025-03-10T10:00:00Z",
            1000,
        );
        booking.base_price = quote.base_price;
        booking.discount_percentage = quote.discount.discount_percentage;
        booking.final_price = quote.final_price();

        // The mock rejects the write once it has checked the charged amount.
        let result = service.create_booking(member.uuid, booking).await;

        assert!(
            matches!(
                result,
                Err(BookingsServiceError::Storage(StoreError::InvalidData))
            ),
            "expected the stubbed storage error, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn quote_uses_fallback_price_for_unpriced_rooms() -> TestResult {
        let room = meeting_room(Some(Decimal::ZERO));

        let mut store = MockBookingStore::new();
        expect_workstation(&mut store, &room);
        store
            .expect_list_active_discounts()
            .returning(|| Ok(Vec::new()));

        let quote = service(store)
            .quote_price(room.uuid, BookingDuration::Hour, at("2025-03-15T12:00:00Z"))
            .await?;

        assert_eq!(quote.base_price, Decimal::from(1000));
        assert_eq!(quote.final_price(), Decimal::from(1000));
        assert!(!quote.discount.is_discounted());

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_twice_is_rejected_without_writes() {
        let member = user(Role::User);
        let room = meeting_room(None);
        let mut cancelled = booking(
            &member,
            &room,
            "2025-03-12T09:00:00Z",
            "2025-03-12T10:00:00Z",
            None,
        );
        cancelled.status = BookingStatus::Cancelled;

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &cancelled);
        store.expect_cancel_booking().never();

        let result = service(store)
            .cancel_booking(cancelled.uuid, member.uuid, at("2025-03-10T09:00:00Z"))
            .await;

        assert!(
            matches!(result, Err(BookingsServiceError::AlreadyCancelled)),
            "expected AlreadyCancelled, got {result:?}"
        );
    }

    #[tokio::test]
    async fn elapsed_bookings_cannot_be_cancelled_by_anyone() {
        let member = user(Role::User);
        let manager = user(Role::Manager);
        let room = meeting_room(None);
        let past = booking(
            &member,
            &room,
            "2025-03-10T09:00:00Z",
            "2025-03-10T10:00:00Z",
            None,
        );

        for caller in [&member, &manager] {
            let mut store = MockBookingStore::new();
            expect_booking(&mut store, &past);
            expect_user(&mut store, caller);
            store.expect_cancel_booking().never();

            let result = service(store)
                .cancel_booking(past.uuid, caller.uuid, at("2025-03-10T10:00:00Z"))
                .await;

            assert!(
                matches!(result, Err(BookingsServiceError::BookingElapsed)),
                "expected BookingElapsed for {}, got {result:?}",
                caller.role
            );
        }
    }

    #[tokio::test]
    async fn strangers_cannot_cancel() {
        let owner = user(Role::User);
        let stranger = user(Role::User);
        let room = meeting_room(None);
        let upcoming = booking(
            &owner,
            &room,
            "2025-03-12T09:00:00Z",
            "2025-03-12T10:00:00Z",
            None,
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        expect_user(&mut store, &stranger);
        store.expect_cancel_booking().never();

        let result = service(store)
            .cancel_booking(upcoming.uuid, stranger.uuid, at("2025-03-10T09:00:00Z"))
            .await;

        assert!(
            matches!(result, Err(BookingsServiceError::AccessDenied)),
            "expected AccessDenied, got {result:?}"
        );
    }

    #[tokio::test]
    async fn owner_cancelling_early_gets_a_full_refund() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(None);
        let paid = payment(1200);
        let upcoming = booking(
            &member,
            &room,
            "2025-03-10T12:00:00Z",
            "2025-03-10T15:00:00Z",
            Some(paid.uuid),
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        expect_user(&mut store, &member);
        store
            .expect_get_payment()
            .returning(move |_| Ok(paid.clone()));

        let cancelled = BookingRecord {
            status: BookingStatus::Cancelled,
            ..upcoming.clone()
        };

        let payment_uuid = upcoming.payment_uuid;
        store
            .expect_cancel_booking()
            .withf(move |_, update| {
                update.as_ref().is_some_and(|update| {
                    Some(update.payment_uuid) == payment_uuid
                        && update.status == PaymentStatus::Refunded
                        && update.refund_amount == Some(Decimal::from(1200))
                })
            })
            .times(1)
            .returning(move |_, _| Ok(cancelled.clone()));

        let cancellation = service(store)
            .cancel_booking(upcoming.uuid, member.uuid, at("2025-03-10T09:30:00Z"))
            .await?;

        assert_eq!(cancellation.message, "Booking cancelled");
        assert_eq!(cancellation.cancelled_by, CancelledBy::User);
        assert_eq!(cancellation.refund.reason, RefundReason::FullRefund);
        assert!(cancellation.refund.is_full_refund);

        Ok(())
    }

    #[tokio::test]
    async fn late_owner_cancellation_leaves_payment_untouched() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(None);
        let paid = payment(1200);
        let upcoming = booking(
            &member,
            &room,
            "2025-03-10T12:00:00Z",
            "2025-03-10T15:00:00Z",
            Some(paid.uuid),
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        expect_user(&mut store, &member);
        store
            .expect_get_payment()
            .returning(move |_| Ok(paid.clone()));

        let cancelled = BookingRecord {
            status: BookingStatus::Cancelled,
            ..upcoming.clone()
        };
        store
            .expect_cancel_booking()
            .withf(|_, update| update.is_none())
            .times(1)
            .returning(move |_, _| Ok(cancelled.clone()));

        let cancellation = service(store)
            .cancel_booking(upcoming.uuid, member.uuid, at("2025-03-10T11:30:00Z"))
            .await?;

        assert_eq!(cancellation.refund.refund_amount, Decimal::ZERO);
        assert_eq!(cancellation.refund.reason, RefundReason::NoRefund);

        Ok(())
    }

    #[tokio::test]
    async fn staff_cancellations_refund_in_full() -> TestResult {
        let member = user(Role::User);
        let admin = user(Role::Admin);
        let room = meeting_room(None);
        let paid = payment(1200);
        let upcoming = booking(
            &member,
            &room,
            "2025-03-10T12:00:00Z",
            "2025-03-10T15:00:00Z",
            Some(paid.uuid),
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        expect_user(&mut store, &admin);
        store
            .expect_get_payment()
            .returning(move |_| Ok(paid.clone()));

        let cancelled = BookingRecord {
            status: BookingStatus::Cancelled,
            ..upcoming.clone()
        };
        store
            .expect_cancel_booking()
            .withf(|_, update| {
                update
                    .as_ref()
                    .is_some_and(|update| update.refund_amount == Some(Decimal::from(1200)))
            })
            .times(1)
            .returning(move |_, _| Ok(cancelled.clone()));

        let cancellation = service(store)
            .cancel_booking(upcoming.uuid, admin.uuid, at("2025-03-10T11:59:00Z"))
            .await?;

        assert_eq!(cancellation.cancelled_by, CancelledBy::Manager);
        assert_eq!(cancellation.refund.reason, RefundReason::CancelledByManager);

        Ok(())
    }

    #[tokio::test]
    async fn unreadable_payment_degrades_to_no_refund() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(None);
        let upcoming = booking(
            &member,
            &room,
            "2025-03-10T12:00:00Z",
            "2025-03-10T15:00:00Z",
            Some(PaymentUuid::new()),
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        expect_user(&mut store, &member);
        store
            .expect_get_payment()
            .returning(|_| Err(StoreError::InvalidData));

        let cancelled = BookingRecord {
            status: BookingStatus::Cancelled,
            ..upcoming.clone()
        };
        store
            .expect_cancel_booking()
            .withf(|_, update| update.is_none())
            .times(1)
            .returning(move |_, _| Ok(cancelled.clone()));

        let cancellation = service(store)
            .cancel_booking(upcoming.uuid, member.uuid, at("2025-03-09T09:00:00Z"))
            .await?;

        assert_eq!(cancellation.refund.refund_amount, Decimal::ZERO);
        assert_eq!(cancellation.refund.reason, RefundReason::NoPayment);

        Ok(())
    }

    #[tokio::test]
    async fn refund_preview_never_writes() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(None);
        let paid = payment(1200);
        let upcoming = booking(
            &member,
            &room,
            "2025-03-10T12:00:00Z",
            "2025-03-10T15:00:00Z",
            Some(paid.uuid),
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        expect_user(&mut store, &member);
        store
            .expect_get_payment()
            .returning(move |_| Ok(paid.clone()));
        store.expect_cancel_booking().never();

        let refund = service(store)
            .preview_refund(upcoming.uuid, member.uuid, at("2025-03-10T10:30:00Z"))
            .await?;

        assert_eq!(refund.refund_amount, Decimal::from(600));
        assert_eq!(refund.reason, RefundReason::PartialRefund);

        Ok(())
    }

    #[tokio::test]
    async fn status_update_cancels_without_refund_rules() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(None);
        let payment_uuid = PaymentUuid::new();
        let upcoming = booking(
            &member,
            &room,
            "2025-03-10T12:00:00Z",
            "2025-03-10T15:00:00Z",
            Some(payment_uuid),
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        store.expect_get_payment().never();

        let cancelled = BookingRecord {
            status: BookingStatus::Cancelled,
            ..upcoming.clone()
        };
        store
            .expect_cancel_booking()
            .withf(move |_, update| {
                *update
                    == Some(PaymentUpdate {
                        payment_uuid,
                        status: PaymentStatus::Refunded,
                        refund_amount: None,
                    })
            })
            .times(1)
            .returning(move |_, _| Ok(cancelled.clone()));

        let updated = service(store)
            .update_booking_status(upcoming.uuid, member.uuid, BookingStatus::Cancelled)
            .await?;

        assert_eq!(updated.status, BookingStatus::Cancelled);

        Ok(())
    }

    #[tokio::test]
    async fn status_update_is_owner_only_and_follows_transitions() {
        let member = user(Role::User);
        let admin = user(Role::Admin);
        let room = meeting_room(None);
        let mut completed = booking(
            &member,
            &room,
            "2025-03-10T12:00:00Z",
            "2025-03-10T15:00:00Z",
            None,
        );
        completed.status = BookingStatus::Completed;

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &completed);
        store.expect_update_booking_status().never();
        store.expect_cancel_booking().never();

        let service = service(store);

        let result = service
            .update_booking_status(completed.uuid, admin.uuid, BookingStatus::Cancelled)
            .await;

        assert!(
            matches!(result, Err(BookingsServiceError::AccessDenied)),
            "expected AccessDenied, got {result:?}"
        );

        let result = service
            .update_booking_status(completed.uuid, member.uuid, BookingStatus::Active)
            .await;

        assert!(
            matches!(
                result,
                Err(BookingsServiceError::InvalidTransition {
                    from: BookingStatus::Completed,
                    to: BookingStatus::Active
                })
            ),
            "expected InvalidTransition, got {result:?}"
        );
    }

    #[tokio::test]
    async fn booking_a_missing_workstation_is_not_found() {
        let member = user(Role::User);
        let room = meeting_room(None);

        let mut store = MockBookingStore::new();
        expect_user(&mut store, &member);
        store
            .expect_get_workstation()
            .returning(|_| Err(StoreError::NotFound));
        store.expect_find_overlapping_active_booking().never();
        store.expect_create_booking().never();

        let result = service(store)
            .create_booking(
                member.uuid,
                hourly_request(&room, "2025-03-10T09:00:00Z", "2025-03-10T10:00:00Z", 1000),
            )
            .await;

        assert!(
            matches!(result, Err(BookingsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn cancelling_a_missing_booking_is_not_found() {
        let member = user(Role::User);

        let mut store = MockBookingStore::new();
        store
            .expect_get_booking()
            .returning(|_| Err(StoreError::NotFound));
        store.expect_get_user().never();
        store.expect_cancel_booking().never();

        let result = service(store)
            .cancel_booking(BookingUuid::new(), member.uuid, at("2025-03-10T09:00:00Z"))
            .await;

        assert!(
            matches!(result, Err(BookingsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn concurrent_cancellation_reports_already_cancelled() {
        let member = user(Role::User);
        let room = meeting_room(None);
        let upcoming = booking(
            &member,
            &room,
            "2025-03-12T09:00:00Z",
            "2025-03-12T10:00:00Z",
            None,
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        expect_user(&mut store, &member);
        store
            .expect_cancel_booking()
            .times(1)
            .returning(|_, _| Err(StoreError::NotActive(BookingStatus::Cancelled)));

        let result = service(store)
            .cancel_booking(upcoming.uuid, member.uuid, at("2025-03-10T09:00:00Z"))
            .await;

        assert!(
            matches!(result, Err(BookingsServiceError::AlreadyCancelled)),
            "expected AlreadyCancelled, got {result:?}"
        );
    }

    #[tokio::test]
    async fn status_update_racing_a_cancellation_is_an_invalid_transition() {
        let member = user(Role::User);
        let room = meeting_room(None);
        let upcoming = booking(
            &member,
            &room,
            "2025-03-12T09:00:00Z",
            "2025-03-12T10:00:00Z",
            None,
        );

        let mut store = MockBookingStore::new();
        expect_booking(&mut store, &upcoming);
        store
            .expect_update_booking_status()
            .times(1)
            .returning(|_, _| Err(StoreError::NotActive(BookingStatus::Cancelled)));

        let result = service(store)
            .update_booking_status(upcoming.uuid, member.uuid, BookingStatus::Completed)
            .await;

        assert!(
            matches!(
                result,
                Err(BookingsServiceError::InvalidTransition {
                    from: BookingStatus::Cancelled,
                    to: BookingStatus::Completed
                })
            ),
            "expected InvalidTransition, got {result:?}"
        );
    }

    #[tokio::test]
    async fn availability_excludes_the_booking_being_moved() -> TestResult {
        let member = user(Role::User);
        let room = meeting_room(None);
        let existing = booking(
            &member,
            &room,
            "2025-03-10T09:00:00Z",
            "2025-03-10T18:00:00Z",
            None,
        );

        let mut store = MockBookingStore::new();
        expect_workstation(&mut store, &room);
        expect_overlaps(&mut store, vec![existing.clone()]);

        let service = service(store);

        let busy = service
            .check_availability(
                room.uuid,
                at("2025-03-10T12:00:00Z"),
                at("2025-03-10T13:00:00Z"),
                None,
            )
            .await?;

        assert!(!busy.is_available);
        assert_eq!(
            busy.conflicting_booking.map(|conflict| conflict.uuid),
            Some(existing.uuid)
        );

        let moving = service
            .check_availability(
                room.uuid,
                at("2025-03-10T12:00:00Z"),
                at("2025-03-10T13:00:00Z"),
                Some(existing.uuid),
            )
            .await?;

        assert!(moving.is_available);

        Ok(())
    }

    #[tokio::test]
    async fn availability_for_missing_workstation_is_not_found() {
        let mut store = MockBookingStore::new();
        store
            .expect_get_workstation()
            .returning(|_| Err(StoreError::NotFound));

        let result = service(store)
            .check_availability(
                WorkstationUuid::new(),
                at("2025-03-10T12:00:00Z"),
                at("2025-03-10T13:00:00Z"),
                None,
            )
            .await;

        assert!(
            matches!(result, Err(BookingsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn listing_everything_is_staff_only() -> TestResult {
        let member = user(Role::User);
        let manager = user(Role::Manager);

        let mut store = MockBookingStore::new();
        expect_user(&mut store, &member);
        expect_user(&mut store, &manager);
        store
            .expect_list_bookings()
            .withf(|filter| *filter == BookingFilter::All)
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let service = service(store);

        let result = service.list_all_bookings(member.uuid).await;

        assert!(
            matches!(result, Err(BookingsServiceError::AccessDenied)),
            "expected AccessDenied, got {result:?}"
        );

        assert!(service.list_all_bookings(manager.uuid).await?.is_empty());

        Ok(())
    }
}
