//! Bookings errors.

use cowork::{
    bookings::{BookingError, BookingStatus},
    money::MoneyInputError,
};
use rust_decimal::Decimal;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// `PostgreSQL` `exclusion_violation`.
const EXCLUSION_VIOLATION: &str = "23P01";

/// Errors raised by a [`BookingStore`](super::BookingStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("record already exists")]
    AlreadyExists,

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("booking overlaps an active booking")]
    Overlap,

    #[error("booking is no longer active, it is {0}")]
    NotActive(BookingStatus),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for StoreError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        if let Some(database_error) = error.as_database_error()
            && database_error.code().as_deref() == Some(EXCLUSION_VIOLATION)
        {
            return Self::Overlap;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}

/// Rejected booking input.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Interval(#[from] BookingError),

    #[error(transparent)]
    Currency(#[from] MoneyInputError),

    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },
}

#[derive(Debug, Error)]
pub enum BookingsServiceError {
    #[error("not found")]
    NotFound,

    #[error("access denied")]
    AccessDenied,

    #[error("booking is already cancelled")]
    AlreadyCancelled,

    #[error("booking has already ended")]
    BookingElapsed,

    #[error("booking status cannot change from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("invalid booking: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for BookingsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl From<Error> for BookingsServiceError {
    fn from(error: Error) -> Self {
        StoreError::from(error).into()
    }
}

impl From<BookingError> for BookingsServiceError {
    fn from(error: BookingError) -> Self {
        Self::Validation(error.into())
    }
}

impl From<MoneyInputError> for BookingsServiceError {
    fn from(error: MoneyInputError) -> Self {
        Self::Validation(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rows_surface_as_not_found() {
        assert!(matches!(
            StoreError::from(Error::RowNotFound),
            StoreError::NotFound
        ));
        assert!(matches!(
            BookingsServiceError::from(StoreError::NotFound),
            BookingsServiceError::NotFound
        ));
    }

    #[test]
    fn stale_status_is_not_a_missing_row() {
        let error = BookingsServiceError::from(StoreError::NotActive(BookingStatus::Completed));

        assert!(
            matches!(
                error,
                BookingsServiceError::Storage(StoreError::NotActive(BookingStatus::Completed))
            ),
            "expected NotActive to stay a storage error, got {error:?}"
        );
    }

    #[test]
    fn other_store_errors_are_storage_failures() {
        assert!(matches!(
            BookingsServiceError::from(StoreError::Overlap),
            BookingsServiceError::Storage(StoreError::Overlap)
        ));
        assert!(matches!(
            BookingsServiceError::from(Error::PoolTimedOut),
            BookingsServiceError::Storage(StoreError::Sql(_))
        ));
    }
}
