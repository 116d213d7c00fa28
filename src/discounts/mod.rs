//! Discounts
//!
//! Time and day bounded percentage discounts, the rules deciding whether one applies at a
//! given moment, and the stacker that layers the applicable ones onto a price.

use jiff::{Timestamp, Zoned};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

mod stack;
pub mod window;

pub use stack::{
    AppliedDiscount, DiscountedPrice, compute_discounted_price, compute_discounted_price_at,
};
pub use window::{HoursWindow, WindowError};

/// Largest percentage a single discount may take off.
pub const MAX_DISCOUNT_PERCENTAGE: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Validation failures for discount definitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountValidationError {
    /// Discounts must be named.
    #[error("discount name must not be blank")]
    BlankName,

    /// Percentage outside `(0, 50]`.
    #[error("discount percentage must be greater than 0 and at most 50, got {0}")]
    InvalidPercentage(Decimal),

    /// Negative absolute cap.
    #[error("maximum discount amount must not be negative, got {0}")]
    NegativeCap(Decimal),

    /// The validity window ends before it starts.
    #[error("discount end date {end} is before start date {start}")]
    InvalidDateRange {
        /// Window start
        start: Timestamp,
        /// Window end
        end: Timestamp,
    },

    /// Bad day or hour window.
    #[error(transparent)]
    Window(#[from] WindowError),
}

/// Percentage discount definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    /// Identifier reported in the applied-discount trail.
    pub uuid: Uuid,

    /// Unique display name.
    pub name: String,

    /// Optional free text shown alongside the discount.
    #[serde(default)]
    pub description: Option<String>,

    /// Percentage taken off the remaining price, in `(0, 50]`.
    pub percentage: Decimal,

    /// Absolute cap on the amount this discount may take off.
    #[serde(default)]
    pub max_discount_amount: Option<Decimal>,

    /// Remaining redemptions; zero or less disables the discount.
    #[serde(default)]
    pub usage_limit: Option<i64>,

    /// First instant the discount is valid.
    #[serde(default)]
    pub start_date: Option<Timestamp>,

    /// Last instant the discount is valid.
    #[serde(default)]
    pub end_date: Option<Timestamp>,

    /// English weekday names; empty means every day.
    #[serde(default)]
    pub applicable_days: SmallVec<[String; 7]>,

    /// Optional `HH:MM-HH:MM` local time window.
    #[serde(default)]
    pub applicable_hours: Option<String>,

    /// Inactive discounts never apply.
    pub is_active: bool,

    /// Higher priorities are applied first.
    #[serde(default)]
    pub priority: i32,
}

impl Discount {
    /// Check a definition before it is stored.
    ///
    /// # Errors
    ///
    /// Returns the first [`DiscountValidationError`] the definition violates.
    pub fn validate(&self) -> Result<(), DiscountValidationError> {
        if self.name.trim().is_empty() {
            return Err(DiscountValidationError::BlankName);
        }

        if self.percentage <= Decimal::ZERO || self.percentage > MAX_DISCOUNT_PERCENTAGE {
            return Err(DiscountValidationError::InvalidPercentage(self.percentage));
        }

        if let Some(cap) = self.max_discount_amount
            && cap < Decimal::ZERO
        {
            return Err(DiscountValidationError::NegativeCap(cap));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && end < start
        {
            return Err(DiscountValidationError::InvalidDateRange { start, end });
        }

        for day in &self.applicable_days {
            window::parse_weekday(day)?;
        }

        if let Some(window) = self.hours_window()?
            && !window.is_ordered()
        {
            return Err(WindowError::InvertedHours(window.to_string()).into());
        }

        Ok(())
    }

    /// Parsed hours window; blank strings mean "no restriction".
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::MalformedHours`] when the string is not `HH:MM-HH:MM`.
    pub fn hours_window(&self) -> Result<Option<HoursWindow>, WindowError> {
        match self.applicable_hours.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }

    /// Whether this discount applies at `as_of`.
    ///
    /// # Errors
    ///
    /// Returns a [`WindowError`] when the stored day or hour restrictions cannot be read.
    pub fn applies_at(&self, as_of: &Zoned) -> Result<bool, WindowError> {
        if !self.is_active {
            return Ok(false);
        }

        let instant = as_of.timestamp();

        if self.start_date.is_some_and(|start| instant < start) {
            return Ok(false);
        }

        if self.end_date.is_some_and(|end| instant > end) {
            return Ok(false);
        }

        if self.usage_limit.is_some_and(|limit| limit <= 0) {
            return Ok(false);
        }

        if !self.applicable_days.is_empty() {
            let today = as_of.weekday();
            let mut matched = false;

            for day in &self.applicable_days {
                if window::parse_weekday(day)? == today {
                    matched = true;
                }
            }

            if !matched {
                return Ok(false);
            }
        }

        match self.hours_window()? {
            Some(window) => Ok(window.contains(as_of)),
            None => Ok(true),
        }
    }
}

/// Keep the discounts that apply at `as_of`, in their original order.
///
/// A discount whose restrictions cannot be read is skipped and logged; it never fails the
/// whole selection.
pub fn applicable_discounts<'a>(discounts: &'a [Discount], as_of: &Zoned) -> Vec<&'a Discount> {
    discounts
        .iter()
        .filter(|discount| match discount.applies_at(as_of) {
            Ok(applies) => applies,
            Err(error) => {
                warn!(
                    discount_uuid = %discount.uuid,
                    discount_name = %discount.name,
                    %error,
                    "skipping discount with unreadable restrictions"
                );

                false
            }
        })
        .collect()
}
