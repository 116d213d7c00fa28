//! Discount stacking

use decimal_percentage::Percentage;
use jiff::{Timestamp, Zoned, tz::TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    discounts::{Discount, applicable_discounts},
    money::round2,
};

/// One step of the discount trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    /// Discount identifier
    pub uuid: Uuid,

    /// Discount name
    pub name: String,

    /// Configured percentage
    pub percentage: Decimal,

    /// Amount actually taken off at this step, after capping
    pub discount_amount: Decimal,

    /// Discount description, if any
    pub description: Option<String>,
}

/// Result of layering discounts onto a price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedPrice {
    /// Total saving as a percentage of the original price
    pub discount_percentage: Decimal,

    /// Total saving
    pub discount_amount: Decimal,

    /// Price after every applied discount, never negative
    pub final_price: Decimal,

    /// Number of discounts applied
    pub discounts_applied: usize,

    /// Applied discounts in application order
    pub applied_discounts: Vec<AppliedDiscount>,
}

impl DiscountedPrice {
    /// The shape returned whenever nothing is taken off.
    pub fn undiscounted(price: Decimal) -> Self {
        Self {
            discount_percentage: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            final_price: round2(price.max(Decimal::ZERO)),
            discounts_applied: 0,
            applied_discounts: Vec::new(),
        }
    }

    /// Whether any discount was applied.
    pub fn is_discounted(&self) -> bool {
        self.discounts_applied > 0
    }
}

/// Layer every discount applicable at `as_of` onto `price`.
///
/// Applicable discounts are applied by descending priority (ties keep their input order), each
/// one taking its percentage of whatever is left after the previous ones, clamped to its cap.
/// At most `max_applied` discounts are used when a limit is given.
pub fn compute_discounted_price(
    price: Decimal,
    discounts: &[Discount],
    as_of: &Zoned,
    max_applied: Option<usize>,
) -> DiscountedPrice {
    if price <= Decimal::ZERO {
        debug!(%price, "non-positive price, skipping discounts");

        return DiscountedPrice::undiscounted(price);
    }

    let mut applicable = applicable_discounts(discounts, as_of);

    if applicable.is_empty() {
        return DiscountedPrice::undiscounted(price);
    }

    applicable.sort_by(|a, b| b.priority.cmp(&a.priority));

    let limit = max_applied.unwrap_or(usize::MAX);

    let mut remaining = price;
    let mut total = Decimal::ZERO;
    let mut applied_discounts = Vec::with_capacity(applicable.len().min(limit));

    for discount in applicable.into_iter().take(limit) {
        let rate = Percentage::from(discount.percentage / Decimal::ONE_HUNDRED);
        let amount: Decimal = rate * remaining;

        let effective = discount
            .max_discount_amount
            .map_or(amount, |cap| amount.min(cap))
            .max(Decimal::ZERO);

        remaining -= effective;
        total += effective;

        applied_discounts.push(AppliedDiscount {
            uuid: discount.uuid,
            name: discount.name.clone(),
            percentage: discount.percentage,
            discount_amount: round2(effective),
            description: discount.description.clone(),
        });
    }

    DiscountedPrice {
        discount_percentage: round2(total / price * Decimal::ONE_HUNDRED),
        discount_amount: round2(total),
        final_price: round2(remaining.max(Decimal::ZERO)),
        discounts_applied: applied_discounts.len(),
        applied_discounts,
    }
}

/// Same as [`compute_discounted_price`] for a textual `as_of` instant.
///
/// The instant is read as an RFC 3339 timestamp and evaluated in `time_zone`. An unreadable
/// instant yields the undiscounted result.
pub fn compute_discounted_price_at(
    price: Decimal,
    discounts: &[Discount],
    as_of: &str,
    time_zone: &TimeZone,
    max_applied: Option<usize>,
) -> DiscountedPrice {
    match as_of.trim().parse::<Timestamp>() {
        Ok(instant) => compute_discounted_price(
            price,
            discounts,
            &instant.to_zoned(time_zone.clone()),
            max_applied,
        ),
        Err(error) => {
            warn!(as_of, %error, "unreadable pricing instant, skipping discounts");

            DiscountedPrice::undiscounted(price)
        }
    }
}
