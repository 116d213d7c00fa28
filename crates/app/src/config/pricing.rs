//! Pricing Config

use clap::Args;
use cowork::money::{MoneyInputError, parse_currency};
use jiff::tz::TimeZone;
use thiserror::Error;

use crate::domain::bookings::PricingSettings;

#[derive(Debug, Error)]
pub enum PricingConfigError {
    #[error("unknown time zone {name}: {source}")]
    TimeZone {
        name: String,
        #[source]
        source: jiff::Error,
    },

    #[error(transparent)]
    Currency(#[from] MoneyInputError),
}

/// Quote pricing settings.
#[derive(Debug, Clone, Args)]
pub struct PricingConfig {
    /// IANA time zone discount days and hours are evaluated in
    #[arg(long, env = "COWORK_TIME_ZONE", default_value = "UTC")]
    pub time_zone: String,

    /// ISO-4217 currency quotes are issued in
    #[arg(long, env = "COWORK_CURRENCY", default_value = "RUB")]
    pub currency: String,

    /// Maximum number of discounts stacked on one price
    #[arg(long, alias = "max-applied", env = "COWORK_MAX_APPLIED_DISCOUNTS")]
    pub max_applied_discounts: Option<usize>,
}

impl PricingConfig {
    /// Resolve the configured names.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown time zone or currency.
    pub fn settings(&self) -> Result<PricingSettings, PricingConfigError> {
        let name = self.time_zone.trim();

        let time_zone = if name.eq_ignore_ascii_case("UTC") {
            TimeZone::UTC
        } else {
            TimeZone::get(name).map_err(|source| PricingConfigError::TimeZone {
                name: name.to_string(),
                source,
            })?
        };

        Ok(PricingSettings {
            time_zone,
            currency: parse_currency(&self.currency)?,
            max_applied_discounts: self.max_applied_discounts,
        })
    }
}
