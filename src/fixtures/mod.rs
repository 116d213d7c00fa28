//! Fixtures
//!
//! Discount definitions loaded from YAML, used by tests and offline quotes.

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use jiff::Timestamp;
use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use serde::Deserialize;
use smallvec::SmallVec;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    discounts::{Discount, DiscountValidationError},
    money::{MoneyInputError, parse_currency},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid amount format
    #[error("Invalid amount format: {0}")]
    InvalidAmount(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error(transparent)]
    Currency(#[from] MoneyInputError),

    /// Discount rejected by validation
    #[error("Invalid discount {key}: {source}")]
    InvalidDiscount {
        /// Fixture key of the discount
        key: String,

        /// Validation failure
        source: DiscountValidationError,
    },

    /// Discount not found
    #[error("Discount not found: {0}")]
    DiscountNotFound(String),

    /// Currency mismatch between fixture files
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No fixture loaded yet
    #[error("No discounts loaded yet; currency unknown")]
    NoCurrency,
}

/// Wrapper for discounts in YAML
#[derive(Debug, Deserialize)]
pub struct DiscountsFixture {
    /// ISO-4217 code caps are expressed in
    pub currency: String,

    /// Discounts in the order they are listed
    pub discounts: Vec<DiscountFixture>,
}

/// Discount fixture from YAML
#[derive(Debug, Deserialize)]
pub struct DiscountFixture {
    /// Lookup key
    pub key: String,

    /// Display name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Percentage string (e.g. "20%")
    pub percentage: String,

    /// Cap amount string (e.g. "150.00")
    #[serde(default)]
    pub max_discount_amount: Option<String>,

    /// Remaining redemptions
    #[serde(default)]
    pub usage_limit: Option<i64>,

    /// RFC 3339 start of validity
    #[serde(default)]
    pub start_date: Option<Timestamp>,

    /// RFC 3339 end of validity
    #[serde(default)]
    pub end_date: Option<Timestamp>,

    /// Weekday names
    #[serde(default)]
    pub applicable_days: Vec<String>,

    /// `HH:MM-HH:MM` window
    #[serde(default)]
    pub applicable_hours: Option<String>,

    /// Defaults to active
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Stacking priority
    #[serde(default)]
    pub priority: i32,
}

fn default_active() -> bool {
    true
}

impl DiscountFixture {
    /// Convert into a validated [`Discount`].
    ///
    /// # Errors
    ///
    /// Returns an error if an amount or percentage cannot be parsed or the discount is invalid.
    pub fn try_into_discount(self) -> Result<Discount, FixtureError> {
        let percentage = parse_percentage(&self.percentage)?;

        let max_discount_amount = self
            .max_discount_amount
            .as_deref()
            .map(parse_amount)
            .transpose()?;

        let discount = Discount {
            uuid: Uuid::now_v7(),
            name: self.name,
            description: self.description,
            percentage,
            max_discount_amount,
            usage_limit: self.usage_limit,
            start_date: self.start_date,
            end_date: self.end_date,
            applicable_days: SmallVec::from_vec(self.applicable_days),
            applicable_hours: self.applicable_hours,
            is_active: self.is_active,
            priority: self.priority,
        };

        discount
            .validate()
            .map_err(|source| FixtureError::InvalidDiscount {
                key: self.key,
                source,
            })?;

        Ok(discount)
    }
}

/// Parse a percentage string such as `"12.5%"` into percentage points.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidPercentage`] if the string is not a number.
pub fn parse_percentage(raw: &str) -> Result<Decimal, FixtureError> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();

    Decimal::from_str(number).map_err(|_err| FixtureError::InvalidPercentage(raw.to_string()))
}

/// Parse a plain decimal amount such as `"150.00"`.
///
/// # Errors
///
/// Returns [`FixtureError::InvalidAmount`] if the string is not a number.
pub fn parse_amount(raw: &str) -> Result<Decimal, FixtureError> {
    Decimal::from_str(raw.trim()).map_err(|_err| FixtureError::InvalidAmount(raw.to_string()))
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Loaded discounts in file order
    discounts: Vec<Discount>,

    /// Fixture keys, parallel to `discounts`
    keys: Vec<String>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            discounts: Vec::new(),
            keys: Vec::new(),
            currency: None,
        }
    }

    /// Load discounts from `<base>/discounts/<name>.yml`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_discounts(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let file_path = self.base_path.join("discounts").join(format!("{name}.yml"));

        self.load_discounts_file(&file_path)
    }

    /// Load discounts from an arbitrary YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated, or if its currency
    /// differs from what is already loaded.
    pub fn load_discounts_file(&mut self, path: &Path) -> Result<&mut Self, FixtureError> {
        let contents = fs::read_to_string(path)?;
        let fixture: DiscountsFixture = serde_norway::from_str(&contents)?;

        let currency = parse_currency(&fixture.currency)?;

        if let Some(existing) = self.currency {
            if existing != currency {
                return Err(FixtureError::CurrencyMismatch(
                    existing.iso_alpha_code.to_string(),
                    currency.iso_alpha_code.to_string(),
                ));
            }
        } else {
            self.currency = Some(currency);
        }

        for discount_fixture in fixture.discounts {
            let key = discount_fixture.key.clone();
            let discount = discount_fixture.try_into_discount()?;

            self.keys.push(key);
            self.discounts.push(discount);
        }

        Ok(self)
    }

    /// Load a named discount set
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture file cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture.load_discounts(name)?;

        Ok(fixture)
    }

    /// Get a discount by its fixture key
    ///
    /// # Errors
    ///
    /// Returns an error if the discount is not found.
    pub fn discount(&self, key: &str) -> Result<&Discount, FixtureError> {
        self.keys
            .iter()
            .zip(&self.discounts)
            .find_map(|(candidate, discount)| (candidate == key).then_some(discount))
            .ok_or_else(|| FixtureError::DiscountNotFound(key.to_string()))
    }

    /// Get all discounts in load order
    pub fn discounts(&self) -> &[Discount] {
        &self.discounts
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if nothing has been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
