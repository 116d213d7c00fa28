//! Quote rendering

use std::io;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::discounts::DiscountedPrice;

/// Errors that can occur while writing a quote.
#[derive(Debug, Error)]
pub enum QuoteRenderError {
    /// Writing to the output failed.
    #[error("failed to write quote: {0}")]
    Io(#[from] io::Error),
}

/// Human readable breakdown of a discounted price.
#[derive(Debug, Clone, Copy)]
pub struct QuoteReceipt<'a> {
    base_price: Decimal,
    quote: &'a DiscountedPrice,
    currency: &'static Currency,
}

impl<'a> QuoteReceipt<'a> {
    /// Wrap a computed quote for display.
    pub fn new(base_price: Decimal, quote: &'a DiscountedPrice, currency: &'static Currency) -> Self {
        Self {
            base_price,
            quote,
            currency,
        }
    }

    /// Writes the discount trail as a table followed by the totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), QuoteRenderError> {
        if self.quote.applied_discounts.is_empty() {
            writeln!(out, "\nNo discounts apply.")?;
        } else {
            let mut builder = Builder::default();

            builder.push_record(["#", "Discount", "Rate", "Saving"]);

            for (idx, applied) in self.quote.applied_discounts.iter().enumerate() {
                builder.push_record([
                    (idx + 1).to_string(),
                    applied.name.clone(),
                    format!("{}%", applied.percentage.normalize()),
                    format!("-{}", self.money(applied.discount_amount)),
                ]);
            }

            let mut table = builder.build();

            table.with(Theme::from(Style::modern_rounded()));
            table.modify(Rows::first(), Color::BOLD);
            table.modify(Columns::new(2..4), Alignment::right());

            writeln!(out, "\n{table}")?;
        }

        let lines = [
            ("Base price:", self.money(self.base_price)),
            (
                "Discount:",
                format!(
                    "({}%) -{}",
                    self.quote.discount_percentage.normalize(),
                    self.money(self.quote.discount_amount)
                ),
            ),
            ("Final price:", self.money(self.quote.final_price)),
        ];

        let label_width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = lines.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

        for (label, value) in lines {
            writeln!(out, " {label:>label_width$}  {value:>value_width$}")?;
        }

        Ok(())
    }

    fn money(&self, amount: Decimal) -> String {
        Money::from_decimal(amount, self.currency).to_string()
    }
}
