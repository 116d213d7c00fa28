use std::{io, path::PathBuf};

use clap::Args;
use cowork::{discounts::compute_discounted_price, fixtures::Fixture, quote::QuoteReceipt};
use cowork_app::config::PricingConfig;
use jiff::Timestamp;
use rust_decimal::Decimal;

#[derive(Debug, Args)]
pub(crate) struct QuoteArgs {
    /// Undiscounted price
    #[arg(long)]
    price: Decimal,

    /// Instant the discounts are evaluated at (RFC 3339); defaults to now
    #[arg(long)]
    as_of: Option<Timestamp>,

    /// YAML file of discount definitions
    #[arg(long)]
    discounts: Option<PathBuf>,

    #[command(flatten)]
    pricing: PricingConfig,
}

pub(crate) fn run(args: QuoteArgs) -> Result<(), String> {
    let settings = args.pricing.settings().map_err(|error| error.to_string())?;

    let mut fixture = Fixture::new();

    if let Some(path) = &args.discounts {
        fixture
            .load_discounts_file(path)
            .map_err(|error| format!("failed to load {}: {error}", path.display()))?;
    }

    // Discount caps are written in the file's currency.
    let currency = fixture.currency().unwrap_or(settings.currency);
    let as_of = args.as_of.unwrap_or_else(Timestamp::now);

    let quote = compute_discounted_price(
        args.price,
        fixture.discounts(),
        &as_of.to_zoned(settings.time_zone),
        settings.max_applied_discounts,
    );

    QuoteReceipt::new(args.price, &quote, currency)
        .write_to(io::stdout().lock())
        .map_err(|error| error.to_string())
}
