use clap::Args;
use cowork::refunds::calculate_refund_at;
use jiff::Timestamp;
use rust_decimal::Decimal;

#[derive(Debug, Args)]
pub(crate) struct RefundArgs {
    /// Booking start (RFC 3339)
    #[arg(long)]
    start: String,

    /// Booking end (RFC 3339)
    #[arg(long)]
    end: String,

    /// Final price paid; omit for an unpaid booking
    #[arg(long)]
    price: Option<Decimal>,

    /// Cancellation instant (RFC 3339); defaults to now
    #[arg(long)]
    cancelled_at: Option<String>,

    /// Who cancels: user or manager
    #[arg(long, default_value = "user")]
    by: String,

    /// Print the refund as JSON
    #[arg(long)]
    json: bool,
}

pub(crate) fn run(args: RefundArgs) -> Result<(), String> {
    let cancelled_at = args
        .cancelled_at
        .unwrap_or_else(|| Timestamp::now().to_string());

    let refund = calculate_refund_at(&args.start, &args.end, args.price, &cancelled_at, &args.by);

    if args.json {
        let json = serde_json::to_string_pretty(&refund).map_err(|error| error.to_string())?;

        println!("{json}");

        return Ok(());
    }

    println!("refund_amount: {}", refund.refund_amount);
    println!(
        "refund_percentage: {}%",
        (refund.refund_percentage * Decimal::ONE_HUNDRED).normalize()
    );
    println!("reason: {}", refund.reason);

    if let Some(booking_type) = refund.booking_type {
        println!("booking_type: {booking_type}");
    }

    if let Some(hours) = refund.hours_until_start {
        println!("hours_until_start: {hours:.2}");
    }

    Ok(())
}
