use clap::{Parser, Subcommand};
use cowork_app::config::LoggingConfig;

mod discounts;
mod quote;
mod refund;
mod sweep;

#[derive(Debug, Parser)]
#[command(name = "cowork-app", about = "Coworking bookings CLI", long_about = None)]
pub(crate) struct Cli {
    /// Logging output settings.
    #[command(flatten)]
    pub(crate) logging: LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Complete bookings whose end time has passed.
    Sweep(sweep::SweepArgs),

    /// Price a booking offline against discounts from a YAML file.
    Quote(quote::QuoteArgs),

    /// Work out the refund for a cancellation.
    Refund(refund::RefundArgs),

    /// Store the discounts defined in a YAML file.
    ImportDiscounts(discounts::ImportDiscountsArgs),
}

impl Cli {
    /// Parse arguments, reading a `.env` file first if one exists.
    pub(crate) fn load() -> Result<Self, clap::Error> {
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Sweep(args) => sweep::run(args).await,
            Commands::Quote(args) => quote::run(args),
            Commands::Refund(args) => refund::run(args),
            Commands::ImportDiscounts(args) => discounts::run(args).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn refund_arguments_parse() {
        let cli = Cli::try_parse_from([
            "cowork-app",
            "refund",
            "--start",
            "2025-03-10T12:00:00Z",
            "--end",
            "2025-03-10T15:00:00Z",
            "--price",
            "1200",
            "--cancelled-at",
            "2025-03-10T10:30:00Z",
            "--by",
            "manager",
        ]);

        assert!(
            matches!(cli, Ok(Cli { command: Commands::Refund(_), .. })),
            "expected refund command, got {cli:?}"
        );
    }
}
