//! Configuration
//!
//! `clap` argument groups shared by the `cowork-app` subcommands. Every option can also be set
//! through the environment, and a `.env` file is read when present.

mod db;
mod logging;
mod pricing;
mod sweeper;

pub use db::DatabaseConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use pricing::{PricingConfig, PricingConfigError};
pub use sweeper::SweeperConfig;
