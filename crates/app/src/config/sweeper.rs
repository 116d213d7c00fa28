//! Sweeper Config

use std::time::Duration;

use clap::Args;

/// Expiry sweeper settings.
#[derive(Debug, Clone, Args)]
pub struct SweeperConfig {
    /// Seconds between sweeps
    #[arg(
        long,
        env = "SWEEP_INTERVAL_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub sweep_interval_secs: u64,
}

impl SweeperConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
