//! Expiry Sweeper
//!
//! Background task that completes bookings whose end time has passed. It runs once as soon as
//! it starts and then on a fixed interval until shutdown is signalled.

use std::time::{Duration, Instant};

use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::Timestamp;
use tokio::{
    sync::watch,
    time::{self, MissedTickBehavior},
};
use tracing::{error, info};

use crate::domain::bookings::{BookingStore, StoreError};

/// Default pause between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
pub struct ExpirySweeper<S> {
    store: S,
    interval: Duration,
}

impl<S: BookingStore> ExpirySweeper<S> {
    #[must_use]
    pub fn new(store: S, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Completes every active booking that ended before `now`.
    ///
    /// # Errors
    ///
    /// Returns the storage error unchanged; [`run`](Self::run) only logs it.
    #[tracing::instrument(name = "bookings.sweeper.run_once", skip(self), err)]
    pub async fn run_once(&self, now: Timestamp) -> Result<u64, StoreError> {
        self.store.complete_expired_bookings(now).await
    }

    /// Sweeps until `shutdown` flips to `true` or its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            every = %self.interval.human(Truncate::Nano),
            "expiry sweeper started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let started = Instant::now();

                    match self.run_once(Timestamp::now()).await {
                        Ok(completed) => info!(
                            completed,
                            took = %started.elapsed().human(Truncate::Nano),
                            "completed expired bookings"
                        ),
                        Err(e) => error!(error = %e, "expiry sweep failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("expiry sweeper stopped");
    }
}
