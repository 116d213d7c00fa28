use clap::Args;
use cowork_app::{
    config::{DatabaseConfig, SweeperConfig},
    database::{self, Db},
    domain::bookings::PgBookingStore,
    shutdown,
    sweeper::ExpirySweeper,
};
use jiff::Timestamp;
use tokio::sync::watch;

#[derive(Debug, Args)]
pub(crate) struct SweepArgs {
    #[command(flatten)]
    database: DatabaseConfig,

    #[command(flatten)]
    sweeper: SweeperConfig,

    /// Apply pending migrations before sweeping
    #[arg(long)]
    migrate: bool,

    /// Sweep once and exit instead of running until interrupted
    #[arg(long)]
    once: bool,
}

pub(crate) async fn run(args: SweepArgs) -> Result<(), String> {
    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    if args.migrate {
        database::migrate(&pool)
            .await
            .map_err(|error| format!("failed to apply migrations: {error}"))?;
    }

    let sweeper = ExpirySweeper::new(PgBookingStore::new(Db::new(pool)), args.sweeper.interval());

    if args.once {
        let completed = sweeper
            .run_once(Timestamp::now())
            .await
            .map_err(|error| format!("failed to complete expired bookings: {error}"))?;

        println!("completed: {completed}");

        return Ok(());
    }

    let (sender, receiver) = watch::channel(false);
    let task = tokio::spawn(sweeper.run(receiver));

    shutdown::listen(sender)
        .await
        .map_err(|error| error.to_string())?;

    task.await
        .map_err(|error| format!("sweeper task failed: {error}"))
}
