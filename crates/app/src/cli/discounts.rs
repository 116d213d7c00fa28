use std::path::PathBuf;

use clap::Args;
use cowork::fixtures::Fixture;
use cowork_app::{
    config::DatabaseConfig,
    database::{self, Db},
    domain::discounts::{DiscountsService, PgDiscountsService},
};

#[derive(Debug, Args)]
pub(crate) struct ImportDiscountsArgs {
    /// YAML file of discount definitions
    #[arg(long)]
    file: PathBuf,

    #[command(flatten)]
    database: DatabaseConfig,
}

pub(crate) async fn run(args: ImportDiscountsArgs) -> Result<(), String> {
    let mut fixture = Fixture::new();

    fixture
        .load_discounts_file(&args.file)
        .map_err(|error| format!("failed to load {}: {error}", args.file.display()))?;

    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let service = PgDiscountsService::new(Db::new(pool));

    for discount in fixture.discounts() {
        let created = service
            .create_discount(discount.clone())
            .await
            .map_err(|error| format!("failed to import {}: {error}", discount.name))?;

        println!("{}: {}", created.uuid, created.name);
    }

    Ok(())
}
