//! Loads fixture data into the configured Postgres database.
//!
//! ```bash
//! # Replace inventory (medicines, stores, supplies, orders) with sample data
//! cargo run --bin seed -- sample
//!
//! # Wipe everything and leave one admin (id 1) and one store (id 1)
//! cargo run --bin seed -- reset --admin-email admin@pharmacy.local
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use pharmacy_inventory::{
    auth::password::NewPassword,
    db::PgRepository,
    logging,
    seed::{reset_fixtures, sample_fixtures, FixtureRepo, ResetScope},
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "seed", about = "Load fixture data into the pharmacy database")]
struct Cli {
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Clear inventory tables and insert sample medicines, stores and supplies.
    Sample,
    /// Clear every table and create a single admin and store.
    Reset {
        #[arg(long, env = "SEED_ADMIN_EMAIL", default_value = "admin@pharmacy.local")]
        admin_email: String,

        #[arg(long, env = "SEED_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("pharmacy_inventory=info,seed=info");

    let cli = Cli::parse();
    let repo = PgRepository::connect(&cli.database_url).await?;
    repo.migrate().await?;

    let (scope, set) = match cli.command {
        Command::Sample => (ResetScope::Inventory, sample_fixtures()),
        Command::Reset {
            admin_email,
            admin_password,
        } => {
            let password = match NewPassword::parse(&admin_password) {
                Ok(password) => password,
                Err(e) => bail!("admin password rejected: {e}"),
            };
            (ResetScope::All, reset_fixtures(&admin_email, &password)?)
        }
    };

    let report = repo
        .load_fixtures(scope, set)
        .await
        .context("load fixtures")?;
    info!(
        users = report.users,
        medicines = report.medicines,
        stores = report.stores,
        supplies = report.supplies,
        "seeding finished"
    );
    Ok(())
}
