use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use clap::{Parser, Subcommand};
use server_api::{
    add_flower, admin_stats,
    auth::{hash_password, AdminCredential, SessionKeys},
    garden_view, sweep, ApiContext,
};
use shared::{clock::SystemClock, error::ApiException, lifecycle::lifespan_days};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/garden.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an argon2 hash suitable for `admin_password_hash`.
    HashPassword { password: String },
    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that operate on the flower database.
#[derive(Subcommand, Debug)]
enum StoreCommand {
    /// Stock a new, untrimmed flower.
    Add { flower_type: String },
    /// Retire every flower past its expiry.
    Sweep,
    /// Print the garden view as JSON.
    Garden,
    /// Print the admin counters.
    Stats,
    /// Print every stored flower, retired ones included, as JSON.
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let command = match cli.command {
        Command::HashPassword { password } => {
            let hash =
                hash_password(&password).map_err(|e| anyhow::anyhow!("hash failed: {e}"))?;
            println!("{hash}");
            return Ok(());
        }
        Command::Store(command) => command,
    };

    let storage = Storage::new(&cli.database_url).await?;
    let ctx = ApiContext {
        storage,
        clock: Arc::new(SystemClock),
        credential: AdminCredential::disabled(),
        sessions: SessionKeys::ephemeral(Duration::hours(1)),
    };

    match command {
        StoreCommand::Add { flower_type } => {
            let flower = add_flower(&ctx, &flower_type)
                .await
                .map_err(ApiException::from)?;
            println!(
                "added flower_id={} type={} lifespan_days={} expires_at={}",
                flower.id,
                flower.flower_type,
                lifespan_days(flower.flower_type),
                flower.expires_at
            );
        }
        StoreCommand::Sweep => {
            let retired = sweep(&ctx, ctx.now()).await.map_err(ApiException::from)?;
            println!("retired {} flower(s)", retired.len());
        }
        StoreCommand::Garden => {
            let view = garden_view(&ctx).await.map_err(ApiException::from)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        StoreCommand::Stats => {
            let stats = admin_stats(&ctx).await.map_err(ApiException::from)?;
            println!(
                "total={} active={} in_vases={}",
                stats.total_flowers, stats.active_flowers, stats.flowers_in_vases
            );
        }
        StoreCommand::List => {
            let flowers = ctx.storage.list_all().await?;
            println!("{}", serde_json::to_string_pretty(&flowers)?);
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
