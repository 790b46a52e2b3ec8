//! herald CLI: run the bot, run the scheduler alone, or trigger one content job.

use anyhow::Result;
use clap::Parser;
use herald_bot::cli::{load_config, Cli, Commands};
use herald_bot::{run_bot, run_scheduler_only, run_trigger};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => run_bot(load_config(token)?).await,
        Commands::Scheduler { token } => run_scheduler_only(load_config(token)?).await,
        Commands::Trigger { job, token } => run_trigger(load_config(token)?, job).await,
    }
}
