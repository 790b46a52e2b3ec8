//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::BotConfig;
use crate::content::ContentJob;

#[derive(Debug, Parser)]
#[command(name = "herald")]
#[command(about = "Group-chat assistant: webhook server, daily scheduler, manual triggers", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the webhook and trigger endpoints and run the scheduler (config from env).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Run only the daily scheduler.
    Scheduler {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Send one content job to the report chat now.
    Trigger {
        #[arg(value_enum)]
        job: ContentJob,
        #[arg(short, long)]
        token: Option<String>,
    },
}

/// Load BotConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    BotConfig::load(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_token() {
        let cli = Cli::try_parse_from(["herald", "run", "--token", "123:abc"]).unwrap();
        match cli.command {
            Commands::Run { token } => assert_eq!(token.as_deref(), Some("123:abc")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    /// **Test: Trigger accepts kebab-case job names and rejects unknown ones.**
    #[test]
    fn test_parse_trigger_job() {
        let cli = Cli::try_parse_from(["herald", "trigger", "morning-report"]).unwrap();
        match cli.command {
            Commands::Trigger { job, token } => {
                assert_eq!(job, ContentJob::MorningReport);
                assert!(token.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::try_parse_from(["herald", "trigger", "payments-reminder", "-t", "x"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Trigger { job: ContentJob::PaymentsReminder, .. }
        ));

        assert!(Cli::try_parse_from(["herald", "trigger", "weather"]).is_err());
    }

    #[test]
    fn test_parse_scheduler() {
        let cli = Cli::try_parse_from(["herald", "scheduler"]).unwrap();
        assert!(matches!(cli.command, Commands::Scheduler { token: None }));
    }
}
