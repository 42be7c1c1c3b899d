mod run;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::run::RunArgs;

#[derive(Debug, Parser)]
#[command(name = "postwatch")]
#[command(about = "Relay new posts from watched X profiles to Discord webhooks")]
struct Cli {
    /// Log at debug level and report every scroll step.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Collect, filter, and deliver new posts (the default)
    Run {
        /// Only process this group id
        #[arg(long)]
        group: Option<u32>,
        /// Log messages instead of posting them, and leave state untouched
        #[arg(long)]
        dry_run: bool,
        /// Launch Chromium with --no-sandbox (needed as root in containers)
        #[arg(long)]
        no_sandbox: bool,
    },
    /// Print the configured groups
    Groups,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = postwatch_core::load_app_config_from_env()?;

    let default_level = if cli.verbose {
        "debug".to_owned()
    } else {
        config.log_level.clone()
    };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(Commands::Run {
            group,
            dry_run,
            no_sandbox,
        }) => {
            let args = RunArgs {
                group,
                dry_run,
                no_sandbox,
                verbose: cli.verbose,
            };
            run::execute(&config, &args).await
        }
        Some(Commands::Groups) => {
            for line in run::describe_groups(&config.groups) {
                println!("{line}");
            }
            Ok(())
        }
        None => {
            let args = RunArgs {
                verbose: cli.verbose,
                ..RunArgs::default()
            };
            run::execute(&config, &args).await
        }
    }
}

#[cfg(test)]
mod tests;
