mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::RunArgs;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "codelab-cli")]
#[command(about = "Codelab CLI - Run practice code against the judge and grade it", long_about = None)]
struct Cli {
    /// JSON config file; CODELAB_* environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Judge base URL (overrides config and environment)
    #[arg(long, global = true)]
    judge_url: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit code with its test cases and print the graded report
    Run(RunArgs),

    /// Poll an existing submission until the judge completes it
    Poll {
        /// Submission id returned by the judge
        submission_id: String,

        /// Seconds to wait before giving up (defaults to the configured poll timeout)
        #[arg(long)]
        max_wait: Option<u64>,
    },

    /// Write a default config file
    InitConfig {
        /// Where to write the config
        #[arg(short, long, default_value = "codelab.json")]
        path: PathBuf,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Commands::Run(args) => {
            let config = commands::load_config(cli.config.as_deref(), cli.judge_url.as_deref())?;
            let passed = commands::run(args, config).await?;
            if !passed {
                std::process::exit(1);
            }
        }
        Commands::Poll {
            submission_id,
            max_wait,
        } => {
            let config = commands::load_config(cli.config.as_deref(), cli.judge_url.as_deref())?;
            if let Err(e) = commands::poll(&submission_id, max_wait, config).await {
                error!(submission_id = %submission_id, error = %e, "Polling failed");
                return Err(e);
            }
        }
        Commands::InitConfig { path } => {
            commands::init_config(&path)?;
        }
    }

    Ok(())
}
