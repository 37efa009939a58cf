mod cmd;
mod settings;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lurch",
    about = "Deployment bot: runs ansible playbooks from a devops Docker image on request from Slack",
    version,
    propagate_version = true
)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "LURCH_CONFIG", default_value = "lurch.yaml")]
    config: PathBuf,

    /// Slack bot token (overrides slack.token)
    #[arg(long, global = true, env = "LURCH_SLACK_TOKEN", hide_env_values = true)]
    slack_token: Option<String>,

    /// Slack signing secret (overrides slack.signing_secret)
    #[arg(
        long,
        global = true,
        env = "LURCH_SLACK_SIGNING_SECRET",
        hide_env_values = true
    )]
    signing_secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for Slack events and run deployments
    Serve {
        /// Address to listen on (overrides `listen` in the config file)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Inspect the configuration file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Print version and build information
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let overrides = settings::Overrides {
        slack_token: cli.slack_token,
        signing_secret: cli.signing_secret,
    };

    let result = match cli.command {
        Commands::Serve { listen } => cmd::serve::run(&cli.config, &overrides, listen),
        Commands::Config { subcommand } => cmd::config::run(&cli.config, &overrides, subcommand),
        Commands::Version => cmd::version::run(),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
