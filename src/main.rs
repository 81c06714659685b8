//! commity - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use commity::commit::Generator;
use commity::config::{self, Config};
use commity::error::SessionError;
use commity::git::GitRepository;
use commity::llm::OpenAiClient;
use commity::session::{Session, TerminalOperator, first_run_setup, until_signal};

/// Generate git commit messages with an AI model.
#[derive(Parser, Debug)]
#[command(name = "commity")]
#[command(about = "Generate git commit messages with an AI model")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,commity=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Step 1: Load configuration, running setup on first use
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_path().context("Failed to locate config file")?,
    };

    let operator = TerminalOperator;
    let mut config = if config::exists(&config_path) {
        Config::load(&config_path).context("Failed to load configuration")?
    } else {
        let mut config = Config::default();
        config.apply_env();
        match first_run_setup(&operator, &mut config, &config_path) {
            Ok(()) => config,
            Err(e) if e.is_cancelled() => {
                println!("Setup cancelled.");
                return Ok(());
            }
            Err(e) => return Err(e).context("Setup failed"),
        }
    };

    // Step 2: Open git repository
    let repo = GitRepository::open(".")
        .context("Not a git repository. Run commity from within a git repository.")?;

    // Step 3: Build the model client
    let client = OpenAiClient::from_config(&config.ai).context("Failed to configure AI client")?;
    let mut generator = Generator::new(client, config.diff);

    // Step 4: Interactive session. Ctrl-C abandons an in-flight request.
    let result = Session::new(&repo, &mut generator, &operator, &mut config)
        .with_settings(&config_path, |config: &Config| OpenAiClient::from_config(&config.ai))
        .run(|| until_signal(tokio::signal::ctrl_c()))
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(SessionError::NoChanges) => {
            println!("No changes to commit.");
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            println!("Cancelled.");
            Ok(())
        }
        Err(e) => Err(e).context("Commit session failed"),
    }
}
