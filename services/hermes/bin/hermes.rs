//! Main Entrypoint for the Hermes Language Assistant
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and the command line.
//! 2. Initializing logging.
//! 3. Building the prompt templates and the model client.
//! 4. Loading the learner profile and running the interactive menu.

use anyhow::Context;
use clap::Parser;
use hermes_assistant::{config::Config, shell::Shell};
use hermes_core::{llm_client::OpenAICompatibleClient, prompts::PromptBook, store::ProfileStore};
use std::{io, path::PathBuf};
use tracing::info;

/// A personal language-learning assistant backed by a generative model.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Learner profile file (overrides PROFILE_PATH).
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,
    /// Directory of prompt template overrides (overrides PROMPTS_PATH).
    #[arg(long, value_name = "DIR")]
    prompts: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --- 1. Load Configuration ---
    let config = Config::from_env()
        .context("Failed to load configuration")?
        .with_overrides(cli.profile, cli.prompts);

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(io::stderr)
        .init();
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        profile = %config.profile_path.display(),
        "Configuration loaded"
    );

    // --- 3. Initialize Shared Services ---
    let prompts = match &config.prompts_path {
        Some(dir) => PromptBook::with_overrides(dir)
            .with_context(|| format!("Failed to read prompt templates from {}", dir.display()))?,
        None => PromptBook::default(),
    };
    let client = OpenAICompatibleClient::new(config.client_config())
        .context("Failed to create the model client")?;

    // --- 4. Run the Assistant ---
    let store = ProfileStore::new(&config.profile_path);
    let profile = store
        .load()
        .context("Failed to load the learner profile")?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = Shell::new(
        stdin.lock(),
        stdout.lock(),
        &client,
        &prompts,
        store,
        profile,
    );
    shell.run()?;

    info!("Assistant has shut down.");
    Ok(())
}
