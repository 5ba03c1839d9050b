//! Prat CLI entry point.

use anyhow::Result;
use clap::Parser;
use prat::cli::{commands, Cli, Commands};
use prat::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("prat={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&std::path::PathBuf::from(path)))?,
        None => Settings::load()?,
    };

    // Ensure working directories exist
    std::fs::create_dir_all(settings.output_dir())?;
    std::fs::create_dir_all(settings.temp_dir())?;

    // Execute command
    match &cli.command {
        Commands::Generate {
            topic,
            mode,
            sources,
            qa_rounds,
            checkpoint,
            audio_output,
            text_output,
        } => {
            commands::run_generate(
                topic,
                mode,
                sources.clone(),
                *qa_rounds,
                *checkpoint,
                audio_output.clone(),
                text_output.clone(),
                settings,
            )
            .await?;
        }

        Commands::Clean { topic, qa_rounds } => {
            commands::run_clean(topic, *qa_rounds, settings).await?;
        }

        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings)?;
        }
    }

    Ok(())
}
