//! CLI module for Prat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Prat - Interview Podcast Generation
///
/// A CLI tool that turns a topic into a multi-speaker podcast script and,
/// optionally, a rendered audio episode. The name "Prat" comes from the
/// Norwegian word for "chat."
#[derive(Parser, Debug)]
#[command(name = "prat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a podcast episode about a topic
    Generate {
        /// The episode topic
        topic: String,

        /// How research material is gathered (research, context)
        #[arg(short, long, default_value = "research")]
        mode: String,

        /// Source locators for context mode (files, URLs, YouTube links)
        #[arg(short, long)]
        sources: Vec<String>,

        /// Question/answer rounds per section (default from config)
        #[arg(short, long)]
        qa_rounds: Option<usize>,

        /// Read and write stage checkpoints for this run
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        checkpoint: bool,

        /// Render episode audio to this file
        #[arg(short, long)]
        audio_output: Option<PathBuf>,

        /// Write the transcript here instead of the output directory
        #[arg(short, long)]
        text_output: Option<PathBuf>,
    },

    /// Remove checkpoint records for a topic
    Clean {
        /// The topic whose checkpoints to remove
        topic: String,

        /// Q&A round count of the run to clean (default from config)
        #[arg(short, long)]
        qa_rounds: Option<usize>,
    },

    /// Initialize Prat and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "script.qa_rounds")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
