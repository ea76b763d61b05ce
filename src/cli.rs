//! Command-line interface for voxnote
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Voice recordings into Obsidian notes
#[derive(Parser, Debug)]
#[command(
    name = "voxnote",
    version,
    about = "Turn voice recordings into Markdown notes in your Obsidian vault"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transcribe and clean recordings, writing one note per file
    Process {
        /// Audio files to process, in order
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Merge all recordings into a single combined note
        #[arg(long)]
        combined: bool,

        /// Skip the cost confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// View and modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the full current configuration
    Show,

    /// Get a configuration value by key (e.g., vault.path)
    Get {
        /// Key from the fixed schema (e.g., vault.path, transcription.model)
        key: String,
    },

    /// Set a configuration value by key
    Set {
        /// Key from the fixed schema (e.g., vault.path, transcription.model)
        key: String,
        /// Value to set
        value: String,
    },
}
