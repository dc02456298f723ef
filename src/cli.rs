//! Command-line interface for convo
//!
//! Provides argument parsing using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

/// Streaming conversation REPL with spoken answers
#[derive(Parser, Debug)]
#[command(name = "convo", version, about = "Streaming conversation REPL with spoken answers")]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Model name override
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Append stream chunks instead of replacing the answer text
    #[arg(long)]
    pub incremental: bool,

    /// Suppress notices (quiet mode)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (-v: notices, -vv: full transcript dump on exit)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Default config path: `$XDG_CONFIG_HOME/convo/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("convo").join("config.toml"))
}
