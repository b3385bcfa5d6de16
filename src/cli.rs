//! Command-line interface for scribed
//!
//! Provides argument parsing using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

/// Streaming speech-to-text server over WebSocket
#[derive(Parser, Debug)]
#[command(name = "scribed", version, about = "Streaming speech-to-text server over WebSocket")]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Bind address
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Listen port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Path to the recognition model file
    #[arg(long, value_name = "PATH")]
    pub model: Option<String>,

    /// Language hint for recognition (e.g. zh, en, auto)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Disable partial results; one final result per session on stop
    #[arg(long)]
    pub single_shot: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
