//! Command line argument parsing
//!
//! This module handles CLI argument parsing with subcommands:
//! - `generate`: Run one prompt through the full engine and print the reply
//! - `providers`: List the configured provider rotation and health state
//! - `show-config`: Show configuration discovery information

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "persona-engine",
    version,
    about = "AI response orchestration engine with provider failover and offline degradation"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a reply for a prompt through the provider rotation
    Generate {
        /// The finished prompt to send
        prompt: String,

        /// Persona identifier used for cache fingerprinting
        #[arg(long, default_value = "cli")]
        persona: String,

        /// Optional prior context folded into the request
        #[arg(long)]
        context: Option<String>,

        /// Optional system prompt
        #[arg(long)]
        system: Option<String>,

        /// Sampling temperature in [0, 2]
        #[arg(long, default_value_t = 0.7)]
        temperature: f32,

        /// Completion token budget
        #[arg(long, default_value_t = 512)]
        max_tokens: u32,

        /// Explicit configuration file instead of discovery
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List configured providers and their current health classification
    Providers {
        /// Explicit configuration file instead of discovery
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show configuration discovery information
    ShowConfig,
}
