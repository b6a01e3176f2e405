//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Subcommand};

/// Serve command arguments.
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to listen on (overrides `server.bind_address`)
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// Submit command arguments.
#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Report JSON file (team and rows)
    #[arg(short, long, value_name = "FILE")]
    pub report: PathBuf,

    /// Report thread identifier
    #[arg(short, long, value_name = "ID")]
    pub thread: String,

    /// Author identifier
    #[arg(short, long, value_name = "ID")]
    pub author: String,

    /// Save as a draft instead of submitting
    #[arg(short, long)]
    pub draft: bool,

    /// Key fragment (overrides `client.key_fragment`)
    #[arg(short, long, value_name = "KEY")]
    pub key: Option<String>,

    /// Server base URL (overrides `client.endpoint`)
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Decrypt command arguments.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "blob_id"])))]
pub struct DecryptCommand {
    /// Read the encrypted blob from a file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Fetch the encrypted blob from the server
    #[arg(short, long, value_name = "ID")]
    pub blob_id: Option<String>,

    /// Key fragment (overrides `client.key_fragment`)
    #[arg(short, long, value_name = "KEY")]
    pub key: Option<String>,

    /// Server base URL (overrides `client.endpoint`)
    #[arg(short, long, value_name = "URL")]
    pub endpoint: Option<String>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}
