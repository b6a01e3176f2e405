//! Command-line interface for aimpact.
//!
//! This module provides the CLI structure for the `aimpact` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, DecryptCommand, ServeCommand, SubmitCommand};

/// aimpact - Encrypted AI productivity impact reports
///
/// Runs the report upload server and submits or decrypts reports from the
/// command line.
#[derive(Debug, Parser)]
#[command(name = "aimpact")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Print a new key fragment
    Keygen,

    /// Encrypt and upload a report
    Submit(SubmitCommand),

    /// Decrypt an uploaded report
    Decrypt(DecryptCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Keygen,
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "aimpact");
    }

    #[test]
    fn test_verbosity_flags() {
        use crate::logging::Verbosity;
        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(3, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["aimpact", "serve", "--bind", "0.0.0.0:8080"]).unwrap();
        match cli.command {
            Command::Serve(cmd) => assert_eq!(cmd.bind.as_deref(), Some("0.0.0.0:8080")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_submit() {
        let args = [
            "aimpact", "submit", "--report", "r.json", "--thread", "t1", "--author", "a1",
            "--draft",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Submit(cmd) => {
                assert_eq!(cmd.report, PathBuf::from("r.json"));
                assert_eq!(cmd.thread, "t1");
                assert!(cmd.draft);
                assert!(cmd.key.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_submit_requires_thread_and_author() {
        let args = ["aimpact", "submit", "--report", "r.json"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_decrypt_needs_exactly_one_source() {
        assert!(Cli::try_parse_from(["aimpact", "decrypt"]).is_err());
        assert!(Cli::try_parse_from([
            "aimpact", "decrypt", "--file", "x.bin", "--blob-id", "a-0123456789"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["aimpact", "decrypt", "--blob-id", "a-0123456789"]).is_ok());
    }

    #[test]
    fn test_parse_with_config() {
        let args = ["aimpact", "-c", "/custom/config.toml", "keygen"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = Cli::try_parse_from(["aimpact", "config", "validate", "-f", "c.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["aimpact", "-vv", "keygen"]).unwrap();
        assert_eq!(cli.verbose, 2);
        let cli = Cli::try_parse_from(["aimpact", "-q", "keygen"]).unwrap();
        assert!(cli.quiet);
    }
}
