//! `aimpact` - CLI for the aimpact report service
//!
//! This binary runs the upload server and lets operators submit, fetch and
//! decrypt encrypted reports.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;

use aimpact::cli::{Cli, Command, ConfigCommand, DecryptCommand, SubmitCommand};
use aimpact::crypto::{generate_key_fragment, ReportCipher};
use aimpact::form::{FormController, FormOptions, PipelineReportService};
use aimpact::machine::FormState;
use aimpact::report::{LoadedReport, ReportStatus};
use aimpact::storage::BlobId;
use aimpact::submit::{HttpUploader, SubmissionMetadata, SubmitPipeline};
use aimpact::{init_logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Serve(serve_cmd) => {
            if let Some(bind) = serve_cmd.bind {
                config.server.bind_address = bind;
            }
            config.validate()?;
            aimpact::server::serve(&config).await?;
        }
        Command::Keygen => println!("{}", generate_key_fragment()),
        Command::Submit(submit_cmd) => handle_submit(&config, submit_cmd).await?,
        Command::Decrypt(decrypt_cmd) => handle_decrypt(&config, decrypt_cmd).await?,
        Command::Config(config_cmd) => handle_config(&config, config_cmd)?,
    }
    Ok(())
}

fn key_fragment(config: &Config, flag: Option<String>) -> anyhow::Result<String> {
    flag.or_else(|| config.client.key_fragment.clone())
        .context("no key fragment given; pass --key or set client.key_fragment")
}

async fn handle_submit(config: &Config, cmd: SubmitCommand) -> anyhow::Result<()> {
    let raw = tokio::fs::read(&cmd.report)
        .await
        .with_context(|| format!("failed to read {}", cmd.report.display()))?;
    let report: LoadedReport = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a valid report", cmd.report.display()))?;

    let key = key_fragment(config, cmd.key)?;
    // Fail before touching the network if the key is unusable.
    ReportCipher::import(&key)?;

    let endpoint = cmd.endpoint.unwrap_or_else(|| config.client.endpoint.clone());
    let uploader = HttpUploader::new(endpoint, config.client_timeout())?;
    let service = Arc::new(PipelineReportService::new(
        SubmitPipeline::new(key, Arc::new(uploader)),
        SubmissionMetadata {
            thread_id: cmd.thread,
            author_id: cmd.author,
        },
        report,
    ));

    let status = if cmd.draft {
        ReportStatus::Draft
    } else {
        ReportStatus::Submitted
    };
    let handle = FormController::spawn(service.clone(), FormOptions::from_config(config));
    let outcome = handle.finish(status).await?;

    if outcome.state != FormState::Success {
        bail!(
            "{}",
            outcome
                .context
                .error
                .unwrap_or_else(|| format!("form ended in state {}", outcome.state))
        );
    }

    let receipt = service
        .last_receipt()
        .await
        .context("upload finished without a receipt")?;
    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        if let Some(message) = &outcome.context.success_message {
            println!("{message}");
        }
        println!("  Status:     {status}");
        println!("  Blob id:    {}", receipt.id);
        println!("  URL:        {}", receipt.url);
        println!(
            "  Time saved: {:.2} h",
            outcome.context.total_time_saved()
        );
    }
    Ok(())
}

async fn handle_decrypt(config: &Config, cmd: DecryptCommand) -> anyhow::Result<()> {
    let cipher = ReportCipher::import(&key_fragment(config, cmd.key)?)?;

    let bytes = if let Some(path) = cmd.file {
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?
    } else if let Some(raw_id) = cmd.blob_id {
        let id = BlobId::parse(&raw_id)?;
        let endpoint = cmd.endpoint.unwrap_or_else(|| config.client.endpoint.clone());
        let uploader = HttpUploader::new(endpoint, config.client_timeout())?;
        match uploader.fetch(&id).await? {
            Some(bytes) => bytes,
            None => bail!("blob {id} not found on {}", uploader.endpoint()),
        }
    } else {
        bail!("either --file or --blob-id is required");
    };

    let plaintext = cipher.decrypt_bytes(&bytes)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&plaintext)?;
    writeln!(stdout)?;
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                let mut shown = config.clone();
                if shown.client.key_fragment.is_some() {
                    shown.client.key_fragment = Some("<redacted>".to_string());
                }
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Server]");
                println!("  Bind address:       {}", config.server.bind_address);
                println!("  Public base URL:    {}", config.server.public_base_url);
                println!("  Max upload bytes:   {}", config.server.max_upload_bytes);
                println!();
                println!("[Storage]");
                println!("  Max age (hours):    {}", config.storage.max_age_hours);
                println!("  Max blobs:          {}", config.storage.max_blobs);
                println!(
                    "  Cleanup (minutes):  {}",
                    config.storage.cleanup_interval_minutes
                );
                println!();
                println!("[Reference]");
                println!("  Path:               {}", config.reference_path().display());
                println!();
                println!("[Form]");
                println!("  Redirect (ms):      {}", config.form.success_redirect_ms);
                println!("  Redirect target:    {}", config.form.redirect_target);
                println!();
                println!("[Client]");
                println!("  Endpoint:           {}", config.client.endpoint);
                println!("  Timeout (seconds):  {}", config.client.timeout_secs);
                println!(
                    "  Key fragment:       {}",
                    if config.client.key_fragment.is_some() {
                        "set"
                    } else {
                        "not set"
                    }
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)).and_then(|c| c.validate().map(|()| c)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
