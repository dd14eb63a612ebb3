use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ipcheck::common::config::{apply_overrides, load_config, AppConfig, ConfigOverrides};
use ipcheck::upload::intake::{self, PendingFile};
use ipcheck::upload::orchestrator::{SubmitOutcome, Uploader};
use ipcheck::upload::state::CheckSession;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ipcheck")]
#[command(about = "Verify a spreadsheet of IP addresses against the scanning service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an .xlsx of IPs and save the processed results
    Check {
        #[arg(help = "Path to the .xlsx file to verify")]
        file: PathBuf,
        #[arg(long, help = "Verification endpoint URL (overrides config)")]
        endpoint: Option<String>,
        #[arg(long, help = "Directory where the result file is saved")]
        output: Option<PathBuf>,
    },
    /// Print the resolved configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config()?;

    match cli.command {
        Commands::Check {
            file,
            endpoint,
            output,
        } => {
            let overrides = ConfigOverrides {
                endpoint,
                output_dir: output,
            };
            let config = apply_overrides(config, &overrides);
            check(&config, &file).await
        }
        Commands::Config => {
            println!("{config:#?}");
            Ok(())
        }
    }
}

async fn check(config: &AppConfig, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .and_then(OsStr::to_str)
        .context(format!("Invalid file name: {}", path.display()))?;

    // Drop-zone contract: files outside the accept filter are ignored
    // without an error or a state change.
    if !intake::is_accepted(name) {
        eprintln!(
            "Ignored {}: only .{} files are accepted",
            path.display(),
            intake::ACCEPTED_EXTENSION
        );
        return Ok(());
    }

    let pending = PendingFile::from_path(path).await?;
    let session = CheckSession::new();
    session.select_file(pending);

    let uploader = Uploader::new(config)?;
    let renderer = spawn_progress_renderer(session.clone());
    let outcome = uploader.submit(&session).await;
    renderer.abort();
    eprintln!();

    match outcome {
        SubmitOutcome::Succeeded => {
            let saved = session.save_result(&config.output_dir)?;
            println!("Results saved to {}", saved.display());
            Ok(())
        }
        SubmitOutcome::Failed => {
            let snapshot = session.snapshot();
            anyhow::bail!(snapshot
                .error
                .unwrap_or_else(|| "upload failed".to_string()))
        }
        SubmitOutcome::Ignored => anyhow::bail!("upload was not started"),
    }
}

/// Mirrors session progress to stderr while the transfer runs.
fn spawn_progress_renderer(session: CheckSession) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = 0u8;
        loop {
            let snapshot = session.snapshot();
            if snapshot.status.is_uploading() && snapshot.progress != last {
                last = snapshot.progress;
                eprint!("\rUploading... {last}%");
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
}
