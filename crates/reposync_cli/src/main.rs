//! reposyncd - daemon keeping a catalog in step with GitHub instances.

mod config;
mod shutdown;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use reposync::{PAGE_SIZE, RepoSyncRequest, SyncWorker};

#[derive(Parser)]
#[command(name = "reposyncd")]
#[command(version)]
#[command(about = "Synchronizes GitHub and GitHub Enterprise repositories into a catalog feed")]
#[command(
    long_about = "reposyncd runs one perpetual, rate-limit-aware sync loop per configured \
code-hosting instance. Each cycle enumerates the instance's visible repositories and \
emits one idempotent create-or-update record per repository as a JSON line on stdout, \
for consumption by the catalog."
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "reposync.toml")]
    config: PathBuf,

    /// Override the inter-cycle interval in seconds
    #[arg(long)]
    interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reposync=info,reposyncd=info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut settings = config::Settings::load(&cli.config);
    if let Some(secs) = cli.interval_secs {
        settings.interval_secs = secs;
    }

    if settings.connections.is_empty() {
        tracing::warn!(config = %cli.config.display(), "no connections configured, nothing to sync");
        return Ok(());
    }

    let (request_tx, mut request_rx) = mpsc::channel::<RepoSyncRequest>(PAGE_SIZE);

    // Stand-in for the catalog collaborator: one JSON line per
    // create-or-update request. Downstream upserts are idempotent, so
    // repeated lines for the same repository are harmless.
    let printer = tokio::spawn(async move {
        use std::io::Write;
        let stdout = std::io::stdout();
        while let Some(request) = request_rx.recv().await {
            match serde_json::to_string(&request) {
                Ok(line) => {
                    let mut out = stdout.lock();
                    if writeln!(out, "{line}").is_err() {
                        return;
                    }
                }
                Err(err) => tracing::error!(error = %err, "failed to encode sync request"),
            }
        }
    });

    let cancel = CancellationToken::new();
    shutdown::spawn_signal_handler(cancel.clone());

    let worker = SyncWorker::new(settings.connections, request_tx)
        .with_interval(Duration::from_secs(settings.interval_secs));
    tracing::info!(
        connections = worker.connection_count(),
        interval_secs = settings.interval_secs,
        "starting sync worker"
    );
    worker.run(cancel).await;

    // The worker dropped the last sender, so the printer drains and stops.
    let _ = printer.await;
    Ok(())
}
