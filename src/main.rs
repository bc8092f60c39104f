//! Beamtime DOI service entry point.
//!
//! Wires the four collaborators together — beamtime snapshot source,
//! registration client, draft state store, scheduler — and runs either the
//! continuous loop or a single tick. All configuration is resolved here,
//! before the scheduler starts; nothing reads the environment during ticks.

mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use beamdoi_core::{DoiConfig, SchedulerConfig};
use beamdoi_datacite::{DataCiteClient, NullClient, RegistrationClient};
use beamdoi_reconciler::{JsonBeamtimeSource, Scheduler};
use beamdoi_store::{DraftStateStore, InMemoryDraftStore, JsonFileDraftStore};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment.
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            interval,
            workers,
            audit_every,
            dry_run,
        } => {
            let config = SchedulerConfig {
                poll_interval: Duration::from_secs(interval.max(1)),
                workers,
                audit_every_ticks: audit_every,
            };
            let scheduler = build_scheduler(config, dry_run)?;

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        info!("Received Ctrl+C, initiating graceful shutdown");
                        let _ = shutdown_tx.send(true);
                    }
                    Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
                }
            });

            scheduler.run(shutdown_rx).await;
            info!("Beamtime DOI service stopped gracefully");
            Ok(())
        }
        Commands::Once { workers, dry_run } => {
            let config = SchedulerConfig {
                workers,
                audit_every_ticks: 0,
                ..SchedulerConfig::default()
            };
            let scheduler = build_scheduler(config, dry_run)?;

            let report = scheduler
                .run_once()
                .await
                .context("reconciliation tick failed")?;
            info!(
                created = report.created,
                updated = report.updated,
                deleted = report.deleted,
                unchanged = report.unchanged,
                retried = report.retried,
                blocked = report.blocked,
                "Tick complete"
            );
            if !report.is_clean() {
                bail!("{} record(s) blocked on permanent failures", report.blocked);
            }
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_scheduler(config: SchedulerConfig, dry_run: bool) -> Result<Scheduler> {
    let snapshot_path = required_env("BEAMTIME_SNAPSHOT")?;
    let source = Arc::new(JsonBeamtimeSource::new(snapshot_path));

    let (client, store): (Arc<dyn RegistrationClient>, Arc<dyn DraftStateStore>) = if dry_run {
        info!("Dry-run mode: no registration API calls, in-memory state only");
        let prefix = std::env::var("DOI_PREFIX").unwrap_or_else(|_| "10.0000".to_string());
        (
            Arc::new(NullClient::new(prefix)),
            Arc::new(InMemoryDraftStore::new()),
        )
    } else {
        let doi_config = DoiConfig::from_env().context("loading DOI service configuration")?;
        let state_path = required_env("DOI_STATE_FILE")?;
        (
            Arc::new(DataCiteClient::new(doi_config).context("building DataCite client")?),
            Arc::new(JsonFileDraftStore::open(state_path).context("opening draft state store")?),
        )
    };

    Ok(Scheduler::new(source, client, store, config))
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("missing required environment variable {name}"))
}
