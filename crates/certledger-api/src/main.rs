//! # certledgerd — CertLedger Server Entry Point
//!
//! Owns client lifecycle: constructs the registry, ledger, archive,
//! and renderer, wires the orchestrator and verification service,
//! spawns the periodic reconciliation task, and serves the API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use certledger_anchor::InProcessLedger;
use certledger_api::{app, AppState};
use certledger_archive::FsArchive;
use certledger_issuance::{IssuanceOrchestrator, TextRenderer, VerificationService};
use certledger_registry::MemoryRegistry;

/// CertLedger credential service.
///
/// Issues and verifies tamper-evident credentials across a registry,
/// a content archive, and an append-only verification ledger.
#[derive(Parser, Debug)]
#[command(name = "certledgerd", version, about)]
struct Args {
    /// Address to serve the API on.
    #[arg(long, default_value = "0.0.0.0:4000")]
    bind: SocketAddr,

    /// Root directory for the content archive.
    #[arg(long, default_value = "./archive")]
    archive_root: PathBuf,

    /// Base URL embedded in rendered documents as the verification
    /// pointer.
    #[arg(long, default_value = "http://localhost:5173")]
    verification_base: String,

    /// Seconds between reconciliation passes.
    #[arg(long, default_value_t = 30)]
    reconcile_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus exporter: {e}"))?;

    let registry = Arc::new(MemoryRegistry::new());
    let ledger = Arc::new(InProcessLedger::new());
    let archive = Arc::new(FsArchive::new(args.archive_root.clone()));
    let renderer = Arc::new(TextRenderer::new(args.verification_base.clone()));

    let orchestrator = Arc::new(IssuanceOrchestrator::new(
        registry.clone(),
        ledger.clone(),
        archive.clone(),
        renderer,
    ));
    let verifier = Arc::new(VerificationService::new(
        registry.clone(),
        ledger.clone(),
        archive.clone(),
    ));

    // Periodic reconciliation: any issuance or revocation interrupted
    // after its ledger call confirmed is driven to completion here.
    let reconciler = orchestrator.clone();
    let interval = Duration::from_secs(args.reconcile_interval_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = reconciler.reconcile().await;
            if report.failed > 0 {
                tracing::warn!(?report, "reconciliation pass left work behind");
            }
        }
    });

    let state = AppState::new(orchestrator, verifier, registry);
    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, archive = %args.archive_root.display(), "certledgerd listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
