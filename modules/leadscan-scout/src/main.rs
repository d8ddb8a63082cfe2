use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use leadscan_common::{AppConfig, ScanConfig};
use leadscan_scout::notify;
use leadscan_scout::pipeline::{ScanCycleResult, ScanOrchestrator};
use leadscan_scout::sources::build_adapters;
use leadscan_scout::store::{LeadSink, MemoryLeadSink, PgLeadSink};

#[derive(Parser)]
#[command(name = "leadscan-scout", about = "Scan forums and video comments for purchase-intent leads")]
struct Cli {
    /// Run a single scan cycle and exit (default)
    #[arg(long, conflicts_with = "run_loop")]
    once: bool,

    /// Keep scanning on SCAN_INTERVAL_HOURS until interrupted
    #[arg(long = "loop")]
    run_loop: bool,

    /// Keep leads in memory instead of Postgres
    #[arg(long)]
    dry_run: bool,

    /// Scan profile TOML (overrides LEADSCAN_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each cycle result as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("leadscan_scout=info".parse()?)
                .add_directive("leadscan_common=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    info!("Lead scan starting...");

    let app = AppConfig::from_env()?;
    let profile_path = cli.config.clone().unwrap_or_else(|| app.config_path.clone());
    let config = ScanConfig::load(&profile_path)
        .with_context(|| format!("Failed to load scan profile {}", profile_path.display()))?
        .with_video_api_key(app.youtube_api_key.clone());
    info!(
        communities = config.forum.communities.len(),
        queries = config.video.queries.len(),
        keywords = config.scoring.keywords.len(),
        min_score = config.scoring.min_score,
        "Scan profile loaded"
    );

    let sink: Arc<dyn LeadSink> = if cli.dry_run {
        info!("Dry run: leads are kept in memory");
        Arc::new(MemoryLeadSink::new())
    } else {
        let url = app
            .database_url
            .as_deref()
            .context("DATABASE_URL is required unless --dry-run is set")?;
        let store = PgLeadSink::connect(url).await?;
        store.migrate().await?;
        info!("Migrations complete");
        Arc::new(store)
    };

    let orchestrator = ScanOrchestrator::new(build_adapters(&config)?, sink)
        .with_notifier(notify::backend_for(app.slack_webhook_url.clone()));

    if cli.once || !cli.run_loop {
        let result = orchestrator.run_scan_cycle(&config).await;
        report(&result, cli.json)?;
        return Ok(());
    }

    info!(interval_hours = app.scan_interval.as_secs() / 3600, "Looping scan cycles");
    loop {
        let result = orchestrator.run_scan_cycle(&config).await;
        report(&result, cli.json)?;

        tokio::select! {
            _ = tokio::time::sleep(app.scan_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping after last completed cycle");
                break;
            }
        }
    }

    Ok(())
}

fn report(result: &ScanCycleResult, json: bool) -> Result<()> {
    info!("{result}");
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    }
    Ok(())
}
