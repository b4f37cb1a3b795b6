//! HR back-office server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hr_backoffice::api::{AppState, create_router};
use hr_backoffice::attendance::AttendanceAggregator;
use hr_backoffice::config::ConfigLoader;
use hr_backoffice::notify::InMemoryChannelRegistry;
use hr_backoffice::store::Store;

#[derive(Debug, Parser)]
#[command(name = "hr-backoffice", version, about = "Attendance and leave approval service")]
struct Args {
    /// Directory holding service.yaml, attendance.yaml and leave.yaml.
    #[arg(long, default_value = "./config/default")]
    config: PathBuf,
}

/// Recomputes today's attendance for every active employee on a fixed period.
fn spawn_recompute(aggregator: AttendanceAggregator, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let aggregator = aggregator.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                let today = aggregator.today(Utc::now());
                aggregator.recompute_all(today)
            })
            .await;
            match outcome {
                Ok(Ok(count)) => info!(count, "periodic recompute finished"),
                Ok(Err(e)) => warn!(error = %e, "periodic recompute failed"),
                Err(e) => warn!(error = %e, "periodic recompute task aborted"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = ConfigLoader::load(&args.config)?;
    let service = config.service().clone();

    let store = Store::open(&service.database_path)?;
    let registry = Arc::new(InMemoryChannelRegistry::default());
    let state = AppState::new(store, &config, registry);

    if let Some(secs) = service.recompute_interval_secs.filter(|s| *s > 0) {
        spawn_recompute(state.aggregator().clone(), Duration::from_secs(secs));
    }

    let listener = tokio::net::TcpListener::bind(&service.bind_address).await?;
    info!(
        bind_address = %service.bind_address,
        database = %service.database_path,
        config = %args.config.display(),
        "hr-backoffice listening"
    );
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}
