use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chainfetch_core::{
    load_config_or_default, metrics::gather_text, run_with_session, validate_config,
    StdoutSink,
};

/// Environment variable naming an optional TOML config file
const CONFIG_ENV: &str = "CHAINFETCH_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Logs go to stderr; stdout carries results only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
    match &config_path {
        Some(path) => info!("Loading configuration from {:?}", path),
        None => info!("No {} set, using built-in defaults", CONFIG_ENV),
    }

    let config = load_config_or_default(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    info!(
        base_url = %config.endpoints.base_url,
        item_url = %config.endpoints.item_url,
        batch_size = config.batch.size,
        strategy = %config.batch.strategy,
        timeout_secs = config.client.timeout_secs,
        "Configuration loaded"
    );

    let sink = StdoutSink::default();
    let report = run_with_session(&config, &sink)
        .await
        .context("Batch run failed")?;

    println!("{}", report.elapsed.as_secs_f64());

    if config.metrics.dump_on_exit {
        eprint!("{}", gather_text());
    }

    Ok(())
}
