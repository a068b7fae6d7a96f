//! # Cachebench
//!
//! Times single and batch operations of the distributed cache gateway
//! against the store selected by configuration.

use cachebench_app::di::build_cache_store;
use cachebench_app::startup::{load_config, print_banner, print_startup_info};
use cachebench_app::{BenchmarkRunner, Fixture, RealtimeOnline};
use cachebench_cache::DistributedCache;
use cachebench_config::AppConfig;
use cachebench_core::{init_telemetry, CacheBenchError, CacheBenchResult, TelemetryConfig};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let loaded = load_config("./config");

    // Logging settings come from the config; fall back to defaults so a bad
    // config file is still reported.
    let telemetry = loaded
        .as_ref()
        .map(|loader| loader.get().telemetry.clone())
        .unwrap_or_else(|_| TelemetryConfig::default());
    if let Err(e) = init_telemetry(&telemetry) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    print_banner();
    info!("Starting cachebench...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let result = match loaded {
        Ok(loader) => run(loader.into_inner()).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!(code = e.error_code(), "Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> CacheBenchResult<()> {
    let store = build_cache_store(&config.redis).await?;
    print_startup_info(&config, store.name());

    let cache = DistributedCache::<RealtimeOnline>::new(store.clone(), config.cache.key_prefix.clone());
    let runner = BenchmarkRunner::new(cache, config.bench.clone())?;

    let outcome = async {
        let fixture = Fixture::load(&config.bench.fixture_path).await?;
        runner.run(&fixture).await
    };

    let result = tokio::select! {
        result = outcome => result,
        () = shutdown_signal() => Err(CacheBenchError::Interrupted),
    };

    info!(store = store.name(), "Closing cache store");
    store.close().await;

    let report = result?;
    report.log_summary();

    if let Some(path) = &config.bench.report_path {
        report.write_json(path).await?;
    }

    info!("Benchmark complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, stopping benchmark...");
        }
        () = terminate => {
            info!("Received terminate signal, stopping benchmark...");
        }
    }
}
