//! Tileweld - tile analysis and stitching service.
//!
//! This binary starts the HTTP server and configures all components.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tileweld::{
    config::Config,
    job::{AnalysisKind, Notifier},
    pipeline::AnalysisService,
    server::{create_router, AppState, RouterConfig},
    RemoteDetector, RemoteSegmenter,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    run_serve(config).await
}

// =============================================================================
// Serve
// =============================================================================

async fn run_serve(config: Config) -> ExitCode {
    // Initialize logging
    init_logging(config.verbose);

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    // Print startup banner and info
    print_banner();

    info!("Configuration:");
    info!("  Uploads dir: {}", config.uploads_dir.display());
    info!("  Tiles dir: {}", config.tiles_dir.display());
    info!("  Outputs dir: {}", config.outputs_dir.display());
    info!("  Detector backend: {}", config.detector_url);
    info!("  Segmenter backend: {}", config.segmenter_url);
    match &config.callback_url {
        Some(url) => info!("  Callback URL: {}", url),
        None => warn!("  Callback URL: none - job results without a per-request URL are only logged"),
    }
    info!(
        "  Jobs: {} tiles in flight, score >= {}, merge IoU {}",
        config.concurrency, config.score_threshold, config.iou_threshold
    );

    // Create the data tree up front so the first request never races
    // directory creation
    info!("");
    info!("Preparing data directories...");
    if let Err(e) = create_data_dirs(&config) {
        error!("  Failed to create data directories: {}", e);
        return ExitCode::FAILURE;
    }
    info!("  Ready");

    // Create inference clients
    let infer_timeout = Duration::from_secs(config.infer_timeout_secs);
    let detector = match RemoteDetector::new(&config.detector_url, infer_timeout) {
        Ok(detector) => Arc::new(detector),
        Err(e) => {
            error!("Failed to create detector client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let segmenter = match RemoteSegmenter::new(&config.segmenter_url, infer_timeout) {
        Ok(segmenter) => Arc::new(segmenter),
        Err(e) => {
            error!("Failed to create segmenter client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Create the analysis service
    let analysis = Arc::new(
        AnalysisService::new(&config.tiles_dir, &config.outputs_dir, detector, segmenter)
            .with_concurrency(config.concurrency)
            .with_score_threshold(config.score_threshold)
            .with_iou_threshold(config.iou_threshold),
    );

    // Create the webhook notifier
    let notifier = match Notifier::new(Duration::from_secs(config.notify_timeout_secs)) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            error!("Failed to create notifier client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let app_state = AppState {
        analysis,
        notifier,
        uploads_dir: config.uploads_dir.clone(),
        default_callback_url: config.callback_url.clone(),
    };

    // Build router configuration
    let router_config = build_router_config(&config);

    // Create router
    let router = create_router(app_state, router_config);

    // Bind and serve
    let addr = config.bind_address();

    info!("");
    info!("────────────────────────────────────────────────────────────────");
    info!("  Server listening on: http://{}", addr);
    info!("");
    info!("  Try these endpoints:");
    info!("    curl http://{}/health", addr);
    info!("    curl -X POST http://{}/pyramids/ship/<image_id>", addr);
    info!("    curl -X POST http://{}/analyses/ship/<image_id>", addr);
    info!("────────────────────────────────────────────────────────────────");
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Print the startup banner.
fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("");
    info!("████████╗██╗██╗     ███████╗██╗    ██╗███████╗██╗     ██████╗ ");
    info!("╚══██╔══╝██║██║     ██╔════╝██║    ██║██╔════╝██║     ██╔══██╗");
    info!("   ██║   ██║██║     █████╗  ██║ █╗ ██║█████╗  ██║     ██║  ██║");
    info!("   ██║   ██║██║     ██╔══╝  ██║███╗██║██╔══╝  ██║     ██║  ██║");
    info!("   ██║   ██║███████╗███████╗╚███╔███╔╝███████╗███████╗██████╔╝");
    info!("   ╚═╝   ╚═╝╚══════╝╚══════╝ ╚══╝╚══╝ ╚══════╝╚══════╝╚═════╝ ");
    info!("");
    info!("                        v{}", version);
}

/// Create the per-kind data directories used by uploads, pyramids and
/// analysis outputs.
fn create_data_dirs(config: &Config) -> std::io::Result<()> {
    for root in [&config.uploads_dir, &config.tiles_dir, &config.outputs_dir] {
        for kind in [AnalysisKind::Ship, AnalysisKind::OilSpill] {
            std::fs::create_dir_all(root.join(kind.as_str()))?;
        }
    }
    Ok(())
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tileweld=debug,tower_http=debug"
    } else {
        "tileweld=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new();

    // Apply CORS origins
    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    // Apply tracing setting
    router_config = router_config.with_tracing(!config.no_tracing);

    router_config
}
