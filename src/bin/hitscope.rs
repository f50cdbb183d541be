//! hitscope - live Application → Gears → Hits viewer
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin hitscope -- --source simulate
//! cargo run --release --bin hitscope -- --source http --headless
//! ```
//!
//! ## Environment Variables
//!
//! - HITSCOPE_URL - Base URL of the delta endpoint (default: http://localhost:8080)
//! - HITSCOPE_SOURCE - http, file or simulate (default: http)
//! - HITSCOPE_DELTA_FILE - JSON file for the file source (default: delta.json)
//! - POLL_INTERVAL_SECS - Poll interval (default: 1)
//! - RETENTION_MINUTES - Hit retention window (default: 5)
//! - HTTP_TIMEOUT_SECS - Request timeout (default: 5)
//! - HITSCOPE_HEADLESS - Log redraws instead of drawing (default: false)
//! - RUST_LOG - Logging level (optional, default: info)

use hitscope::{transport, ui, Config, HitView, Poller};
use std::sync::Arc;
use tokio::sync::RwLock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let mut config = Config::from_env()?;
    let args: Vec<String> = std::env::args().collect();
    config.apply_args(&args)?;

    log::info!("🚀 Starting hitscope");
    log::info!("   Source: {}", config.source.as_str());
    match config.source {
        hitscope::SourceType::Http => log::info!("   URL: {}", config.base_url),
        hitscope::SourceType::File => log::info!("   File: {}", config.delta_file.display()),
        hitscope::SourceType::Simulate => log::info!(
            "   Simulating '{}' up to {} gears",
            config.sim_app_name,
            config.sim_max_gears
        ),
    }
    log::info!("   Poll interval: {:?}", config.poll_interval);
    log::info!("   Retention: {}m", config.retention.num_minutes());

    let source = transport::build_source(&config)?;
    let view = Arc::new(RwLock::new(HitView::new(
        source.source_type(),
        config.retention,
    )));

    let poller = Poller::new(source, config.retention, view.clone());
    let poll_handle = tokio::spawn(poller.run(config.poll_interval));

    if config.headless {
        tokio::select! {
            _ = ui::run_headless(view, config.poll_interval) => {}
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl-C, shutting down");
            }
        }
    } else {
        tokio::select! {
            result = ui::run_ui(view) => {
                match result {
                    Ok(_) => log::info!("UI exited"),
                    Err(e) => log::error!("UI error: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl-C, shutting down");
            }
        }
    }

    poll_handle.abort();
    Ok(())
}
