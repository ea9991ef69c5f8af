//! Flipview - keyboard driven image viewer
//!
//! Main entry point.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;

use anyhow::Result;
use app_fs::{SidecarTagStore, SystemFileSink};
use app_ui::Controller;
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize logging and panic hook first
    app_log::init()?;

    // Clean up old logs (7 days)
    if let Err(e) = app_log::cleanup_old_logs(7) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("Flipview starting...");

    let config = match app_core::AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Failed to load config, using defaults: {:#}", e);
            app_core::AppConfig::default()
        }
    };

    // Background work (tag loads, toast timers, deletes) runs here
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;
    let _guard = runtime.enter();

    let controller = Arc::new(Controller::new(
        &config,
        Arc::new(SidecarTagStore::new(config.tags.sidecar_file.clone())),
        Arc::new(SystemFileSink::new(config.files.use_trash)),
    ));

    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let added = runtime.block_on(controller.drop_paths(args));
        tracing::info!("Opened {} images from the command line", added);
    }

    app::run(controller, runtime.handle().clone())
}
