pub mod config;
pub mod controller;

use crate::config::{default_config_path, AppConfig};
use crate::controller::controller_handle::ControllerHandle;
use crate::controller::frame_processor::ControllerUpdate;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_LOG_LEVEL: &str = "info";

#[tokio::main]
async fn main() -> Result<()> {
    let set_log_level = setup()?;

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let config = AppConfig::load(&path).await?;
    set_log_level(&config.logging.level);

    info!("Starting controller with config from {}", path.display());
    let (update_sender, mut update_receiver) = mpsc::channel(1000);

    let handle = ControllerHandle::spawn(config.controller_settings(), update_sender)
        .await
        .map_err(|e| eyre!("Failed to spawn controller: {}", e))?;
    let snapshots = handle.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received");
                break;
            }
            update = update_receiver.recv() => {
                let Some(update) = update else {
                    info!("Controller pipeline stopped");
                    break;
                };
                log_update(&update);
            }
        }
    }

    drop(update_receiver);
    handle.shutdown().await;
    info!("Final snapshot: {:?}", *snapshots.borrow());
    Ok(())
}

fn log_update(update: &ControllerUpdate) {
    for notification in &update.notifications {
        match notification.event.position() {
            Some(position) => info!("{} {:.2}", notification.topic(), position),
            None => info!("{}", notification.topic()),
        }
    }
    debug!("Snapshot: {:?}", update.snapshot);
}

fn setup() -> Result<impl Fn(&str)> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(setup_logging_env())
}

/// Installs the subscriber at `RUST_LOG` or `info`; the returned closure
/// switches to the configured level unless `RUST_LOG` is set
fn setup_logging_env() -> impl Fn(&str) {
    let from_env = std::env::var("RUST_LOG").is_ok();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .with_filter_reloading();
    let reload_handle = builder.reload_handle();
    builder.init();

    move |level: &str| {
        if from_env || level == DEFAULT_LOG_LEVEL {
            return;
        }
        match EnvFilter::try_new(level) {
            Ok(filter) => {
                if let Err(e) = reload_handle.reload(filter) {
                    warn!("Failed to apply log level {}: {}", level, e);
                }
            }
            Err(e) => warn!("Invalid log level {}: {}", level, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    // Only test in the binary that installs a global subscriber
    #[test]
    fn logging_is_live_before_config_and_follows_configured_level() {
        let from_env = std::env::var("RUST_LOG").is_ok();
        let set_log_level = setup_logging_env();
        if !from_env {
            assert!(tracing::enabled!(Level::INFO));
            assert!(!tracing::enabled!(Level::DEBUG));
        }

        set_log_level("debug");
        if !from_env {
            assert!(tracing::enabled!(Level::DEBUG));
        }
    }
}
