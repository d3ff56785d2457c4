//! Controller Handle - Unified API for the frame pipeline
//!
//! Wires the frame source and the frame processor together and owns their
//! lifecycle.
//!
//! ```text
//! FrameSource ─[RawFrame]→ FrameProcessor ─[ControllerUpdate]→ Application
//!             (mpsc)                       └─[ControllerSnapshot]→ watch
//! ```

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::controller_state::{ControllerConfig, ControllerSnapshot, ControllerState};
use super::error::ControllerError;
use super::frame_processor::{ControllerUpdate, FrameProcessor};
use super::frame_source::{FrameSource, SourceError, SourceSettings};

/// Settings for the complete controller pipeline
#[derive(Clone, Debug, Default)]
pub struct ControllerSettings {
    /// Dead-zones applied by the state machine
    pub controller: ControllerConfig,

    /// Where report lines are read from
    pub source: SourceSettings,
}

/// Errors that can occur while starting the pipeline
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// Invalid controller configuration, detected before anything is spawned
    #[error("Controller error: {0}")]
    ControllerError(#[from] ControllerError),

    /// Frame source failed to start
    #[error("Source error: {0}")]
    SourceError(#[from] SourceError),

    /// Settings rejected before anything is spawned
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Handle for the running pipeline
///
/// Dropping the handle does not stop the tasks; call [`ControllerHandle::shutdown`].
pub struct ControllerHandle {
    state_receiver: watch::Receiver<ControllerSnapshot>,
    shutdown: CancellationToken,
    source_task: JoinHandle<()>,
    processor_task: JoinHandle<()>,
}

impl ControllerHandle {
    /// Validates the configuration, starts the source and spawns both tasks
    ///
    /// Updates are delivered on `sender`, one per frame that changed anything.
    pub async fn spawn(
        settings: ControllerSettings,
        sender: mpsc::Sender<ControllerUpdate>,
    ) -> Result<Self, HandleError> {
        info!("Initializing Controller pipeline with settings: {:?}", settings);

        let state = ControllerState::new(&settings.controller)?;
        info!(
            "Dead-zones: left={:?} right={:?}",
            state.left_deadzone(),
            state.right_deadzone()
        );

        if settings.source.channel_capacity == 0 {
            error!("Frame channel capacity must be at least 1");
            return Err(HandleError::InvalidSettings(
                "source.channel_capacity must be greater than 0".to_string(),
            ));
        }

        let (frame_sender, frame_receiver) = mpsc::channel(settings.source.channel_capacity);
        debug!(
            "Created frame channel with buffer capacity {}",
            settings.source.channel_capacity
        );

        let source = FrameSource::create(Some(settings.source), frame_sender);
        let mut source = source.start().await?;
        info!("Frame Source started successfully");

        let mut processor = FrameProcessor::new(state, frame_receiver, sender);
        let state_receiver = processor.subscribe();

        let shutdown = CancellationToken::new();

        let source_token = shutdown.clone();
        let source_task = tokio::spawn(async move {
            tokio::select! {
                _ = source_token.cancelled() => info!("Frame Source cancelled"),
                result = source.run_read_loop() => match result {
                    Ok(()) => info!("Frame Source task finished"),
                    Err(e) => error!("Frame Source task terminated with error: {}", e),
                },
            }
        });

        let processor_token = shutdown.clone();
        let processor_task = tokio::spawn(async move {
            if let Err(e) = processor.run(processor_token).await {
                error!("Frame Processor task terminated with error: {}", e);
            }
        });

        info!("Controller pipeline initialized successfully");
        Ok(Self {
            state_receiver,
            shutdown,
            source_task,
            processor_task,
        })
    }

    /// Receiver for the latest snapshot
    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        debug!("New subscriber to controller snapshots");
        self.state_receiver.clone()
    }

    /// Stops both tasks and waits for them to finish
    pub async fn shutdown(self) {
        info!("Shutting down Controller pipeline");
        self.shutdown.cancel();

        for (name, task) in [("source", self.source_task), ("processor", self.processor_task)] {
            if let Err(e) = task.await {
                error!("Controller {} task failed to join: {}", name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::range::RangeBounds;
    use std::time::Duration;

    #[tokio::test]
    async fn invalid_deadzone_fails_before_spawning() {
        let (tx, _rx) = mpsc::channel(4);
        let settings = ControllerSettings {
            controller: ControllerConfig {
                left_deadzone: Some(RangeBounds {
                    min: 1.0,
                    max: -1.0,
                }),
                right_deadzone: None,
            },
            source: SourceSettings::default(),
        };

        let result = ControllerHandle::spawn(settings, tx).await;
        assert!(matches!(result, Err(HandleError::ControllerError(_))));
    }

    #[tokio::test]
    async fn zero_channel_capacity_is_rejected() {
        let (tx, _rx) = mpsc::channel(4);
        let settings = ControllerSettings {
            controller: ControllerConfig::default(),
            source: toml::from_str("channel_capacity = 0\nkind = \"stdin\"").unwrap(),
        };

        let result = ControllerHandle::spawn(settings, tx).await;
        assert!(matches!(result, Err(HandleError::InvalidSettings(_))));
    }

    #[tokio::test]
    async fn shutdown_completes_while_updates_are_unread() {
        let (tx, mut rx) = mpsc::channel(1);
        let settings = ControllerSettings {
            controller: ControllerConfig::default(),
            source: SourceSettings {
                program: "sh".to_string(),
                args: vec![
                    "-c".to_string(),
                    "for i in 1 2 3 4 5 6 7 8 9 10; do echo 'X1: 0 A:1'; echo 'X1: 0 A:0'; done; sleep 5"
                        .to_string(),
                ],
                unload_module: None,
                ..SourceSettings::default()
            },
        };

        let handle = ControllerHandle::spawn(settings, tx).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
            .await
            .expect("shutdown hung on a full update channel");

        let first = rx.try_recv().unwrap();
        assert!(first.snapshot.a);
    }

    #[tokio::test]
    async fn missing_driver_is_a_source_error() {
        let (tx, _rx) = mpsc::channel(4);
        let settings = ControllerSettings {
            controller: ControllerConfig::default(),
            source: SourceSettings {
                program: "padstate-driver-that-does-not-exist".to_string(),
                unload_module: None,
                ..SourceSettings::default()
            },
        };

        let result = ControllerHandle::spawn(settings, tx).await;
        assert!(matches!(
            result,
            Err(HandleError::SourceError(SourceError::DriverStartError(_)))
        ));
    }
}
