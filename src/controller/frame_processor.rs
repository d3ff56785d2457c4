use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::controller_state::{ControllerSnapshot, ControllerState};
use super::frame_source::RawFrame;
use super::notification::Notification;

// Transitions detected in one frame, as broadcast to consumers
#[derive(Clone, Debug)]
pub struct ControllerUpdate {
    pub snapshot: ControllerSnapshot,
    pub notifications: Vec<Notification>,
    pub timestamp: DateTime<Local>,
}

// Processor errors
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("Failed to send update: {0}")]
    UpdateSendError(String),
}

/// Applies frames to the controller state, one at a time, in arrival order
pub struct FrameProcessor {
    state: ControllerState,
    frame_receiver: mpsc::Receiver<RawFrame>,
    update_sender: mpsc::Sender<ControllerUpdate>,
    state_sender: watch::Sender<ControllerSnapshot>,
    frames_processed: u64,
}

impl FrameProcessor {
    pub fn new(
        state: ControllerState,
        frame_receiver: mpsc::Receiver<RawFrame>,
        update_sender: mpsc::Sender<ControllerUpdate>,
    ) -> Self {
        let (state_sender, _) = watch::channel(state.snapshot());
        debug!("Created watch channel for controller snapshots");

        Self {
            state,
            frame_receiver,
            update_sender,
            state_sender,
            frames_processed: 0,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerSnapshot> {
        self.state_sender.subscribe()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Applies a single frame and forwards its notifications
    pub async fn process(&mut self, raw: RawFrame) -> Result<(), ProcessorError> {
        let update = self.state.apply_frame(&raw.frame);
        self.frames_processed += 1;

        self.state_sender.send_replace(update.snapshot);

        if update.notifications.is_empty() {
            return Ok(());
        }

        debug!(
            "Frame at {} produced {} notifications",
            raw.timestamp.format("%H:%M:%S.%3f"),
            update.notifications.len()
        );

        self.update_sender
            .send(ControllerUpdate {
                snapshot: update.snapshot,
                notifications: update.notifications,
                timestamp: raw.timestamp,
            })
            .await
            .map_err(|e| ProcessorError::UpdateSendError(e.to_string()))
    }

    // Run until the frame channel closes or shutdown is requested
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<(), ProcessorError> {
        info!("Starting Frame Processor loop");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Frame Processor shutting down");
                    break;
                }
                frame = self.frame_receiver.recv() => {
                    let Some(raw) = frame else {
                        info!("Frame channel closed");
                        break;
                    };
                    // A full update channel must not hold off shutdown
                    let result = tokio::select! {
                        _ = shutdown.cancelled() => {
                            info!("Frame Processor shutting down with an update pending");
                            break;
                        }
                        result = self.process(raw) => result,
                    };
                    if let Err(e) = result {
                        error!("Failed to publish update: {}", e);
                        return Err(e);
                    }
                }
            }
        }

        info!("Frame Processor processed {} frames", self.frames_processed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::controller_state::ControllerConfig;
    use crate::controller::frame::Frame;
    use std::time::Duration;

    fn raw(pairs: &[(&str, i32)]) -> RawFrame {
        RawFrame {
            frame: pairs.iter().map(|(k, v)| (*k, *v)).collect(),
            timestamp: Local::now(),
        }
    }

    fn processor() -> (
        FrameProcessor,
        mpsc::Sender<RawFrame>,
        mpsc::Receiver<ControllerUpdate>,
    ) {
        processor_with_update_capacity(16)
    }

    fn processor_with_update_capacity(
        capacity: usize,
    ) -> (
        FrameProcessor,
        mpsc::Sender<RawFrame>,
        mpsc::Receiver<ControllerUpdate>,
    ) {
        let (frame_tx, frame_rx) = mpsc::channel(16);
        let (update_tx, update_rx) = mpsc::channel(capacity);
        let state = ControllerState::new(&ControllerConfig::default()).unwrap();
        (FrameProcessor::new(state, frame_rx, update_tx), frame_tx, update_rx)
    }

    #[tokio::test]
    async fn unchanged_frames_are_not_forwarded() {
        let (mut processor, _frame_tx, mut update_rx) = processor();

        processor.process(raw(&[("A", 1)])).await.unwrap();
        processor.process(raw(&[("A", 1)])).await.unwrap();

        let update = update_rx.recv().await.unwrap();
        assert!(update.snapshot.a);
        assert_eq!(update.notifications.len(), 2);
        assert!(update_rx.try_recv().is_err());
        assert_eq!(processor.frames_processed(), 2);
    }

    #[tokio::test]
    async fn snapshot_is_published_on_watch() {
        let (mut processor, _frame_tx, _update_rx) = processor();
        let snapshots = processor.subscribe();

        processor.process(raw(&[("RT", 255)])).await.unwrap();
        assert_eq!(snapshots.borrow().right_trigger, 100.0);
    }

    #[tokio::test]
    async fn run_stops_when_frames_end() {
        let (mut processor, frame_tx, mut update_rx) = processor();

        frame_tx.send(raw(&[("du", 1)])).await.unwrap();
        frame_tx
            .send(RawFrame {
                frame: Frame::new(),
                timestamp: Local::now(),
            })
            .await
            .unwrap();
        drop(frame_tx);

        processor.run(CancellationToken::new()).await.unwrap();

        let pressed = update_rx.recv().await.unwrap();
        assert!(pressed.snapshot.up);
        let released = update_rx.recv().await.unwrap();
        assert!(!released.snapshot.up);
        assert_eq!(released.notifications[0].topic(), "up:release");
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let (mut processor, _frame_tx, _update_rx) = processor();
        let token = CancellationToken::new();
        token.cancel();
        processor.run(token).await.unwrap();
        assert_eq!(processor.frames_processed(), 0);
    }

    #[tokio::test]
    async fn cancel_stops_run_while_update_channel_is_full() {
        let (mut processor, frame_tx, _update_rx) = processor_with_update_capacity(1);
        frame_tx.send(raw(&[("A", 1)])).await.unwrap();
        frame_tx.send(raw(&[("A", 0)])).await.unwrap();

        let token = CancellationToken::new();
        let run_token = token.clone();
        let task = tokio::spawn(async move {
            let result = processor.run(run_token).await;
            result.map(|()| processor.frames_processed())
        });

        // First update fills the channel, the second one blocks on send
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        let processed = tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("processor did not stop after cancel")
            .unwrap()
            .unwrap();
        assert_eq!(processed, 2);
    }
}
