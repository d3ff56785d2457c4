use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use statum::{machine, state};
use std::fmt;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::frame::Frame;
use super::frame_parser::parse_frame;

/// Frame parsed from one report line, stamped on arrival
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub frame: Frame,
    pub timestamp: DateTime<Local>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Driver,
    Stdin,
}

/// Driver invocation and channel sizing for the source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub program: String,
    pub args: Vec<String>,
    pub unload_module: Option<String>,
    pub channel_capacity: usize,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            kind: SourceKind::Driver,
            program: "xboxdrv".to_string(),
            args: vec![
                "--dpad-as-button".to_string(),
                "--detach-kernel-driver".to_string(),
            ],
            unload_module: Some("xpad".to_string()),
            channel_capacity: 1000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to start driver: {0}")]
    DriverStartError(String),

    #[error("Failed to read report line: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to send frame: {0}")]
    FrameSendError(String),

    #[error("Source has no input attached")]
    NotAttached,
}

type LineReader = Box<dyn AsyncBufRead + Send + Unpin>;

pub struct FrameReader {
    origin: &'static str,
    lines: Lines<LineReader>,
}

impl FrameReader {
    pub fn new(origin: &'static str, reader: impl AsyncBufRead + Send + Unpin + 'static) -> Self {
        let boxed: LineReader = Box::new(reader);
        Self {
            origin,
            lines: boxed.lines(),
        }
    }
}

impl fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameReader")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[state]
#[derive(Debug, Clone)]
pub enum SourceState {
    Initializing,
    Reading,
}

#[machine]
#[derive(Debug)]
pub struct FrameSource<S: SourceState> {
    settings: SourceSettings,

    frame_sender: mpsc::Sender<RawFrame>,

    // kill_on_drop: dropping the source stops the driver
    driver: Option<Child>,

    reader: Option<FrameReader>,
}

impl FrameSource<Initializing> {
    pub fn create(settings: Option<SourceSettings>, frame_sender: mpsc::Sender<RawFrame>) -> Self {
        let settings = settings.unwrap_or_default();
        debug!("Creating Frame Source with settings: {:?}", settings);
        Self::new(settings, frame_sender, None, None)
    }

    /// Attaches an already open line reader and skips driver startup
    pub fn from_reader(
        settings: Option<SourceSettings>,
        frame_sender: mpsc::Sender<RawFrame>,
        reader: FrameReader,
    ) -> FrameSource<Reading> {
        let mut source = Self::create(settings, frame_sender);
        info!("Attaching frame reader: {}", reader.origin);
        source.reader = Some(reader);
        source.transition()
    }

    /// Unloads the conflicting kernel module, then attaches the driver or stdin
    pub async fn start(mut self) -> Result<FrameSource<Reading>, SourceError> {
        match self.settings.kind {
            SourceKind::Stdin => {
                info!("Reading report lines from stdin");
                self.reader = Some(FrameReader::new(
                    "stdin",
                    BufReader::new(tokio::io::stdin()),
                ));
            }
            SourceKind::Driver => {
                if let Some(module) = &self.settings.unload_module {
                    unload_kernel_module(module).await;
                }

                info!(
                    "Spawning driver: {} {}",
                    self.settings.program,
                    self.settings.args.join(" ")
                );
                let mut child = Command::new(&self.settings.program)
                    .args(&self.settings.args)
                    .stdout(Stdio::piped())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|e| {
                        error!("Failed to spawn {}: {}", self.settings.program, e);
                        SourceError::DriverStartError(e.to_string())
                    })?;

                let stdout = child.stdout.take().ok_or_else(|| {
                    SourceError::DriverStartError("driver stdout not captured".to_string())
                })?;
                info!("Driver started with pid {:?}", child.id());

                self.reader = Some(FrameReader::new("driver", BufReader::new(stdout)));
                self.driver = Some(child);
            }
        }

        info!("Frame Source started, transitioning to Reading state");
        Ok(self.transition())
    }
}

impl FrameSource<Reading> {
    /// Reads one line; `Ok(false)` once the input is exhausted
    pub async fn read_next_line(&mut self) -> Result<bool, SourceError> {
        let reader = self.reader.as_mut().ok_or(SourceError::NotAttached)?;
        let Some(line) = reader.lines.next_line().await? else {
            return Ok(false);
        };

        let Some(frame) = parse_frame(&line) else {
            debug!("Ignoring non-report line: {}", line.trim());
            return Ok(true);
        };
        if frame.is_empty() {
            warn!("Report line without values: {}", line.trim());
            return Ok(true);
        }

        let raw = RawFrame {
            frame,
            timestamp: Local::now(),
        };
        debug!("Captured frame with {} fields", raw.frame.len());

        self.frame_sender.send(raw).await.map_err(|e| {
            error!("Failed to send frame to processor: {}", e);
            SourceError::FrameSendError(e.to_string())
        })?;

        Ok(true)
    }

    pub async fn run_read_loop(&mut self) -> Result<(), SourceError> {
        info!("Starting Frame Source loop");
        let mut line_count: u64 = 0;

        while self.read_next_line().await? {
            line_count += 1;
        }

        info!("Input ended after {} lines", line_count);
        if let Some(driver) = self.driver.as_mut() {
            match driver.wait().await {
                Ok(status) => warn!("Driver exited with {}", status),
                Err(e) => error!("Failed to wait for driver: {}", e),
            }
        }
        Ok(())
    }
}

async fn unload_kernel_module(module: &str) {
    info!("Unloading kernel module {}", module);
    match Command::new("rmmod").arg(module).status().await {
        Ok(status) if status.success() => debug!("Module {} unloaded", module),
        Ok(status) => warn!("rmmod {} exited with {}, continuing", module, status),
        Err(e) => warn!("Failed to run rmmod {}: {}, continuing", module, e),
    }
}
