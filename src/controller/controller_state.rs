//! Controller state machine
//!
//! Turns raw frames into a normalized [`ControllerSnapshot`] and the ordered list
//! of [`Notification`]s for every field whose value actually changed.
//!
//! Per frame, digital fields are processed first, then analog fields, each in
//! the order of [`DigitalField::ALL`] and [`AnalogField::ALL`].
//!
//! # Missing keys
//!
//! - digital key absent: treated as raw `0` (released)
//! - analog key absent: field keeps its value, nothing is emitted
//!
//! # Analog pipeline
//!
//! ```text
//! raw ──► dead-zone? ──► raw 0 ──► rescale(input → output) ──► compare ──► move
//! ```
//!
//! Suppression happens on the raw value, before rescaling.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::error::{ControllerError, RangeError};
use super::fields::{AnalogField, DigitalField, StickSide};
use super::frame::Frame;
use super::notification::{InputEvent, Notification};
use super::range::{Range, RangeBounds};

/// Dead-zone configuration, both sides optional
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub left_deadzone: Option<RangeBounds>,
    pub right_deadzone: Option<RangeBounds>,
}

/// Read-only view of every normalized field
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,
    pub left_bumper: bool,
    pub right_bumper: bool,
    pub back: bool,
    pub start: bool,
    pub guide: bool,
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,

    pub left_x: f64,
    pub left_y: f64,
    pub right_x: f64,
    pub right_y: f64,
    pub left_trigger: f64,
    pub right_trigger: f64,
}

impl ControllerSnapshot {
    pub fn analog(&self, field: AnalogField) -> f64 {
        match field {
            AnalogField::LeftX => self.left_x,
            AnalogField::LeftY => self.left_y,
            AnalogField::RightX => self.right_x,
            AnalogField::RightY => self.right_y,
            AnalogField::LeftTrigger => self.left_trigger,
            AnalogField::RightTrigger => self.right_trigger,
        }
    }

    fn digital_mut(&mut self, field: DigitalField) -> &mut bool {
        match field {
            DigitalField::A => &mut self.a,
            DigitalField::B => &mut self.b,
            DigitalField::X => &mut self.x,
            DigitalField::Y => &mut self.y,
            DigitalField::LeftBumper => &mut self.left_bumper,
            DigitalField::RightBumper => &mut self.right_bumper,
            DigitalField::Back => &mut self.back,
            DigitalField::Start => &mut self.start,
            DigitalField::Guide => &mut self.guide,
            DigitalField::Up => &mut self.up,
            DigitalField::Down => &mut self.down,
            DigitalField::Left => &mut self.left,
            DigitalField::Right => &mut self.right,
        }
    }

    fn analog_mut(&mut self, field: AnalogField) -> &mut f64 {
        match field {
            AnalogField::LeftX => &mut self.left_x,
            AnalogField::LeftY => &mut self.left_y,
            AnalogField::RightX => &mut self.right_x,
            AnalogField::RightY => &mut self.right_y,
            AnalogField::LeftTrigger => &mut self.left_trigger,
            AnalogField::RightTrigger => &mut self.right_trigger,
        }
    }
}

/// Result of applying one frame
#[derive(Clone, Debug, PartialEq)]
pub struct FrameUpdate {
    pub snapshot: ControllerSnapshot,
    pub notifications: Vec<Notification>,
}

/// Current normalized state of a single controller
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ControllerState {
    snapshot: ControllerSnapshot,
    left_deadzone: Range,
    right_deadzone: Range,
}

impl ControllerState {
    /// Creates a state with all fields at rest; absent dead-zones are `[0, 0]`
    pub fn new(config: &ControllerConfig) -> Result<Self, ControllerError> {
        let left_deadzone = build_deadzone(config.left_deadzone, "left")?;
        let right_deadzone = build_deadzone(config.right_deadzone, "right")?;

        debug!(
            "Created controller state with dead-zones left={:?} right={:?}",
            left_deadzone, right_deadzone
        );

        Ok(Self {
            snapshot: ControllerSnapshot::default(),
            left_deadzone,
            right_deadzone,
        })
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.snapshot
    }

    pub fn left_deadzone(&self) -> Range {
        self.left_deadzone
    }

    pub fn right_deadzone(&self) -> Range {
        self.right_deadzone
    }

    /// Applies one raw frame and reports every transition in field order.
    ///
    /// The new snapshot is committed only after all 19 fields are computed.
    pub fn apply_frame(&mut self, frame: &Frame) -> FrameUpdate {
        let mut next = self.snapshot;
        let mut notifications = Vec::new();

        for field in DigitalField::ALL {
            let pressed = frame.get(field.frame_key()).unwrap_or(0) == 1;
            let stored = next.digital_mut(field);
            if *stored == pressed {
                continue;
            }
            *stored = pressed;

            let event = if pressed {
                debug!("{} pressed", field);
                InputEvent::Press(field)
            } else {
                debug!("{} released", field);
                InputEvent::Release(field)
            };
            notifications.extend(Notification::dual(event));
        }

        for field in AnalogField::ALL {
            let Some(raw) = frame.get(field.frame_key()) else {
                trace!("No sample for {} in frame, keeping {}", field, next.analog(field));
                continue;
            };

            let position = self.normalize(field, raw);
            let stored = next.analog_mut(field);
            if *stored == position {
                continue;
            }
            *stored = position;

            debug!("{} moved to {:.4} (raw {})", field, position, raw);
            notifications.extend(Notification::dual(InputEvent::Move { field, position }));
        }

        self.snapshot = next;
        FrameUpdate {
            snapshot: next,
            notifications,
        }
    }

    fn deadzone(&self, field: AnalogField) -> Option<&Range> {
        match field.stick_side()? {
            StickSide::Left => Some(&self.left_deadzone),
            StickSide::Right => Some(&self.right_deadzone),
        }
    }

    // Suppress to raw zero first, then rescale
    fn normalize(&self, field: AnalogField, raw: i32) -> f64 {
        let mut raw = f64::from(raw);
        if let Some(deadzone) = self.deadzone(field) {
            if deadzone.contains(raw) {
                raw = 0.0;
            }
        }
        field.input_range().rescale(raw, &field.output_range())
    }
}

fn build_deadzone(
    bounds: Option<RangeBounds>,
    side: &'static str,
) -> Result<Range, ControllerError> {
    bounds
        .map_or(Ok(Range::ZERO), Range::try_from)
        .map_err(|source: RangeError| ControllerError::InvalidDeadzone { side, source })
}
