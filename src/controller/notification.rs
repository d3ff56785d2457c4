use serde::{Deserialize, Serialize};
use std::fmt;

use super::fields::{AnalogField, DigitalField};

/// Delivery channel of a notification
///
/// Every transition is reported twice: once on the field-specific channel
/// and once on the generic channel, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Field,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    Press,
    Release,
    Move,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::Press => "press",
            NotificationKind::Release => "release",
            NotificationKind::Move => "move",
        })
    }
}

/// Observed field transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    Press(DigitalField),
    Release(DigitalField),
    Move { field: AnalogField, position: f64 },
}

impl InputEvent {
    pub fn kind(&self) -> NotificationKind {
        match self {
            InputEvent::Press(_) => NotificationKind::Press,
            InputEvent::Release(_) => NotificationKind::Release,
            InputEvent::Move { .. } => NotificationKind::Move,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            InputEvent::Press(field) | InputEvent::Release(field) => field.name(),
            InputEvent::Move { field, .. } => field.name(),
        }
    }

    /// New position for moves, `None` for button edges
    pub fn position(&self) -> Option<f64> {
        match self {
            InputEvent::Move { position, .. } => Some(*position),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub channel: Channel,
    pub event: InputEvent,
}

impl Notification {
    /// Emits the field-specific and the generic notification for one transition
    pub(crate) fn dual(event: InputEvent) -> [Notification; 2] {
        [
            Notification {
                channel: Channel::Field,
                event,
            },
            Notification {
                channel: Channel::Generic,
                event,
            },
        ]
    }

    /// Subscription topic, e.g. `a:press` on the field channel or `press` on the generic one
    pub fn topic(&self) -> String {
        match self.channel {
            Channel::Field => format!("{}:{}", self.event.field_name(), self.event.kind()),
            Channel::Generic => self.event.kind().to_string(),
        }
    }
}
