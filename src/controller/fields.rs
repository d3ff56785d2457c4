use serde::{Deserialize, Serialize};
use std::fmt;

use super::range::{Range, STICK_INPUT, STICK_OUTPUT, TRIGGER_INPUT, TRIGGER_OUTPUT};

// Boolean button / d-pad fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigitalField {
    A,
    B,
    X,
    Y,
    LeftBumper,
    RightBumper,
    Back,
    Start,
    Guide,
    Up,
    Down,
    Left,
    Right,
}

impl DigitalField {
    /// Processing order within a frame
    pub const ALL: [DigitalField; 13] = [
        DigitalField::A,
        DigitalField::B,
        DigitalField::X,
        DigitalField::Y,
        DigitalField::LeftBumper,
        DigitalField::RightBumper,
        DigitalField::Back,
        DigitalField::Start,
        DigitalField::Guide,
        DigitalField::Up,
        DigitalField::Down,
        DigitalField::Left,
        DigitalField::Right,
    ];

    /// Key carrying this field in a raw frame
    pub fn frame_key(self) -> &'static str {
        match self {
            DigitalField::A => "A",
            DigitalField::B => "B",
            DigitalField::X => "X",
            DigitalField::Y => "Y",
            DigitalField::LeftBumper => "LB",
            DigitalField::RightBumper => "RB",
            DigitalField::Back => "back",
            DigitalField::Start => "start",
            DigitalField::Guide => "guide",
            DigitalField::Up => "du",
            DigitalField::Down => "dd",
            DigitalField::Left => "dl",
            DigitalField::Right => "dr",
        }
    }

    /// Name used in notification topics
    pub fn name(self) -> &'static str {
        match self {
            DigitalField::A => "a",
            DigitalField::B => "b",
            DigitalField::X => "x",
            DigitalField::Y => "y",
            DigitalField::LeftBumper => "leftBumper",
            DigitalField::RightBumper => "rightBumper",
            DigitalField::Back => "back",
            DigitalField::Start => "start",
            DigitalField::Guide => "guide",
            DigitalField::Up => "up",
            DigitalField::Down => "down",
            DigitalField::Left => "left",
            DigitalField::Right => "right",
        }
    }
}

impl fmt::Display for DigitalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Stick side, selects which dead-zone applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StickSide {
    Left,
    Right,
}

// Continuous stick axis / trigger fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalogField {
    LeftX,
    LeftY,
    RightX,
    RightY,
    LeftTrigger,
    RightTrigger,
}

impl AnalogField {
    /// Processing order within a frame, after all digital fields
    pub const ALL: [AnalogField; 6] = [
        AnalogField::LeftX,
        AnalogField::LeftY,
        AnalogField::RightX,
        AnalogField::RightY,
        AnalogField::LeftTrigger,
        AnalogField::RightTrigger,
    ];

    pub fn frame_key(self) -> &'static str {
        match self {
            AnalogField::LeftX => "X1",
            AnalogField::LeftY => "Y1",
            AnalogField::RightX => "X2",
            AnalogField::RightY => "Y2",
            AnalogField::LeftTrigger => "LT",
            AnalogField::RightTrigger => "RT",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AnalogField::LeftX => "leftX",
            AnalogField::LeftY => "leftY",
            AnalogField::RightX => "rightX",
            AnalogField::RightY => "rightY",
            AnalogField::LeftTrigger => "leftTrigger",
            AnalogField::RightTrigger => "rightTrigger",
        }
    }

    /// Stick the axis belongs to; `None` for triggers
    pub fn stick_side(self) -> Option<StickSide> {
        match self {
            AnalogField::LeftX | AnalogField::LeftY => Some(StickSide::Left),
            AnalogField::RightX | AnalogField::RightY => Some(StickSide::Right),
            AnalogField::LeftTrigger | AnalogField::RightTrigger => None,
        }
    }

    /// Raw input domain of this field
    pub fn input_range(self) -> Range {
        match self.stick_side() {
            Some(_) => STICK_INPUT,
            None => TRIGGER_INPUT,
        }
    }

    /// Normalized output domain of this field
    pub fn output_range(self) -> Range {
        match self.stick_side() {
            Some(_) => STICK_OUTPUT,
            None => TRIGGER_OUTPUT,
        }
    }
}

impl fmt::Display for AnalogField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
