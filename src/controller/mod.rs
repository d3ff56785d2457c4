//! Controller subsystem: raw driver frames in, normalized state and change
//! notifications out
//!
//! 1. [`frame_source`] - Report line acquisition (driver process or stdin)
//! 2. [`frame_parser`] - Report line to [`frame::Frame`]
//! 3. [`frame_processor`] - Applies frames to the [`controller_state::ControllerState`]
//! 4. [`controller_handle`] - Unified API and lifecycle management
//!
//! # Architecture
//!
//! ```text
//! Driver ──► Source ──► Processor ──► ControllerUpdate
//!            (Frames)   (State machine)
//! ```
//!
//! The state machine itself ([`controller_state`], [`range`]) is synchronous
//! and has no I/O.

pub mod controller_handle;
pub mod controller_state;
pub mod error;
pub mod fields;
pub mod frame;
pub mod frame_parser;
pub mod frame_processor;
pub mod frame_source;
pub mod notification;
pub mod range;
