#![cfg_attr(not(test), no_std)]

//! Servo-flipped seven-segment digit for a networked scoreboard node.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`display`] | PPM pulse generator and the movement sequencer |
//! | [`support`] | Tick source over hardware timers, heartbeat LED |
//! | [`node`] | Bus address resolution, payload handling and calibration window |
//! | [`config`] | Timing, widths and node table constants |

mod logging;

pub mod config;
pub mod display;
pub mod node;
pub mod support;

pub use display::{ChannelId, FlipDisplay, PulseWidth, Segments, SequencerConfig, State};
pub use support::{TickSource, Timer};
