//! Krama Motion - scripted motion sequencing for differential-drive robots
//!
//! Drives an abstract actuator through timed motion primitives (forward,
//! turn left, turn right, wait), strictly one command at a time, with
//! external stop and reset. One core, two consumption modes: a per-frame
//! polling queue and blocking per-primitive calls.
//!
//! ## Features
//!
//! - `mock`: Enable the simulated actuator for hardware-free testing

pub mod actuator;
pub mod command;
pub mod config;
pub mod error;
pub mod player;
pub mod script;
pub mod sensor;
pub mod sequencer;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod sim;

// Re-export commonly used types
pub use actuator::Actuator;
pub use command::{MotionOp, ScriptCommand};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use player::ScriptPlayer;
pub use script::ScriptStep;
pub use sensor::{ProximitySensors, SensorDirection};
pub use sequencer::{MotionLimits, MotionSequencer, StopHandle};
pub use types::Pose2D;
