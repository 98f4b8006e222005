//! Scripted motion command definitions

use crate::sequencer::MotionSequencer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Callback fired exactly once when a command finishes its full duration.
///
/// Receives the sequencer so chained scripts can enqueue follow-up commands
/// or stop movement from inside the callback.
pub type CompletionCallback = Box<dyn FnOnce(&mut MotionSequencer) + Send>;

/// Motion primitive kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionOp {
    /// Accelerate along the current heading
    Forward,
    /// Rotate counter-clockwise in place
    TurnLeft,
    /// Rotate clockwise in place
    TurnRight,
    /// Timed no-op, used to create gaps between commands
    Wait,
}

impl MotionOp {
    /// Op name for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::TurnLeft => "turn_left",
            Self::TurnRight => "turn_right",
            Self::Wait => "wait",
        }
    }
}

/// One atomic scripted motion instruction with a bounded duration.
///
/// Immutable once enqueued. Durations are `Duration`, so the non-negative
/// clamp happens at construction by type.
pub struct ScriptCommand {
    /// Motion primitive to execute
    pub op: MotionOp,
    /// How long the primitive stays applied
    pub duration: Duration,
    /// Optional completion callback
    pub on_complete: Option<CompletionCallback>,
}

impl ScriptCommand {
    /// Create a command from op and duration
    pub fn new(op: MotionOp, duration: Duration) -> Self {
        Self {
            op,
            duration,
            on_complete: None,
        }
    }

    /// Forward command
    pub fn forward(duration: Duration) -> Self {
        Self::new(MotionOp::Forward, duration)
    }

    /// Turn-left command
    pub fn turn_left(duration: Duration) -> Self {
        Self::new(MotionOp::TurnLeft, duration)
    }

    /// Turn-right command
    pub fn turn_right(duration: Duration) -> Self {
        Self::new(MotionOp::TurnRight, duration)
    }

    /// Wait command
    pub fn wait(duration: Duration) -> Self {
        Self::new(MotionOp::Wait, duration)
    }

    /// Attach a completion callback
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&mut MotionSequencer) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptCommand")
            .field("op", &self.op)
            .field("duration", &self.duration)
            .field("has_callback", &self.on_complete.is_some())
            .finish()
    }
}

/// Status of the active command
#[derive(Debug, Clone)]
pub struct CommandStatus {
    /// Motion primitive being executed
    pub op: MotionOp,
    /// Requested duration
    pub duration: Duration,
    /// Time left before completion
    pub remaining: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_op_names() {
        assert_eq!(MotionOp::Forward.name(), "forward");
        assert_eq!(MotionOp::TurnLeft.name(), "turn_left");
        assert_eq!(MotionOp::TurnRight.name(), "turn_right");
        assert_eq!(MotionOp::Wait.name(), "wait");
    }

    #[test]
    fn test_command_builder() {
        let cmd = ScriptCommand::forward(Duration::from_millis(500));
        assert_eq!(cmd.op, MotionOp::Forward);
        assert_eq!(cmd.duration, Duration::from_millis(500));
        assert!(cmd.on_complete.is_none());

        let cmd = ScriptCommand::wait(Duration::ZERO).on_complete(|_seq| {});
        assert!(cmd.on_complete.is_some());
    }
}
