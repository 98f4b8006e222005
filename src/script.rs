//! Declarative motion scripts
//!
//! A script is plain data: an ordered list of steps, each naming one of the
//! four motion primitives and a duration. Unknown op names fail at
//! deserialization, so a script can never express anything outside the
//! fixed instruction set.

use crate::command::{MotionOp, ScriptCommand};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One step of a script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Motion primitive to run
    pub op: MotionOp,
    /// Step duration in milliseconds
    pub duration_ms: u64,
}

impl ScriptStep {
    /// Create a step
    pub fn new(op: MotionOp, duration_ms: u64) -> Self {
        Self { op, duration_ms }
    }

    /// Step duration
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Build the queueable command for this step
    pub fn to_command(&self) -> ScriptCommand {
        ScriptCommand::new(self.op, self.duration())
    }
}

/// Total wall time a script occupies when run back to back
pub fn total_duration(steps: &[ScriptStep]) -> Duration {
    steps.iter().map(ScriptStep::duration).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Doc {
        script: Vec<ScriptStep>,
    }

    #[test]
    fn test_parse_script_steps() {
        let doc: Doc = toml::from_str(
            r#"
[[script]]
op = "forward"
duration_ms = 500

[[script]]
op = "turn_left"
duration_ms = 300

[[script]]
op = "wait"
duration_ms = 100
"#,
        )
        .unwrap();

        assert_eq!(doc.script.len(), 3);
        assert_eq!(doc.script[0], ScriptStep::new(MotionOp::Forward, 500));
        assert_eq!(doc.script[1], ScriptStep::new(MotionOp::TurnLeft, 300));
        assert_eq!(total_duration(&doc.script), Duration::from_millis(900));
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let result: Result<Doc, _> = toml::from_str(
            r#"
[[script]]
op = "teleport"
duration_ms = 500
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_step_to_command() {
        let step = ScriptStep::new(MotionOp::TurnRight, 250);
        let cmd = step.to_command();
        assert_eq!(cmd.op, MotionOp::TurnRight);
        assert_eq!(cmd.duration, Duration::from_millis(250));
    }
}
