//! Configuration for the krama player
//!
//! Loads configuration from a TOML file: motion limits, start pose, control
//! rate, logging, and the script itself.

use crate::error::Result;
use crate::script::ScriptStep;
use crate::sequencer::MotionLimits;
use crate::types::Pose2D;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub motion: MotionConfig,
    pub start: StartConfig,
    pub player: PlayerConfig,
    pub logging: LoggingConfig,
    /// Script steps, executed in order
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

/// Motion limits and simulation parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotionConfig {
    /// Forward thrust for a forward command (m/s²)
    pub linear_acceleration: f32,
    /// Angular rate for turn commands (rad/s)
    pub turn_rate: f32,
    /// Peak linear speed (m/s)
    pub max_velocity: f32,
    /// Deceleration applied while coasting (m/s²)
    pub drag: f32,
    /// Proximity sensor range (m)
    pub sensor_range: f32,
}

impl MotionConfig {
    /// Base primitive magnitudes for the sequencer
    pub fn limits(&self) -> MotionLimits {
        MotionLimits {
            linear_acceleration: self.linear_acceleration,
            turn_rate: self.turn_rate,
            max_velocity: self.max_velocity,
        }
    }
}

/// Start pose
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartConfig {
    /// X position in meters
    pub x: f32,
    /// Y position in meters
    pub y: f32,
    /// Heading in radians (CCW from +X)
    pub theta: f32,
}

impl StartConfig {
    /// Start pose as a [`Pose2D`]
    pub fn pose(&self) -> Pose2D {
        Pose2D::new(self.x, self.y, self.theta)
    }
}

/// Control loop configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    /// Control loop rate (Hz)
    pub rate_hz: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log output (stdout or stderr)
    pub output: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Built-in demo: drive a square, pausing at each corner.
    ///
    /// Suitable for a first run without a config file.
    pub fn demo_defaults() -> Self {
        use crate::command::MotionOp;

        let mut script = Vec::new();
        for _ in 0..4 {
            script.push(ScriptStep::new(MotionOp::Forward, 1500));
            script.push(ScriptStep::new(MotionOp::Wait, 300));
            // 90° at the default turn rate
            script.push(ScriptStep::new(MotionOp::TurnLeft, 1309));
            script.push(ScriptStep::new(MotionOp::Wait, 300));
        }

        Self {
            motion: MotionConfig {
                linear_acceleration: 0.5,
                turn_rate: 1.2,
                max_velocity: 0.35,
                drag: 0.8,
                sensor_range: 0.6,
            },
            start: StartConfig {
                x: 0.0,
                y: 0.0,
                theta: 0.0,
            },
            player: PlayerConfig { rate_hz: 50 },
            logging: LoggingConfig {
                level: "info".to_string(),
                output: "stdout".to_string(),
            },
            script,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::demo_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MotionOp;

    #[test]
    fn test_demo_defaults() {
        let config = AppConfig::demo_defaults();
        assert_eq!(config.player.rate_hz, 50);
        assert_eq!(config.script.len(), 16);
        assert_eq!(config.script[0].op, MotionOp::Forward);
        assert!(config.motion.max_velocity > 0.0);
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::demo_defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[motion]"));
        assert!(toml_string.contains("[start]"));
        assert!(toml_string.contains("[player]"));
        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("[[script]]"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[motion]
linear_acceleration = 0.4
turn_rate = 1.0
max_velocity = 0.3
drag = 0.6
sensor_range = 0.5

[start]
x = 1.0
y = 2.0
theta = 0.0

[player]
rate_hz = 100

[logging]
level = "debug"
output = "stderr"

[[script]]
op = "forward"
duration_ms = 500
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.player.rate_hz, 100);
        assert_eq!(config.start.pose(), Pose2D::new(1.0, 2.0, 0.0));
        assert_eq!(config.script.len(), 1);
        assert_eq!(config.motion.limits().turn_rate, 1.0);
    }

    #[test]
    fn test_script_section_is_optional() {
        let toml_content = r#"
[motion]
linear_acceleration = 0.4
turn_rate = 1.0
max_velocity = 0.3
drag = 0.6
sensor_range = 0.5

[start]
x = 0.0
y = 0.0
theta = 0.0

[player]
rate_hz = 50

[logging]
level = "info"
output = "stdout"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert!(config.script.is_empty());
    }
}
