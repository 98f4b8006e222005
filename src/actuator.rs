//! Actuator capability trait

use crate::error::Result;
use crate::types::Pose2D;

/// Motion-capable entity driven by the sequencer.
///
/// Implementations translate thrust and angular-rate setpoints into whatever
/// the underlying platform needs (wheel speeds, physics-engine forces). The
/// sequencer is the only writer while a command is executing.
pub trait Actuator: Send {
    /// Apply forward thrust along the current heading
    ///
    /// # Arguments
    /// * `magnitude` - Acceleration in m/s² (negative for reverse)
    fn apply_forward_thrust(&mut self, magnitude: f32) -> Result<()>;

    /// Apply angular velocity
    ///
    /// # Arguments
    /// * `magnitude` - Angular rate in rad/s (positive = CCW)
    fn apply_angular_velocity(&mut self, magnitude: f32) -> Result<()>;

    /// Zero thrust and angular rate at the end of a command.
    ///
    /// Residual linear velocity may persist (platform drag bleeds it off).
    fn clear_actuation(&mut self) -> Result<()>;

    /// Zero thrust, angular rate and linear velocity immediately.
    fn halt(&mut self) -> Result<()>;

    /// Get current pose
    fn get_pose(&mut self) -> Result<Pose2D>;

    /// Teleport to a pose (reset path)
    fn set_pose(&mut self, pose: Pose2D) -> Result<()>;

    /// Cap the platform's peak linear speed (m/s).
    ///
    /// Platforms without a configurable cap can keep the default no-op.
    fn set_velocity_limit(&mut self, cap: f32) -> Result<()> {
        let _ = cap;
        Ok(())
    }
}
