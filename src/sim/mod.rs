//! Simulated actuator for hardware-free testing
//!
//! Integrates thrust and angular-rate setpoints into a pose the way the
//! target platform's drive stack would: thrust accelerates along the
//! heading, drag bleeds speed off while coasting, speed is capped, and an
//! optional occupancy map stops the robot at walls.

mod grid;

pub use grid::GridMap;

use crate::actuator::Actuator;
use crate::error::Result;
use crate::sensor::{ProximitySensors, SensorDirection};
use crate::types::{Pose2D, normalize_angle};
use parking_lot::Mutex;
use std::sync::Arc;

/// Simulation parameters
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Deceleration while no thrust is applied (m/s²)
    pub drag: f32,
    /// Hard cap on linear speed (m/s)
    pub max_velocity: f32,
    /// Proximity sensor range (m)
    pub sensor_range: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            drag: 0.8,
            max_velocity: 0.35,
            sensor_range: 0.6,
        }
    }
}

struct SimState {
    pose: Pose2D,
    /// Signed speed along the heading (m/s)
    speed: f32,
    thrust: f32,
    angular_rate: f32,
    velocity_limit: f32,
    config: SimConfig,
    map: Option<GridMap>,
    collided: bool,
}

/// Simulated actuator.
///
/// Cloning yields another handle onto the same simulated robot, so a test
/// can hand one clone to the sequencer and keep another for inspection.
#[derive(Clone)]
pub struct SimActuator {
    state: Arc<Mutex<SimState>>,
}

impl SimActuator {
    /// Create a simulated robot at the given pose
    pub fn new(config: SimConfig, start: Pose2D) -> Self {
        let velocity_limit = config.max_velocity;
        Self {
            state: Arc::new(Mutex::new(SimState {
                pose: start,
                speed: 0.0,
                thrust: 0.0,
                angular_rate: 0.0,
                velocity_limit,
                config,
                map: None,
                collided: false,
            })),
        }
    }

    /// Attach an occupancy map; the robot stops when driving into a wall
    pub fn with_map(self, map: GridMap) -> Self {
        self.state.lock().map = Some(map);
        self
    }

    /// Advance the simulation by `dt` seconds
    pub fn step(&self, dt: f32) {
        let mut s = self.state.lock();

        if s.thrust != 0.0 {
            s.speed += s.thrust * dt;
        } else if s.speed != 0.0 {
            // Coasting: drag moves speed toward zero without overshooting
            let decel = s.config.drag * dt;
            s.speed = if s.speed > 0.0 {
                (s.speed - decel).max(0.0)
            } else {
                (s.speed + decel).min(0.0)
            };
        }

        let cap = s.velocity_limit.min(s.config.max_velocity);
        s.speed = s.speed.clamp(-cap, cap);

        let theta = normalize_angle(s.pose.theta + s.angular_rate * dt);
        s.pose.theta = theta;

        let new_x = s.pose.x + s.speed * theta.cos() * dt;
        let new_y = s.pose.y + s.speed * theta.sin() * dt;

        let blocked = s
            .map
            .as_ref()
            .is_some_and(|map| map.is_occupied(new_x, new_y));
        if blocked {
            s.speed = 0.0;
            s.collided = true;
        } else {
            s.pose.x = new_x;
            s.pose.y = new_y;
        }
    }

    /// Current signed speed along the heading (m/s)
    pub fn speed(&self) -> f32 {
        self.state.lock().speed
    }

    /// Currently applied thrust (m/s²)
    pub fn thrust(&self) -> f32 {
        self.state.lock().thrust
    }

    /// Currently applied angular rate (rad/s)
    pub fn angular_rate(&self) -> f32 {
        self.state.lock().angular_rate
    }

    /// True once the robot has hit a wall
    pub fn collided(&self) -> bool {
        self.state.lock().collided
    }
}

impl Actuator for SimActuator {
    fn apply_forward_thrust(&mut self, magnitude: f32) -> Result<()> {
        self.state.lock().thrust = magnitude;
        Ok(())
    }

    fn apply_angular_velocity(&mut self, magnitude: f32) -> Result<()> {
        self.state.lock().angular_rate = magnitude;
        Ok(())
    }

    fn clear_actuation(&mut self) -> Result<()> {
        let mut s = self.state.lock();
        s.thrust = 0.0;
        s.angular_rate = 0.0;
        Ok(())
    }

    fn halt(&mut self) -> Result<()> {
        let mut s = self.state.lock();
        s.thrust = 0.0;
        s.angular_rate = 0.0;
        s.speed = 0.0;
        Ok(())
    }

    fn get_pose(&mut self) -> Result<Pose2D> {
        Ok(self.state.lock().pose)
    }

    fn set_pose(&mut self, pose: Pose2D) -> Result<()> {
        self.state.lock().pose = pose;
        Ok(())
    }

    fn set_velocity_limit(&mut self, cap: f32) -> Result<()> {
        let mut s = self.state.lock();
        s.velocity_limit = cap.max(0.0);
        s.speed = s.speed.clamp(-s.velocity_limit, s.velocity_limit);
        Ok(())
    }
}

impl ProximitySensors for SimActuator {
    fn is_active(&mut self, direction: SensorDirection) -> Result<bool> {
        let s = self.state.lock();
        let Some(map) = s.map.as_ref() else {
            return Ok(false);
        };

        let angle = s.pose.theta + direction.bearing();
        let step = map.resolution() / 2.0;
        let mut t = step;
        while t <= s.config.sensor_range {
            if map.is_occupied(s.pose.x + t * angle.cos(), s.pose.y + t * angle.sin()) {
                return Ok(true);
            }
            t += step;
        }
        Ok(false)
    }
}
