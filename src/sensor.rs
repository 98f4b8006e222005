//! Proximity sensing capability
//!
//! Sensors are read by decision-making layers (scripts reacting to
//! obstacles), never by the motion sequencer itself.

use crate::error::Result;
use std::f32::consts::PI;

/// Body-relative sensor directions, eight fixed bearings around the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorDirection {
    Front,
    FrontLeft,
    Left,
    RearLeft,
    Rear,
    RearRight,
    Right,
    FrontRight,
}

impl SensorDirection {
    /// All directions, front first, going counter-clockwise
    pub const ALL: [SensorDirection; 8] = [
        Self::Front,
        Self::FrontLeft,
        Self::Left,
        Self::RearLeft,
        Self::Rear,
        Self::RearRight,
        Self::Right,
        Self::FrontRight,
    ];

    /// Bearing relative to the heading, radians CCW
    pub fn bearing(&self) -> f32 {
        match self {
            Self::Front => 0.0,
            Self::FrontLeft => PI / 4.0,
            Self::Left => PI / 2.0,
            Self::RearLeft => 3.0 * PI / 4.0,
            Self::Rear => PI,
            Self::RearRight => -3.0 * PI / 4.0,
            Self::Right => -PI / 2.0,
            Self::FrontRight => -PI / 4.0,
        }
    }

    /// Map a numeric-keypad digit to a direction (8 = front, 2 = rear).
    ///
    /// Legacy operator layout: the keypad is read with the robot pointing
    /// "up", so 7/8/9 are the forward arc and 1/2/3 the rear arc. 5 and
    /// out-of-range digits map to nothing.
    pub fn from_numpad(key: u8) -> Option<Self> {
        match key {
            8 => Some(Self::Front),
            7 => Some(Self::FrontLeft),
            4 => Some(Self::Left),
            1 => Some(Self::RearLeft),
            2 => Some(Self::Rear),
            3 => Some(Self::RearRight),
            6 => Some(Self::Right),
            9 => Some(Self::FrontRight),
            _ => None,
        }
    }
}

/// Obstacle proximity around the robot
pub trait ProximitySensors {
    /// True when an obstacle sits within sensing range in the given direction
    fn is_active(&mut self, direction: SensorDirection) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numpad_mapping() {
        assert_eq!(SensorDirection::from_numpad(8), Some(SensorDirection::Front));
        assert_eq!(SensorDirection::from_numpad(2), Some(SensorDirection::Rear));
        assert_eq!(SensorDirection::from_numpad(4), Some(SensorDirection::Left));
        assert_eq!(
            SensorDirection::from_numpad(9),
            Some(SensorDirection::FrontRight)
        );
        assert_eq!(SensorDirection::from_numpad(5), None);
        assert_eq!(SensorDirection::from_numpad(0), None);
    }

    #[test]
    fn test_bearings_are_distinct() {
        for (i, a) in SensorDirection::ALL.iter().enumerate() {
            for b in SensorDirection::ALL.iter().skip(i + 1) {
                assert!((a.bearing() - b.bearing()).abs() > 1e-3);
            }
        }
    }
}
