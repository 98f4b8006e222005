//! Script player
//!
//! Owns a possibly-not-yet-attached sequencer and a script. Calls that
//! arrive before [`ScriptPlayer::init`] are reported and ignored instead of
//! crashing, so a host can wire the player up before its actuator exists.

use crate::actuator::Actuator;
use crate::error::{Error, Result};
use crate::script::{ScriptStep, total_duration};
use crate::sequencer::{MotionLimits, MotionSequencer, StopHandle};
use crate::types::Pose2D;
use std::time::Duration;

/// Plays a declarative script through a [`MotionSequencer`]
pub struct ScriptPlayer {
    script: Vec<ScriptStep>,
    sequencer: Option<MotionSequencer>,
    started: bool,
}

impl ScriptPlayer {
    /// Create a player for the given script
    pub fn new(script: Vec<ScriptStep>) -> Self {
        Self {
            script,
            sequencer: None,
            started: false,
        }
    }

    /// Attach an actuator, replacing any previous one
    pub fn init(&mut self, actuator: Box<dyn Actuator + Send>, limits: MotionLimits) -> Result<()> {
        self.sequencer = Some(MotionSequencer::new(actuator, limits)?);
        self.started = false;
        log::info!(
            "ScriptPlayer: Initialized with {} step(s), ~{:.1}s total",
            self.script.len(),
            total_duration(&self.script).as_secs_f32()
        );
        Ok(())
    }

    /// True once an actuator is attached
    pub fn is_initialized(&self) -> bool {
        self.sequencer.is_some()
    }

    /// Cross-thread stop handle for the underlying sequencer
    pub fn stop_handle(&self) -> Result<StopHandle> {
        Ok(self.sequencer()?.handle())
    }

    /// Enqueue the whole script. Calling again replays it from the start.
    pub fn start(&mut self) -> Result<()> {
        let steps = self.script.clone();
        let sequencer = self.sequencer_mut()?;
        for step in &steps {
            sequencer.enqueue(step.to_command());
        }
        self.started = true;
        log::debug!("ScriptPlayer: Enqueued {} step(s)", steps.len());
        Ok(())
    }

    /// Advance the sequencer by one control frame
    pub fn tick(&mut self, delta: Duration) -> Result<()> {
        self.sequencer_mut()?.tick(delta)
    }

    /// True once a started script has fully drained
    pub fn finished(&self) -> bool {
        self.started && self.sequencer.as_ref().is_some_and(MotionSequencer::is_idle)
    }

    /// Current actuator pose
    pub fn pose(&self) -> Result<Pose2D> {
        self.sequencer()?.pose()
    }

    /// Direct access to the sequencer, if initialized
    pub fn sequencer_opt(&mut self) -> Option<&mut MotionSequencer> {
        self.sequencer.as_mut()
    }

    fn sequencer(&self) -> Result<&MotionSequencer> {
        self.sequencer.as_ref().ok_or_else(Self::not_initialized)
    }

    fn sequencer_mut(&mut self) -> Result<&mut MotionSequencer> {
        self.sequencer.as_mut().ok_or_else(Self::not_initialized)
    }

    fn not_initialized() -> Error {
        log::warn!("ScriptPlayer: No actuator attached yet, ignoring call");
        Error::NotInitialized
    }
}
