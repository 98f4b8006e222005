//! Motion sequencer: executes scripted commands one at a time
//!
//! One core, two consumption modes:
//!
//! - **Polling**: [`MotionSequencer::enqueue`] commands, then call
//!   [`MotionSequencer::tick`] once per control frame. The sequencer counts
//!   each command's duration down and advances the queue, strictly FIFO, at
//!   most one command starting per tick.
//! - **Suspending**: call [`MotionSequencer::move_forward_for`] and friends
//!   directly. Each call applies its primitive, parks the calling thread for
//!   the duration, then clears actuation. The caller's own call sequence is
//!   the queue; `&mut self` receivers keep a second primitive from being
//!   issued while one is in flight.
//!
//! [`StopHandle`] cancels either mode from any thread.

use crate::actuator::Actuator;
use crate::command::{CommandStatus, MotionOp, ScriptCommand};
use crate::error::Result;
use crate::types::Pose2D;
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Base magnitudes for motion primitives
#[derive(Debug, Clone, Copy)]
pub struct MotionLimits {
    /// Forward thrust for a `Forward` command (m/s²)
    pub linear_acceleration: f32,

    /// Angular rate for turn commands (rad/s)
    pub turn_rate: f32,

    /// Peak linear speed cap pushed to the actuator (m/s)
    pub max_velocity: f32,
}

impl Default for MotionLimits {
    fn default() -> Self {
        Self {
            linear_acceleration: 0.5,
            turn_rate: 1.2,
            max_velocity: 0.35,
        }
    }
}

/// Snapshot of sequencer state
#[derive(Debug, Clone)]
pub struct SequencerStatus {
    /// Active command, if any
    pub active: Option<CommandStatus>,
    /// Number of pending commands
    pub queued: usize,
    /// Stop flag state
    pub stopped: bool,
    /// Current speed multiplier
    pub speed_multiplier: f32,
}

/// Cross-thread stop control for a [`MotionSequencer`].
///
/// Cloneable; a signal handler or supervisor thread can hold one and cancel
/// movement while another thread owns the sequencer itself.
#[derive(Clone)]
pub struct StopHandle {
    actuator: Arc<Mutex<Box<dyn Actuator + Send>>>,
    stopped: Arc<AtomicBool>,
    cancel: Arc<Mutex<Option<Sender<()>>>>,
}

impl StopHandle {
    /// Stop movement now: set the sticky stop flag, wake any parked
    /// suspending call, and zero thrust, angular rate and linear velocity.
    ///
    /// Idempotent; safe to call at any time from any thread.
    pub fn stop(&self) -> Result<()> {
        self.stopped.store(true, Ordering::Relaxed);
        if let Some(tx) = self.cancel.lock().take() {
            let _ = tx.send(());
        }
        self.actuator.lock().halt()
    }

    /// True after [`StopHandle::stop`] until the sequencer is reset
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Install a fresh cancellation token and return its receiving end.
    fn arm(&self) -> Receiver<()> {
        let (tx, rx) = bounded(1);
        *self.cancel.lock() = Some(tx);
        rx
    }

    /// Drop the outstanding cancellation token, if any
    fn disarm(&self) {
        self.cancel.lock().take();
    }
}

/// Command with its countdown running
struct ActiveCommand {
    op: MotionOp,
    duration: Duration,
    remaining: Duration,
    on_complete: Option<crate::command::CompletionCallback>,
}

/// Scripted motion sequencer.
///
/// Owns the pending command queue and the actuator, executes exactly one
/// command at a time in FIFO order, and carries the controller state
/// (stop flag, speed multiplier, initial pose for reset).
pub struct MotionSequencer {
    shared: StopHandle,
    limits: MotionLimits,
    queue: VecDeque<ScriptCommand>,
    active: Option<ActiveCommand>,
    speed_multiplier: f32,
    initial_pose: Pose2D,
}

impl MotionSequencer {
    /// Create a sequencer driving the given actuator.
    ///
    /// Captures the actuator's current pose as the reset target and pushes
    /// the base velocity cap down.
    pub fn new(actuator: Box<dyn Actuator + Send>, limits: MotionLimits) -> Result<Self> {
        let shared = StopHandle {
            actuator: Arc::new(Mutex::new(actuator)),
            stopped: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(Mutex::new(None)),
        };

        let initial_pose = {
            let mut actuator = shared.actuator.lock();
            actuator.set_velocity_limit(limits.max_velocity)?;
            actuator.get_pose()?
        };

        log::debug!(
            "MotionSequencer: Initialized - accel={:.2}m/s², turn={:.2}rad/s, cap={:.2}m/s, start=({:.2}, {:.2}, {:.2})",
            limits.linear_acceleration,
            limits.turn_rate,
            limits.max_velocity,
            initial_pose.x,
            initial_pose.y,
            initial_pose.theta
        );

        Ok(Self {
            shared,
            limits,
            queue: VecDeque::new(),
            active: None,
            speed_multiplier: 1.0,
            initial_pose,
        })
    }

    /// Get a cloneable cross-thread stop handle
    pub fn handle(&self) -> StopHandle {
        self.shared.clone()
    }

    // ------------------------------------------------------------------
    // Polling mode
    // ------------------------------------------------------------------

    /// Append a command to the pending queue.
    ///
    /// Never starts execution itself; only [`MotionSequencer::tick`] drains
    /// the queue. Safe at any queue depth, idle or executing.
    pub fn enqueue(&mut self, command: ScriptCommand) {
        log::debug!(
            "MotionSequencer: Enqueued {} for {:?} ({} pending)",
            command.op.name(),
            command.duration,
            self.queue.len() + 1
        );
        self.queue.push_back(command);
    }

    /// Advance the sequencer by one control frame.
    ///
    /// Counts the active command down by `delta`, completing it (callback
    /// fired after actuation is cleared) when its duration has elapsed, then
    /// starts at most one queued command. While stopped, queued commands
    /// complete immediately as no-ops, one per tick, without any actuation.
    pub fn tick(&mut self, delta: Duration) -> Result<()> {
        if self.shared.is_stopped() {
            // Anything cancelled by the stop is discarded without completion;
            // commands enqueued afterwards short-circuit to no-op completions.
            self.active = None;
            if let Some(command) = self.queue.pop_front() {
                log::debug!(
                    "MotionSequencer: Completing {} as no-op while stopped",
                    command.op.name()
                );
                if let Some(callback) = command.on_complete {
                    callback(self);
                }
            }
            return Ok(());
        }

        if let Some(active) = self.active.as_mut() {
            active.remaining = active.remaining.saturating_sub(delta);
        }

        if let Some(finished) = self.active.take_if(|a| a.remaining.is_zero()) {
            self.shared.actuator.lock().clear_actuation()?;
            log::debug!(
                "MotionSequencer: Completed {} after {:?}",
                finished.op.name(),
                finished.duration
            );
            if let Some(callback) = finished.on_complete {
                callback(self);
            }
        }

        // The callback may have stopped or reset us; never start a command
        // in that case. At most one command starts per tick.
        if !self.shared.is_stopped()
            && self.active.is_none()
            && let Some(command) = self.queue.pop_front()
        {
            self.begin(command)?;
        }

        Ok(())
    }

    /// Dequeue-to-active transition: apply the primitive and start the countdown
    fn begin(&mut self, command: ScriptCommand) -> Result<()> {
        self.apply_primitive(command.op)?;
        log::debug!(
            "MotionSequencer: Starting {} for {:?}",
            command.op.name(),
            command.duration
        );
        self.active = Some(ActiveCommand {
            op: command.op,
            duration: command.duration,
            remaining: command.duration,
            on_complete: command.on_complete,
        });
        Ok(())
    }

    // ------------------------------------------------------------------
    // Suspending mode
    // ------------------------------------------------------------------

    /// Drive forward for `duration`, blocking the calling thread.
    pub fn move_forward_for(&mut self, duration: Duration) -> Result<()> {
        self.run_for(MotionOp::Forward, duration)
    }

    /// Turn counter-clockwise for `duration`, blocking the calling thread.
    pub fn turn_left_for(&mut self, duration: Duration) -> Result<()> {
        self.run_for(MotionOp::TurnLeft, duration)
    }

    /// Turn clockwise for `duration`, blocking the calling thread.
    pub fn turn_right_for(&mut self, duration: Duration) -> Result<()> {
        self.run_for(MotionOp::TurnRight, duration)
    }

    /// Hold still for `duration`, blocking the calling thread.
    pub fn wait_for(&mut self, duration: Duration) -> Result<()> {
        self.run_for(MotionOp::Wait, duration)
    }

    /// Apply one primitive and park until it completes or a stop cancels it.
    ///
    /// Bypasses the pending queue. The stop flag is checked at entry, after
    /// arming the cancellation token, and at wakeup; a cancelled wait returns
    /// without touching actuation again (the stop already zeroed it).
    fn run_for(&mut self, op: MotionOp, duration: Duration) -> Result<()> {
        if self.shared.is_stopped() {
            log::debug!(
                "MotionSequencer: Skipping {} while stopped",
                op.name()
            );
            return Ok(());
        }

        self.apply_primitive(op)?;
        let cancel = self.shared.arm();

        // A stop may have slipped in between the entry check and arming;
        // it found no token to fire, so re-check before parking.
        if self.shared.is_stopped() {
            self.shared.disarm();
            return Ok(());
        }

        let cancelled = cancel.recv_timeout(duration).is_ok();
        self.shared.disarm();

        if cancelled || self.shared.is_stopped() {
            return Ok(());
        }
        self.shared.actuator.lock().clear_actuation()
    }

    // ------------------------------------------------------------------
    // Primitive executor
    // ------------------------------------------------------------------

    /// Map an op onto actuator calls.
    ///
    /// The speed multiplier is read here, once per activation; changing it
    /// mid-command does not retouch an already-applied magnitude.
    fn apply_primitive(&mut self, op: MotionOp) -> Result<()> {
        let scale = self.speed_multiplier;
        let mut actuator = self.shared.actuator.lock();
        match op {
            MotionOp::Forward => {
                actuator.apply_forward_thrust(self.limits.linear_acceleration * scale)
            }
            MotionOp::TurnLeft => actuator.apply_angular_velocity(self.limits.turn_rate * scale),
            MotionOp::TurnRight => {
                actuator.apply_angular_velocity(-self.limits.turn_rate * scale)
            }
            MotionOp::Wait => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Controller state
    // ------------------------------------------------------------------

    /// Scale every subsequent primitive's magnitude.
    ///
    /// Clamped to `>= 0`. Takes effect at the next command activation; the
    /// actuator's velocity cap is retargeted immediately to `base cap * m`.
    pub fn set_speed_multiplier(&mut self, multiplier: f32) -> Result<()> {
        let multiplier = multiplier.max(0.0);
        self.speed_multiplier = multiplier;
        log::debug!("MotionSequencer: Speed multiplier set to {:.2}", multiplier);
        self.shared
            .actuator
            .lock()
            .set_velocity_limit(self.limits.max_velocity * multiplier)
    }

    /// Cancel the active command, drop the pending queue, and halt.
    ///
    /// Sets the sticky stop flag; no command executes until [`reset`].
    /// Idempotent, and safe to call from inside a completion callback.
    ///
    /// [`reset`]: MotionSequencer::reset
    pub fn stop_movement(&mut self) -> Result<()> {
        let dropped = self.queue.len() + usize::from(self.active.is_some());
        self.active = None;
        self.queue.clear();
        self.shared.stop()?;
        if dropped > 0 {
            log::info!("MotionSequencer: Stopped, dropped {} command(s)", dropped);
        } else {
            log::debug!("MotionSequencer: Stopped");
        }
        Ok(())
    }

    /// Return to the construction-time state: stopped movement, initial
    /// pose, speed multiplier 1.0, stop flag cleared, queue empty.
    pub fn reset(&mut self) -> Result<()> {
        self.stop_movement()?;

        {
            let mut actuator = self.shared.actuator.lock();
            actuator.set_pose(self.initial_pose)?;
            actuator.set_velocity_limit(self.limits.max_velocity)?;
        }
        self.speed_multiplier = 1.0;

        // Cleared last so nothing restarts mid-reset
        self.shared.stopped.store(false, Ordering::Relaxed);

        log::info!(
            "MotionSequencer: Reset to ({:.2}, {:.2}, {:.2})",
            self.initial_pose.x,
            self.initial_pose.y,
            self.initial_pose.theta
        );
        Ok(())
    }

    /// Current actuator pose
    pub fn pose(&self) -> Result<Pose2D> {
        self.shared.actuator.lock().get_pose()
    }

    /// True when no command is active and the queue is empty
    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Number of pending commands
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Get sequencer status
    pub fn status(&self) -> SequencerStatus {
        SequencerStatus {
            active: self.active.as_ref().map(|a| CommandStatus {
                op: a.op,
                duration: a.duration,
                remaining: a.remaining,
            }),
            queued: self.queue.len(),
            stopped: self.shared.is_stopped(),
            speed_multiplier: self.speed_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;

    const MS: Duration = Duration::from_millis(1);

    /// Records every actuation call for exact assertions
    #[derive(Clone, Default)]
    struct RecordingActuator {
        state: Arc<Mutex<Recorded>>,
    }

    #[derive(Default)]
    struct Recorded {
        thrust: f32,
        angular: f32,
        pose: Pose2D,
        velocity_limit: f32,
        halts: usize,
        clears: usize,
    }

    impl RecordingActuator {
        fn thrust(&self) -> f32 {
            self.state.lock().thrust
        }

        fn angular(&self) -> f32 {
            self.state.lock().angular
        }

        fn halts(&self) -> usize {
            self.state.lock().halts
        }

        fn velocity_limit(&self) -> f32 {
            self.state.lock().velocity_limit
        }

        fn clears(&self) -> usize {
            self.state.lock().clears
        }

        fn set_test_pose(&self, pose: Pose2D) {
            self.state.lock().pose = pose;
        }
    }

    impl Actuator for RecordingActuator {
        fn apply_forward_thrust(&mut self, magnitude: f32) -> Result<()> {
            self.state.lock().thrust = magnitude;
            Ok(())
        }

        fn apply_angular_velocity(&mut self, magnitude: f32) -> Result<()> {
            self.state.lock().angular = magnitude;
            Ok(())
        }

        fn clear_actuation(&mut self) -> Result<()> {
            let mut state = self.state.lock();
            state.thrust = 0.0;
            state.angular = 0.0;
            state.clears += 1;
            Ok(())
        }

        fn halt(&mut self) -> Result<()> {
            let mut state = self.state.lock();
            state.thrust = 0.0;
            state.angular = 0.0;
            state.halts += 1;
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
            self.state.lock().velocity_limit = cap;
            Ok(())
        }
    }

    fn sequencer() -> (MotionSequencer, RecordingActuator) {
        let actuator = RecordingActuator::default();
        let seq = MotionSequencer::new(Box::new(actuator.clone()), MotionLimits::default())
            .expect("sequencer init");
        (seq, actuator)
    }

    #[test]
    fn test_fifo_order_and_full_durations() {
        let (mut seq, actuator) = sequencer();
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        seq.enqueue(
            ScriptCommand::forward(500 * MS).on_complete(move |_| o.lock().push("forward")),
        );
        let o = Arc::clone(&order);
        seq.enqueue(
            ScriptCommand::turn_left(300 * MS).on_complete(move |_| o.lock().push("turn")),
        );

        // Nothing runs until the first tick
        assert!(actuator.thrust() == 0.0 && actuator.angular() == 0.0);

        seq.tick(Duration::ZERO).unwrap();
        assert!(actuator.thrust() > 0.0);
        assert!(order.lock().is_empty());

        // Full duration elapses: forward completes, turn starts same tick
        seq.tick(500 * MS).unwrap();
        assert_eq!(*order.lock(), vec!["forward"]);
        assert_eq!(actuator.thrust(), 0.0);
        assert!(actuator.angular() > 0.0);

        seq.tick(300 * MS).unwrap();
        assert_eq!(*order.lock(), vec!["forward", "turn"]);
        assert_eq!(actuator.angular(), 0.0);
        assert!(seq.is_idle());
    }

    #[test]
    fn test_at_most_one_start_per_tick() {
        let (mut seq, _actuator) = sequencer();
        seq.enqueue(ScriptCommand::wait(Duration::ZERO));
        seq.enqueue(ScriptCommand::wait(Duration::ZERO));

        seq.tick(MS).unwrap();
        assert_eq!(seq.queue_len(), 1);
        assert!(seq.status().active.is_some());

        seq.tick(MS).unwrap();
        assert_eq!(seq.queue_len(), 0);
        assert!(seq.status().active.is_some());

        seq.tick(MS).unwrap();
        assert!(seq.is_idle());
    }

    #[test]
    fn test_turn_directions() {
        let (mut seq, actuator) = sequencer();
        let turn = MotionLimits::default().turn_rate;

        seq.enqueue(ScriptCommand::turn_left(100 * MS));
        seq.tick(Duration::ZERO).unwrap();
        assert!((actuator.angular() - turn).abs() < 1e-6);

        seq.tick(100 * MS).unwrap();
        seq.enqueue(ScriptCommand::turn_right(100 * MS));
        seq.tick(Duration::ZERO).unwrap();
        assert!((actuator.angular() + turn).abs() < 1e-6);
    }

    #[test]
    fn test_stop_zeroes_actuation_and_blocks_execution() {
        let (mut seq, actuator) = sequencer();
        seq.enqueue(ScriptCommand::forward(1000 * MS));
        seq.tick(100 * MS).unwrap();
        assert!(actuator.thrust() > 0.0);

        seq.stop_movement().unwrap();
        assert_eq!(actuator.thrust(), 0.0);
        assert_eq!(actuator.halts(), 1);

        // No execution resumes while stopped
        seq.enqueue(ScriptCommand::forward(100 * MS));
        seq.tick(100 * MS).unwrap();
        seq.tick(100 * MS).unwrap();
        assert_eq!(actuator.thrust(), 0.0);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut seq, actuator) = sequencer();
        seq.enqueue(ScriptCommand::forward(500 * MS));
        seq.tick(100 * MS).unwrap();

        seq.stop_movement().unwrap();
        let first = seq.status();
        seq.stop_movement().unwrap();
        let second = seq.status();

        assert!(first.stopped && second.stopped);
        assert_eq!(first.queued, second.queued);
        assert_eq!(actuator.thrust(), 0.0);
    }

    #[test]
    fn test_stopped_queue_completes_as_noop() {
        let (mut seq, actuator) = sequencer();
        seq.stop_movement().unwrap();

        let fired = Arc::new(Mutex::new(false));
        let f = Arc::clone(&fired);
        seq.enqueue(ScriptCommand::forward(500 * MS).on_complete(move |_| *f.lock() = true));

        seq.tick(MS).unwrap();
        assert!(*fired.lock());
        assert_eq!(actuator.thrust(), 0.0);
        assert!(seq.is_idle());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let (mut seq, actuator) = sequencer();
        actuator.set_test_pose(Pose2D::new(2.0, -1.0, 0.7));
        seq.set_speed_multiplier(3.0).unwrap();
        seq.stop_movement().unwrap();

        seq.reset().unwrap();

        let status = seq.status();
        assert!(!status.stopped);
        assert_eq!(status.speed_multiplier, 1.0);
        assert_eq!(seq.pose().unwrap(), Pose2D::origin());
        assert_eq!(
            actuator.velocity_limit(),
            MotionLimits::default().max_velocity
        );
    }

    #[test]
    fn test_reset_drops_pending_queue() {
        let (mut seq, actuator) = sequencer();
        seq.stop_movement().unwrap();
        seq.enqueue(ScriptCommand::forward(500 * MS));
        seq.enqueue(ScriptCommand::turn_left(500 * MS));

        seq.reset().unwrap();
        assert!(seq.is_idle());

        // Queue stays empty: nothing left over starts running
        seq.tick(100 * MS).unwrap();
        assert_eq!(actuator.thrust(), 0.0);
    }

    #[test]
    fn test_zero_multiplier_keeps_timing() {
        let (mut seq, actuator) = sequencer();
        seq.set_speed_multiplier(0.0).unwrap();

        let fired = Arc::new(Mutex::new(false));
        let f = Arc::clone(&fired);
        seq.enqueue(ScriptCommand::forward(300 * MS).on_complete(move |_| *f.lock() = true));

        seq.tick(Duration::ZERO).unwrap();
        assert_eq!(actuator.thrust(), 0.0);
        assert_eq!(actuator.velocity_limit(), 0.0);

        // Completion timing is unaffected by the magnitude
        seq.tick(299 * MS).unwrap();
        assert!(!*fired.lock());
        seq.tick(MS).unwrap();
        assert!(*fired.lock());
    }

    #[test]
    fn test_multiplier_read_at_activation_only() {
        let (mut seq, actuator) = sequencer();
        seq.enqueue(ScriptCommand::forward(500 * MS));
        seq.tick(Duration::ZERO).unwrap();
        let applied = actuator.thrust();

        seq.set_speed_multiplier(0.0).unwrap();
        seq.tick(100 * MS).unwrap();
        assert_eq!(actuator.thrust(), applied);
    }

    #[test]
    fn test_stop_from_completion_callback() {
        let (mut seq, actuator) = sequencer();

        seq.enqueue(ScriptCommand::forward(100 * MS).on_complete(|seq| {
            seq.stop_movement().expect("stop inside callback");
        }));
        seq.enqueue(ScriptCommand::turn_left(100 * MS));

        seq.tick(Duration::ZERO).unwrap();
        seq.tick(100 * MS).unwrap();

        // The follow-up command never started
        assert!(seq.status().stopped);
        assert_eq!(actuator.angular(), 0.0);
        assert!(seq.status().active.is_none());
    }

    #[test]
    fn test_suspending_call_short_circuits_when_stopped() {
        let (mut seq, actuator) = sequencer();
        seq.stop_movement().unwrap();

        let start = std::time::Instant::now();
        seq.move_forward_for(1000 * MS).unwrap();
        assert!(start.elapsed() < 100 * MS);
        assert_eq!(actuator.thrust(), 0.0);
    }

    #[test]
    fn test_suspending_call_applies_and_clears() {
        let (mut seq, actuator) = sequencer();
        seq.wait_for(10 * MS).unwrap();
        seq.move_forward_for(20 * MS).unwrap();
        assert_eq!(actuator.thrust(), 0.0);
        assert_eq!(actuator.clears(), 2);
        assert_eq!(actuator.halts(), 0);
    }
}
