// Motion controller: shared motion state, drive loop, safety watchdog
//
// One controller owns the actuator and all motion state. Inbound commands
// are dispatched through it; the drive loop re-asserts the current throttle
// vector onto the hardware every tick while motion is active, and a
// rearmable watchdog force-stops the base if move commands stop arriving.
//
// Locking: `shared` (std mutex) guards motion state and the actuator and is
// never held across an await. `op` (async mutex) serializes the public
// operations so a firing watchdog cannot interleave with a start, and so
// stopping can join the drive loop without the active flag flipping back
// underneath it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{debug, error, info, warn};

use crate::actuator::{Actuator, ActuatorError};
use crate::config::{
    DIAG_DEFAULT_THROTTLE, DIAG_DWELL, DRIVE_TICK, DRIVE_WHEELS, LIFT_CHANNEL, WATCHDOG_WINDOW,
};
use crate::messages::{Command, MoveTarget};

use super::presets::{Direction, Wiring};

/// What the drive loop is currently asserting
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveMode {
    Idle,
    Preset(Direction),
    Raw,
}

/// Shared record of current motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub active: bool,
    pub mode: DriveMode,
    pub throttles: [f32; DRIVE_WHEELS],
}

impl MotionState {
    fn idle() -> Self {
        Self {
            active: false,
            mode: DriveMode::Idle,
            throttles: [0.0; DRIVE_WHEELS],
        }
    }
}

struct Shared<A> {
    state: MotionState,
    actuator: A,
    drive: Option<JoinHandle<()>>,
    // True from spawn until the loop's own exit, cleared under this lock on
    // every exit path. `JoinHandle::is_finished` is not equivalent: it stays
    // false for a moment after the loop has released the lock and broken,
    // which could let a move skip spawning while no loop is live.
    loop_running: bool,
    // Bumped on every arm/stop; a sleeping watchdog only fires if its
    // generation is still current, so a canceled timer is a no-op.
    watchdog_generation: u64,
}

pub struct MotionController<A> {
    shared: Arc<StdMutex<Shared<A>>>,
    op: Arc<AsyncMutex<()>>,
    live_loops: Arc<AtomicUsize>,
    wiring: Wiring,
}

impl<A> Clone for MotionController<A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            op: Arc::clone(&self.op),
            live_loops: Arc::clone(&self.live_loops),
            wiring: self.wiring,
        }
    }
}

impl<A: Actuator> MotionController<A> {
    pub fn new(actuator: A, wiring: Wiring) -> Self {
        Self {
            shared: Arc::new(StdMutex::new(Shared {
                state: MotionState::idle(),
                actuator,
                drive: None,
                loop_running: false,
                watchdog_generation: 0,
            })),
            op: Arc::new(AsyncMutex::new(())),
            live_loops: Arc::new(AtomicUsize::new(0)),
            wiring,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared<A>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> MotionState {
        self.lock().state
    }

    pub fn is_driving(&self) -> bool {
        self.lock().state.active
    }

    /// Map an inbound command to a motion operation
    pub async fn dispatch(&self, command: Command) -> Result<(), ActuatorError> {
        match command {
            Command::Move { target } => self.handle_move(target).await,
            Command::Stop => self.stop_motion().await,
            Command::Lift { angle } => self.lift(angle),
            Command::Wheel0 { value } => self.diagnostic_pulse(0, value).await,
            Command::Wheel1 { value } => self.diagnostic_pulse(1, value).await,
            Command::Wheel2 { value } => self.diagnostic_pulse(2, value).await,
            Command::Wheel3 { value } => self.diagnostic_pulse(3, value).await,
        }
    }

    async fn handle_move(&self, target: MoveTarget) -> Result<(), ActuatorError> {
        let (mode, throttles) = match target {
            MoveTarget::Direction(name) => {
                // the station's touch UI releases buttons with move("stop")
                if name == "stop" {
                    return self.stop_motion().await;
                }
                match name.parse::<Direction>() {
                    Ok(direction) => (DriveMode::Preset(direction), self.wiring.preset(direction)),
                    Err(e) => {
                        warn!("ignoring move command: {}", e);
                        return Ok(());
                    }
                }
            }
            MoveTarget::Wheels(v) => (DriveMode::Raw, sanitize(v)),
        };

        let _guard = self.op.lock().await;
        let generation = {
            let mut s = self.lock();
            s.watchdog_generation += 1;
            s.state.active = true;
            s.state.mode = mode;
            s.state.throttles = throttles;
            // at most one drive loop, ever; a live loop picks up the new
            // vector on its next tick
            if !s.loop_running {
                s.loop_running = true;
                s.drive = Some(self.spawn_drive_loop());
            }
            s.watchdog_generation
        };
        debug!("drive {:?} {:?}", mode, throttles);
        self.spawn_watchdog(generation);
        Ok(())
    }

    /// Stop all motion: zero the drive channels synchronously, cancel any
    /// pending watchdog, and wait for the drive loop to exit.
    pub async fn stop_motion(&self) -> Result<(), ActuatorError> {
        let _guard = self.op.lock().await;
        self.stop_locked(None).await?;
        Ok(())
    }

    /// Implicit stop on transport disconnect
    pub async fn on_disconnect(&self) -> Result<(), ActuatorError> {
        info!("transport disconnected, stopping motion");
        self.stop_motion().await
    }

    /// Stop with the op lock already held. With `expected_generation` set,
    /// only stops if the watchdog generation still matches (stale watchdog
    /// firings become no-ops). Returns whether the stop was performed.
    async fn stop_locked(
        &self,
        expected_generation: Option<u64>,
    ) -> Result<bool, ActuatorError> {
        let (handle, write_result) = {
            let mut s = self.lock();
            if let Some(generation) = expected_generation {
                if generation != s.watchdog_generation {
                    return Ok(false);
                }
            }
            s.watchdog_generation += 1;
            s.state = MotionState::idle();

            let mut write_result = Ok(());
            for channel in 0..DRIVE_WHEELS {
                if let Err(e) = s.actuator.set_throttle(channel as u8, 0.0) {
                    error!("failed to zero channel {}: {}", channel, e);
                    if write_result.is_ok() {
                        write_result = Err(e);
                    }
                }
            }
            (s.drive.take(), write_result)
        };

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("drive loop task failed: {}", e);
            }
        }
        write_result.map(|_| true)
    }

    /// Clamp and apply a lift angle. Independent of motion state: does not
    /// touch the drive loop or the watchdog.
    pub fn lift(&self, angle: f32) -> Result<(), ActuatorError> {
        if !angle.is_finite() {
            warn!("ignoring lift command with non-finite angle");
            return Ok(());
        }
        let angle = angle.clamp(0.0, 180.0);
        debug!("lift to {:.1} degrees", angle);
        self.lock().actuator.set_angle(LIFT_CHANNEL, angle)
    }

    /// Exclusive single-channel pulse: force-stop, drive one wheel for the
    /// dwell, then zero everything again. Holds the op lock for the whole
    /// dwell so no movement command can touch the channels mid-pulse.
    pub async fn diagnostic_pulse(
        &self,
        wheel: u8,
        value: Option<f32>,
    ) -> Result<(), ActuatorError> {
        let throttle = value.unwrap_or(DIAG_DEFAULT_THROTTLE).clamp(-1.0, 1.0);
        let throttle = if throttle.is_finite() { throttle } else { DIAG_DEFAULT_THROTTLE };

        let _guard = self.op.lock().await;
        self.stop_locked(None).await?;
        info!("diagnostic: wheel {} throttle {:.2}, others 0", wheel, throttle);
        self.lock().actuator.set_throttle(wheel, throttle)?;

        sleep(DIAG_DWELL).await;

        // best-effort across all four channels, like stop_locked: one bad
        // write must not leave the remaining wheels driven
        let mut s = self.lock();
        let mut write_result = Ok(());
        for channel in 0..DRIVE_WHEELS {
            if let Err(e) = s.actuator.set_throttle(channel as u8, 0.0) {
                error!("failed to zero channel {}: {}", channel, e);
                if write_result.is_ok() {
                    write_result = Err(e);
                }
            }
        }
        write_result
    }

    fn spawn_drive_loop(&self) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let live_loops = Arc::clone(&self.live_loops);
        live_loops.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let mut ticker = interval(DRIVE_TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut s = shared.lock().unwrap_or_else(PoisonError::into_inner);
                if !s.state.active {
                    s.loop_running = false;
                    break;
                }
                let throttles = s.state.throttles;
                let mut failed = false;
                for (channel, &throttle) in throttles.iter().enumerate() {
                    if let Err(e) = s.actuator.set_throttle(channel as u8, throttle) {
                        error!("actuator write failed on channel {}: {}", channel, e);
                        failed = true;
                        break;
                    }
                }
                if failed {
                    // leave a consistent stopped state behind, never a hung
                    // active flag with no loop
                    s.state = MotionState::idle();
                    s.loop_running = false;
                    s.watchdog_generation += 1;
                    for channel in 0..DRIVE_WHEELS {
                        let _ = s.actuator.set_throttle(channel as u8, 0.0);
                    }
                    break;
                }
            }
            live_loops.fetch_sub(1, Ordering::SeqCst);
        })
    }

    fn spawn_watchdog(&self, generation: u64) {
        let controller = self.clone();
        tokio::spawn(async move {
            sleep(WATCHDOG_WINDOW).await;
            let _guard = controller.op.lock().await;
            match controller.stop_locked(Some(generation)).await {
                Ok(true) => warn!(
                    "no move command within {:?}, motion stopped",
                    WATCHDOG_WINDOW
                ),
                Ok(false) => {} // rearmed or canceled in the meantime
                Err(e) => error!("watchdog stop failed: {}", e),
            }
        });
    }
}

fn sanitize(throttles: [f32; DRIVE_WHEELS]) -> [f32; DRIVE_WHEELS] {
    throttles.map(|t| if t.is_finite() { t.clamp(-1.0, 1.0) } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    /// Actuator double that exposes channel state to the test
    #[derive(Clone, Default)]
    struct RecordingActuator {
        throttles: Arc<StdMutex<[f32; DRIVE_WHEELS]>>,
        lift: Arc<StdMutex<Option<f32>>>,
        writes: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
        fail_channel: Arc<StdMutex<Option<u8>>>,
    }

    impl RecordingActuator {
        fn throttles(&self) -> [f32; DRIVE_WHEELS] {
            *self.throttles.lock().unwrap()
        }
    }

    impl Actuator for RecordingActuator {
        fn set_throttle(&mut self, channel: u8, throttle: f32) -> Result<(), ActuatorError> {
            if self.fail.load(Ordering::SeqCst)
                || *self.fail_channel.lock().unwrap() == Some(channel)
            {
                return Err(ActuatorError::InvalidChannel(channel));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.throttles.lock().unwrap()[channel as usize] = throttle;
            Ok(())
        }

        fn set_angle(&mut self, _channel: u8, degrees: f32) -> Result<(), ActuatorError> {
            *self.lift.lock().unwrap() = Some(degrees);
            Ok(())
        }
    }

    fn controller(wiring: Wiring) -> (MotionController<RecordingActuator>, RecordingActuator) {
        let actuator = RecordingActuator::default();
        (MotionController::new(actuator.clone(), wiring), actuator)
    }

    fn move_direction(name: &str) -> Command {
        Command::Move {
            target: MoveTarget::Direction(name.to_string()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_drive_loop_across_moves() {
        let (ctrl, _actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        ctrl.dispatch(move_direction("left")).await.unwrap();
        ctrl.dispatch(move_direction("right")).await.unwrap();
        sleep(DRIVE_TICK * 3).await;

        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 1);
        assert!(ctrl.is_driving());

        ctrl.stop_motion().await.unwrap();
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 0);
        assert!(!ctrl.is_driving());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_zeroes_channels_before_returning() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;
        assert_eq!(actuator.throttles(), [1.0, 1.0, 1.0, 1.0]);

        ctrl.dispatch(Command::Stop).await.unwrap();
        assert_eq!(actuator.throttles(), [0.0; 4]);
        assert_eq!(ctrl.snapshot(), MotionState::idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_loop_reasserts_every_tick() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(DRIVE_TICK).await;
        let before = actuator.writes.load(Ordering::SeqCst);
        sleep(DRIVE_TICK * 10).await;
        let after = actuator.writes.load(Ordering::SeqCst);

        // four channel writes per tick, not a one-shot assertion
        assert!(after >= before + 4 * 8, "before={} after={}", before, after);

        ctrl.stop_motion().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_watchdog_stops_idle_motion() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(WATCHDOG_WINDOW - Duration::from_millis(100)).await;
        assert!(ctrl.is_driving());

        sleep(Duration::from_millis(100) + DRIVE_TICK * 2).await;
        assert!(!ctrl.is_driving());
        assert_eq!(actuator.throttles(), [0.0; 4]);
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_cancels_previous_deadline() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(Duration::from_millis(300)).await;
        ctrl.dispatch(move_direction("forward")).await.unwrap();

        // past the first deadline (600ms) but before the second (900ms):
        // only the second arming may fire
        sleep(Duration::from_millis(400)).await;
        assert!(ctrl.is_driving());
        assert_eq!(actuator.throttles(), [1.0, 1.0, 1.0, 1.0]);

        sleep(Duration::from_millis(250)).await;
        assert!(!ctrl.is_driving());
        assert_eq!(actuator.throttles(), [0.0; 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_stop_cancels_watchdog() {
        let (ctrl, _actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        ctrl.dispatch(Command::Stop).await.unwrap();

        // a new drive started after the stop must not be killed by the
        // stale watchdog from the first move
        ctrl.dispatch(move_direction("left")).await.unwrap();
        sleep(WATCHDOG_WINDOW - Duration::from_millis(50)).await;
        assert!(ctrl.is_driving());

        ctrl.stop_motion().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_preset_switch_updates_vector_in_place() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("left")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;
        assert_eq!(actuator.throttles(), [0.5, 1.0, 0.5, 1.0]);

        ctrl.dispatch(move_direction("right")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;
        assert_eq!(actuator.throttles(), [1.0, 0.5, 1.0, 0.5]);
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 1);

        ctrl.stop_motion().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_raw_vector_passes_through_clamped() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(Command::Move {
            target: MoveTarget::Wheels([0.25, -3.0, f32::NAN, 0.75]),
        })
        .await
        .unwrap();
        sleep(DRIVE_TICK * 2).await;

        assert_eq!(actuator.throttles(), [0.25, -1.0, 0.0, 0.75]);
        assert_eq!(ctrl.snapshot().mode, DriveMode::Raw);

        ctrl.stop_motion().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_direction_is_ignored() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("sideways")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;

        assert!(!ctrl.is_driving());
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 0);
        assert_eq!(actuator.throttles(), [0.0; 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_stop_payload_stops() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;
        ctrl.dispatch(move_direction("stop")).await.unwrap();

        assert!(!ctrl.is_driving());
        assert_eq!(actuator.throttles(), [0.0; 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lift_clamps_angle() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(Command::Lift { angle: -10.0 }).await.unwrap();
        assert_eq!(*actuator.lift.lock().unwrap(), Some(0.0));

        ctrl.dispatch(Command::Lift { angle: 200.0 }).await.unwrap();
        assert_eq!(*actuator.lift.lock().unwrap(), Some(180.0));

        ctrl.dispatch(Command::Lift { angle: 90.0 }).await.unwrap();
        assert_eq!(*actuator.lift.lock().unwrap(), Some(90.0));

        // lift never engages the drive loop or the watchdog
        assert!(!ctrl.is_driving());
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_diagnostic_pulse_is_exclusive_and_bounded() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;

        let pulse = tokio::spawn({
            let ctrl = ctrl.clone();
            async move {
                ctrl.dispatch(Command::Wheel0 { value: Some(0.5) })
                    .await
                    .unwrap();
            }
        });

        // mid-dwell: the drive loop has been force-stopped, channel 0 holds
        // the pulse, everything else is zero
        sleep(Duration::from_millis(100)).await;
        assert_eq!(actuator.throttles(), [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 0);

        pulse.await.unwrap();
        assert_eq!(actuator.throttles(), [0.0; 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_during_dwell_cannot_touch_channels() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        let pulse = tokio::spawn({
            let ctrl = ctrl.clone();
            async move {
                ctrl.dispatch(Command::Wheel0 { value: Some(0.5) })
                    .await
                    .unwrap();
            }
        });
        sleep(Duration::from_millis(100)).await;
        assert_eq!(actuator.throttles(), [0.5, 0.0, 0.0, 0.0]);

        // a move arriving mid-dwell must wait out the pulse, not interleave
        let mid_move = tokio::spawn({
            let ctrl = ctrl.clone();
            async move {
                ctrl.dispatch(move_direction("forward")).await.unwrap();
            }
        });
        sleep(Duration::from_millis(400)).await;
        assert_eq!(actuator.throttles(), [0.5, 0.0, 0.0, 0.0]);
        assert!(!mid_move.is_finished());

        pulse.await.unwrap();
        mid_move.await.unwrap();

        // the deferred move takes effect once the dwell has elapsed
        sleep(DRIVE_TICK * 2).await;
        assert_eq!(actuator.throttles(), [1.0, 1.0, 1.0, 1.0]);

        ctrl.stop_motion().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_diagnostic_cleanup_zeroes_remaining_channels_on_error() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        let pulse = tokio::spawn({
            let ctrl = ctrl.clone();
            async move { ctrl.diagnostic_pulse(0, Some(0.5)).await }
        });
        sleep(Duration::from_millis(100)).await;
        assert_eq!(actuator.throttles(), [0.5, 0.0, 0.0, 0.0]);

        // fault channel 1 and dirty the trailing channels so any skipped
        // cleanup write would show
        *actuator.fail_channel.lock().unwrap() = Some(1);
        {
            let mut throttles = actuator.throttles.lock().unwrap();
            throttles[2] = 0.9;
            throttles[3] = 0.9;
        }

        let result = pulse.await.unwrap();
        assert!(result.is_err());

        let throttles = actuator.throttles();
        assert_eq!(throttles[0], 0.0);
        assert_eq!(throttles[2], 0.0);
        assert_eq!(throttles[3], 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_diagnostic_defaults_to_safe_throttle() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        let pulse = tokio::spawn({
            let ctrl = ctrl.clone();
            async move {
                ctrl.dispatch(Command::Wheel2 { value: None }).await.unwrap();
            }
        });

        sleep(Duration::from_millis(100)).await;
        assert_eq!(actuator.throttles(), [0.0, 0.0, DIAG_DEFAULT_THROTTLE, 0.0]);

        pulse.await.unwrap();
        assert_eq!(actuator.throttles(), [0.0; 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_stops_motion() {
        let (ctrl, actuator) = controller(Wiring::Mirrored);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;
        assert_eq!(actuator.throttles(), [0.5, -0.5, 0.5, -0.5]);

        ctrl.on_disconnect().await.unwrap();
        assert!(!ctrl.is_driving());
        assert_eq!(actuator.throttles(), [0.0; 4]);
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_actuator_failure_leaves_stopped_state() {
        let (ctrl, actuator) = controller(Wiring::Direct);

        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;
        assert!(ctrl.is_driving());

        actuator.fail.store(true, Ordering::SeqCst);
        sleep(DRIVE_TICK * 3).await;

        // loop exited and the state is consistent: no hung active flag, and
        // the loop marked itself stopped so the next move respawns it
        assert!(!ctrl.is_driving());
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 0);
        assert!(!ctrl.lock().loop_running);

        // a later move recovers once the hardware does, with a fresh loop
        // asserting throttles again
        actuator.fail.store(false, Ordering::SeqCst);
        ctrl.dispatch(move_direction("forward")).await.unwrap();
        sleep(DRIVE_TICK * 2).await;
        assert!(ctrl.is_driving());
        assert_eq!(ctrl.live_loops.load(Ordering::SeqCst), 1);
        assert_eq!(actuator.throttles(), [1.0, 1.0, 1.0, 1.0]);
        ctrl.stop_motion().await.unwrap();
    }
}
