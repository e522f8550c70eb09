// Timing, channel assignments, zenoh topics, hardware configuration
use std::time::Duration;

// Drive loop re-assertion period
pub const DRIVE_TICK: Duration = Duration::from_millis(10);

// Safety watchdog window: motion stops if no move command arrives within it
pub const WATCHDOG_WINDOW: Duration = Duration::from_millis(600);

// Hold duration for single-channel diagnostic pulses
pub const DIAG_DWELL: Duration = Duration::from_secs(1);

// Throttle used by diagnostic pulses when the command carries no value.
// Low magnitude on purpose: diagnostics usually run with the robot on a bench.
pub const DIAG_DEFAULT_THROTTLE: f32 = 0.5;

// PCA9685 channel assignments: drive servos on channels 0..3, lift servo on 4
pub const DRIVE_WHEELS: usize = 4;
pub const LIFT_CHANNEL: u8 = 4;

// Zenoh key expressions
pub const TOPIC_CMD: &str = "terre/cmd"; // inbound commands
pub const TOPIC_IDENTITY: &str = "terre/state/identity"; // handshake on connect
pub const TOPIC_HEALTH: &str = "terre/state/health"; // periodic health status
pub const OPERATOR_LIVELINESS: &str = "terre/op/**"; // operator presence tokens

pub const HEALTH_PERIOD: Duration = Duration::from_secs(1);

// Identity handshake payload
pub const DEVICE_TYPE: &str = "terrE";
pub const DEVICE_UNIT: &str = env!("CARGO_PKG_VERSION");

// PWM controller hardware
pub const PCA9685_ADDRESS: u16 = 0x40;
pub const PWM_FREQUENCY_HZ: f64 = 50.0;
